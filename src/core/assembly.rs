use crate::core::footprint;
use crate::io::manifest;
use crate::types::SceneRecord;
use std::collections::HashSet;

/// One absolute-orbit group after chain building. `members` is the maximal
/// pairwise-valid chain (1 or 2 scenes); it is empty when every chain
/// candidate had an unassigned slice, in which case the anchor stands alone.
#[derive(Debug, Clone)]
pub struct AssembledGroup {
    pub anchor: SceneRecord,
    pub members: Vec<SceneRecord>,
    /// True when any scene of the orbit group is cross-polarized; such
    /// groups are excluded from coherence pairing
    pub has_cross_pol: bool,
}

impl AssembledGroup {
    /// Scenes making up the emitted job: the chain, or the anchor alone
    pub fn job_members(&self) -> Vec<SceneRecord> {
        if self.members.is_empty() {
            vec![self.anchor.clone()]
        } else {
            self.members.clone()
        }
    }
}

/// Slice assembly is required when some absolute orbit recurs: a single pass
/// was recorded in multiple sequential acquisitions
pub fn requires_slice_assembly(records: &[SceneRecord]) -> bool {
    let distinct: HashSet<u32> = records.iter().map(|r| r.absolute_orbit).collect();
    distinct.len() < records.len()
}

/// Two scenes are true sequential slices when their footprints barely overlap
/// but still touch after boundary rounding. High overlap means duplicate
/// coverage, not adjacency.
pub fn is_pair_valid(a: &SceneRecord, b: &SceneRecord) -> bool {
    footprint::overlap_area(a.scene_dir(), b.scene_dir()) < 1.0
        && footprint::rounded_intersects(a.scene_dir(), b.scene_dir())
}

/// Partitions the record list into per-absolute-orbit groups and builds the
/// slice-assembly chain for each.
///
/// Records sharing an absolute orbit must be contiguous in the input, which
/// catalog discovery order (descending acquisition time) guarantees: the
/// outer cursor advances by the size of each consumed group, so an orbit
/// interleaved with another would be consumed twice. A leading record with
/// slice number "0" cannot anchor a pair and is skipped outright.
pub fn assemble_groups(records: &[SceneRecord]) -> Vec<AssembledGroup> {
    let mut groups = Vec::new();
    let mut j = 0;

    while j < records.len() {
        let anchor = records[j].clone();
        let mut group: Vec<SceneRecord> = records
            .iter()
            .filter(|r| r.absolute_orbit == anchor.absolute_orbit)
            .cloned()
            .collect();

        if slice_unassigned(&anchor) {
            log::debug!("skipping unassigned-slice leader {}", anchor.path);
            j += 1;
            continue;
        }

        // an unassigned-slice group head must also be cleared before the
        // first chain candidate can be set
        if group.first().map(slice_unassigned).unwrap_or(false) {
            group.remove(0);
        }

        let advance = group.len().max(1);
        let has_cross_pol = group.iter().any(|r| r.polarization.is_cross_pol());
        let members = build_chain(&group);

        groups.push(AssembledGroup {
            anchor,
            members,
            has_cross_pol,
        });

        j += advance;
    }

    log::info!("assembled {} job group(s) from {} records", groups.len(), records.len());
    groups
}

/// Walks the group with a two-step lookahead: a valid `(x, x+1)` pair is
/// accepted directly; an invalid neighbor followed by a valid `(x, x+2)`
/// pair marks `x+1` as a spurious duplicate between two true slices.
fn build_chain(group: &[SceneRecord]) -> Vec<SceneRecord> {
    let mut chain: Vec<SceneRecord> = group.first().cloned().into_iter().collect();
    let mut skip_until = 0;

    for x in 0..group.len().saturating_sub(1) {
        if skip_until > x {
            continue;
        }
        if is_pair_valid(&group[x], &group[x + 1]) {
            chain = assigned_pair(&group[x], &group[x + 1]);
        } else if x + 2 < group.len() && is_pair_valid(&group[x], &group[x + 2]) {
            chain = assigned_pair(&group[x], &group[x + 2]);
            skip_until = x + 2;
        }
    }

    chain
}

/// Keeps only the pair members that carry a real slice number
fn assigned_pair(a: &SceneRecord, b: &SceneRecord) -> Vec<SceneRecord> {
    let mut result = Vec::with_capacity(2);
    if !slice_unassigned(a) {
        result.push(a.clone());
    }
    if !slice_unassigned(b) {
        result.push(b.clone());
    }
    result
}

fn slice_unassigned(record: &SceneRecord) -> bool {
    manifest::slice_number(record.scene_dir()).as_deref() == Some("0")
}

/// Redundant-scene pruning for GRD runs without slice mode: when a record's
/// neighbor fails pair validity but the record two ahead passes, the middle
/// record duplicates existing coverage and is removed.
pub fn prune_redundant(records: Vec<SceneRecord>) -> Vec<SceneRecord> {
    let mut redundant: HashSet<usize> = HashSet::new();
    let mut skip_until = 0;

    for x in 0..records.len().saturating_sub(1) {
        if skip_until > x {
            continue;
        }
        if is_pair_valid(&records[x], &records[x + 1]) {
            continue;
        } else if x + 2 < records.len() && is_pair_valid(&records[x], &records[x + 2]) {
            redundant.insert(x + 1);
            skip_until = x + 2;
        }
    }

    if !redundant.is_empty() {
        log::info!("pruning {} redundant scene(s)", redundant.len());
    }

    records
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !redundant.contains(i))
        .map(|(_, r)| r)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrbitDirection, Platform, PolarizationMode};
    use chrono::NaiveDate;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_manifest(dir: &Path, slice_number: &str, coords: &str) {
        let xml = format!(
            r#"<?xml version="1.0"?>
<xfdu:XFDU xmlns:xfdu="urn:ccsds:schema:xfdu:1"
           xmlns:gml="http://www.opengis.net/gml"
           xmlns:s1="http://www.esa.int/safe/sentinel-1.0/sentinel-1"
           xmlns:s1sarl1="http://www.esa.int/safe/sentinel-1.0/sentinel-1/sar/level-1">
  <s1:pass>ASCENDING</s1:pass>
  <s1sarl1:sliceNumber>{}</s1sarl1:sliceNumber>
  <gml:coordinates>{}</gml:coordinates>
</xfdu:XFDU>"#,
            slice_number, coords
        );
        std::fs::write(dir.join("manifest.safe"), xml).unwrap();
    }

    /// Square footprint of `size` degrees with lower-left corner (lat0, lon0),
    /// rendered in manifest order (lat,lon per point)
    fn square_coords(lat0: f64, lon0: f64, size: f64) -> String {
        format!(
            "{},{} {},{} {},{} {},{}",
            lat0 + size,
            lon0,
            lat0 + size,
            lon0 + size,
            lat0,
            lon0 + size,
            lat0,
            lon0
        )
    }

    fn scene(
        root: &TempDir,
        name: &str,
        orbit: u32,
        slice_number: &str,
        lon0: f64,
    ) -> SceneRecord {
        let dir = root.path().join(name);
        std::fs::create_dir_all(&dir).unwrap();
        write_manifest(&dir, slice_number, &square_coords(48.0, lon0, 1.0));
        let start = NaiveDate::from_ymd_opt(2020, 1, 3)
            .unwrap()
            .and_hms_opt(17, 8, 15)
            .unwrap();
        SceneRecord {
            path: dir.display().to_string(),
            platform: Platform::S1A,
            polarization: PolarizationMode::DualVV,
            start_time: start,
            stop_time: start,
            absolute_orbit: orbit,
            relative_orbit: 117,
            orbit_direction: OrbitDirection::Ascending,
            unique_id: name.to_string(),
        }
    }

    #[test]
    fn test_requires_slice_assembly() {
        let root = TempDir::new().unwrap();
        let distinct = vec![scene(&root, "a", 1, "1", 0.0), scene(&root, "b", 2, "1", 5.0)];
        assert!(!requires_slice_assembly(&distinct));
        let repeated = vec![scene(&root, "c", 1, "1", 0.0), scene(&root, "d", 1, "2", 1.0)];
        assert!(requires_slice_assembly(&repeated));
    }

    #[test]
    fn test_pair_validity_for_touching_slices() {
        let root = TempDir::new().unwrap();
        let a = scene(&root, "a", 1, "1", 0.0);
        let b = scene(&root, "b", 1, "2", 1.0); // shares the lon=1 edge
        assert!(is_pair_valid(&a, &b));
    }

    #[test]
    fn test_pair_validity_monotonic_in_overlap() {
        // overlap area >= 1 is duplicate coverage, never a valid pair
        let root = TempDir::new().unwrap();
        let dir_a = root.path().join("a");
        let dir_b = root.path().join("b");
        std::fs::create_dir_all(&dir_a).unwrap();
        std::fs::create_dir_all(&dir_b).unwrap();
        write_manifest(&dir_a, "1", &square_coords(48.0, 0.0, 2.0));
        write_manifest(&dir_b, "2", &square_coords(48.0, 1.0, 2.0));

        let mut a = scene(&root, "a2", 1, "1", 0.0);
        let mut b = scene(&root, "b2", 1, "2", 0.0);
        a.path = dir_a.display().to_string();
        b.path = dir_b.display().to_string();

        assert!(footprint::overlap_area(a.scene_dir(), b.scene_dir()) >= 1.0);
        assert!(!is_pair_valid(&a, &b));
    }

    #[test]
    fn test_chain_of_three_with_spurious_middle() {
        // A and C touch, B is a stray duplicate in between: one job {A, C}
        let root = TempDir::new().unwrap();
        let a = scene(&root, "a", 7, "1", 0.0);
        let b = scene(&root, "b", 7, "2", 5.0);
        let c = scene(&root, "c", 7, "3", 1.0);
        let records = vec![a.clone(), b, c.clone()];

        let groups = assemble_groups(&records);
        assert_eq!(groups.len(), 1);
        let members = groups[0].job_members();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].unique_id, "a");
        assert_eq!(members[1].unique_id, "c");
    }

    #[test]
    fn test_unassigned_slice_leader_is_skipped() {
        let root = TempDir::new().unwrap();
        let zero = scene(&root, "z", 7, "0", 0.0);
        let a = scene(&root, "a", 7, "1", 1.0);
        let b = scene(&root, "b", 7, "2", 2.0);
        let records = vec![zero, a, b];

        let groups = assemble_groups(&records);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].anchor.unique_id, "a");
        let members = groups[0].job_members();
        assert_eq!(members.len(), 2);
        assert!(members.iter().all(|m| m.unique_id != "z"));
    }

    #[test]
    fn test_single_scene_group() {
        let root = TempDir::new().unwrap();
        let a = scene(&root, "a", 7, "1", 0.0);
        let groups = assemble_groups(&[a]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].job_members().len(), 1);
    }

    #[test]
    fn test_cross_pol_group_flag() {
        let root = TempDir::new().unwrap();
        let a = scene(&root, "a", 7, "1", 0.0);
        let mut b = scene(&root, "b", 7, "2", 1.0);
        b.polarization = PolarizationMode::DualHH;
        let groups = assemble_groups(&[a, b]);
        assert!(groups[0].has_cross_pol);
    }

    #[test]
    fn test_prune_redundant_middle_scene() {
        let root = TempDir::new().unwrap();
        let a = scene(&root, "a", 1, "1", 0.0);
        let b = scene(&root, "b", 2, "1", 5.0);
        let c = scene(&root, "c", 3, "1", 1.0);
        let pruned = prune_redundant(vec![a, b, c]);
        assert_eq!(pruned.len(), 2);
        assert!(pruned.iter().all(|r| r.unique_id != "b"));
    }
}
