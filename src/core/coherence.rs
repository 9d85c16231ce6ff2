use crate::core::assembly::AssembledGroup;
use crate::core::footprint;
use crate::types::{CoherenceJob, SceneRecord, SlicePairing};
use chrono::Duration;

/// Overlap threshold for duplicating one side of an asymmetric 1-vs-2 pairing
const DUPLICATE_THRESHOLD: f64 = 1.0;
/// Thresholds for the four pairwise overlaps of a 2-vs-2 pairing. The last
/// one is lower by design: the tie-break favors the first slot.
const PAIR_THRESHOLDS: [f64; 4] = [1.5, 1.5, 1.5, 1.2];

/// Finds 6/12-day interferometric partners for the emitted jobs
pub struct CoherenceMatcher<'a> {
    records: &'a [SceneRecord],
    with_scene_id: bool,
}

impl<'a> CoherenceMatcher<'a> {
    pub fn new(records: &'a [SceneRecord], with_scene_id: bool) -> Self {
        Self {
            records,
            with_scene_id,
        }
    }

    /// Partner candidates: same ground date at `base + day_offset` and the
    /// same two-digit hour of day. Two passes on one calendar date at
    /// different times of day are not valid interferometric pairs.
    fn candidates(&self, base: &SceneRecord, day_offset: u32) -> Vec<SceneRecord> {
        let target = base.start_date() + Duration::days(day_offset as i64);
        let hour = base.hour_token();
        self.records
            .iter()
            .filter(|r| r.start_date() == target && r.hour_token() == hour)
            .cloned()
            .collect()
    }

    /// One-to-many fan-out for single-scene jobs: every candidate whose
    /// footprint overlaps the base yields its own coherence job
    pub fn match_single(&self, base: &SceneRecord, day_offset: u32) -> Vec<CoherenceJob> {
        let candidates = self.candidates(base, day_offset);
        if candidates.is_empty() {
            return Vec::new();
        }
        if has_cross_pol(base, &candidates) {
            log::debug!(
                "cross-pol in {}d pairing for {}, discarding",
                day_offset,
                base.path
            );
            return Vec::new();
        }

        candidates
            .into_iter()
            .filter(|candidate| {
                footprint::overlap_area(base.scene_dir(), candidate.scene_dir()) > 0.0
            })
            .map(|candidate| {
                let uid = if self.with_scene_id {
                    format!("_{}_{}", base.unique_id, candidate.unique_id)
                } else {
                    String::new()
                };
                CoherenceJob {
                    base_members: vec![base.clone()],
                    partner_members: vec![candidate],
                    day_offset,
                    output_name: output_name(base, day_offset, &uid),
                }
            })
            .collect()
    }

    /// Exactly one coherence job per (job, offset) for assembled groups,
    /// reducing both sides to the spatially relevant slices
    pub fn match_assembled(
        &self,
        group: &AssembledGroup,
        day_offset: u32,
    ) -> Option<CoherenceJob> {
        let candidates = self.candidates(&group.anchor, day_offset);
        if candidates.is_empty() {
            return None;
        }
        if group.has_cross_pol || has_cross_pol(&group.anchor, &candidates) {
            log::debug!(
                "cross-pol in {}d pairing for {}, discarding",
                day_offset,
                group.anchor.path
            );
            return None;
        }

        let base = SlicePairing::from_members(&group.job_members())?;
        let partner = SlicePairing::from_members(&candidates)?;
        let (base_members, partner_members) = reduce_pairing(base, partner);

        let uid = if self.with_scene_id {
            base_members
                .iter()
                .chain(partner_members.iter())
                .map(|m| format!("_{}", m.unique_id))
                .collect()
        } else {
            String::new()
        };

        Some(CoherenceJob {
            base_members,
            partner_members,
            day_offset,
            output_name: output_name(&group.anchor, day_offset, &uid),
        })
    }
}

fn has_cross_pol(base: &SceneRecord, candidates: &[SceneRecord]) -> bool {
    base.polarization.is_cross_pol() || candidates.iter().any(|c| c.polarization.is_cross_pol())
}

fn output_name(anchor: &SceneRecord, day_offset: u32, uid: &str) -> String {
    let partner_date = (anchor.start_date() + Duration::days(day_offset as i64))
        .format("%Y%m%d")
        .to_string();
    format!(
        "{}_{}_{}_{}_{}_{}{}_coh{}d",
        anchor.date_token(),
        partner_date,
        anchor.platform,
        anchor.polarization,
        anchor.relative_orbit,
        anchor.orbit_direction.name_token(),
        uid,
        day_offset
    )
}

/// Reduces a (base, partner) pairing to matching element counts using
/// overlap-area thresholds.
///
/// A single scene that covers both scenes on the other side is duplicated
/// into both slots; in the 2-vs-2 case whichever scene covers both opposite
/// scenes collapses its counterpart, with a pairwise fallback when no
/// collapse condition fires. Defined for areas of interest overlapping at
/// most two footprints per side.
pub fn reduce_pairing(
    base: SlicePairing,
    partner: SlicePairing,
) -> (Vec<SceneRecord>, Vec<SceneRecord>) {
    use SlicePairing::{Assembled, Single};

    let overlap = |a: &SceneRecord, b: &SceneRecord| {
        footprint::overlap_area(a.scene_dir(), b.scene_dir())
    };

    match (base, partner) {
        (Single(b), Assembled(c1, c2)) => {
            let covers_both = overlap(&b, &c1) > DUPLICATE_THRESHOLD
                && overlap(&b, &c2) > DUPLICATE_THRESHOLD;
            let base_members = if covers_both {
                vec![b.clone(), b]
            } else {
                vec![b]
            };
            (base_members, vec![c1, c2])
        }
        (Assembled(b1, b2), Single(c)) => {
            let covered_by_both = overlap(&b1, &c) > DUPLICATE_THRESHOLD
                && overlap(&b2, &c) > DUPLICATE_THRESHOLD;
            let partner_members = if covered_by_both {
                vec![c.clone(), c]
            } else {
                vec![c]
            };
            (vec![b1, b2], partner_members)
        }
        (Assembled(b1, b2), Assembled(c1, c2)) => {
            let o11 = overlap(&b1, &c1) > PAIR_THRESHOLDS[0];
            let o12 = overlap(&b1, &c2) > PAIR_THRESHOLDS[1];
            let o21 = overlap(&b2, &c1) > PAIR_THRESHOLDS[2];
            let o22 = overlap(&b2, &c2) > PAIR_THRESHOLDS[3];

            if !o11 && !o12 && o21 && o22 {
                (vec![b2.clone(), b2], vec![c1, c2])
            } else if !o21 && !o22 && o11 && o12 {
                (vec![b1.clone(), b1], vec![c1, c2])
            } else if !o11 && !o21 && o12 && o22 {
                (vec![b1, b2], vec![c2.clone(), c2])
            } else if !o12 && !o22 && o11 && o21 {
                (vec![b1, b2], vec![c1.clone(), c1])
            } else if o12 {
                (vec![b1], vec![c2])
            } else if o21 {
                (vec![b2], vec![c1])
            } else {
                (vec![b1, b2], vec![c1, c2])
            }
        }
        (b, c) => (b.members(), c.members()),
    }
}
