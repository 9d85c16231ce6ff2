use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Sentinel-1 platform identifier (first token of the scene name)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    S1A,
    S1B,
}

impl Platform {
    /// Orbit bias used in the relative-orbit formula
    /// (see https://forum.step.esa.int/t/sentinel-1-relative-orbit-from-filename/7042/18)
    pub fn orbit_bias(&self) -> i64 {
        match self {
            Platform::S1A => 73,
            Platform::S1B => 27,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::S1A => write!(f, "S1A"),
            Platform::S1B => write!(f, "S1B"),
        }
    }
}

/// Dual-polarization acquisition mode, derived from the product-class token
/// (`1SDV` or `1SDH`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolarizationMode {
    DualVV,
    DualHH,
}

impl PolarizationMode {
    /// Cross-polarization acquisitions are excluded from coherence pairing
    pub fn is_cross_pol(&self) -> bool {
        matches!(self, PolarizationMode::DualHH)
    }
}

impl std::fmt::Display for PolarizationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolarizationMode::DualVV => write!(f, "VVVH"),
            PolarizationMode::DualHH => write!(f, "HHHV"),
        }
    }
}

/// Pass direction as reported by the manifest `pass` element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrbitDirection {
    Ascending,
    Descending,
    Unknown,
}

impl OrbitDirection {
    /// Short token used in output names; empty when the direction is unknown
    pub fn name_token(&self) -> &'static str {
        match self {
            OrbitDirection::Ascending => "asc",
            OrbitDirection::Descending => "desc",
            OrbitDirection::Unknown => "",
        }
    }
}

/// Product type of the input scenes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductType {
    Grd,
    Slc,
}

impl ProductType {
    pub fn label(&self) -> &'static str {
        match self {
            ProductType::Grd => "GRD",
            ProductType::Slc => "SLC",
        }
    }

    /// Tag appended to primary output names (backscatter / polarimetric
    /// vegetation index)
    pub fn output_product(&self) -> &'static str {
        match self {
            ProductType::Grd => "BS",
            ProductType::Slc => "polVI",
        }
    }
}

/// One satellite acquisition, normalized from its catalog identifier.
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneRecord {
    /// Scene location (a `.SAFE` directory containing `manifest.safe`)
    pub path: String,
    pub platform: Platform,
    pub polarization: PolarizationMode,
    pub start_time: NaiveDateTime,
    pub stop_time: NaiveDateTime,
    pub absolute_orbit: u32,
    pub relative_orbit: u32,
    pub orbit_direction: OrbitDirection,
    /// Trailing identifier token, used to disambiguate output names
    pub unique_id: String,
}

impl SceneRecord {
    pub fn scene_dir(&self) -> &Path {
        Path::new(&self.path)
    }

    pub fn manifest_path(&self) -> PathBuf {
        Path::new(&self.path).join("manifest.safe")
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_time.date()
    }

    /// Acquisition date rendered as in the catalog name (`%Y%m%d`)
    pub fn date_token(&self) -> String {
        self.start_time.format("%Y%m%d").to_string()
    }

    /// Two-digit hour of day, used to reject same-date acquisitions from a
    /// different pass when pairing for coherence
    pub fn hour_token(&self) -> String {
        self.start_time.format("%H").to_string()
    }
}

/// One emitted unit of work for the primary product.
///
/// Members are 1 or 2 scenes; consecutive members satisfy the slice-assembly
/// pair-validity predicate. A job is never split by the coherence matcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingJob {
    pub members: Vec<SceneRecord>,
    pub output_name: String,
}

impl ProcessingJob {
    /// Member paths joined by `", "`, the field form used in list files
    pub fn member_paths(&self) -> String {
        join_paths(&self.members)
    }
}

/// One emitted unit of work for interferometric coherence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoherenceJob {
    pub base_members: Vec<SceneRecord>,
    pub partner_members: Vec<SceneRecord>,
    pub day_offset: u32,
    pub output_name: String,
}

impl CoherenceJob {
    pub fn base_paths(&self) -> String {
        join_paths(&self.base_members)
    }

    pub fn partner_paths(&self) -> String {
        join_paths(&self.partner_members)
    }
}

pub(crate) fn join_paths(members: &[SceneRecord]) -> String {
    members
        .iter()
        .map(|m| m.path.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// One side of a coherence pairing: a single scene or an assembled pair
#[derive(Debug, Clone)]
pub enum SlicePairing {
    Single(SceneRecord),
    Assembled(SceneRecord, SceneRecord),
}

impl SlicePairing {
    /// Builds a pairing from 1 or 2 scenes. Extra scenes are dropped: the
    /// reduction thresholds are defined for areas of interest overlapping at
    /// most two footprints.
    pub fn from_members(members: &[SceneRecord]) -> Option<SlicePairing> {
        match members {
            [] => None,
            [a] => Some(SlicePairing::Single(a.clone())),
            [a, b] => Some(SlicePairing::Assembled(a.clone(), b.clone())),
            [a, b, rest @ ..] => {
                log::warn!(
                    "pairing limited to two scenes, dropping {} extra candidate(s)",
                    rest.len()
                );
                Some(SlicePairing::Assembled(a.clone(), b.clone()))
            }
        }
    }

    pub fn members(&self) -> Vec<SceneRecord> {
        match self {
            SlicePairing::Single(a) => vec![a.clone()],
            SlicePairing::Assembled(a, b) => vec![a.clone(), b.clone()],
        }
    }
}

/// Explicit run parameters for naming and output placement.
///
/// The generation timestamp is part of the context rather than read from the
/// clock at call time, so reruns can reproduce file names exactly.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub product_type: ProductType,
    pub area_name: String,
    pub start_date: String,
    pub end_date: String,
    pub result_path: PathBuf,
    pub generated_at: NaiveDateTime,
    /// When false (GRD only), redundant-scene pruning replaces slice assembly
    pub slice_mode: bool,
    /// Attach unique scene id suffixes to output names
    pub with_scene_id: bool,
}

impl RunContext {
    pub fn new(
        product_type: ProductType,
        area_name: &str,
        start_date: &str,
        end_date: &str,
        result_path: &Path,
        generated_at: NaiveDateTime,
    ) -> Self {
        Self {
            product_type,
            area_name: area_name.to_string(),
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
            result_path: result_path.to_path_buf(),
            generated_at,
            slice_mode: true,
            with_scene_id: true,
        }
    }
}

/// Error types for work-order planning
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed scene identifier: {0}")]
    MalformedIdentifier(String),

    #[error("metadata missing for {scene}: {element}")]
    MetadataMissing { scene: String, element: String },

    #[error("XML parsing error: {0}")]
    XmlParsing(String),

    #[error("invalid footprint geometry: {0}")]
    Geometry(String),
}

/// Result type for planning operations
pub type PlanResult<T> = Result<T, PlanError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(path: &str) -> SceneRecord {
        let start = NaiveDate::from_ymd_opt(2020, 1, 3)
            .unwrap()
            .and_hms_opt(17, 8, 15)
            .unwrap();
        SceneRecord {
            path: path.to_string(),
            platform: Platform::S1A,
            polarization: PolarizationMode::DualVV,
            start_time: start,
            stop_time: start,
            absolute_orbit: 30639,
            relative_orbit: 117,
            orbit_direction: OrbitDirection::Ascending,
            unique_id: "DADE".to_string(),
        }
    }

    #[test]
    fn test_date_and_hour_tokens() {
        let rec = record("/data/scene.SAFE");
        assert_eq!(rec.date_token(), "20200103");
        assert_eq!(rec.hour_token(), "17");
    }

    #[test]
    fn test_join_paths() {
        let members = vec![record("/a.SAFE"), record("/b.SAFE")];
        assert_eq!(join_paths(&members), "/a.SAFE, /b.SAFE");
        assert_eq!(join_paths(&members[..1]), "/a.SAFE");
    }

    #[test]
    fn test_pairing_from_members() {
        assert!(SlicePairing::from_members(&[]).is_none());
        let single = SlicePairing::from_members(&[record("/a")]).unwrap();
        assert_eq!(single.members().len(), 1);
        let pair = SlicePairing::from_members(&[record("/a"), record("/b"), record("/c")]).unwrap();
        assert_eq!(pair.members().len(), 2);
    }

    #[test]
    fn test_cross_pol_flag() {
        assert!(PolarizationMode::DualHH.is_cross_pol());
        assert!(!PolarizationMode::DualVV.is_cross_pol());
    }
}
