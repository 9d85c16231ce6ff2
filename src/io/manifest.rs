use crate::types::{OrbitDirection, PlanError, PlanResult};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs;
use std::path::Path;

/// The three manifest elements the planner depends on. The manifest is a
/// heavily namespaced SAFE document; elements are matched by local name only.
#[derive(Debug, Clone, Default)]
pub struct SceneManifest {
    /// Text of the `gml:coordinates` ground-control polygon
    pub coordinates: Option<String>,
    /// `sliceNumber`; the sentinel value "0" means "not yet assigned"
    pub slice_number: Option<String>,
    /// `pass` flag: ASCENDING or DESCENDING
    pub pass: Option<String>,
}

/// Reads and parses `<scene>/manifest.safe`
pub fn read_scene_manifest(scene: &Path) -> PlanResult<SceneManifest> {
    let manifest = scene.join("manifest.safe");
    let content = fs::read_to_string(&manifest).map_err(|_| PlanError::MetadataMissing {
        scene: scene.display().to_string(),
        element: "manifest.safe".to_string(),
    })?;
    parse_manifest(&content)
}

fn parse_manifest(xml: &str) -> PlanResult<SceneManifest> {
    let mut reader = Reader::from_str(xml);

    #[derive(Clone, Copy)]
    enum Field {
        Coordinates,
        SliceNumber,
        Pass,
    }

    let mut manifest = SceneManifest::default();
    let mut current: Option<Field> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                current = match e.local_name().as_ref() {
                    b"coordinates" => Some(Field::Coordinates),
                    b"sliceNumber" => Some(Field::SliceNumber),
                    b"pass" => Some(Field::Pass),
                    _ => None,
                };
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| PlanError::XmlParsing(format!("{}", e)))?;
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                if let Some(field) = current.take() {
                    // keep the first occurrence of each element
                    let slot = match field {
                        Field::Coordinates => &mut manifest.coordinates,
                        Field::SliceNumber => &mut manifest.slice_number,
                        Field::Pass => &mut manifest.pass,
                    };
                    if slot.is_none() {
                        *slot = Some(text.to_string());
                    }
                }
            }
            Ok(Event::End(_)) => current = None,
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(PlanError::XmlParsing(format!(
                    "failed to parse manifest: {}",
                    e
                )))
            }
            _ => {}
        }
    }

    Ok(manifest)
}

/// Slice number of a scene, or `None` when the manifest or the element is
/// unavailable. Failures degrade to "no slice info" so grouping stays total.
pub fn slice_number(scene: &Path) -> Option<String> {
    match read_scene_manifest(scene) {
        Ok(manifest) => manifest.slice_number,
        Err(e) => {
            log::warn!("no slice number for {}: {}", scene.display(), e);
            None
        }
    }
}

/// Pass direction from a single authoritative manifest read
pub fn orbit_direction(scene: &Path) -> OrbitDirection {
    let pass = match read_scene_manifest(scene) {
        Ok(manifest) => manifest.pass,
        Err(e) => {
            log::warn!("no pass flag for {}: {}", scene.display(), e);
            None
        }
    };
    match pass.as_deref() {
        Some("ASCENDING") => OrbitDirection::Ascending,
        Some("DESCENDING") => OrbitDirection::Descending,
        _ => OrbitDirection::Unknown,
    }
}
