//! I/O modules for reading scene manifests and writing job lists

pub mod manifest;
pub mod list_file;

pub use manifest::{read_scene_manifest, SceneManifest};
