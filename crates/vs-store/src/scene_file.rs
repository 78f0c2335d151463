//! Scene documents on disk, `.json` or `.toml`.
//!
//! Both formats share the shape of [`WireScene`]. The TOML form uses an
//! array of tables for stimuli:
//!
//! ```toml
//! name = "demo"
//! attended = ["s1"]
//!
//! [[stimuli]]
//! id = "s1"
//! position = [2, 3]
//! text = "X"
//! color = "red"
//! ```

use std::fs;
use std::path::Path;

use vs_core::{Scene, WireScene};

use crate::error::{Result, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneFormat {
    Json,
    Toml,
}

impl SceneFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(SceneFormat::Json),
            "toml" => Ok(SceneFormat::Toml),
            _ => Err(StoreError::InvalidData(format!(
                "unsupported scene file '{}' (expected .json or .toml)",
                path.display()
            ))),
        }
    }
}

pub fn parse_scene(text: &str, format: SceneFormat, default_finst: usize) -> Result<Scene> {
    let wire: WireScene = match format {
        SceneFormat::Json => serde_json::from_str(text)?,
        SceneFormat::Toml => toml::from_str(text)?,
    };
    Ok(wire.into_scene(default_finst)?)
}

/// Read a scene file; `name` overrides the document's own name.
pub fn read_scene_file(path: &Path, name: Option<&str>, default_finst: usize) -> Result<Scene> {
    let format = SceneFormat::from_path(path)?;
    let text = fs::read_to_string(path)?;
    let mut scene = parse_scene(&text, format, default_finst)?;
    if let Some(name) = name {
        scene.name = name.to_string();
    }
    tracing::info!(
        path = %path.display(),
        scene = %scene.name,
        stimuli = scene.stimuli.len(),
        "scene file read"
    );
    Ok(scene)
}
