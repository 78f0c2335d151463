//! JSON scene documents.
//!
//! A scene is a snapshot of the screen: stimuli in scan order plus the ids
//! currently held in the FINST list.
//!
//! ```json
//! { "name": "demo", "finst": 4,
//!   "stimuli": [{ "id": "s1", "position": [2, 3], "text": "X", "color": "red" }],
//!   "attended": ["s1"] }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{LevelError, MatchError, Result};
use crate::history::AttentionHistory;
use crate::level::Grid;
use crate::stimulus::{Stimulus, StimulusId, StimulusStore};

pub const CURRENT_VERSION: &str = "1";

#[derive(Serialize, Deserialize, Debug)]
pub struct WireScene {
    #[serde(default = "current_version")]
    pub version: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finst: Option<usize>,
    #[serde(default)]
    pub stimuli: Vec<Stimulus>,
    #[serde(default)]
    pub attended: Vec<StimulusId>,
}

fn current_version() -> String {
    CURRENT_VERSION.to_string()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scene {
    pub name: String,
    pub stimuli: StimulusStore,
    pub history: AttentionHistory,
}

impl Scene {
    pub fn new(name: &str, finst: usize) -> Self {
        Self {
            name: name.to_string(),
            stimuli: StimulusStore::new(),
            history: AttentionHistory::new(finst),
        }
    }

    /// Lay stimuli out on a grid sized to the largest coordinates, labelled
    /// by their text or, failing that, their id. Stimuli at negative
    /// coordinates are left off.
    pub fn to_grid(&self) -> std::result::Result<Grid<String>, LevelError> {
        let on_grid = || {
            self.stimuli
                .iter()
                .filter(|s| s.attributes.position.x >= 0 && s.attributes.position.y >= 0)
        };
        let width = on_grid().map(|s| extent(s.attributes.position.x)).max().unwrap_or(0);
        let height = on_grid().map(|s| extent(s.attributes.position.y)).max().unwrap_or(0);
        let mut grid = Grid::new(height, width)?;

        for s in on_grid() {
            let label = s
                .attributes
                .text
                .clone()
                .unwrap_or_else(|| s.id.to_string());
            let pos = s.attributes.position;
            let row = usize::try_from(pos.y).unwrap_or(usize::MAX);
            let col = usize::try_from(pos.x).unwrap_or(usize::MAX);
            grid.place(row, col, label)
                .map_err(|_| LevelError::OutOfBounds {
                    row,
                    col,
                    height,
                    width,
                })?;
        }
        Ok(grid)
    }
}

/// Cells needed to reach `coord`; saturates so oversized scenes fail the
/// grid size check.
fn extent(coord: i64) -> usize {
    usize::try_from(coord)
        .ok()
        .and_then(|c| c.checked_add(1))
        .unwrap_or(usize::MAX)
}

impl WireScene {
    /// Build a scene; `default_finst` applies when the document has none.
    pub fn into_scene(self, default_finst: usize) -> Result<Scene> {
        let stimuli: StimulusStore = self.stimuli.into_iter().collect();
        let mut history = AttentionHistory::new(self.finst.unwrap_or(default_finst));
        for id in &self.attended {
            let attrs = stimuli.get(id).ok_or_else(|| MatchError::UnknownStimulus {
                id: id.to_string(),
            })?;
            history.record(attrs.clone());
        }
        Ok(Scene {
            name: self.name,
            stimuli,
            history,
        })
    }

    /// History entries whose stimulus is no longer on screen are dropped.
    pub fn from_scene(scene: &Scene) -> Self {
        let attended = scene
            .history
            .iter()
            .filter_map(|attrs| {
                let found = scene
                    .stimuli
                    .iter()
                    .find(|s| &s.attributes == attrs)
                    .map(|s| s.id.clone());
                if found.is_none() {
                    tracing::debug!("dropping attended entry with no stimulus on screen");
                }
                found
            })
            .collect();

        WireScene {
            version: current_version(),
            name: scene.name.clone(),
            finst: Some(scene.history.capacity()),
            stimuli: scene.stimuli.iter().cloned().collect(),
            attended,
        }
    }
}

pub fn import_json(json: &str, default_finst: usize) -> Result<Scene> {
    let wire: WireScene = serde_json::from_str(json)?;
    wire.into_scene(default_finst)
}

pub fn export_json(scene: &Scene) -> Result<String> {
    Ok(serde_json::to_string_pretty(&WireScene::from_scene(scene))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeSet;

    const DOC: &str = r#"{
        "name": "demo",
        "stimuli": [
            {"id": "s1", "position": [2, 1], "text": "X", "color": "red"},
            {"id": "s2", "position": [0, 0], "vis_delay": 20}
        ],
        "attended": ["s2"]
    }"#;

    #[test]
    fn test_import() {
        let scene = import_json(DOC, 3).unwrap();
        assert_eq!(scene.name, "demo");
        assert_eq!(scene.stimuli.len(), 2);
        assert_eq!(scene.history.capacity(), 3);
        let s2 = scene.stimuli.get(&"s2".into()).unwrap();
        assert!(scene.history.contains(s2));
        let ids: Vec<&str> = scene.stimuli.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2"]);
    }

    #[test]
    fn test_unknown_attended_id() {
        let doc = r#"{"name": "x", "stimuli": [], "attended": ["ghost"]}"#;
        let err = import_json(doc, 4).unwrap_err();
        assert!(matches!(err, MatchError::UnknownStimulus { ref id } if id == "ghost"));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(import_json("{", 4), Err(MatchError::Json(_))));
    }

    #[test]
    fn test_export_keeps_order_and_attention() {
        let scene = import_json(DOC, 3).unwrap();
        let json = export_json(&scene).unwrap();
        let again = import_json(&json, 9).unwrap();
        assert_eq!(again, scene);
    }

    #[test]
    fn test_export_drops_offscreen_history() {
        let mut scene = Scene::new("s", 2);
        scene.stimuli.insert("a", AttributeSet::at(0, 0));
        scene.history.record(AttributeSet::at(9, 9));
        let wire = WireScene::from_scene(&scene);
        assert!(wire.attended.is_empty());
    }

    #[test]
    fn test_to_grid() {
        let scene = import_json(DOC, 3).unwrap();
        let grid = scene.to_grid().unwrap();
        assert_eq!((grid.height(), grid.width()), (2, 3));
        assert_eq!(grid.get(1, 2).map(String::as_str), Some("X"));
        assert_eq!(grid.get(0, 0).map(String::as_str), Some("s2"));
    }

    #[test]
    fn test_far_coordinates_are_too_large() {
        for position in [(i64::MAX, 0), (0, i64::MAX), (5_000, 5_000)] {
            let mut scene = Scene::new("far", 4);
            scene.stimuli.insert("a", AttributeSet::at(0, 0));
            scene
                .stimuli
                .insert("b", AttributeSet::at(position.0, position.1));
            assert!(
                matches!(scene.to_grid(), Err(LevelError::TooLarge { .. })),
                "position {position:?}"
            );
        }
    }

    #[test]
    fn test_empty_scene_has_no_grid() {
        assert!(Scene::new("empty", 4).to_grid().is_err());
    }
}
