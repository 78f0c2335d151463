use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use vs_core::{AttentionHistory, AttributeSet, LocationRecord, Match, Query, Scene};

use crate::error::{Result, StoreError};
use crate::schema;

/// One row of `vs scenes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneSummary {
    pub name: String,
    pub finst: usize,
    pub stimuli: usize,
    pub attended: usize,
    pub updated_at: String,
}

/// One row of the search log, newest first when listed.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchLogEntry {
    pub query: String,
    pub matcher: String,
    pub stimulus_id: Option<String>,
    pub location: Option<LocationRecord>,
    pub created_at: String,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    // --- Scenes ---

    /// Save a scene under its name, replacing stimuli and history of any
    /// scene already stored with that name. The search log is kept.
    pub fn save_scene(&self, scene: &Scene) -> Result<Uuid> {
        if scene.name.trim().is_empty() {
            return Err(StoreError::InvalidData("scene name is empty".into()));
        }

        let tx = self.conn.unchecked_transaction()?;
        let id = match Self::find_scene_id(&tx, &scene.name)? {
            Some(id) => {
                tx.execute(
                    "UPDATE scenes SET finst = ?1, updated_at = datetime('now') WHERE id = ?2",
                    params![scene.history.capacity() as i64, id.to_string()],
                )?;
                tx.execute("DELETE FROM stimuli WHERE scene_id = ?1", [id.to_string()])?;
                id
            }
            None => {
                let id = Uuid::new_v4();
                tx.execute(
                    "INSERT INTO scenes (id, name, finst) VALUES (?1, ?2, ?3)",
                    params![id.to_string(), scene.name, scene.history.capacity() as i64],
                )?;
                id
            }
        };

        {
            let mut insert = tx.prepare(
                "INSERT INTO stimuli (scene_id, ord, stimulus_id, attributes_json)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (ord, stimulus) in scene.stimuli.iter().enumerate() {
                insert.execute(params![
                    id.to_string(),
                    ord as i64,
                    stimulus.id.as_str(),
                    serde_json::to_string(&stimulus.attributes)?,
                ])?;
            }
        }
        Self::write_history(&tx, &id, &scene.history)?;

        tx.commit()?;
        tracing::info!(scene = %scene.name, stimuli = scene.stimuli.len(), "scene saved");
        Ok(id)
    }

    pub fn load_scene(&self, name: &str) -> Result<Scene> {
        let (id, finst): (String, i64) = self
            .conn
            .query_row(
                "SELECT id, finst FROM scenes WHERE name = ?1",
                [name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("scene '{name}'")))?;

        let finst = usize::try_from(finst)
            .map_err(|_| StoreError::InvalidData(format!("negative finst {finst} for '{name}'")))?;
        let mut scene = Scene::new(name, finst);

        let mut stmt = self.conn.prepare(
            "SELECT stimulus_id, attributes_json FROM stimuli WHERE scene_id = ?1 ORDER BY ord",
        )?;
        let rows: Vec<(String, String)> = stmt
            .query_map([&id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<_, _>>()?;
        for (stimulus_id, json) in rows {
            let attributes: AttributeSet = serde_json::from_str(&json)?;
            scene.stimuli.insert(stimulus_id, attributes);
        }

        let mut stmt = self
            .conn
            .prepare("SELECT attributes_json FROM attended WHERE scene_id = ?1 ORDER BY ord")?;
        let rows: Vec<String> = stmt
            .query_map([&id], |row| row.get(0))?
            .collect::<std::result::Result<_, _>>()?;
        for json in rows {
            scene.history.record(serde_json::from_str(&json)?);
        }

        Ok(scene)
    }

    pub fn list_scenes(&self) -> Result<Vec<SceneSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.name, s.finst, s.updated_at,
                    (SELECT COUNT(*) FROM stimuli WHERE scene_id = s.id),
                    (SELECT COUNT(*) FROM attended WHERE scene_id = s.id)
             FROM scenes s ORDER BY s.name",
        )?;
        let rows: Vec<(String, i64, String, i64, i64)> = stmt
            .query_map([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
            })?
            .collect::<std::result::Result<_, _>>()?;

        Ok(rows
            .into_iter()
            .map(|(name, finst, updated_at, stimuli, attended)| SceneSummary {
                name,
                finst: finst.max(0) as usize,
                stimuli: stimuli as usize,
                attended: attended as usize,
                updated_at,
            })
            .collect())
    }

    /// Replace the stored FINST list of a scene.
    pub fn save_history(&self, name: &str, history: &AttentionHistory) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let id = Self::find_scene_id(&tx, name)?
            .ok_or_else(|| StoreError::NotFound(format!("scene '{name}'")))?;
        Self::write_history(&tx, &id, history)?;
        tx.execute(
            "UPDATE scenes SET updated_at = datetime('now') WHERE id = ?1",
            [id.to_string()],
        )?;
        tx.commit()?;
        Ok(())
    }

    // --- Search log ---

    pub fn record_search(
        &self,
        scene: &str,
        query: &Query,
        matcher: &str,
        found: Option<&Match>,
    ) -> Result<()> {
        let id = Self::find_scene_id(&self.conn, scene)?
            .ok_or_else(|| StoreError::NotFound(format!("scene '{scene}'")))?;
        let location = found.map(|m| serde_json::to_string(&m.location)).transpose()?;
        self.conn.execute(
            "INSERT INTO search_log (scene_id, query, matcher, stimulus_id, location_json)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id.to_string(),
                query.to_string(),
                matcher,
                found.map(|m| m.stimulus_id.to_string()),
                location,
            ],
        )?;
        Ok(())
    }

    pub fn recent_searches(&self, scene: &str, limit: usize) -> Result<Vec<SearchLogEntry>> {
        let id = Self::find_scene_id(&self.conn, scene)?
            .ok_or_else(|| StoreError::NotFound(format!("scene '{scene}'")))?;
        let mut stmt = self.conn.prepare(
            "SELECT query, matcher, stimulus_id, location_json, created_at
             FROM search_log WHERE scene_id = ?1 ORDER BY id DESC LIMIT ?2",
        )?;
        let rows: Vec<(String, String, Option<String>, Option<String>, String)> = stmt
            .query_map(params![id.to_string(), limit as i64], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
            })?
            .collect::<std::result::Result<_, _>>()?;

        rows.into_iter()
            .map(|(query, matcher, stimulus_id, location, created_at)| -> Result<SearchLogEntry> {
                let location = location
                    .map(|json| serde_json::from_str::<LocationRecord>(&json))
                    .transpose()?;
                Ok(SearchLogEntry {
                    query,
                    matcher,
                    stimulus_id,
                    location,
                    created_at,
                })
            })
            .collect()
    }

    // --- Helpers ---

    fn find_scene_id(conn: &Connection, name: &str) -> Result<Option<Uuid>> {
        let id: Option<String> = conn
            .query_row("SELECT id FROM scenes WHERE name = ?1", [name], |row| {
                row.get(0)
            })
            .optional()?;
        id.as_deref().map(parse_uuid).transpose()
    }

    fn write_history(conn: &Connection, id: &Uuid, history: &AttentionHistory) -> Result<()> {
        conn.execute("DELETE FROM attended WHERE scene_id = ?1", [id.to_string()])?;
        let mut insert = conn.prepare(
            "INSERT INTO attended (scene_id, ord, attributes_json) VALUES (?1, ?2, ?3)",
        )?;
        for (ord, attrs) in history.iter().enumerate() {
            insert.execute(params![id.to_string(), ord as i64, serde_json::to_string(attrs)?])?;
        }
        Ok(())
    }
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| StoreError::InvalidData(format!("invalid UUID '{s}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vs_core::{
        ATTENDED, Bindings, ExtraTests, StimulusMatcher, LocationMatcher, Value, import_json,
    };

    const DOC: &str = r#"{
        "name": "letters",
        "finst": 3,
        "stimuli": [
            {"id": "a", "position": [0, 0], "text": "A", "color": "red"},
            {"id": "b", "position": [1, 0], "text": "B", "vis_delay": 50},
            {"id": "c", "position": [2, 0], "text": "C", "size": 2}
        ],
        "attended": ["b", "a"]
    }"#;

    fn scene() -> Scene {
        import_json(DOC, 4).unwrap()
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let store = Store::open_in_memory().unwrap();
        let original = scene();
        store.save_scene(&original).unwrap();

        let loaded = store.load_scene("letters").unwrap();
        assert_eq!(loaded, original);
        let ids: Vec<&str> = loaded.stimuli.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        let attended: Vec<_> = loaded.history.iter().map(|a| a.text.clone()).collect();
        assert_eq!(attended, vec![Some("B".into()), Some("A".into())]);
    }

    #[test]
    fn test_save_overwrites_previous() {
        let store = Store::open_in_memory().unwrap();
        let first_id = store.save_scene(&scene()).unwrap();

        let mut smaller = Scene::new("letters", 2);
        smaller.stimuli.insert("z", AttributeSet::at(5, 5));
        let second_id = store.save_scene(&smaller).unwrap();

        assert_eq!(first_id, second_id);
        let loaded = store.load_scene("letters").unwrap();
        assert_eq!(loaded, smaller);
    }

    #[test]
    fn test_save_rejects_empty_name() {
        let store = Store::open_in_memory().unwrap();
        let err = store.save_scene(&Scene::new("  ", 4)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
    }

    #[test]
    fn test_load_missing_scene() {
        let store = Store::open_in_memory().unwrap();
        let err = store.load_scene("nope").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_list_scenes() {
        let store = Store::open_in_memory().unwrap();
        store.save_scene(&scene()).unwrap();
        store.save_scene(&Scene::new("empty", 4)).unwrap();

        let scenes = store.list_scenes().unwrap();
        assert_eq!(scenes.len(), 2);
        assert_eq!(scenes[0].name, "empty");
        assert_eq!((scenes[0].stimuli, scenes[0].attended), (0, 0));
        assert_eq!(scenes[1].name, "letters");
        assert_eq!(scenes[1].finst, 3);
        assert_eq!((scenes[1].stimuli, scenes[1].attended), (3, 2));
    }

    #[test]
    fn test_save_history() {
        let store = Store::open_in_memory().unwrap();
        let mut scene = scene();
        store.save_scene(&scene).unwrap();

        let c = scene.stimuli.get(&"c".into()).unwrap().clone();
        scene.history.record(c.clone());
        store.save_history("letters", &scene.history).unwrap();

        let loaded = store.load_scene("letters").unwrap();
        assert_eq!(loaded.history.len(), 3);
        assert!(loaded.history.contains(&c));
        assert!(matches!(
            store.save_history("nope", &scene.history),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_search_log_newest_first() {
        let store = Store::open_in_memory().unwrap();
        let scene = scene();
        store.save_scene(&scene).unwrap();

        let unattended = ExtraTests::from([(ATTENDED.to_string(), Value::Bool(false))]);
        let query = Query::new();
        let found = StimulusMatcher
            .find(&query, &Bindings::new(), &unattended, &scene.stimuli, Some(&scene.history))
            .unwrap();
        assert_eq!(found.as_ref().map(|m| m.stimulus_id.as_str()), Some("c"));

        store
            .record_search("letters", &query, "stimulus", found.as_ref())
            .unwrap();
        let missing = Query::new().with("value", "TARGET");
        store.record_search("letters", &missing, "reference", None).unwrap();

        let log = store.recent_searches("letters", 10).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].matcher, "reference");
        assert_eq!(log[0].stimulus_id, None);
        assert!(log[0].location.is_none());
        assert_eq!(log[1].stimulus_id.as_deref(), Some("c"));
        assert_eq!(log[1].location.as_ref().map(|l| l.screen_x), Some(2));

        assert_eq!(store.recent_searches("letters", 1).unwrap().len(), 1);
    }

    #[test]
    fn test_search_log_survives_resave() {
        let store = Store::open_in_memory().unwrap();
        store.save_scene(&scene()).unwrap();
        store
            .record_search("letters", &Query::new(), "stimulus", None)
            .unwrap();
        store.save_scene(&scene()).unwrap();
        assert_eq!(store.recent_searches("letters", 10).unwrap().len(), 1);
    }

    #[test]
    fn test_search_log_reads_back_shadowed_location_fields() {
        let store = Store::open_in_memory().unwrap();
        let doc = r#"{
            "name": "shadow",
            "stimuli": [
                {"id": "s", "position": [3, 4], "screen_x": 9, "isa": "letter", "color": "red"}
            ]
        }"#;
        let scene = import_json(doc, 4).unwrap();
        store.save_scene(&scene).unwrap();

        let found = StimulusMatcher
            .find(&Query::new(), &Bindings::new(), &ExtraTests::new(), &scene.stimuli, None)
            .unwrap();
        store
            .record_search("shadow", &Query::new(), "stimulus", found.as_ref())
            .unwrap();

        let log = store.recent_searches("shadow", 10).unwrap();
        let location = log[0].location.as_ref().unwrap();
        assert_eq!((location.screen_x, location.screen_y), (3, 4));
        assert_eq!(location.kind, "_visuallocation");
        assert_eq!(location.attributes.get("color"), Some(&Value::from("red")));
        assert!(!location.attributes.contains_key("isa"));
    }

    #[test]
    fn test_open_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenes.db");
        {
            let store = Store::open(&path).unwrap();
            store.save_scene(&scene()).unwrap();
        }
        let store = Store::open(&path).unwrap();
        assert_eq!(store.load_scene("letters").unwrap(), scene());
    }
}
