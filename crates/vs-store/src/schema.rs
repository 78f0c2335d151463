use rusqlite::{Connection, OptionalExtension};

use crate::error::{Result, StoreError};

pub const SCHEMA_VERSION: i64 = 1;

pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS scenes (
            id         TEXT PRIMARY KEY,
            name       TEXT NOT NULL UNIQUE,
            finst      INTEGER NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS stimuli (
            scene_id        TEXT NOT NULL REFERENCES scenes(id) ON DELETE CASCADE,
            ord             INTEGER NOT NULL,
            stimulus_id     TEXT NOT NULL,
            attributes_json TEXT NOT NULL,
            PRIMARY KEY (scene_id, ord)
        );

        CREATE TABLE IF NOT EXISTS attended (
            scene_id        TEXT NOT NULL REFERENCES scenes(id) ON DELETE CASCADE,
            ord             INTEGER NOT NULL,
            attributes_json TEXT NOT NULL,
            PRIMARY KEY (scene_id, ord)
        );

        CREATE TABLE IF NOT EXISTS search_log (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            scene_id      TEXT NOT NULL REFERENCES scenes(id) ON DELETE CASCADE,
            query         TEXT NOT NULL,
            matcher       TEXT NOT NULL,
            stimulus_id   TEXT,
            location_json TEXT,
            created_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_log_scene ON search_log(scene_id);
        ",
    )?;

    if let Some(found) = get_schema_version(conn)?.filter(|v| *v > SCHEMA_VERSION) {
        return Err(StoreError::InvalidData(format!(
            "database schema version {found} is newer than supported version {SCHEMA_VERSION}"
        )));
    }

    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    tracing::info!(version = SCHEMA_VERSION, "scene store initialized");
    Ok(())
}

pub fn get_schema_version(conn: &Connection) -> Result<Option<i64>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    raw.map(|v| {
        v.parse::<i64>()
            .map_err(|_| StoreError::InvalidData(format!("bad schema version '{v}'")))
    })
    .transpose()
}
