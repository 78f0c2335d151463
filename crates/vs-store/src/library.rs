use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::config::{CONFIG_FILE, Config};
use crate::error::{Result, StoreError};
use crate::store::Store;

pub const DATA_DIR_ENV: &str = "VS_DATA_DIR";
const DB_FILE: &str = "scenes.db";

/// Default base directory for all visual-search storage.
pub fn default_base_dir() -> PathBuf {
    dirs_home().join(".visual-search")
}

fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// `VS_DATA_DIR` when set, otherwise [`default_base_dir`].
pub fn resolve_base_dir() -> PathBuf {
    env::var(DATA_DIR_ENV)
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(default_base_dir)
}

/// The data directory: configuration plus the scene database.
///
/// Layout:
/// ```text
/// ~/.visual-search/
/// ├── config.toml
/// └── scenes.db
/// ```
pub struct SceneLibrary {
    base: PathBuf,
    config: Config,
    store: Store,
}

impl SceneLibrary {
    /// Open the library, creating the directory as needed.
    /// `base_dir`: override the base directory (for testing).
    pub fn open(base_dir: Option<&Path>) -> Result<Self> {
        let base = base_dir.map(PathBuf::from).unwrap_or_else(resolve_base_dir);
        fs::create_dir_all(&base).map_err(|e| {
            StoreError::InvalidData(format!("failed to create {}: {e}", base.display()))
        })?;

        let config = Config::load(&base.join(CONFIG_FILE))?;
        let store = Store::open(&base.join(DB_FILE))?;
        Ok(Self {
            base,
            config,
            store,
        })
    }

    /// Open with an in-memory store and default configuration (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            base: PathBuf::new(),
            config: Config::default(),
            store: Store::open_in_memory()?,
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }
}
