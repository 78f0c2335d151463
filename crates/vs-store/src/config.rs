//! `config.toml` in the data directory. Every key is optional.
//!
//! ```toml
//! [vision]
//! finst = 4
//! matcher = "stimulus"
//!
//! [store]
//! log_limit = 20
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use vs_core::VisionConfig;

use crate::error::Result;

pub const CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_LOG_LIMIT: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub vision: VisionConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Rows shown by `vs log`.
    pub log_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            log_limit: DEFAULT_LOG_LIMIT,
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        let config = Self::from_toml(&text)?;
        tracing::info!(path = %path.display(), "config loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vs_core::{DEFAULT_FINST, MatcherKind};

    #[test]
    fn test_empty_config_is_default() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.vision.finst, DEFAULT_FINST);
        assert_eq!(config.vision.matcher, MatcherKind::Stimulus);
        assert_eq!(config.store.log_limit, DEFAULT_LOG_LIMIT);
    }

    #[test]
    fn test_partial_config() {
        let config = Config::from_toml("[vision]\nmatcher = \"reference\"\n").unwrap();
        assert_eq!(config.vision.matcher, MatcherKind::Reference);
        assert_eq!(config.vision.finst, DEFAULT_FINST);
        assert_eq!(config.store.log_limit, DEFAULT_LOG_LIMIT);
    }

    #[test]
    fn test_full_config() {
        let text = "[vision]\nfinst = 0\nmatcher = \"stimulus\"\n\n[store]\nlog_limit = 5\n";
        let config = Config::from_toml(text).unwrap();
        assert_eq!(config.vision.finst, 0);
        assert_eq!(config.store.log_limit, 5);
    }

    #[test]
    fn test_bad_matcher_rejected() {
        let err = Config::from_toml("[vision]\nmatcher = \"fuzzy\"\n").unwrap_err();
        assert!(matches!(err, crate::StoreError::Toml(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[store]\nlog_limit = 3\n").unwrap();
        assert_eq!(Config::load(&path).unwrap().store.log_limit, 3);
    }
}
