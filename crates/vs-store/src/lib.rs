pub mod config;
pub mod error;
pub mod library;
pub mod scene_file;
pub mod schema;
pub mod store;

pub use config::{Config, StoreConfig};
pub use error::{Result, StoreError};
pub use library::{DATA_DIR_ENV, SceneLibrary, default_base_dir, resolve_base_dir};
pub use scene_file::{SceneFormat, parse_scene, read_scene_file};
pub use store::{SceneSummary, SearchLogEntry, Store};
