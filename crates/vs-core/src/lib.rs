//! Visual-location search engine.
//!
//! Given the stimuli on screen and a perceptual query, find the first
//! stimulus that satisfies the query under the attention (FINST) history,
//! absolute screen-coordinate constraints and structural subsumption of the
//! remaining attributes.
//!
//! Zero I/O. Persistence and the command line live in `vs-store` and
//! `vs-cli`.

pub mod attributes;
pub mod binder;
pub mod compat;
pub mod constants;
pub mod error;
pub mod events;
pub mod history;
pub mod level;
pub mod matcher;
pub mod query;
pub mod registry;
pub mod render;
pub mod scene;
pub mod stimulus;
pub mod value;
pub mod vision;

pub use attributes::{AttributeSet, Position};
pub use binder::{Bindings, Constraint, ResolvedQuery, UnboundPolicy, resolve};
pub use compat::satisfies;
pub use constants::{
    ATTENDED, DEFAULT_FINST, HUMAN_AGENT, LOCATION_FIELDS, RESERVED_ATTRIBUTES, VISUAL_LOCATION,
};
pub use error::{LevelError, MatchError, RegistryError, Result};
pub use events::{SimEvent, key_pressed, production_fired};
pub use history::AttentionHistory;
pub use level::{Grid, MAX_CELLS, build_level};
pub use matcher::{
    AttendedFilter, ExtraTests, LocationMatcher, LocationRecord, Match, ReferenceMatcher,
    StimulusMatcher,
};
pub use query::{Query, Slot};
pub use registry::{AgentAdapter, AgentInstance, AgentRegistry, AgentRunner};
pub use render::{Frame, GridPainter, Labeled, Rgb, Shape};
pub use scene::{CURRENT_VERSION, Scene, WireScene, export_json, import_json};
pub use stimulus::{Stimulus, StimulusId, StimulusStore};
pub use value::Value;
pub use vision::{MatcherKind, VisionConfig, VisionModule};
