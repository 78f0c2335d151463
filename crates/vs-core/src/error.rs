use thiserror::Error;

use crate::constants::HUMAN_AGENT;

/// Errors surfaced by query construction, resolution and scene decoding.
///
/// Per-candidate filter mismatches are never errors; a search that finds
/// nothing returns `Ok(None)`.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("malformed query: {reason}")]
    MalformedQuery { reason: String },
    #[error("variable '{name}' is not bound")]
    UnboundVariable { name: String },
    #[error("unknown stimulus '{id}'")]
    UnknownStimulus { id: String },
    #[error("invalid scene document: {0}")]
    Json(#[from] serde_json::Error),
}

impl MatchError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        MatchError::MalformedQuery {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error(
        "agent type '{name}' is not registered; expected a '{name}' runner and a '{name}Adapter' adapter"
    )]
    NotRegistered { name: String },
    #[error("agent type '{name}' is already registered")]
    AlreadyRegistered { name: String },
    #[error("agent type '{name}' is reserved for externally controlled participants")]
    ReservedName { name: String },
}

impl RegistryError {
    pub(crate) fn reserved() -> Self {
        RegistryError::ReservedName {
            name: HUMAN_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("height and width must be positive (got {height}x{width})")]
    InvalidDimensions { height: usize, width: usize },
    #[error("not enough space: {agents} agents for {cells} cells ({height}x{width})")]
    PlacementCapacity {
        agents: usize,
        cells: usize,
        height: usize,
        width: usize,
    },
    #[error("grid {height}x{width} is too large (at most {max} cells)")]
    TooLarge {
        height: usize,
        width: usize,
        max: usize,
    },
    #[error("cell ({row}, {col}) is outside the {height}x{width} grid")]
    OutOfBounds {
        row: usize,
        col: usize,
        height: usize,
        width: usize,
    },
}

pub type Result<T> = std::result::Result<T, MatchError>;
