//! Error types for the pacer_core library.

use crate::types::PhaseKind;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for pacer_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The plan produced zero exercises after block assembly
    #[error("This workout plan contains no exercises and cannot be started")]
    EmptyPlan,

    /// A generated plan failed validation before block assembly
    #[error("Generated plan rejected: {0}")]
    InvalidGeneratedPlan(String),

    /// The data service failed to save a session
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A user action is not valid in the current phase
    #[error("Cannot {action} while {phase:?}")]
    InvalidAction {
        action: &'static str,
        phase: PhaseKind,
    },

    /// Requested set is outside `1..=sets_total`
    #[error("Set {requested} is out of range (1..={sets_total})")]
    SetOutOfRange { requested: u32, sets_total: u32 },

    /// The session already reached its terminal phase
    #[error("Session already finished")]
    SessionFinished,

    /// The session task is gone (torn down or aborted)
    #[error("Session is no longer running")]
    SessionClosed,

    /// No plan with the given id
    #[error("Plan not found: {0}")]
    PlanNotFound(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
