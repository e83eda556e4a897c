//! Engine error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Rendering engine unavailable: {0}")]
    Unavailable(String),

    #[error("Engine cannot isolate storage domain {0}")]
    IsolationUnsupported(String),

    #[error("Failed to provision storage domain {identifier}: {reason}")]
    Provisioning { identifier: String, reason: String },

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("No {0} history entry")]
    NoHistory(&'static str),

    #[error("View has been detached")]
    Detached,
}
