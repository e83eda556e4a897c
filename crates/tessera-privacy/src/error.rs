//! Privacy error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrivacyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Engine error: {0}")]
    Engine(#[from] tessera_engine::EngineError),
}
