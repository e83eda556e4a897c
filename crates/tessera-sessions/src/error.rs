//! Session error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Engine error: {0}")]
    Engine(#[from] tessera_engine::EngineError),

    #[error("Item error: {0}")]
    Item(#[from] tessera_items::ItemError),
}
