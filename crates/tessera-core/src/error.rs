//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] tessera_storage::StorageError),

    #[error("Item error: {0}")]
    Item(#[from] tessera_items::ItemError),

    #[error("Session error: {0}")]
    Session(#[from] tessera_sessions::SessionError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] tessera_navigation::NavigationError),

    #[error("Privacy error: {0}")]
    Privacy(#[from] tessera_privacy::PrivacyError),

    #[error("Engine error: {0}")]
    Engine(#[from] tessera_engine::EngineError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Only tabs can be converted, got {0}")]
    NotATab(String),
}
