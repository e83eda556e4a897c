//! Item error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ItemError {
    #[error("Invalid session key: {0}")]
    InvalidSessionKey(String),

    #[error("Unknown item kind: {0}")]
    UnknownKind(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ItemError {
    /// Wrap an entity store backend failure
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ItemError::Backend(Box::new(err))
    }
}
