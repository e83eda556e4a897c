//! Navigation error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NavigationError {
    #[error("Invalid fallback homepage: {0}")]
    InvalidHomepage(String),

    #[error("Poll interval must be positive")]
    ZeroInterval,
}
