//! Tessera Navigation
//!
//! - Navigation state poller: samples the visible session's back/forward
//!   state and URL on a timer and republishes it when it changes
//! - URL recovery: repairs items whose stored URL is the blank placeholder,
//!   guessing a destination from the title
//!
//! Recovery order:
//!   1. Title matches a keyword → that site
//!   2. Anything else → fallback homepage

mod error;
mod poller;
mod recovery;

pub use error::NavigationError;
pub use poller::{NavigationPoller, NavigationSnapshot, DEFAULT_POLL_INTERVAL};
pub use recovery::{is_generic_title, UrlRecovery, DEFAULT_FALLBACK_HOMEPAGE, GENERIC_TITLES};

pub type Result<T> = std::result::Result<T, NavigationError>;
