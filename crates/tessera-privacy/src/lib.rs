//! Tessera Privacy
//!
//! Storage isolation:
//! - Sessions without a profile share one default storage domain
//! - Each profile gets its own domain, provisioned on first use
//! - If the engine cannot isolate, profiles fall back to the shared domain
//!   and a degraded-isolation notice is raised
//!
//! Media permissions:
//! - Camera / Microphone: undetermined until the platform answers
//! - Undetermined requests are denied unless the platform grants them

mod error;
mod isolation;
mod permissions;

pub use error::PrivacyError;
pub use isolation::{IsolationNotice, StorageResolver, PARTITION_AREAS};
pub use permissions::{
    MediaAuthorizer, MediaPermissionBroker, PermissionManager, PermissionState,
    StaticAuthorizer,
};

pub type Result<T> = std::result::Result<T, PrivacyError>;
