//! Tessera Core
//!
//! The shell owns every long-lived piece of the session layer and is built
//! explicitly at startup: entity store, storage resolver, session registry,
//! navigation poller, persistence bridge and media permission broker.
//! The presentation layer talks only to [`Shell`].

mod config;
mod error;
mod shell;

pub use config::Config;
pub use error::CoreError;
pub use shell::Shell;

// Re-export core components
pub use tessera_engine::{
    memory::MemoryEngine, Engine, EngineError, EngineEvent, EngineView, MediaKind,
    PermissionDecision, StorageDomain,
};
pub use tessera_items::{
    Bookmark, EntityStore, Item, ItemError, ItemKind, ItemScope, PinnedTab, Profile, SessionKey,
    Space, Tab,
};
pub use tessera_navigation::{NavigationError, NavigationSnapshot, UrlRecovery};
pub use tessera_privacy::{
    IsolationNotice, MediaAuthorizer, MediaPermissionBroker, PermissionState, PrivacyError,
    StaticAuthorizer, StorageResolver,
};
pub use tessera_sessions::{
    NavigationFailure, PersistenceBridge, Session, SessionError, SessionEvent, SessionHandle,
    SessionObserver, SessionRegistry, Visibility,
};
pub use tessera_storage::{Database, SqliteStore, StorageError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging. `RUST_LOG` overrides the default `info` filter.
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // A subscriber may already be installed (tests, embedders)
    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}
