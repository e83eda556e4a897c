//! Tessera Storage Layer
//!
//! SQLite-based persistence for profiles, spaces, tabs, bookmarks and
//! pinned tabs. [`SqliteStore`] is the entity store the session layer writes
//! through.

mod database;
mod error;
mod migrations;
mod store;

pub use database::Database;
pub use error::StorageError;
pub use store::SqliteStore;

pub type Result<T> = std::result::Result<T, StorageError>;
