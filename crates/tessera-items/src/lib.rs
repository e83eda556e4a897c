//! Tessera Items
//!
//! The persisted, user-visible browsing entries: bookmarks, tabs and pinned
//! tabs, grouped into spaces and scoped to profiles.
//!
//! Every item is addressable by a [`SessionKey`] of the form
//! `"{kind}-{uuid}"`. The session layer, the persistence bridge and URL
//! recovery all parse this encoding to find the backing entity.

mod error;
mod item;
mod key;
mod profile;
mod sentinel;
mod store;

pub use error::ItemError;
pub use item::{Bookmark, Item, ItemOwner, PinnedTab, Tab};
pub use key::{ItemKind, SessionKey};
pub use profile::{Profile, Space};
pub use sentinel::{is_sentinel_url, origin_of, SENTINEL_URL};
pub use store::{EntityStore, ItemScope};

pub type Result<T> = std::result::Result<T, ItemError>;
