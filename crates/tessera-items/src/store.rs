//! Entity store interface
//!
//! The session layer reads and writes items only through this trait. The
//! SQLite implementation lives in `tessera-storage`.

use uuid::Uuid;

use crate::item::{Item, ItemOwner};
use crate::key::{ItemKind, SessionKey};
use crate::profile::{Profile, Space};
use crate::Result;

/// Which items a [`EntityStore::load_items`] call returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemScope {
    All,
    /// Tabs and bookmarks of one space
    Space(Uuid),
    /// Pinned tabs of one profile, `None` for the unscoped pins
    Profile(Option<Uuid>),
}

pub trait EntityStore: Send + Sync {
    /// Items of one kind, ordered by position
    fn load_items(&self, kind: ItemKind, scope: ItemScope) -> Result<Vec<Item>>;

    fn load_item(&self, key: &SessionKey) -> Result<Option<Item>>;

    /// Insert or replace
    fn save(&self, item: &Item) -> Result<()>;

    /// Field updates touch an existing row only. They return whether
    /// anything was written: an absent item, or one already holding the
    /// value, is left alone.
    fn update_title(&self, key: &SessionKey, title: &str) -> Result<bool>;

    fn update_url(&self, key: &SessionKey, url: &str) -> Result<bool>;

    fn update_favicon(&self, key: &SessionKey, bytes: &[u8]) -> Result<bool>;

    /// Deleting an absent item is not an error.
    fn delete_item(&self, key: &SessionKey) -> Result<()>;

    /// Swap one item for another, e.g. a tab converted into a bookmark.
    /// Stores that can should do this atomically.
    fn replace_item(&self, old: &SessionKey, new: &Item) -> Result<()> {
        self.save(new)?;
        self.delete_item(old)
    }

    fn list_profiles(&self) -> Result<Vec<Profile>>;

    fn list_spaces(&self) -> Result<Vec<Space>>;

    fn save_profile(&self, profile: &Profile) -> Result<()>;

    fn save_space(&self, space: &Space) -> Result<()>;

    /// Remove a profile. Spaces bound to it fall back to no profile.
    fn delete_profile(&self, id: Uuid) -> Result<()>;

    /// Profile an item's session should be isolated under
    fn profile_for(&self, item: &Item) -> Result<Option<Profile>> {
        let profile_id = match item.owner() {
            ItemOwner::Profile(id) => id,
            ItemOwner::Space(space_id) => self
                .list_spaces()?
                .into_iter()
                .find(|space| space.id == space_id)
                .and_then(|space| space.profile_id),
        };

        let Some(profile_id) = profile_id else {
            return Ok(None);
        };

        let profile = self
            .list_profiles()?
            .into_iter()
            .find(|profile| profile.id == profile_id);

        if profile.is_none() {
            tracing::warn!(
                item = %item.key(),
                profile_id = %profile_id,
                "Item references a missing profile, using shared storage"
            );
        }

        Ok(profile)
    }
}
