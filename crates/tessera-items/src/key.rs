//! Item kinds and the `"{kind}-{uuid}"` session key encoding

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ItemError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemKind {
    /// Saved link inside a space, URL fixed at creation
    Bookmark,
    /// Ordinary tab inside a space
    Tab,
    /// Shortcut pinned directly to a profile
    PinnedTab,
}

impl ItemKind {
    pub const ALL: [ItemKind; 3] = [ItemKind::Bookmark, ItemKind::Tab, ItemKind::PinnedTab];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Bookmark => "bookmark",
            ItemKind::Tab => "tab",
            ItemKind::PinnedTab => "pinnedTab",
        }
    }

    /// Whether the stored URL follows the page as it navigates
    pub fn has_live_url(&self) -> bool {
        matches!(self, ItemKind::Tab | ItemKind::PinnedTab)
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ItemKind {
    type Err = ItemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bookmark" => Ok(ItemKind::Bookmark),
            "tab" => Ok(ItemKind::Tab),
            "pinnedTab" => Ok(ItemKind::PinnedTab),
            _ => Err(ItemError::UnknownKind(s.to_string())),
        }
    }
}

/// Stable identifier of a rendering session, derived from the item it shows.
///
/// The string form is `"{kind}-{uuid}"`. Kind names never contain `-`, so the
/// first dash always separates the kind from the UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionKey {
    pub kind: ItemKind,
    pub id: Uuid,
}

impl SessionKey {
    pub fn new(kind: ItemKind, id: Uuid) -> Self {
        Self { kind, id }
    }

    pub fn bookmark(id: Uuid) -> Self {
        Self::new(ItemKind::Bookmark, id)
    }

    pub fn tab(id: Uuid) -> Self {
        Self::new(ItemKind::Tab, id)
    }

    pub fn pinned_tab(id: Uuid) -> Self {
        Self::new(ItemKind::PinnedTab, id)
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.kind, self.id)
    }
}

impl std::str::FromStr for SessionKey {
    type Err = ItemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once('-')
            .ok_or_else(|| ItemError::InvalidSessionKey(s.to_string()))?;

        let kind: ItemKind = kind.parse()?;
        let id = Uuid::parse_str(id).map_err(|_| ItemError::InvalidSessionKey(s.to_string()))?;

        Ok(Self { kind, id })
    }
}

impl TryFrom<String> for SessionKey {
    type Error = ItemError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SessionKey> for String {
    fn from(key: SessionKey) -> Self {
        key.to_string()
    }
}
