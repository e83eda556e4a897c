//! Browsing items
//!
//! Bookmarks and tabs live in a space; pinned tabs hang directly off a
//! profile. The three variants are a closed set, so callers match on
//! [`Item`] exhaustively instead of going through a trait object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ItemError;
use crate::key::{ItemKind, SessionKey};
use crate::sentinel::{is_sentinel_url, SENTINEL_URL};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: Uuid,
    pub space_id: Uuid,
    pub title: String,
    /// Fixed once the bookmark is created
    pub url: String,
    pub favicon: Option<Vec<u8>>,
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bookmark {
    pub fn new(space_id: Uuid, title: String, url: String) -> Result<Self> {
        if is_sentinel_url(&url) {
            return Err(ItemError::InvalidUrl(
                "Bookmark needs a real destination".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            space_id,
            title,
            url,
            favicon: None,
            position: 0,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    pub id: Uuid,
    pub space_id: Uuid,
    pub title: String,
    pub url: String,
    pub favicon: Option<Vec<u8>>,
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tab {
    /// A blank URL is stored as the sentinel.
    pub fn new(space_id: Uuid, url: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            space_id,
            title: String::new(),
            url: normalize_url(url),
            favicon: None,
            position: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Build the bookmark that replaces this tab. The bookmark gets its own
    /// id, so it is shown by a different session than the tab was.
    pub fn to_bookmark(&self) -> Result<Bookmark> {
        let mut bookmark = Bookmark::new(self.space_id, self.title.clone(), self.url.clone())?;
        bookmark.favicon = self.favicon.clone();
        bookmark.position = self.position;
        Ok(bookmark)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinnedTab {
    pub id: Uuid,
    /// `None` pins to the shared storage domain
    pub profile_id: Option<Uuid>,
    pub title: String,
    pub url: String,
    pub favicon: Option<Vec<u8>>,
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PinnedTab {
    pub fn new(profile_id: Option<Uuid>, title: String, url: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            profile_id,
            title,
            url: normalize_url(url),
            favicon: None,
            position: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

fn normalize_url(url: String) -> String {
    if is_sentinel_url(&url) {
        SENTINEL_URL.to_string()
    } else {
        url
    }
}

/// What an item hangs off when working out its profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOwner {
    Space(Uuid),
    Profile(Option<Uuid>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Item {
    Bookmark(Bookmark),
    Tab(Tab),
    PinnedTab(PinnedTab),
}

impl Item {
    pub fn kind(&self) -> ItemKind {
        match self {
            Item::Bookmark(_) => ItemKind::Bookmark,
            Item::Tab(_) => ItemKind::Tab,
            Item::PinnedTab(_) => ItemKind::PinnedTab,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Item::Bookmark(b) => b.id,
            Item::Tab(t) => t.id,
            Item::PinnedTab(p) => p.id,
        }
    }

    pub fn key(&self) -> SessionKey {
        SessionKey::new(self.kind(), self.id())
    }

    pub fn title(&self) -> &str {
        match self {
            Item::Bookmark(b) => &b.title,
            Item::Tab(t) => &t.title,
            Item::PinnedTab(p) => &p.title,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Item::Bookmark(b) => &b.url,
            Item::Tab(t) => &t.url,
            Item::PinnedTab(p) => &p.url,
        }
    }

    pub fn favicon(&self) -> Option<&[u8]> {
        match self {
            Item::Bookmark(b) => b.favicon.as_deref(),
            Item::Tab(t) => t.favicon.as_deref(),
            Item::PinnedTab(p) => p.favicon.as_deref(),
        }
    }

    pub fn position(&self) -> i64 {
        match self {
            Item::Bookmark(b) => b.position,
            Item::Tab(t) => t.position,
            Item::PinnedTab(p) => p.position,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Item::Bookmark(b) => b.created_at,
            Item::Tab(t) => t.created_at,
            Item::PinnedTab(p) => p.created_at,
        }
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        match self {
            Item::Bookmark(b) => b.updated_at,
            Item::Tab(t) => t.updated_at,
            Item::PinnedTab(p) => p.updated_at,
        }
    }

    pub fn owner(&self) -> ItemOwner {
        match self {
            Item::Bookmark(b) => ItemOwner::Space(b.space_id),
            Item::Tab(t) => ItemOwner::Space(t.space_id),
            Item::PinnedTab(p) => ItemOwner::Profile(p.profile_id),
        }
    }

    pub fn has_sentinel_url(&self) -> bool {
        is_sentinel_url(self.url())
    }

    /// Update the page title
    pub fn set_title(&mut self, title: String) {
        match self {
            Item::Bookmark(b) => b.title = title,
            Item::Tab(t) => t.title = title,
            Item::PinnedTab(p) => p.title = title,
        }
        self.touch();
    }

    /// Overwrite the stored URL. This bypasses the bookmark immutability
    /// rule, which is enforced by whoever forwards live navigation.
    pub fn set_url(&mut self, url: String) {
        let url = normalize_url(url);
        match self {
            Item::Bookmark(b) => b.url = url,
            Item::Tab(t) => t.url = url,
            Item::PinnedTab(p) => p.url = url,
        }
        self.touch();
    }

    /// Update favicon bytes
    pub fn set_favicon(&mut self, favicon: Option<Vec<u8>>) {
        match self {
            Item::Bookmark(b) => b.favicon = favicon,
            Item::Tab(t) => t.favicon = favicon,
            Item::PinnedTab(p) => p.favicon = favicon,
        }
        self.touch();
    }

    fn touch(&mut self) {
        let now = Utc::now();
        match self {
            Item::Bookmark(b) => b.updated_at = now,
            Item::Tab(t) => t.updated_at = now,
            Item::PinnedTab(p) => p.updated_at = now,
        }
    }

    /// Get display title (with fallback to URL)
    pub fn display_title(&self) -> &str {
        if self.title().is_empty() {
            self.url()
        } else {
            self.title()
        }
    }
}

impl From<Bookmark> for Item {
    fn from(value: Bookmark) -> Self {
        Item::Bookmark(value)
    }
}

impl From<Tab> for Item {
    fn from(value: Tab) -> Self {
        Item::Tab(value)
    }
}

impl From<PinnedTab> for Item {
    fn from(value: PinnedTab) -> Self {
        Item::PinnedTab(value)
    }
}
