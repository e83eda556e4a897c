//! Profiles and spaces

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An isolated browsing identity with its own storage domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    /// Accent colour shown in the sidebar, `#rrggbb`
    pub color: String,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            color: color.into(),
            created_at: Utc::now(),
        }
    }

    /// Storage domain identifier. Derived only from the id so it survives
    /// renames and restarts.
    pub fn storage_identifier(&self) -> String {
        Self::storage_identifier_for(self.id)
    }

    pub fn storage_identifier_for(id: Uuid) -> String {
        format!("profile-{}", id)
    }
}

/// A group of tabs and bookmarks, optionally bound to a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub id: Uuid,
    pub name: String,
    /// `None` means sessions in this space use the shared storage domain
    pub profile_id: Option<Uuid>,
    pub position: i64,
    pub created_at: DateTime<Utc>,
}

impl Space {
    pub fn new(name: impl Into<String>, profile_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            profile_id,
            position: 0,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_identifier_is_stable() {
        let mut profile = Profile::new("Work", "#3366ff");
        let before = profile.storage_identifier();

        profile.name = "Renamed".to_string();
        assert_eq!(profile.storage_identifier(), before);
        assert_eq!(before, format!("profile-{}", profile.id));
    }

    #[test]
    fn test_distinct_profiles_distinct_identifiers() {
        let a = Profile::new("A", "#000000");
        let b = Profile::new("B", "#000000");
        assert_ne!(a.storage_identifier(), b.storage_identifier());
    }
}
