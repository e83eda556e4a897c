//! Storage domains

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Identifier engines use for the shared domain
pub const SHARED_DOMAIN_ID: &str = "default";

/// A partition of cookies, cache and local state a view is bound to at
/// construction time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageDomain {
    /// Shared by every session without a profile
    Shared,
    /// Private to one profile
    Isolated { identifier: String, path: PathBuf },
}

impl StorageDomain {
    pub fn isolated(identifier: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        StorageDomain::Isolated {
            identifier: identifier.into(),
            path: path.into(),
        }
    }

    pub fn identifier(&self) -> &str {
        match self {
            StorageDomain::Shared => SHARED_DOMAIN_ID,
            StorageDomain::Isolated { identifier, .. } => identifier,
        }
    }

    pub fn is_isolated(&self) -> bool {
        matches!(self, StorageDomain::Isolated { .. })
    }

    /// On-disk partition root, `None` for the shared domain
    pub fn path(&self) -> Option<&Path> {
        match self {
            StorageDomain::Shared => None,
            StorageDomain::Isolated { path, .. } => Some(path),
        }
    }
}

impl std::fmt::Display for StorageDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.identifier())
    }
}
