//! Storage isolation resolver
//!
//! Maps a profile to the storage domain its sessions are built in. The first
//! resolution for a profile creates the on-disk partition and asks the engine
//! to provision it; later resolutions return the cached domain.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use tessera_engine::{Engine, StorageDomain};
use tessera_items::Profile;

use crate::Result;

/// Independent sub-areas of a profile partition
pub const PARTITION_AREAS: [&str; 5] = [
    "cookies",
    "cache",
    "local-storage",
    "session-storage",
    "indexeddb",
];

/// Raised when a profile had to fall back to the shared domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsolationNotice {
    pub profile_id: Uuid,
    pub profile_name: String,
    pub reason: String,
}

pub struct StorageResolver {
    engine: Arc<dyn Engine>,
    root: PathBuf,
    /// Provisioned domains per profile id
    domains: Arc<RwLock<HashMap<Uuid, StorageDomain>>>,
    /// Profiles currently running without isolation
    degraded: Arc<RwLock<HashMap<Uuid, IsolationNotice>>>,
    notices: broadcast::Sender<IsolationNotice>,
}

impl StorageResolver {
    pub fn new(engine: Arc<dyn Engine>, root: impl Into<PathBuf>) -> Self {
        let (notices, _) = broadcast::channel(16);
        Self {
            engine,
            root: root.into(),
            domains: Arc::new(RwLock::new(HashMap::new())),
            degraded: Arc::new(RwLock::new(HashMap::new())),
            notices,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Domain for a session bound to `profile`. Never fails: anything that
    /// prevents isolation degrades to [`StorageDomain::Shared`].
    pub fn resolve(&self, profile: Option<&Profile>) -> StorageDomain {
        let Some(profile) = profile else {
            return StorageDomain::Shared;
        };

        if let Some(domain) = self.domains.read().get(&profile.id) {
            return domain.clone();
        }

        if !self.engine.supports_persistent_isolation() {
            self.report_degraded(
                profile,
                format!("{} engine has no persistent isolation", self.engine.name()),
            );
            return StorageDomain::Shared;
        }

        // Held across provisioning so concurrent first resolutions provision once
        let mut domains = self.domains.write();
        if let Some(domain) = domains.get(&profile.id) {
            return domain.clone();
        }

        let identifier = profile.storage_identifier();
        let domain = StorageDomain::isolated(identifier.clone(), self.root.join(&identifier));

        if let Err(e) = self.provision(&domain) {
            drop(domains);
            self.report_degraded(profile, e.to_string());
            return StorageDomain::Shared;
        }

        domains.insert(profile.id, domain.clone());
        drop(domains);
        self.report_isolated(profile.id);

        tracing::info!(
            profile_id = %profile.id,
            profile_name = %profile.name,
            domain = %domain,
            "Provisioned storage domain"
        );

        domain
    }

    fn provision(&self, domain: &StorageDomain) -> Result<()> {
        if let Some(path) = domain.path() {
            for area in PARTITION_AREAS {
                std::fs::create_dir_all(path.join(area))?;
            }
        }
        self.engine.provision_domain(domain)?;
        Ok(())
    }

    /// Record that `profile` is browsing in the shared domain. Also used by
    /// callers that got a domain from [`resolve`](Self::resolve) but could
    /// not build a view in it. The notice is sent once per degradation.
    pub fn report_degraded(&self, profile: &Profile, reason: impl Into<String>) {
        let notice = IsolationNotice {
            profile_id: profile.id,
            profile_name: profile.name.clone(),
            reason: reason.into(),
        };

        let first = self
            .degraded
            .write()
            .insert(profile.id, notice.clone())
            .is_none();

        if first {
            tracing::warn!(
                profile_id = %notice.profile_id,
                profile_name = %notice.profile_name,
                reason = %notice.reason,
                "Profile isolation degraded, using shared storage"
            );
            // No subscribers is fine
            let _ = self.notices.send(notice);
        }
    }

    /// Clear a degraded condition once the profile runs isolated again
    pub fn report_isolated(&self, profile_id: Uuid) {
        if self.degraded.write().remove(&profile_id).is_some() {
            tracing::info!(profile_id = %profile_id, "Profile isolation restored");
        }
    }

    /// Provisioned domain for a profile, if it has been resolved
    pub fn cached(&self, profile_id: Uuid) -> Option<StorageDomain> {
        self.domains.read().get(&profile_id).cloned()
    }

    /// Drop the cached domain, e.g. after the profile is deleted. Files on
    /// disk are kept.
    pub fn forget(&self, profile_id: Uuid) -> Option<StorageDomain> {
        self.degraded.write().remove(&profile_id);
        self.domains.write().remove(&profile_id)
    }

    /// Forget the profile and delete its partition from the engine and disk
    pub fn purge(&self, profile_id: Uuid) -> Result<()> {
        let domain = self.forget(profile_id).unwrap_or_else(|| {
            let identifier = Profile::storage_identifier_for(profile_id);
            StorageDomain::isolated(identifier.clone(), self.root.join(identifier))
        });

        self.engine.remove_domain(&domain)?;
        if let Some(path) = domain.path() {
            if path.exists() {
                std::fs::remove_dir_all(path)?;
            }
        }

        tracing::info!(profile_id = %profile_id, domain = %domain, "Purged storage domain");
        Ok(())
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded.read().is_empty()
    }

    pub fn is_degraded_for(&self, profile_id: Uuid) -> bool {
        self.degraded.read().contains_key(&profile_id)
    }

    pub fn degraded_profiles(&self) -> Vec<Uuid> {
        self.degraded.read().keys().copied().collect()
    }

    pub fn degraded_notices(&self) -> Vec<IsolationNotice> {
        self.degraded.read().values().cloned().collect()
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<IsolationNotice> {
        self.notices.subscribe()
    }
}

impl Clone for StorageResolver {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            root: self.root.clone(),
            domains: Arc::clone(&self.domains),
            degraded: Arc::clone(&self.degraded),
            notices: self.notices.clone(),
        }
    }
}
