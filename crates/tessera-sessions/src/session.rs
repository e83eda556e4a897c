//! Session data structure

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use tessera_engine::{EngineView, StorageDomain, SubscriptionId};
use tessera_items::{Profile, SessionKey};

use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Hidden,
    Shown,
}

/// Last navigation that did not commit, shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationFailure {
    pub url: String,
    pub reason: String,
    pub failed_at: DateTime<Utc>,
}

pub struct Session {
    key: SessionKey,
    /// Owned by this session; detached when the session is removed
    view: Arc<dyn EngineView>,
    profile: Option<Profile>,
    domain: StorageDomain,
    subscription: SubscriptionId,
    visibility: RwLock<Visibility>,
    last_failure: RwLock<Option<NavigationFailure>>,
    created_at: DateTime<Utc>,
}

pub type SessionHandle = Arc<Session>;

impl Session {
    pub(crate) fn new(
        key: SessionKey,
        view: Arc<dyn EngineView>,
        profile: Option<Profile>,
        domain: StorageDomain,
        subscription: SubscriptionId,
    ) -> Self {
        Self {
            key,
            view,
            profile,
            domain,
            subscription,
            visibility: RwLock::new(Visibility::Hidden),
            last_failure: RwLock::new(None),
            created_at: Utc::now(),
        }
    }

    pub fn key(&self) -> SessionKey {
        self.key
    }

    pub fn view(&self) -> &Arc<dyn EngineView> {
        &self.view
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    /// Domain the view was actually built in. Shared when isolation was
    /// requested but unavailable.
    pub fn storage_domain(&self) -> &StorageDomain {
        &self.domain
    }

    pub(crate) fn subscription(&self) -> SubscriptionId {
        self.subscription
    }

    pub fn visibility(&self) -> Visibility {
        *self.visibility.read()
    }

    pub fn is_shown(&self) -> bool {
        self.visibility() == Visibility::Shown
    }

    pub(crate) fn set_visibility(&self, visibility: Visibility) {
        let mut current = self.visibility.write();
        if *current != visibility {
            *current = visibility;
            self.view.set_visible(visibility == Visibility::Shown);
        }
    }

    pub fn last_failure(&self) -> Option<NavigationFailure> {
        self.last_failure.read().clone()
    }

    pub(crate) fn record_failure(&self, url: &str, reason: &str) {
        *self.last_failure.write() = Some(NavigationFailure {
            url: url.to_string(),
            reason: reason.to_string(),
            failed_at: Utc::now(),
        });
    }

    pub(crate) fn clear_failure(&self) {
        self.last_failure.write().take();
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn current_url(&self) -> Option<String> {
        self.view.current_url()
    }

    pub fn load(&self, url: &str) -> Result<()> {
        Ok(self.view.load(url)?)
    }

    pub fn go_back(&self) -> Result<()> {
        Ok(self.view.go_back()?)
    }

    pub fn go_forward(&self) -> Result<()> {
        Ok(self.view.go_forward()?)
    }

    pub fn reload(&self) -> Result<()> {
        Ok(self.view.reload()?)
    }

    pub fn evaluate_script(&self, code: &str) -> Result<serde_json::Value> {
        Ok(self.view.evaluate_script(code)?)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("key", &self.key)
            .field("view", &self.view.id())
            .field("domain", &self.domain)
            .field("visibility", &self.visibility())
            .finish()
    }
}
