//! Media permission management
//!
//! | Capability | Default      | Remembered             |
//! | Camera     | Undetermined | Per origin, in memory  |
//! | Microphone | Undetermined | Per origin, in memory  |
//!
//! Undetermined requests go to the platform asynchronously. The page is
//! denied unless the platform grants every requested device. Answers last
//! for the life of the shell.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use tessera_engine::{MediaKind, MediaPermissionRequest, PermissionDecision};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionState {
    /// Not answered yet, ask the platform
    Undetermined,
    Allow,
    Deny,
}

impl From<PermissionDecision> for PermissionState {
    fn from(decision: PermissionDecision) -> Self {
        match decision {
            PermissionDecision::Grant => PermissionState::Allow,
            PermissionDecision::Deny => PermissionState::Deny,
        }
    }
}

pub struct PermissionManager {
    /// Site-specific permissions: (origin, kind) -> state
    site_permissions: HashMap<(String, MediaKind), PermissionState>,
}

impl PermissionManager {
    pub fn new() -> Self {
        Self {
            site_permissions: HashMap::new(),
        }
    }

    pub fn get_permission(&self, origin: &str, kind: MediaKind) -> PermissionState {
        self.site_permissions
            .get(&(origin.to_string(), kind))
            .copied()
            .unwrap_or(PermissionState::Undetermined)
    }

    pub fn set_site_permission(&mut self, origin: &str, kind: MediaKind, state: PermissionState) {
        self.site_permissions.insert((origin.to_string(), kind), state);
    }

    /// Combined state for a request covering several devices: any denial
    /// wins, then any undetermined device, otherwise allowed.
    pub fn decide(&self, origin: &str, kinds: &[MediaKind]) -> PermissionState {
        let mut combined = PermissionState::Allow;
        for kind in kinds {
            match self.get_permission(origin, *kind) {
                PermissionState::Deny => return PermissionState::Deny,
                PermissionState::Undetermined => combined = PermissionState::Undetermined,
                PermissionState::Allow => {}
            }
        }
        combined
    }
}

impl Default for PermissionManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Platform prompt for device access (OS privacy dialog)
pub trait MediaAuthorizer: Send + Sync {
    /// Dropping the sender counts as a denial.
    fn request_access(&self, origin: &str, kind: MediaKind) -> oneshot::Receiver<PermissionDecision>;
}

/// Answers every prompt the same way. Headless runs use `Deny`.
pub struct StaticAuthorizer(pub PermissionDecision);

impl MediaAuthorizer for StaticAuthorizer {
    fn request_access(&self, _origin: &str, _kind: MediaKind) -> oneshot::Receiver<PermissionDecision> {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(self.0);
        rx
    }
}

/// Answers media permission requests forwarded from sessions
pub struct MediaPermissionBroker {
    manager: Arc<RwLock<PermissionManager>>,
    authorizer: Arc<dyn MediaAuthorizer>,
}

impl MediaPermissionBroker {
    pub fn new(authorizer: Arc<dyn MediaAuthorizer>) -> Self {
        Self {
            manager: Arc::new(RwLock::new(PermissionManager::new())),
            authorizer,
        }
    }

    pub fn manager(&self) -> &Arc<RwLock<PermissionManager>> {
        &self.manager
    }

    /// Answer a request. Known answers are applied immediately; undetermined
    /// devices are asked of the platform on a detached task, whose handle is
    /// returned. Without a runtime the request is denied.
    pub fn handle(&self, request: &MediaPermissionRequest) -> Option<JoinHandle<()>> {
        let state = self.manager.read().decide(&request.origin, &request.kinds);

        match state {
            PermissionState::Allow => {
                request.responder.respond(PermissionDecision::Grant);
                None
            }
            PermissionState::Deny => {
                request.responder.respond(PermissionDecision::Deny);
                None
            }
            PermissionState::Undetermined => self.ask_platform(request),
        }
    }

    fn ask_platform(&self, request: &MediaPermissionRequest) -> Option<JoinHandle<()>> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                origin = %request.origin,
                "No runtime to ask the platform, denying media request"
            );
            request.responder.respond(PermissionDecision::Deny);
            return None;
        };

        let pending: Vec<(MediaKind, oneshot::Receiver<PermissionDecision>)> = {
            let manager = self.manager.read();
            request
                .kinds
                .iter()
                .filter(|kind| {
                    manager.get_permission(&request.origin, **kind) == PermissionState::Undetermined
                })
                .map(|kind| (*kind, self.authorizer.request_access(&request.origin, *kind)))
                .collect()
        };

        let manager = Arc::clone(&self.manager);
        let origin = request.origin.clone();
        let kinds = request.kinds.clone();
        let responder = request.responder.clone();

        Some(runtime.spawn(async move {
            for (kind, rx) in pending {
                let decision = rx.await.unwrap_or(PermissionDecision::Deny);
                tracing::info!(origin = %origin, kind = ?kind, decision = ?decision, "Platform answered media request");
                manager
                    .write()
                    .set_site_permission(&origin, kind, decision.into());
            }

            let decision = match manager.read().decide(&origin, &kinds) {
                PermissionState::Allow => PermissionDecision::Grant,
                _ => PermissionDecision::Deny,
            };
            responder.respond(decision);
        }))
    }
}
