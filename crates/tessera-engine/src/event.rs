//! Events raised by engine views

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Camera,
    Microphone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionDecision {
    Grant,
    Deny,
}

/// One-shot answer channel for a permission prompt.
///
/// Events are delivered to several consumers, so the responder is cloneable;
/// only the first `respond` reaches the engine.
#[derive(Clone)]
pub struct PermissionResponder {
    tx: Arc<Mutex<Option<oneshot::Sender<PermissionDecision>>>>,
}

impl PermissionResponder {
    pub fn new() -> (Self, oneshot::Receiver<PermissionDecision>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                tx: Arc::new(Mutex::new(Some(tx))),
            },
            rx,
        )
    }

    /// Returns false if someone already answered or the engine stopped waiting
    pub fn respond(&self, decision: PermissionDecision) -> bool {
        match self.tx.lock().take() {
            Some(tx) => tx.send(decision).is_ok(),
            None => false,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.tx.lock().is_none()
    }
}

impl std::fmt::Debug for PermissionResponder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionResponder")
            .field("answered", &self.is_answered())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct MediaPermissionRequest {
    pub origin: String,
    pub kinds: Vec<MediaKind>,
    pub responder: PermissionResponder,
}

#[derive(Debug, Clone)]
pub enum EngineEvent {
    NavigationStarted { url: String },
    NavigationFinished { url: String },
    NavigationFailed { url: String, reason: String },
    TitleChanged(String),
    FaviconChanged(Vec<u8>),
    UrlChanged(String),
    MediaPermissionRequested(MediaPermissionRequest),
}

impl EngineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::NavigationStarted { .. } => "navigation-started",
            EngineEvent::NavigationFinished { .. } => "navigation-finished",
            EngineEvent::NavigationFailed { .. } => "navigation-failed",
            EngineEvent::TitleChanged(_) => "title-changed",
            EngineEvent::FaviconChanged(_) => "favicon-changed",
            EngineEvent::UrlChanged(_) => "url-changed",
            EngineEvent::MediaPermissionRequested(_) => "media-permission-requested",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_responder_answers_once() {
        let (responder, mut rx) = PermissionResponder::new();
        let clone = responder.clone();

        assert!(responder.respond(PermissionDecision::Deny));
        assert!(!clone.respond(PermissionDecision::Grant));
        assert!(clone.is_answered());
        assert_eq!(rx.try_recv().unwrap(), PermissionDecision::Deny);
    }
}
