//! UI-confined event delivery
//!
//! Engines call consumers on whatever thread they like. Interceptors only
//! enqueue; registry state and observers are touched from the UI loop that
//! drains the queue.

use tokio::sync::mpsc;

use tessera_engine::EngineEvent;
use tessera_items::SessionKey;

use crate::registry::SessionRegistry;

/// An engine event tagged with the session it came from
#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub key: SessionKey,
    pub event: EngineEvent,
}

/// Receives forwarded events on the UI loop, in the order observers were
/// added to the registry.
pub trait SessionObserver: Send + Sync {
    fn on_session_event(&self, event: &SessionEvent);
}

impl<F> SessionObserver for F
where
    F: Fn(&SessionEvent) + Send + Sync,
{
    fn on_session_event(&self, event: &SessionEvent) {
        self(event)
    }
}

pub type EventSender = mpsc::UnboundedSender<SessionEvent>;

pub fn ui_channel() -> (EventSender, UiLoop) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, UiLoop { rx })
}

pub struct UiLoop {
    rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl UiLoop {
    /// Deliver everything queued so far. Returns the number delivered.
    pub fn drain(&mut self, registry: &SessionRegistry) -> usize {
        let mut delivered = 0;
        while let Ok(event) = self.rx.try_recv() {
            registry.publish(&event);
            delivered += 1;
        }
        delivered
    }

    /// Next queued event without delivering it
    pub fn try_next(&mut self) -> Option<SessionEvent> {
        self.rx.try_recv().ok()
    }

    pub async fn next(&mut self) -> Option<SessionEvent> {
        self.rx.recv().await
    }

    /// Deliver events as they arrive until every sender is gone
    pub async fn run(mut self, registry: SessionRegistry) {
        tracing::debug!("UI event loop started");
        while let Some(event) = self.rx.recv().await {
            registry.publish(&event);
        }
        tracing::debug!("UI event loop stopped");
    }
}

impl SessionObserver for tessera_privacy::MediaPermissionBroker {
    fn on_session_event(&self, event: &SessionEvent) {
        if let EngineEvent::MediaPermissionRequested(request) = &event.event {
            tracing::info!(
                session_id = %event.key,
                origin = %request.origin,
                "Media permission requested"
            );
            self.handle(request);
        }
    }
}
