//! Delegate interceptor
//!
//! Subscribed to a view after the engine's own consumer, so that consumer
//! always sees an event first. The interceptor then tags the event with its
//! session and queues it for the UI loop; it never touches registry state
//! from the engine's thread.

use tessera_engine::{EngineEvent, EventConsumer};
use tessera_items::SessionKey;

use crate::dispatch::{EventSender, SessionEvent};

pub struct EventInterceptor {
    key: SessionKey,
    events: EventSender,
}

impl EventInterceptor {
    pub fn new(key: SessionKey, events: EventSender) -> Self {
        Self { key, events }
    }

    pub fn key(&self) -> SessionKey {
        self.key
    }
}

impl EventConsumer for EventInterceptor {
    fn on_event(&self, event: &EngineEvent) {
        let forwarded = SessionEvent {
            key: self.key,
            event: event.clone(),
        };

        if self.events.send(forwarded).is_err() {
            tracing::trace!(
                session_id = %self.key,
                event = event.name(),
                "UI loop gone, dropping event"
            );
        }
    }
}
