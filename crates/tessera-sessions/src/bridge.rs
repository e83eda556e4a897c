//! Persistence bridge
//!
//! Writes forwarded title, favicon and URL changes back to the entity store.
//! Dropped without a write:
//! - blank titles and empty favicons
//! - placeholder URLs
//! - URL changes on bookmarks, whose URL only changes by editing
//! - values equal to what is already stored
//!
//! Writes run on the blocking pool and are not awaited or retried; two
//! quick writes to one item may land in either order.

use std::sync::Arc;
use tokio::task::JoinHandle;

use tessera_engine::EngineEvent;
use tessera_items::{is_sentinel_url, EntityStore, SessionKey};

use crate::dispatch::{SessionEvent, SessionObserver};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Update {
    Title(String),
    Favicon(Vec<u8>),
    Url(String),
}

impl Update {
    fn field(&self) -> &'static str {
        match self {
            Update::Title(_) => "title",
            Update::Favicon(_) => "favicon",
            Update::Url(_) => "url",
        }
    }
}

pub struct PersistenceBridge {
    store: Arc<dyn EntityStore>,
}

impl PersistenceBridge {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Start the write an event calls for. Returns the write's handle, or
    /// `None` if the event was dropped or there was no runtime to run it on
    /// (the write then happens inline).
    pub fn apply(&self, event: &SessionEvent) -> Option<JoinHandle<()>> {
        let update = Self::update_for(event.key, &event.event)?;
        let store = Arc::clone(&self.store);
        let key = event.key;
        self.spawn(move || write_update(store.as_ref(), key, update))
    }

    /// Like [`apply`](Self::apply) for an untyped session id. Ids that do not
    /// parse are logged and ignored.
    pub fn apply_tagged(&self, session_id: &str, event: &EngineEvent) -> Option<JoinHandle<()>> {
        match session_id.parse::<SessionKey>() {
            Ok(key) => self.apply(&SessionEvent {
                key,
                event: event.clone(),
            }),
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "Ignoring event for unparseable session id");
                None
            }
        }
    }

    /// Store the URL of an item repaired at read time. Like every bridge
    /// write it only updates an existing row.
    pub fn persist_recovered(&self, key: SessionKey, url: String) -> Option<JoinHandle<()>> {
        let store = Arc::clone(&self.store);
        self.spawn(move || match store.update_url(&key, &url) {
            Ok(true) => tracing::info!(session_id = %key, url = %url, "Persisted recovered URL"),
            Ok(false) => tracing::debug!(session_id = %key, "Item gone or already repaired"),
            Err(e) => tracing::error!(session_id = %key, error = %e, "Failed to persist recovered URL"),
        })
    }

    fn update_for(key: SessionKey, event: &EngineEvent) -> Option<Update> {
        let update = match event {
            EngineEvent::TitleChanged(title) if !title.trim().is_empty() => {
                Update::Title(title.clone())
            }
            EngineEvent::FaviconChanged(bytes) if !bytes.is_empty() => {
                Update::Favicon(bytes.clone())
            }
            EngineEvent::UrlChanged(url) if is_sentinel_url(url) => {
                tracing::trace!(session_id = %key, "Ignoring placeholder URL");
                return None;
            }
            EngineEvent::UrlChanged(url) if key.kind.has_live_url() => Update::Url(url.clone()),
            _ => return None,
        };
        Some(update)
    }

    fn spawn<F>(&self, write: F) -> Option<JoinHandle<()>>
    where
        F: FnOnce() + Send + 'static,
    {
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => Some(runtime.spawn_blocking(write)),
            Err(_) => {
                write();
                None
            }
        }
    }
}

impl Clone for PersistenceBridge {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl SessionObserver for PersistenceBridge {
    fn on_session_event(&self, event: &SessionEvent) {
        // Detached
        let _ = self.apply(event);
    }
}

fn write_update(store: &dyn EntityStore, key: SessionKey, update: Update) {
    let field = update.field();
    match try_write_update(store, key, update) {
        Ok(true) => tracing::debug!(session_id = %key, field, "Persisted item update"),
        Ok(false) => {}
        Err(e) => tracing::error!(session_id = %key, field, error = %e, "Failed to persist item update"),
    }
}

/// Returns whether anything was written
fn try_write_update(
    store: &dyn EntityStore,
    key: SessionKey,
    update: Update,
) -> tessera_items::Result<bool> {
    match update {
        Update::Title(title) => store.update_title(&key, &title),
        Update::Favicon(bytes) => store.update_favicon(&key, &bytes),
        Update::Url(url) => store.update_url(&key, &url),
    }
}
