//! Engine and view traits

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::domain::StorageDomain;
use crate::event::EngineEvent;
use crate::Result;

/// Receives view events. Engines may call this from any thread.
pub trait EventConsumer: Send + Sync {
    fn on_event(&self, event: &EngineEvent);
}

impl<F> EventConsumer for F
where
    F: Fn(&EngineEvent) + Send + Sync,
{
    fn on_event(&self, event: &EngineEvent) {
        self(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub u64);

impl std::fmt::Display for ViewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "view-{}", self.0)
    }
}

/// Ordered subscriber list for engine adapters.
///
/// Consumers are called in subscription order. The list is snapshotted
/// before delivery, so a consumer may subscribe or unsubscribe from inside
/// its callback.
#[derive(Default)]
pub struct ConsumerList {
    next_id: AtomicU64,
    consumers: RwLock<Vec<(SubscriptionId, Arc<dyn EventConsumer>)>>,
}

impl ConsumerList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, consumer: Arc<dyn EventConsumer>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.consumers.write().push((id, consumer));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut consumers = self.consumers.write();
        let before = consumers.len();
        consumers.retain(|(existing, _)| *existing != id);
        consumers.len() != before
    }

    pub fn clear(&self) {
        self.consumers.write().clear();
    }

    pub fn len(&self) -> usize {
        self.consumers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumers.read().is_empty()
    }

    pub fn emit(&self, event: &EngineEvent) {
        let snapshot: Vec<Arc<dyn EventConsumer>> = self
            .consumers
            .read()
            .iter()
            .map(|(_, consumer)| Arc::clone(consumer))
            .collect();

        for consumer in snapshot {
            consumer.on_event(event);
        }
    }
}

/// One live rendering instance
pub trait EngineView: Send + Sync {
    fn id(&self) -> ViewId;

    /// Start navigating. Load failures arrive as
    /// [`EngineEvent::NavigationFailed`], not as an error here.
    fn load(&self, url: &str) -> Result<()>;

    fn go_back(&self) -> Result<()>;

    fn go_forward(&self) -> Result<()>;

    fn reload(&self) -> Result<()>;

    fn can_go_back(&self) -> bool;

    fn can_go_forward(&self) -> bool;

    fn current_url(&self) -> Option<String>;

    fn title(&self) -> Option<String>;

    fn evaluate_script(&self, code: &str) -> Result<serde_json::Value>;

    /// Consumers receive events in the order they subscribed.
    fn subscribe(&self, consumer: Arc<dyn EventConsumer>) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    fn set_visible(&self, visible: bool);

    fn is_visible(&self) -> bool;

    fn storage_domain(&self) -> &StorageDomain;

    /// Remove from the window and stop delivering events. Further
    /// navigation calls fail with [`crate::EngineError::Detached`].
    fn detach(&self);
}

/// Factory for views
pub trait Engine: Send + Sync {
    fn name(&self) -> &str;

    fn create_view(&self, domain: &StorageDomain) -> Result<Arc<dyn EngineView>>;

    /// Whether views can be bound to a persistent, per-identifier domain
    fn supports_persistent_isolation(&self) -> bool;

    /// Prepare an isolated domain before the first view is built in it
    fn provision_domain(&self, domain: &StorageDomain) -> Result<()>;

    /// Discard everything the engine keeps for a domain
    fn remove_domain(&self, _domain: &StorageDomain) -> Result<()> {
        Ok(())
    }
}
