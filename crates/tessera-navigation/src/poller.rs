//! Navigation state poller
//!
//! Engines do not report every back/forward transition (in-page history
//! pushes, restored pages), so the visible session is also sampled on a
//! timer. Snapshots go out on a watch channel, and only when they differ
//! from the last one published.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use tessera_engine::EngineView;
use tessera_items::SessionKey;

use crate::{NavigationError, Result};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationSnapshot {
    pub session: SessionKey,
    pub can_go_back: bool,
    pub can_go_forward: bool,
    pub url: Option<String>,
}

impl NavigationSnapshot {
    fn sample(session: SessionKey, view: &dyn EngineView) -> Self {
        Self {
            session,
            can_go_back: view.can_go_back(),
            can_go_forward: view.can_go_forward(),
            url: view.current_url(),
        }
    }
}

struct Tracked {
    session: SessionKey,
    view: Arc<dyn EngineView>,
    timer: Option<JoinHandle<()>>,
}

/// Polls at most one session at a time. Retracking stops the previous timer
/// before the next one starts.
pub struct NavigationPoller {
    interval: Duration,
    tracked: Mutex<Option<Tracked>>,
    updates: Arc<watch::Sender<Option<NavigationSnapshot>>>,
}

impl NavigationPoller {
    pub fn new(interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(NavigationError::ZeroInterval);
        }

        let (updates, _) = watch::channel(None);
        Ok(Self {
            interval,
            tracked: Mutex::new(None),
            updates: Arc::new(updates),
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start polling `view`. Publishes a first sample immediately. Without a
    /// Tokio runtime the session is recorded but no timer runs.
    pub fn track(&self, session: SessionKey, view: Arc<dyn EngineView>) {
        let mut tracked = self.tracked.lock();
        if let Some(previous) = tracked.take() {
            stop_timer(previous);
        }

        publish(
            &self.updates,
            Some(NavigationSnapshot::sample(session, view.as_ref())),
        );

        let timer = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => Some(runtime.spawn(poll_loop(
                session,
                Arc::clone(&view),
                Arc::clone(&self.updates),
                self.interval,
            ))),
            Err(_) => {
                tracing::debug!(session_id = %session, "No runtime, navigation polling disabled");
                None
            }
        };

        tracing::debug!(session_id = %session, "Tracking navigation state");
        *tracked = Some(Tracked {
            session,
            view,
            timer,
        });
    }

    /// Stop if `session` is the one being tracked
    pub fn untrack(&self, session: &SessionKey) -> bool {
        let mut tracked = self.tracked.lock();
        if tracked.as_ref().map(|t| &t.session) != Some(session) {
            return false;
        }

        if let Some(previous) = tracked.take() {
            stop_timer(previous);
        }
        publish(&self.updates, None);
        true
    }

    pub fn stop(&self) {
        if let Some(previous) = self.tracked.lock().take() {
            stop_timer(previous);
        }
        publish(&self.updates, None);
    }

    pub fn tracked(&self) -> Option<SessionKey> {
        self.tracked.lock().as_ref().map(|t| t.session)
    }

    pub fn is_polling(&self) -> bool {
        self.tracked
            .lock()
            .as_ref()
            .and_then(|t| t.timer.as_ref())
            .is_some_and(|timer| !timer.is_finished())
    }

    /// Sample the tracked session now, outside the timer
    pub fn sample_now(&self) -> Option<NavigationSnapshot> {
        let snapshot = {
            let tracked = self.tracked.lock();
            let tracked = tracked.as_ref()?;
            NavigationSnapshot::sample(tracked.session, tracked.view.as_ref())
        };

        publish(&self.updates, Some(snapshot.clone()));
        Some(snapshot)
    }

    pub fn current(&self) -> Option<NavigationSnapshot> {
        self.updates.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<NavigationSnapshot>> {
        self.updates.subscribe()
    }
}

impl Default for NavigationPoller {
    fn default() -> Self {
        let (updates, _) = watch::channel(None);
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            tracked: Mutex::new(None),
            updates: Arc::new(updates),
        }
    }
}

impl Drop for NavigationPoller {
    fn drop(&mut self) {
        if let Some(previous) = self.tracked.get_mut().take() {
            stop_timer(previous);
        }
    }
}

fn stop_timer(tracked: Tracked) {
    if let Some(timer) = tracked.timer {
        timer.abort();
    }
    tracing::debug!(session_id = %tracked.session, "Stopped tracking navigation state");
}

fn publish(
    updates: &watch::Sender<Option<NavigationSnapshot>>,
    snapshot: Option<NavigationSnapshot>,
) -> bool {
    updates.send_if_modified(|current| {
        if *current == snapshot {
            false
        } else {
            *current = snapshot;
            true
        }
    })
}

async fn poll_loop(
    session: SessionKey,
    view: Arc<dyn EngineView>,
    updates: Arc<watch::Sender<Option<NavigationSnapshot>>>,
    period: Duration,
) {
    let start = tokio::time::Instant::now() + period;
    let mut ticker = tokio::time::interval_at(start, period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let snapshot = NavigationSnapshot::sample(session, view.as_ref());
        if publish(&updates, Some(snapshot)) {
            tracing::trace!(session_id = %session, "Navigation state changed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_engine::memory::MemoryEngine;
    use tessera_engine::{Engine, StorageDomain};
    use uuid::Uuid;

    fn view(engine: &MemoryEngine) -> Arc<dyn EngineView> {
        engine.create_view(&StorageDomain::Shared).unwrap()
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(NavigationPoller::new(Duration::ZERO).is_err());
    }

    #[test]
    fn test_track_without_runtime_records_session() {
        let engine = MemoryEngine::new();
        let view = view(&engine);
        let poller = NavigationPoller::default();
        let session = SessionKey::tab(Uuid::new_v4());

        view.load("https://example.com/").unwrap();
        poller.track(session, Arc::clone(&view));

        assert_eq!(poller.tracked(), Some(session));
        assert!(!poller.is_polling());
        assert_eq!(
            poller.current().unwrap().url.as_deref(),
            Some("https://example.com/")
        );

        view.load("https://example.com/next").unwrap();
        let snapshot = poller.sample_now().unwrap();
        assert!(snapshot.can_go_back);
        assert_eq!(poller.current(), Some(snapshot));
    }

    #[tokio::test(start_paused = true)]
    async fn test_converges_within_one_interval_without_events() {
        let engine = MemoryEngine::new();
        let view = view(&engine);
        let poller = NavigationPoller::new(Duration::from_millis(250)).unwrap();
        let session = SessionKey::tab(Uuid::new_v4());
        let mut updates = poller.subscribe();

        poller.track(session, Arc::clone(&view));
        assert!(poller.is_polling());
        updates.borrow_and_update();

        engine.suppress_events(true);
        view.load("https://a.example/").unwrap();
        view.load("https://b.example/").unwrap();

        tokio::time::sleep(Duration::from_millis(260)).await;

        assert!(updates.has_changed().unwrap());
        let snapshot = updates.borrow_and_update().clone().unwrap();
        assert_eq!(snapshot.session, session);
        assert!(snapshot.can_go_back);
        assert!(!snapshot.can_go_forward);
        assert_eq!(snapshot.url.as_deref(), Some("https://b.example/"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_state_not_republished() {
        let engine = MemoryEngine::new();
        let view = view(&engine);
        view.load("https://a.example/").unwrap();

        let poller = NavigationPoller::new(Duration::from_millis(250)).unwrap();
        let mut updates = poller.subscribe();
        poller.track(SessionKey::tab(Uuid::new_v4()), view);
        updates.borrow_and_update();

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(!updates.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retrack_follows_new_session_only() {
        let engine = MemoryEngine::new();
        let first = view(&engine);
        let second = view(&engine);
        let poller = NavigationPoller::new(Duration::from_millis(250)).unwrap();
        let first_key = SessionKey::tab(Uuid::new_v4());
        let second_key = SessionKey::bookmark(Uuid::new_v4());

        poller.track(first_key, Arc::clone(&first));
        poller.track(second_key, Arc::clone(&second));
        assert_eq!(poller.tracked(), Some(second_key));

        first.load("https://first.example/").unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;

        let snapshot = poller.current().unwrap();
        assert_eq!(snapshot.session, second_key);
        assert_eq!(snapshot.url, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_untrack_only_matching_session() {
        let engine = MemoryEngine::new();
        let poller = NavigationPoller::new(Duration::from_millis(250)).unwrap();
        let session = SessionKey::tab(Uuid::new_v4());

        poller.track(session, view(&engine));
        assert!(!poller.untrack(&SessionKey::tab(Uuid::new_v4())));
        assert!(poller.untrack(&session));
        assert_eq!(poller.tracked(), None);
        assert_eq!(poller.current(), None);
        assert!(!poller.is_polling());
    }
}
