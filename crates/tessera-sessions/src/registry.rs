//! Session registry
//!
//! Owns every live session, keyed by the item it shows. Creation is lazy,
//! visibility is switched here, and sessions are destroyed only on explicit
//! removal.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use tessera_engine::{Engine, EngineEvent, EngineView, StorageDomain};
use tessera_items::{is_sentinel_url, Profile, SessionKey};
use tessera_navigation::NavigationPoller;
use tessera_privacy::StorageResolver;

use crate::dispatch::{EventSender, SessionEvent, SessionObserver};
use crate::interceptor::EventInterceptor;
use crate::session::{Session, SessionHandle, Visibility};
use crate::Result;

pub struct SessionRegistry {
    engine: Arc<dyn Engine>,
    resolver: StorageResolver,
    poller: Arc<NavigationPoller>,
    sessions: Arc<RwLock<HashMap<SessionKey, SessionHandle>>>,
    /// Key of the shown session
    current: Arc<RwLock<Option<SessionKey>>>,
    observers: Arc<RwLock<Vec<Arc<dyn SessionObserver>>>>,
    events: EventSender,
}

impl SessionRegistry {
    pub fn new(
        engine: Arc<dyn Engine>,
        resolver: StorageResolver,
        poller: Arc<NavigationPoller>,
        events: EventSender,
    ) -> Self {
        Self {
            engine,
            resolver,
            poller,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            current: Arc::new(RwLock::new(None)),
            observers: Arc::new(RwLock::new(Vec::new())),
            events,
        }
    }

    pub fn resolver(&self) -> &StorageResolver {
        &self.resolver
    }

    pub fn poller(&self) -> &Arc<NavigationPoller> {
        &self.poller
    }

    /// Session for `key`, created hidden on first request.
    ///
    /// An existing session is returned untouched: `initial_url` is only
    /// loaded by the call that creates the session, and never if it is the
    /// blank placeholder.
    pub fn get_or_create(
        &self,
        key: SessionKey,
        initial_url: &str,
        profile: Option<&Profile>,
    ) -> Result<SessionHandle> {
        if let Some(existing) = self.get(&key) {
            tracing::debug!(session_id = %key, "Reusing session");
            return Ok(existing);
        }

        let (view, domain) = self.build_view(key, profile)?;
        let subscription = view.subscribe(Arc::new(EventInterceptor::new(
            key,
            self.events.clone(),
        )));
        let session = Arc::new(Session::new(
            key,
            Arc::clone(&view),
            profile.cloned(),
            domain,
            subscription,
        ));
        view.set_visible(false);

        {
            let mut sessions = self.sessions.write();
            if let Some(existing) = sessions.get(&key) {
                // Lost a race with another creator; keep theirs
                let existing = Arc::clone(existing);
                drop(sessions);
                teardown(&session);
                return Ok(existing);
            }
            sessions.insert(key, Arc::clone(&session));
        }

        tracing::info!(
            session_id = %key,
            view = %view.id(),
            domain = %session.storage_domain(),
            "Created session"
        );

        if !is_sentinel_url(initial_url) {
            if let Err(e) = session.load(initial_url) {
                tracing::warn!(session_id = %key, url = %initial_url, error = %e, "Initial load failed");
            }
        }

        Ok(session)
    }

    /// Build a view in the profile's domain, falling back to the shared
    /// domain if the engine refuses the isolated one.
    fn build_view(
        &self,
        key: SessionKey,
        profile: Option<&Profile>,
    ) -> Result<(Arc<dyn EngineView>, StorageDomain)> {
        let domain = self.resolver.resolve(profile);

        match (self.engine.create_view(&domain), profile) {
            (Ok(view), Some(profile)) if domain.is_isolated() => {
                self.resolver.report_isolated(profile.id);
                Ok((view, domain))
            }
            (Ok(view), _) => Ok((view, domain)),
            (Err(e), Some(profile)) if domain.is_isolated() => {
                tracing::warn!(
                    session_id = %key,
                    domain = %domain,
                    error = %e,
                    "Could not build isolated view, retrying in shared storage"
                );
                let view = self.engine.create_view(&StorageDomain::Shared)?;
                self.resolver
                    .report_degraded(profile, format!("engine refused isolated view: {}", e));
                Ok((view, StorageDomain::Shared))
            }
            (Err(e), _) => {
                tracing::error!(session_id = %key, error = %e, "Engine could not build a view");
                Err(e.into())
            }
        }
    }

    /// Show `key`'s session and hide every other one. With an unknown key
    /// nothing is left visible.
    pub fn show(&self, key: &SessionKey) -> bool {
        let sessions = self.sessions.read();
        let target = sessions.get(key).cloned();

        for (other, session) in sessions.iter() {
            if other != key {
                session.set_visibility(Visibility::Hidden);
            }
        }
        drop(sessions);

        match target {
            Some(session) => {
                session.set_visibility(Visibility::Shown);
                *self.current.write() = Some(*key);
                self.poller.track(*key, Arc::clone(session.view()));
                tracing::debug!(session_id = %key, "Showing session");
                true
            }
            None => {
                *self.current.write() = None;
                self.poller.stop();
                tracing::debug!(session_id = %key, "No session to show");
                false
            }
        }
    }

    pub fn hide_all(&self) {
        for session in self.sessions.read().values() {
            session.set_visibility(Visibility::Hidden);
        }
        *self.current.write() = None;
        self.poller.stop();
    }

    pub fn current(&self) -> Option<SessionHandle> {
        let key = (*self.current.read())?;
        self.get(&key)
    }

    pub fn get(&self, key: &SessionKey) -> Option<SessionHandle> {
        self.sessions.read().get(key).cloned()
    }

    pub fn contains(&self, key: &SessionKey) -> bool {
        self.sessions.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    pub fn ids(&self) -> Vec<SessionKey> {
        self.sessions.read().keys().copied().collect()
    }

    /// Detach and drop `key`'s session. Removing an absent key is a no-op.
    pub fn remove(&self, key: &SessionKey) -> bool {
        let Some(session) = self.sessions.write().remove(key) else {
            return false;
        };

        {
            let mut current = self.current.write();
            if current.as_ref() == Some(key) {
                *current = None;
            }
        }
        self.poller.untrack(key);
        teardown(&session);

        tracing::info!(session_id = %key, "Removed session");
        true
    }

    /// Remove every session matching `predicate`, e.g. all sessions bound to
    /// a deleted profile. Returns the removed keys.
    pub fn remove_where<F>(&self, predicate: F) -> Vec<SessionKey>
    where
        F: Fn(&Session) -> bool,
    {
        let doomed: Vec<SessionKey> = self
            .sessions
            .read()
            .values()
            .filter(|session| predicate(session))
            .map(|session| session.key())
            .collect();

        doomed.into_iter().filter(|key| self.remove(key)).collect()
    }

    pub fn add_observer(&self, observer: Arc<dyn SessionObserver>) {
        self.observers.write().push(observer);
    }

    /// Deliver a forwarded event: session state first, then observers in
    /// the order they were added. Events from removed sessions are dropped.
    pub fn publish(&self, event: &SessionEvent) {
        let Some(session) = self.get(&event.key) else {
            tracing::trace!(
                session_id = %event.key,
                event = event.event.name(),
                "Dropping event from removed session"
            );
            return;
        };

        match &event.event {
            EngineEvent::NavigationFailed { url, reason } => {
                tracing::warn!(session_id = %event.key, url = %url, reason = %reason, "Navigation failed");
                session.record_failure(url, reason);
            }
            EngineEvent::NavigationFinished { .. } => session.clear_failure(),
            _ => {}
        }

        let observers: Vec<Arc<dyn SessionObserver>> =
            self.observers.read().iter().map(Arc::clone).collect();
        for observer in observers {
            observer.on_session_event(event);
        }
    }
}

fn teardown(session: &Session) {
    let view = session.view();
    view.unsubscribe(session.subscription());
    view.set_visible(false);
    view.detach();
}

impl Clone for SessionRegistry {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            resolver: self.resolver.clone(),
            poller: Arc::clone(&self.poller),
            sessions: Arc::clone(&self.sessions),
            current: Arc::clone(&self.current),
            observers: Arc::clone(&self.observers),
            events: self.events.clone(),
        }
    }
}
