//! In-process reference engine
//!
//! Models what the session layer can observe of a real engine: per-view
//! back/forward history, per-domain cookie jars keyed by origin, ordered
//! event delivery, a small script surface, and scripted failure modes
//! (engine unavailable, no isolation support, failing URLs, dropped events).

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::oneshot;
use url::Url;

use crate::domain::StorageDomain;
use crate::error::EngineError;
use crate::event::{
    EngineEvent, MediaKind, MediaPermissionRequest, PermissionDecision, PermissionResponder,
};
use crate::view::{ConsumerList, Engine, EngineView, EventConsumer, SubscriptionId, ViewId};
use crate::Result;

type ConsumerFactory = Arc<dyn Fn(ViewId) -> Arc<dyn EventConsumer> + Send + Sync>;

/// origin -> cookie name -> value
type CookieJar = HashMap<String, BTreeMap<String, String>>;

#[derive(Debug, Clone)]
pub struct MemoryEngineConfig {
    /// `create_view` fails for every domain
    pub unavailable: bool,
    /// `create_view` fails for isolated domains only
    pub isolated_views_fail: bool,
    /// Persistent per-identifier domains are supported
    pub isolation_supported: bool,
}

impl Default for MemoryEngineConfig {
    fn default() -> Self {
        Self {
            unavailable: false,
            isolated_views_fail: false,
            isolation_supported: true,
        }
    }
}

/// A navigation the engine performed, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRecord {
    pub view: ViewId,
    pub url: String,
}

struct EngineState {
    config: RwLock<MemoryEngineConfig>,
    next_view: AtomicU64,
    views: RwLock<Vec<Weak<MemoryView>>>,
    jars: RwLock<HashMap<String, CookieJar>>,
    provisioned: RwLock<HashSet<String>>,
    provision_log: RwLock<Vec<String>>,
    load_log: RwLock<Vec<LoadRecord>>,
    titles: RwLock<HashMap<String, String>>,
    favicons: RwLock<HashMap<String, Vec<u8>>>,
    failing_urls: RwLock<HashSet<String>>,
    events_suppressed: AtomicBool,
    primary_consumer: RwLock<Option<ConsumerFactory>>,
}

/// Headless engine double. Cloning shares state.
#[derive(Clone)]
pub struct MemoryEngine {
    state: Arc<EngineState>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::with_config(MemoryEngineConfig::default())
    }

    pub fn with_config(config: MemoryEngineConfig) -> Self {
        Self {
            state: Arc::new(EngineState {
                config: RwLock::new(config),
                next_view: AtomicU64::new(1),
                views: RwLock::new(Vec::new()),
                jars: RwLock::new(HashMap::new()),
                provisioned: RwLock::new(HashSet::new()),
                provision_log: RwLock::new(Vec::new()),
                load_log: RwLock::new(Vec::new()),
                titles: RwLock::new(HashMap::new()),
                favicons: RwLock::new(HashMap::new()),
                failing_urls: RwLock::new(HashSet::new()),
                events_suppressed: AtomicBool::new(false),
                primary_consumer: RwLock::new(None),
            }),
        }
    }

    pub fn set_config(&self, config: MemoryEngineConfig) {
        *self.state.config.write() = config;
    }

    /// Install the consumer every new view starts with, ahead of any
    /// subscriber added later.
    pub fn set_primary_consumer<F>(&self, factory: F)
    where
        F: Fn(ViewId) -> Arc<dyn EventConsumer> + Send + Sync + 'static,
    {
        *self.state.primary_consumer.write() = Some(Arc::new(factory));
    }

    /// Title pages at `url` report once loaded
    pub fn set_page_title(&self, url: &str, title: &str) {
        self.state
            .titles
            .write()
            .insert(url.to_string(), title.to_string());
    }

    pub fn set_page_favicon(&self, url: &str, bytes: Vec<u8>) {
        self.state.favicons.write().insert(url.to_string(), bytes);
    }

    /// Loads of `url` end in `NavigationFailed`
    pub fn fail_url(&self, url: &str) {
        self.state.failing_urls.write().insert(url.to_string());
    }

    /// Drop every event instead of delivering it, like an engine that does
    /// not report some transitions.
    pub fn suppress_events(&self, suppressed: bool) {
        self.state
            .events_suppressed
            .store(suppressed, Ordering::SeqCst);
    }

    pub fn view(&self, id: ViewId) -> Option<Arc<MemoryView>> {
        self.state
            .views
            .read()
            .iter()
            .filter_map(Weak::upgrade)
            .find(|view| view.id == id)
    }

    /// Views still alive, oldest first
    pub fn live_views(&self) -> Vec<Arc<MemoryView>> {
        self.state
            .views
            .read()
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|view| !view.detached.load(Ordering::SeqCst))
            .collect()
    }

    pub fn load_log(&self) -> Vec<LoadRecord> {
        self.state.load_log.read().clone()
    }

    pub fn loads_for(&self, view: ViewId) -> Vec<String> {
        self.state
            .load_log
            .read()
            .iter()
            .filter(|record| record.view == view)
            .map(|record| record.url.clone())
            .collect()
    }

    /// Identifiers in the order they were provisioned
    pub fn provision_log(&self) -> Vec<String> {
        self.state.provision_log.read().clone()
    }

    pub fn is_provisioned(&self, identifier: &str) -> bool {
        self.state.provisioned.read().contains(identifier)
    }

    /// Cookies visible to `origin` inside `domain`
    pub fn cookies(&self, domain: &StorageDomain, origin: &str) -> BTreeMap<String, String> {
        self.state
            .jars
            .read()
            .get(domain.identifier())
            .and_then(|jar| jar.get(origin))
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for MemoryEngine {
    fn name(&self) -> &str {
        "memory"
    }

    fn create_view(&self, domain: &StorageDomain) -> Result<Arc<dyn EngineView>> {
        let config = self.state.config.read().clone();
        if config.unavailable {
            return Err(EngineError::Unavailable("memory engine disabled".to_string()));
        }

        if domain.is_isolated() {
            if config.isolated_views_fail {
                return Err(EngineError::Unavailable(format!(
                    "cannot build view in {}",
                    domain
                )));
            }
            if !config.isolation_supported {
                return Err(EngineError::IsolationUnsupported(
                    domain.identifier().to_string(),
                ));
            }
            if !self.is_provisioned(domain.identifier()) {
                tracing::debug!(domain = %domain, "Provisioning domain on first view");
                self.provision_domain(domain)?;
            }
        }

        let id = ViewId(self.state.next_view.fetch_add(1, Ordering::Relaxed));
        let view = Arc::new(MemoryView {
            id,
            domain: domain.clone(),
            engine: Arc::clone(&self.state),
            history: RwLock::new(History::default()),
            title: RwLock::new(None),
            visible: AtomicBool::new(false),
            detached: AtomicBool::new(false),
            consumers: ConsumerList::new(),
        });

        if let Some(factory) = self.state.primary_consumer.read().as_ref() {
            view.consumers.subscribe(factory(id));
        }

        {
            let mut views = self.state.views.write();
            views.retain(|view| view.strong_count() > 0);
            views.push(Arc::downgrade(&view));
        }
        tracing::debug!(view = %id, domain = %domain, "Created memory view");

        Ok(view)
    }

    fn supports_persistent_isolation(&self) -> bool {
        self.state.config.read().isolation_supported
    }

    fn provision_domain(&self, domain: &StorageDomain) -> Result<()> {
        if !domain.is_isolated() {
            return Ok(());
        }
        if !self.supports_persistent_isolation() {
            return Err(EngineError::IsolationUnsupported(
                domain.identifier().to_string(),
            ));
        }

        let identifier = domain.identifier().to_string();
        if self.state.provisioned.write().insert(identifier.clone()) {
            self.state.provision_log.write().push(identifier.clone());
            self.state.jars.write().entry(identifier).or_default();
        }
        Ok(())
    }

    fn remove_domain(&self, domain: &StorageDomain) -> Result<()> {
        let identifier = domain.identifier();
        self.state.provisioned.write().remove(identifier);
        self.state.jars.write().remove(identifier);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct History {
    entries: Vec<String>,
    index: Option<usize>,
}

impl History {
    fn current(&self) -> Option<&String> {
        self.index.and_then(|i| self.entries.get(i))
    }

    fn push(&mut self, url: String) {
        let keep = self.index.map(|i| i + 1).unwrap_or(0);
        self.entries.truncate(keep);
        self.entries.push(url);
        self.index = Some(self.entries.len() - 1);
    }

    fn can_go_back(&self) -> bool {
        matches!(self.index, Some(i) if i > 0)
    }

    fn can_go_forward(&self) -> bool {
        matches!(self.index, Some(i) if i + 1 < self.entries.len())
    }
}

pub struct MemoryView {
    id: ViewId,
    domain: StorageDomain,
    engine: Arc<EngineState>,
    history: RwLock<History>,
    title: RwLock<Option<String>>,
    visible: AtomicBool,
    detached: AtomicBool,
    consumers: ConsumerList,
}

impl MemoryView {
    fn emit(&self, event: EngineEvent) {
        if self.detached.load(Ordering::SeqCst)
            || self.engine.events_suppressed.load(Ordering::SeqCst)
        {
            return;
        }
        self.consumers.emit(&event);
    }

    fn ensure_attached(&self) -> Result<()> {
        if self.detached.load(Ordering::SeqCst) {
            Err(EngineError::Detached)
        } else {
            Ok(())
        }
    }

    fn current_origin(&self) -> Option<String> {
        let url = self.history.read().current().cloned()?;
        let parsed = Url::parse(&url).ok()?;
        let origin = parsed.origin();
        origin.is_tuple().then(|| origin.ascii_serialization())
    }

    fn title_for(&self, url: &str) -> String {
        if let Some(title) = self.engine.titles.read().get(url) {
            return title.clone();
        }
        Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default()
    }

    /// Everything after a navigation commits: URL, finish, title, favicon
    fn commit(&self, url: &str) {
        self.engine.load_log.write().push(LoadRecord {
            view: self.id,
            url: url.to_string(),
        });

        let title = self.title_for(url);
        *self.title.write() = Some(title.clone());

        self.emit(EngineEvent::UrlChanged(url.to_string()));
        self.emit(EngineEvent::NavigationFinished {
            url: url.to_string(),
        });
        self.emit(EngineEvent::TitleChanged(title));

        let favicon = self.engine.favicons.read().get(url).cloned();
        if let Some(bytes) = favicon {
            self.emit(EngineEvent::FaviconChanged(bytes));
        }
    }

    /// Ask the embedder for camera/microphone access, as a page would
    pub fn request_media_permission(
        &self,
        kinds: Vec<MediaKind>,
    ) -> Result<oneshot::Receiver<PermissionDecision>> {
        self.ensure_attached()?;
        let origin = self
            .current_origin()
            .ok_or_else(|| EngineError::Script("SecurityError: opaque origin".to_string()))?;

        let (responder, rx) = PermissionResponder::new();
        self.emit(EngineEvent::MediaPermissionRequested(MediaPermissionRequest {
            origin,
            kinds,
            responder,
        }));
        Ok(rx)
    }

    pub fn subscriber_count(&self) -> usize {
        self.consumers.len()
    }

    fn cookie_header(&self, origin: &str) -> String {
        let jars = self.engine.jars.read();
        jars.get(self.domain.identifier())
            .and_then(|jar| jar.get(origin))
            .map(|cookies| {
                cookies
                    .iter()
                    .map(|(name, value)| format!("{}={}", name, value))
                    .collect::<Vec<_>>()
                    .join("; ")
            })
            .unwrap_or_default()
    }

    fn set_cookie(&self, origin: &str, assignment: &str) -> Result<String> {
        let pair = assignment.split(';').next().unwrap_or_default();
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| EngineError::Script(format!("malformed cookie: {}", assignment)))?;

        self.engine
            .jars
            .write()
            .entry(self.domain.identifier().to_string())
            .or_default()
            .entry(origin.to_string())
            .or_default()
            .insert(name.trim().to_string(), value.trim().to_string());

        Ok(pair.trim().to_string())
    }
}

/// Strip one layer of matching quotes
fn unquote(literal: &str) -> Option<&str> {
    let literal = literal.trim();
    let first = literal.chars().next()?;
    if (first == '"' || first == '\'') && literal.len() >= 2 && literal.ends_with(first) {
        Some(&literal[1..literal.len() - 1])
    } else {
        None
    }
}

impl EngineView for MemoryView {
    fn id(&self) -> ViewId {
        self.id
    }

    fn load(&self, url: &str) -> Result<()> {
        self.ensure_attached()?;
        self.emit(EngineEvent::NavigationStarted {
            url: url.to_string(),
        });

        if self.engine.failing_urls.read().contains(url) {
            self.emit(EngineEvent::NavigationFailed {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
            return Ok(());
        }

        self.history.write().push(url.to_string());
        self.commit(url);
        Ok(())
    }

    fn go_back(&self) -> Result<()> {
        self.ensure_attached()?;
        let url = {
            let mut history = self.history.write();
            if !history.can_go_back() {
                return Err(EngineError::NoHistory("back"));
            }
            history.index = history.index.map(|i| i - 1);
            history.current().cloned()
        };

        if let Some(url) = url {
            self.commit(&url);
        }
        Ok(())
    }

    fn go_forward(&self) -> Result<()> {
        self.ensure_attached()?;
        let url = {
            let mut history = self.history.write();
            if !history.can_go_forward() {
                return Err(EngineError::NoHistory("forward"));
            }
            history.index = history.index.map(|i| i + 1);
            history.current().cloned()
        };

        if let Some(url) = url {
            self.commit(&url);
        }
        Ok(())
    }

    fn reload(&self) -> Result<()> {
        self.ensure_attached()?;
        let current = self.history.read().current().cloned();
        if let Some(url) = current {
            self.emit(EngineEvent::NavigationStarted { url: url.clone() });
            self.commit(&url);
        }
        Ok(())
    }

    fn can_go_back(&self) -> bool {
        self.history.read().can_go_back()
    }

    fn can_go_forward(&self) -> bool {
        self.history.read().can_go_forward()
    }

    fn current_url(&self) -> Option<String> {
        self.history.read().current().cloned()
    }

    fn title(&self) -> Option<String> {
        self.title.read().clone()
    }

    fn evaluate_script(&self, code: &str) -> Result<serde_json::Value> {
        self.ensure_attached()?;
        let code = code.trim().trim_end_matches(';').trim();

        match code {
            "location.href" => {
                return Ok(self
                    .current_url()
                    .map(serde_json::Value::String)
                    .unwrap_or(serde_json::Value::Null))
            }
            "document.title" => {
                return Ok(serde_json::Value::String(
                    self.title().unwrap_or_default(),
                ))
            }
            "history.length" => {
                return Ok(serde_json::Value::from(self.history.read().entries.len()))
            }
            _ => {}
        }

        if code == "document.cookie" {
            let origin = self.current_origin().ok_or_else(|| {
                EngineError::Script("SecurityError: cookies unavailable on opaque origin".into())
            })?;
            return Ok(serde_json::Value::String(self.cookie_header(&origin)));
        }

        if let Some(rhs) = code.strip_prefix("document.cookie") {
            if let Some(literal) = rhs.trim_start().strip_prefix('=') {
                let origin = self.current_origin().ok_or_else(|| {
                    EngineError::Script(
                        "SecurityError: cookies unavailable on opaque origin".into(),
                    )
                })?;
                let assignment = unquote(literal).ok_or_else(|| {
                    EngineError::Script(format!("SyntaxError: expected string in {}", code))
                })?;
                return self
                    .set_cookie(&origin, assignment)
                    .map(serde_json::Value::String);
            }
        }

        Err(EngineError::Script(format!(
            "ReferenceError: unsupported expression `{}`",
            code
        )))
    }

    fn subscribe(&self, consumer: Arc<dyn EventConsumer>) -> SubscriptionId {
        self.consumers.subscribe(consumer)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.consumers.unsubscribe(id)
    }

    fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
    }

    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    fn storage_domain(&self) -> &StorageDomain {
        &self.domain
    }

    fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
        self.visible.store(false, Ordering::SeqCst);
        self.consumers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn isolated(name: &str) -> StorageDomain {
        StorageDomain::isolated(name, format!("/tmp/partitions/{}", name))
    }

    fn recorder(view: &Arc<dyn EngineView>) -> Arc<Mutex<Vec<&'static str>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        view.subscribe(Arc::new(move |event: &EngineEvent| {
            sink.lock().push(event.name())
        }));
        seen
    }

    #[test]
    fn test_history_navigation() {
        let engine = MemoryEngine::new();
        let view = engine.create_view(&StorageDomain::Shared).unwrap();

        assert!(!view.can_go_back());
        view.load("https://a.example/").unwrap();
        view.load("https://b.example/").unwrap();
        assert!(view.can_go_back());
        assert!(!view.can_go_forward());

        view.go_back().unwrap();
        assert_eq!(view.current_url().as_deref(), Some("https://a.example/"));
        assert!(view.can_go_forward());

        // A new load drops the forward entries
        view.load("https://c.example/").unwrap();
        assert!(!view.can_go_forward());
        assert_eq!(
            view.evaluate_script("history.length").unwrap(),
            serde_json::json!(2)
        );

        assert_eq!(view.go_forward(), Err(EngineError::NoHistory("forward")));
    }

    #[test]
    fn test_event_sequence_for_load() {
        let engine = MemoryEngine::new();
        let view = engine.create_view(&StorageDomain::Shared).unwrap();
        let seen = recorder(&view);

        view.load("https://example.com/").unwrap();
        assert_eq!(
            *seen.lock(),
            vec![
                "navigation-started",
                "url-changed",
                "navigation-finished",
                "title-changed"
            ]
        );
    }

    #[test]
    fn test_failing_url_reports_failure() {
        let engine = MemoryEngine::new();
        engine.fail_url("https://down.example/");
        let view = engine.create_view(&StorageDomain::Shared).unwrap();
        let seen = recorder(&view);

        view.load("https://down.example/").unwrap();
        assert_eq!(*seen.lock(), vec!["navigation-started", "navigation-failed"]);
        assert_eq!(view.current_url(), None);
    }

    #[test]
    fn test_primary_consumer_runs_first() {
        let engine = MemoryEngine::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let primary_seen = Arc::clone(&seen);
        engine.set_primary_consumer(move |_| {
            let seen = Arc::clone(&primary_seen);
            let consumer: Arc<dyn EventConsumer> =
                Arc::new(move |_: &EngineEvent| seen.lock().push("primary"));
            consumer
        });

        let view = engine.create_view(&StorageDomain::Shared).unwrap();
        let later = Arc::clone(&seen);
        view.subscribe(Arc::new(move |_: &EngineEvent| later.lock().push("later")));

        view.evaluate_script("location.href").unwrap();
        view.load("https://example.com/").unwrap();
        let seen = seen.lock();
        assert_eq!(seen[0], "primary");
        assert_eq!(seen[1], "later");
    }

    #[test]
    fn test_cookies_are_per_domain() {
        let engine = MemoryEngine::new();
        let work = engine.create_view(&isolated("work")).unwrap();
        let home = engine.create_view(&isolated("home")).unwrap();

        work.load("https://site.example/").unwrap();
        home.load("https://site.example/").unwrap();

        work.evaluate_script("document.cookie = 'sid=work-123; path=/'")
            .unwrap();

        assert_eq!(
            work.evaluate_script("document.cookie").unwrap(),
            serde_json::json!("sid=work-123")
        );
        assert_eq!(
            home.evaluate_script("document.cookie").unwrap(),
            serde_json::json!("")
        );
        assert!(engine
            .cookies(&isolated("home"), "https://site.example")
            .is_empty());
    }

    #[test]
    fn test_shared_domain_shares_cookies() {
        let engine = MemoryEngine::new();
        let a = engine.create_view(&StorageDomain::Shared).unwrap();
        let b = engine.create_view(&StorageDomain::Shared).unwrap();
        a.load("https://site.example/").unwrap();
        b.load("https://site.example/").unwrap();

        a.evaluate_script("document.cookie = \"k=v\"").unwrap();
        assert_eq!(
            b.evaluate_script("document.cookie").unwrap(),
            serde_json::json!("k=v")
        );
    }

    #[test]
    fn test_script_errors() {
        let engine = MemoryEngine::new();
        let view = engine.create_view(&StorageDomain::Shared).unwrap();

        assert!(matches!(
            view.evaluate_script("document.cookie"),
            Err(EngineError::Script(_))
        ));
        assert!(matches!(
            view.evaluate_script("window.alert(1)"),
            Err(EngineError::Script(_))
        ));
    }

    #[test]
    fn test_isolation_unsupported() {
        let engine = MemoryEngine::with_config(MemoryEngineConfig {
            isolation_supported: false,
            ..Default::default()
        });

        assert!(matches!(
            engine.create_view(&isolated("work")),
            Err(EngineError::IsolationUnsupported(_))
        ));
        assert!(engine.create_view(&StorageDomain::Shared).is_ok());
    }

    #[test]
    fn test_unavailable_engine() {
        let engine = MemoryEngine::with_config(MemoryEngineConfig {
            unavailable: true,
            ..Default::default()
        });
        assert!(matches!(
            engine.create_view(&StorageDomain::Shared),
            Err(EngineError::Unavailable(_))
        ));
    }

    #[test]
    fn test_provision_once() {
        let engine = MemoryEngine::new();
        engine.provision_domain(&isolated("work")).unwrap();
        engine.provision_domain(&isolated("work")).unwrap();
        engine.create_view(&isolated("work")).unwrap();

        assert_eq!(engine.provision_log(), vec!["work".to_string()]);
    }

    #[test]
    fn test_detach_stops_events_and_navigation() {
        let engine = MemoryEngine::new();
        let view = engine.create_view(&StorageDomain::Shared).unwrap();
        let seen = recorder(&view);

        view.detach();
        assert_eq!(view.load("https://example.com/"), Err(EngineError::Detached));
        assert!(seen.lock().is_empty());
        assert!(engine.live_views().is_empty());
    }

    #[test]
    fn test_dropped_views_pruned() {
        let engine = MemoryEngine::new();
        for _ in 0..3 {
            drop(engine.create_view(&StorageDomain::Shared).unwrap());
        }
        let kept = engine.create_view(&StorageDomain::Shared).unwrap();

        assert_eq!(engine.state.views.read().len(), 1);
        assert!(engine.view(kept.id()).is_some());
    }

    #[test]
    fn test_suppressed_events_still_navigate() {
        let engine = MemoryEngine::new();
        let view = engine.create_view(&StorageDomain::Shared).unwrap();
        let seen = recorder(&view);

        engine.suppress_events(true);
        view.load("https://example.com/").unwrap();

        assert!(seen.lock().is_empty());
        assert_eq!(view.current_url().as_deref(), Some("https://example.com/"));
    }

    #[tokio::test]
    async fn test_media_permission_request() {
        let engine = MemoryEngine::new();
        let view = engine.create_view(&StorageDomain::Shared).unwrap();
        view.subscribe(Arc::new(|event: &EngineEvent| {
            if let EngineEvent::MediaPermissionRequested(request) = event {
                request.responder.respond(PermissionDecision::Deny);
            }
        }));
        view.load("https://meet.example/").unwrap();

        let memory_view = engine.view(view.id()).unwrap();
        let rx = memory_view
            .request_media_permission(vec![MediaKind::Camera])
            .unwrap();
        assert_eq!(rx.await.unwrap(), PermissionDecision::Deny);
    }
}
