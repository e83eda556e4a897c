//! Main shell state container
//!
//! Built once at startup and handed to the presentation layer. Owns the
//! registry and everything it feeds; nothing here is global.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use tessera_engine::Engine;
use tessera_items::{EntityStore, Item, ItemKind, Profile, SessionKey};
use tessera_navigation::{NavigationPoller, NavigationSnapshot, UrlRecovery};
use tessera_privacy::{IsolationNotice, MediaAuthorizer, MediaPermissionBroker, StorageResolver};
use tessera_sessions::{
    ui_channel, PersistenceBridge, SessionHandle, SessionObserver, SessionRegistry, UiLoop,
};
use tessera_storage::{Database, SqliteStore};

use crate::config::Config;
use crate::error::CoreError;
use crate::Result;

pub struct Shell {
    config: Config,
    store: Arc<dyn EntityStore>,
    registry: SessionRegistry,
    bridge: PersistenceBridge,
    recovery: UrlRecovery,
    broker: Arc<MediaPermissionBroker>,
    /// Taken by `run_event_loop`; until then events are delivered by
    /// `pump_events`
    ui: Mutex<Option<UiLoop>>,
}

impl Shell {
    /// Open the database named by `config` and build the shell on it
    pub fn open(
        config: Config,
        engine: Arc<dyn Engine>,
        authorizer: Arc<dyn MediaAuthorizer>,
    ) -> Result<Self> {
        let db = Database::open(&config.database_path)?;
        let store: Arc<dyn EntityStore> = Arc::new(SqliteStore::new(db));
        Self::new(config, engine, store, authorizer)
    }

    pub fn new(
        config: Config,
        engine: Arc<dyn Engine>,
        store: Arc<dyn EntityStore>,
        authorizer: Arc<dyn MediaAuthorizer>,
    ) -> Result<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.partition_root)?;

        let recovery = UrlRecovery::with_fallback(&config.fallback_homepage)?;
        let poller = Arc::new(NavigationPoller::new(config.poll_interval())?);
        let resolver = StorageResolver::new(Arc::clone(&engine), config.partition_root.clone());
        let (events, ui) = ui_channel();
        let registry = SessionRegistry::new(engine, resolver, poller, events);

        let bridge = PersistenceBridge::new(Arc::clone(&store));
        let broker = Arc::new(MediaPermissionBroker::new(authorizer));
        registry.add_observer(Arc::new(bridge.clone()));
        registry.add_observer(Arc::clone(&broker) as Arc<dyn SessionObserver>);

        tracing::info!(
            data_dir = %config.data_dir.display(),
            poll_interval_ms = config.poll_interval_ms,
            "Shell initialized"
        );

        Ok(Self {
            config,
            store,
            registry,
            bridge,
            recovery,
            broker,
            ui: Mutex::new(Some(ui)),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn resolver(&self) -> &StorageResolver {
        self.registry.resolver()
    }

    pub fn broker(&self) -> &Arc<MediaPermissionBroker> {
        &self.broker
    }

    // === Presentation API ===

    pub fn get_or_create_web_view(
        &self,
        id: &str,
        url: &str,
        profile: Option<&Profile>,
    ) -> Result<SessionHandle> {
        let key: SessionKey = id.parse()?;
        Ok(self.registry.get_or_create(key, url, profile)?)
    }

    pub fn show_web_view(&self, id: &str) -> Result<bool> {
        let key: SessionKey = id.parse()?;
        Ok(self.registry.show(&key))
    }

    pub fn current_web_view(&self) -> Option<SessionHandle> {
        self.registry.current()
    }

    pub fn remove_web_view(&self, id: &str) -> Result<bool> {
        let key: SessionKey = id.parse()?;
        Ok(self.registry.remove(&key))
    }

    // === Item operations ===

    /// Load an item, repairing a placeholder URL from its title. The repair
    /// is written back in the background.
    pub fn resolve_item(&self, key: &SessionKey) -> Result<Item> {
        let item = self.load_item(key)?;

        match self.recovery.recover(&item) {
            Some(repaired) => {
                let _ = self
                    .bridge
                    .persist_recovered(*key, repaired.url().to_string());
                Ok(repaired)
            }
            None => Ok(item),
        }
    }

    fn load_item(&self, key: &SessionKey) -> Result<Item> {
        self.store
            .load_item(key)?
            .ok_or_else(|| CoreError::NotFound(key.to_string()))
    }

    /// What happens when the user clicks an item: make sure it has a
    /// session, in its profile's storage, and show it.
    pub fn select_item(&self, key: &SessionKey) -> Result<SessionHandle> {
        let item = self.resolve_item(key)?;
        let profile = self.store.profile_for(&item)?;

        let session = self
            .registry
            .get_or_create(*key, item.url(), profile.as_ref())?;
        self.registry.show(key);

        Ok(session)
    }

    /// Close the item's session and delete the item
    pub fn close_item(&self, key: &SessionKey) -> Result<()> {
        self.registry.remove(key);
        self.store.delete_item(key)?;
        tracing::info!(session_id = %key, "Closed item");
        Ok(())
    }

    /// Replace a tab by a bookmark with the same page. The tab's session
    /// is torn down; the bookmark gets its own on selection.
    pub fn convert_tab_to_bookmark(&self, key: &SessionKey) -> Result<Item> {
        if key.kind != ItemKind::Tab {
            return Err(CoreError::NotATab(key.to_string()));
        }

        // The repaired URL goes into the bookmark; the tab row is about to go
        let item = self.load_item(key)?;
        let Item::Tab(tab) = self.recovery.recover(&item).unwrap_or(item) else {
            return Err(CoreError::NotATab(key.to_string()));
        };

        let bookmark = Item::Bookmark(tab.to_bookmark()?);
        self.store.replace_item(key, &bookmark)?;
        self.registry.remove(key);

        tracing::info!(tab = %key, bookmark = %bookmark.key(), "Converted tab to bookmark");
        Ok(bookmark)
    }

    /// Delete a profile, tear down every session isolated under it and
    /// remove its storage partition. Returns the closed sessions.
    pub fn delete_profile(&self, profile_id: Uuid) -> Result<Vec<SessionKey>> {
        let closed = self
            .registry
            .remove_where(|session| session.profile().map(|p| p.id) == Some(profile_id));

        self.store.delete_profile(profile_id)?;
        self.resolver().purge(profile_id)?;

        tracing::info!(
            profile_id = %profile_id,
            closed_sessions = closed.len(),
            "Deleted profile"
        );
        Ok(closed)
    }

    // === Events ===

    pub fn navigation_updates(&self) -> watch::Receiver<Option<NavigationSnapshot>> {
        self.registry.poller().subscribe()
    }

    pub fn isolation_notices(&self) -> broadcast::Receiver<IsolationNotice> {
        self.resolver().subscribe_notices()
    }

    /// Deliver queued engine events now. Returns 0 once the event loop
    /// has been started.
    pub fn pump_events(&self) -> usize {
        match self.ui.lock().as_mut() {
            Some(ui) => ui.drain(&self.registry),
            None => 0,
        }
    }

    /// Hand event delivery to a task on the current runtime. Returns `None`
    /// if it is already running or there is no runtime.
    pub fn run_event_loop(&self) -> Option<JoinHandle<()>> {
        let runtime = tokio::runtime::Handle::try_current().ok()?;
        let ui = self.ui.lock().take()?;
        Some(runtime.spawn(ui.run(self.registry.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_engine::memory::MemoryEngine;
    use tessera_engine::{EngineView, MediaKind, PermissionDecision, StorageDomain};
    use tessera_items::{PinnedTab, Space, Tab};
    use tessera_privacy::StaticAuthorizer;

    struct Fixture {
        engine: MemoryEngine,
        shell: Shell,
        store: SqliteStore,
        space: Space,
        _dir: tempfile::TempDir,
    }

    fn fixture_with(decision: PermissionDecision) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let engine = MemoryEngine::new();
        let store = SqliteStore::new(Database::open_in_memory().unwrap());
        let space = Space::new("Main", None);
        store.save_space(&space).unwrap();

        let shell = Shell::new(
            Config::new(dir.path().to_path_buf()),
            Arc::new(engine.clone()),
            Arc::new(store.clone()),
            Arc::new(StaticAuthorizer(decision)),
        )
        .unwrap();

        Fixture {
            engine,
            shell,
            store,
            space,
            _dir: dir,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(PermissionDecision::Deny)
    }

    fn saved_tab(f: &Fixture, url: &str, title: &str) -> SessionKey {
        let mut tab = Tab::new(f.space.id, url.to_string());
        tab.title = title.to_string();
        let item = Item::Tab(tab);
        f.store.save(&item).unwrap();
        item.key()
    }

    #[test]
    fn test_recovered_url_loaded_and_persisted() {
        let f = fixture();
        let key = saved_tab(&f, "about:blank", "YouTube - funny cat compilation");

        let session = f.shell.select_item(&key).unwrap();

        assert_eq!(
            f.engine.loads_for(session.view().id()),
            vec!["https://www.youtube.com".to_string()]
        );
        // No runtime in this test, so the repair was written inline
        assert_eq!(
            f.store.load_item(&key).unwrap().unwrap().url(),
            "https://www.youtube.com"
        );
    }

    #[test]
    fn test_generic_blank_item_stays_blank() {
        let f = fixture();
        let key = saved_tab(&f, "about:blank", "New Tab");

        let session = f.shell.select_item(&key).unwrap();

        assert!(f.engine.loads_for(session.view().id()).is_empty());
        assert_eq!(f.store.load_item(&key).unwrap().unwrap().url(), "about:blank");
    }

    #[test]
    fn test_select_shows_and_reuses() {
        let f = fixture();
        let a = saved_tab(&f, "https://a.example/", "A");
        let b = saved_tab(&f, "https://b.example/", "B");

        let first = f.shell.select_item(&a).unwrap();
        f.shell.select_item(&b).unwrap();
        let again = f.shell.select_item(&a).unwrap();

        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(f.shell.current_web_view().unwrap().key(), a);
        assert_eq!(f.engine.loads_for(first.view().id()).len(), 1);
        assert!(!f.shell.registry().get(&b).unwrap().is_shown());
    }

    #[test]
    fn test_presentation_api_by_string_id() {
        let f = fixture();
        let key = SessionKey::tab(Uuid::new_v4());
        let id = key.to_string();

        let session = f
            .shell
            .get_or_create_web_view(&id, "https://a.example/", None)
            .unwrap();
        assert!(f.shell.show_web_view(&id).unwrap());
        assert!(Arc::ptr_eq(&f.shell.current_web_view().unwrap(), &session));
        assert!(f.shell.remove_web_view(&id).unwrap());
        assert!(!f.shell.remove_web_view(&id).unwrap());

        assert!(matches!(
            f.shell.show_web_view("window-1"),
            Err(CoreError::Item(_))
        ));
    }

    #[test]
    fn test_events_persisted_through_pump() {
        let f = fixture();
        f.engine.set_page_title("https://a.example/", "Example A");
        f.engine.set_page_favicon("https://a.example/", vec![9, 9]);
        let key = saved_tab(&f, "https://a.example/", "");

        let session = f.shell.select_item(&key).unwrap();
        session.load("about:blank").unwrap();
        assert!(f.shell.pump_events() > 0);

        let stored = f.store.load_item(&key).unwrap().unwrap();
        assert_eq!(stored.title(), "Example A");
        assert_eq!(stored.favicon(), Some(&[9u8, 9][..]));
        assert_eq!(stored.url(), "https://a.example/");
    }

    #[test]
    fn test_close_item() {
        let f = fixture();
        let key = saved_tab(&f, "https://a.example/", "A");
        f.shell.select_item(&key).unwrap();

        f.shell.close_item(&key).unwrap();

        assert!(f.shell.registry().get(&key).is_none());
        assert!(f.store.load_item(&key).unwrap().is_none());
        assert!(matches!(f.shell.select_item(&key), Err(CoreError::NotFound(_))));
    }

    #[test]
    fn test_convert_tab_to_bookmark() {
        let f = fixture();
        let key = saved_tab(&f, "https://a.example/", "A");
        f.shell.select_item(&key).unwrap();

        let bookmark = f.shell.convert_tab_to_bookmark(&key).unwrap();

        assert_eq!(bookmark.kind(), ItemKind::Bookmark);
        assert_eq!(bookmark.url(), "https://a.example/");
        assert!(f.shell.registry().get(&key).is_none());
        assert!(f.store.load_item(&key).unwrap().is_none());
        assert!(f.store.load_item(&bookmark.key()).unwrap().is_some());

        assert!(matches!(
            f.shell.convert_tab_to_bookmark(&bookmark.key()),
            Err(CoreError::NotATab(_))
        ));
    }

    #[test]
    fn test_delete_profile_tears_down_sessions() {
        let f = fixture();
        let profile = Profile::new("Work", "#3366ff");
        f.store.save_profile(&profile).unwrap();
        let pinned = Item::PinnedTab(PinnedTab::new(
            Some(profile.id),
            "Mail".into(),
            "https://mail.example/".into(),
        ));
        f.store.save(&pinned).unwrap();
        let shared = saved_tab(&f, "https://a.example/", "A");

        let session = f.shell.select_item(&pinned.key()).unwrap();
        f.shell.select_item(&shared).unwrap();
        let partition = f.shell.config().partition_root.join(profile.storage_identifier());
        assert!(session.storage_domain().is_isolated());
        assert!(partition.exists());

        let closed = f.shell.delete_profile(profile.id).unwrap();

        assert_eq!(closed, vec![pinned.key()]);
        assert!(f.shell.registry().contains(&shared));
        assert!(!partition.exists());
        assert!(f.store.load_item(&pinned.key()).unwrap().is_none());
    }

    #[test]
    fn test_space_profile_isolates_tabs() {
        let f = fixture();
        let profile = Profile::new("Work", "#3366ff");
        f.store.save_profile(&profile).unwrap();
        let space = Space::new("Work space", Some(profile.id));
        f.store.save_space(&space).unwrap();
        let tab = Item::Tab(Tab::new(space.id, "https://a.example/".into()));
        f.store.save(&tab).unwrap();

        let session = f.shell.select_item(&tab.key()).unwrap();

        assert_eq!(
            session.storage_domain().identifier(),
            profile.storage_identifier()
        );
        assert_ne!(session.storage_domain(), &StorageDomain::Shared);
    }

    /// Store whose URL updates land late, after the caller has moved on
    struct SlowUrlStore {
        inner: SqliteStore,
        url_updates: std::sync::atomic::AtomicUsize,
    }

    impl EntityStore for SlowUrlStore {
        fn load_items(
            &self,
            kind: ItemKind,
            scope: tessera_items::ItemScope,
        ) -> tessera_items::Result<Vec<Item>> {
            self.inner.load_items(kind, scope)
        }

        fn load_item(&self, key: &SessionKey) -> tessera_items::Result<Option<Item>> {
            self.inner.load_item(key)
        }

        fn save(&self, item: &Item) -> tessera_items::Result<()> {
            self.inner.save(item)
        }

        fn update_title(&self, key: &SessionKey, title: &str) -> tessera_items::Result<bool> {
            self.inner.update_title(key, title)
        }

        fn update_url(&self, key: &SessionKey, url: &str) -> tessera_items::Result<bool> {
            std::thread::sleep(std::time::Duration::from_millis(50));
            let written = self.inner.update_url(key, url);
            self.url_updates
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            written
        }

        fn update_favicon(&self, key: &SessionKey, bytes: &[u8]) -> tessera_items::Result<bool> {
            self.inner.update_favicon(key, bytes)
        }

        fn delete_item(&self, key: &SessionKey) -> tessera_items::Result<()> {
            self.inner.delete_item(key)
        }

        fn replace_item(&self, old: &SessionKey, new: &Item) -> tessera_items::Result<()> {
            self.inner.replace_item(old, new)
        }

        fn list_profiles(&self) -> tessera_items::Result<Vec<Profile>> {
            self.inner.list_profiles()
        }

        fn list_spaces(&self) -> tessera_items::Result<Vec<Space>> {
            self.inner.list_spaces()
        }

        fn save_profile(&self, profile: &Profile) -> tessera_items::Result<()> {
            self.inner.save_profile(profile)
        }

        fn save_space(&self, space: &Space) -> tessera_items::Result<()> {
            self.inner.save_space(space)
        }

        fn delete_profile(&self, id: Uuid) -> tessera_items::Result<()> {
            self.inner.delete_profile(id)
        }
    }

    fn slow_shell() -> (Shell, Arc<SlowUrlStore>, Space, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let inner = SqliteStore::new(Database::open_in_memory().unwrap());
        let space = Space::new("Main", None);
        inner.save_space(&space).unwrap();
        let store = Arc::new(SlowUrlStore {
            inner,
            url_updates: std::sync::atomic::AtomicUsize::new(0),
        });

        let shell = Shell::new(
            Config::new(dir.path().to_path_buf()),
            Arc::new(MemoryEngine::new()),
            Arc::clone(&store) as Arc<dyn EntityStore>,
            Arc::new(StaticAuthorizer(PermissionDecision::Deny)),
        )
        .unwrap();
        (shell, store, space, dir)
    }

    fn saved_blank_tab(store: &SlowUrlStore, space: &Space, title: &str) -> SessionKey {
        let mut tab = Tab::new(space.id, "about:blank".to_string());
        tab.title = title.to_string();
        let item = Item::Tab(tab);
        store.save(&item).unwrap();
        item.key()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_convert_recovered_tab_leaves_only_bookmark() {
        let (shell, store, space, _dir) = slow_shell();
        let key = saved_blank_tab(&store, &space, "YouTube - funny cat compilation");

        let bookmark = shell.convert_tab_to_bookmark(&key).unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(150)).await;

        assert_eq!(bookmark.url(), "https://www.youtube.com");
        assert!(store.load_item(&key).unwrap().is_none());
        assert_eq!(
            store.load_item(&bookmark.key()).unwrap().unwrap().url(),
            "https://www.youtube.com"
        );
        assert_eq!(store.url_updates.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_close_during_recovery_write_stays_closed() {
        let (shell, store, space, _dir) = slow_shell();
        let key = saved_blank_tab(&store, &space, "GitHub");

        shell.select_item(&key).unwrap();
        shell.close_item(&key).unwrap();

        for _ in 0..100 {
            if store.url_updates.load(std::sync::atomic::Ordering::SeqCst) > 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        assert_eq!(store.url_updates.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert!(store.load_item(&key).unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_updates_follow_shown_session() {
        let f = fixture();
        let key = saved_tab(&f, "https://a.example/", "A");
        let mut updates = f.shell.navigation_updates();

        let session = f.shell.select_item(&key).unwrap();
        f.engine.suppress_events(true);
        session.view().load("https://a.example/next").unwrap();

        tokio::time::sleep(f.shell.config().poll_interval() * 2).await;

        let snapshot = updates.borrow_and_update().clone().unwrap();
        assert_eq!(snapshot.session, key);
        assert!(snapshot.can_go_back);
        assert_eq!(snapshot.url.as_deref(), Some("https://a.example/next"));
    }

    #[tokio::test]
    async fn test_media_request_granted_by_platform() {
        let f = fixture_with(PermissionDecision::Grant);
        let key = saved_tab(&f, "https://meet.example/", "Meeting");
        let session = f.shell.select_item(&key).unwrap();
        f.shell.pump_events();

        let view = f.engine.view(session.view().id()).unwrap();
        let answer = view
            .request_media_permission(vec![MediaKind::Camera, MediaKind::Microphone])
            .unwrap();
        f.shell.pump_events();

        assert_eq!(answer.await.unwrap(), PermissionDecision::Grant);
    }

    #[tokio::test]
    async fn test_media_request_denied_by_default() {
        let f = fixture();
        let key = saved_tab(&f, "https://meet.example/", "Meeting");
        let session = f.shell.select_item(&key).unwrap();

        let view = f.engine.view(session.view().id()).unwrap();
        let answer = view.request_media_permission(vec![MediaKind::Camera]).unwrap();
        f.shell.pump_events();

        assert_eq!(answer.await.unwrap(), PermissionDecision::Deny);
    }

    #[tokio::test]
    async fn test_event_loop_delivers_events() {
        let f = fixture();
        f.engine.set_page_title("https://a.example/", "Looped");
        let key = saved_tab(&f, "https://a.example/", "");

        let handle = f.shell.run_event_loop().unwrap();
        assert!(f.shell.run_event_loop().is_none());
        assert_eq!(f.shell.pump_events(), 0);

        f.shell.select_item(&key).unwrap();

        let mut title = String::new();
        for _ in 0..100 {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            title = f.store.load_item(&key).unwrap().unwrap().title().to_string();
            if !title.is_empty() {
                break;
            }
        }
        assert_eq!(title, "Looped");
        handle.abort();
    }
}
