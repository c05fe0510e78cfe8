//! In-memory fakes for the worker's capabilities.
//!
//! `MemoryCacheStore` and `NotificationCenter` are already in-memory and are
//! used as-is; the fakes here stand in for the network and for windows.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex, PoisonError,
    },
};

use async_trait::async_trait;
use url::Url;

use crate::{
    error::{Result, WorkerError},
    protocol::{ActionMessage, Request, Response},
    services::{
        cache_key, CacheStore, ClientId, ClientInfo, ClientRegistry, ClientType, MemoryCacheStore,
        NotificationCenter,
    },
    worker::{Capabilities, ServiceWorker, WorkerMode},
};

/// Scope used by tests
pub const TEST_SCOPE: &str = "https://app.example/hypertrofia/";

pub fn test_scope() -> Url {
    Url::parse(TEST_SCOPE).expect("valid test scope")
}

/// Network fake serving canned responses and counting calls
#[derive(Debug)]
pub struct FakeFetcher {
    routes: Mutex<HashMap<String, Response>>,
    online: AtomicBool,
    calls: AtomicUsize,
}

impl Default for FakeFetcher {
    fn default() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            online: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `response` for `url`; unknown URLs get a 404
    pub fn route(&self, url: &Url, response: Response) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(cache_key(url), response);
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Number of fetches attempted, including failed ones
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl crate::services::Fetcher for FakeFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.online.load(Ordering::SeqCst) {
            return Err(WorkerError::Network(format!("offline: {}", request.url)));
        }

        let routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(routes
            .get(&cache_key(&request.url))
            .cloned()
            .unwrap_or_else(|| Response::new(404, "Not Found", "")))
    }
}

/// Windows recorded in memory
#[derive(Debug, Default)]
pub struct FakeClients {
    windows: Mutex<Vec<ClientInfo>>,
    unreachable: Mutex<Vec<ClientId>>,
    inbox: Mutex<Vec<(ClientId, ActionMessage)>>,
    focused: Mutex<Vec<ClientId>>,
    opened: Mutex<Vec<Url>>,
    claimed: AtomicBool,
}

impl FakeClients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an uncontrolled window
    pub fn add_window(&self, id: ClientId) {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner).push(ClientInfo {
            id,
            kind: ClientType::Window,
            url: TEST_SCOPE.to_string(),
            controlled: false,
            focused: false,
        });
    }

    /// Make posting to `id` fail, as for a window that navigated away
    pub fn make_unreachable(&self, id: ClientId) {
        self.unreachable.lock().unwrap_or_else(PoisonError::into_inner).push(id);
    }

    pub fn inbox(&self) -> Vec<(ClientId, ActionMessage)> {
        self.inbox.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn focused(&self) -> Vec<ClientId> {
        self.focused.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn opened(&self) -> Vec<Url> {
        self.opened.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClientRegistry for FakeClients {
    async fn match_all(&self, kind: ClientType, include_uncontrolled: bool) -> Result<Vec<ClientInfo>> {
        Ok(self
            .windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|c| c.kind == kind && (include_uncontrolled || c.controlled))
            .cloned()
            .collect())
    }

    async fn post_message(&self, id: ClientId, message: &ActionMessage) -> Result<()> {
        if self.unreachable.lock().unwrap_or_else(PoisonError::into_inner).contains(&id) {
            return Err(WorkerError::Client(format!("client {} unreachable", id)));
        }
        self.inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, message.clone()));
        Ok(())
    }

    async fn focus(&self, id: ClientId) -> Result<()> {
        self.focused.lock().unwrap_or_else(PoisonError::into_inner).push(id);
        Ok(())
    }

    async fn open_window(&self, url: &Url) -> Result<()> {
        self.opened.lock().unwrap_or_else(PoisonError::into_inner).push(url.clone());
        Ok(())
    }

    async fn claim(&self) -> Result<()> {
        self.claimed.store(true, Ordering::SeqCst);
        for window in self.windows.lock().unwrap_or_else(PoisonError::into_inner).iter_mut() {
            window.controlled = true;
        }
        Ok(())
    }
}

/// Cache store whose writes always fail
#[derive(Debug, Default)]
pub struct ReadOnlyCacheStore {
    inner: MemoryCacheStore,
}

#[async_trait]
impl CacheStore for ReadOnlyCacheStore {
    async fn open(&self, bucket: &str) -> Result<()> {
        self.inner.open(bucket).await
    }

    async fn keys(&self) -> Result<Vec<String>> {
        self.inner.keys().await
    }

    async fn delete(&self, bucket: &str) -> Result<bool> {
        self.inner.delete(bucket).await
    }

    async fn match_url(&self, bucket: &str, url: &Url) -> Result<Option<Response>> {
        self.inner.match_url(bucket, url).await
    }

    async fn put(&self, _bucket: &str, url: &Url, _response: Response) -> Result<()> {
        Err(WorkerError::Cache(format!("quota exceeded storing {}", url)))
    }

    async fn put_all(&self, _bucket: &str, _entries: Vec<(Url, Response)>) -> Result<()> {
        Err(WorkerError::Cache("quota exceeded".to_string()))
    }

    async fn urls(&self, bucket: &str) -> Result<Vec<String>> {
        self.inner.urls(bucket).await
    }
}

/// A worker wired to fakes, with handles to inspect them
pub struct Harness {
    pub worker: ServiceWorker,
    pub cache: Arc<MemoryCacheStore>,
    pub fetcher: Arc<FakeFetcher>,
    pub notifications: Arc<NotificationCenter>,
    pub clients: Arc<FakeClients>,
}

impl Harness {
    pub fn new(cache_name: &str, mode: WorkerMode) -> Self {
        let cache = Arc::new(MemoryCacheStore::new());
        let fetcher = Arc::new(FakeFetcher::new());
        let notifications = Arc::new(NotificationCenter::new());
        let clients = Arc::new(FakeClients::new());

        let caps = Capabilities {
            cache: cache.clone(),
            fetcher: fetcher.clone(),
            notifications: notifications.clone(),
            clients: clients.clone(),
        };
        let worker = ServiceWorker::new(test_scope(), cache_name, mode, caps).expect("valid worker");

        Self {
            worker,
            cache,
            fetcher,
            notifications,
            clients,
        }
    }

    /// Absolute URL for a path relative to the test scope
    pub fn url(&self, path: &str) -> Url {
        test_scope().join(path).expect("valid test path")
    }
}
