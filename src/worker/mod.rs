//! The background worker
//!
//! One async entry point per event kind. Each returns only once all of the
//! event's work has settled, so whoever delivers the event can await it
//! before treating the event as handled.

pub mod asset_cache;
pub mod dispatcher;
pub mod publisher;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error, info};
use url::Url;

pub use asset_cache::{AssetCacheManager, APP_ASSETS, CACHE_NAME, ENTRY_DOCUMENT};
pub use dispatcher::{ActionDispatcher, ClickAction, DispatchOutcome, OPEN_TIMER_TARGET};
pub use publisher::{NotificationPublisher, NOTIFICATION_TAG, NOTIFICATION_TITLE};

use crate::{
    error::{Result, WorkerError},
    protocol::{ActionMessage, Request, Response},
    services::{CacheStore, ClientRegistry, Fetcher, NotificationSink},
    state::{StateMirror, TimerStateSnapshot},
};

/// How much of the worker is enabled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerMode {
    /// Asset caching, state mirroring and notifications
    #[default]
    Full,
    /// Lifecycle only: requests go straight to the network and messages are ignored
    Minimal,
}

/// Lifecycle position of the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerPhase {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed; the worker must not serve
    Redundant,
}

/// Runtime facilities the worker is built on
#[derive(Clone)]
pub struct Capabilities {
    pub cache: Arc<dyn CacheStore>,
    pub fetcher: Arc<dyn Fetcher>,
    pub notifications: Arc<dyn NotificationSink>,
    pub clients: Arc<dyn ClientRegistry>,
}

pub struct ServiceWorker {
    mode: WorkerMode,
    scope: Url,
    mirror: StateMirror,
    assets: AssetCacheManager,
    publisher: NotificationPublisher,
    dispatcher: ActionDispatcher,
    fetcher: Arc<dyn Fetcher>,
    clients: Arc<dyn ClientRegistry>,
    phase_tx: watch::Sender<WorkerPhase>,
}

impl ServiceWorker {
    /// Build a worker for the app under `scope` using bucket `cache_name`
    pub fn new(scope: Url, cache_name: &str, mode: WorkerMode, caps: Capabilities) -> Result<Self> {
        let assets = AssetCacheManager::new(
            &scope,
            cache_name,
            caps.cache,
            caps.fetcher.clone(),
            caps.clients.clone(),
        )?;
        let dispatcher = ActionDispatcher::new(&scope, caps.clients.clone(), caps.notifications.clone())?;
        let (phase_tx, _) = watch::channel(WorkerPhase::Parsed);

        Ok(Self {
            mode,
            scope,
            mirror: StateMirror::new(),
            assets,
            publisher: NotificationPublisher::new(caps.notifications),
            dispatcher,
            fetcher: caps.fetcher,
            clients: caps.clients,
            phase_tx,
        })
    }

    /// Install a custom asset manifest (relative to the scope)
    pub fn with_manifest(mut self, assets: &[&str]) -> Result<Self> {
        self.assets = self.assets.with_manifest(&self.scope, assets)?;
        Ok(self)
    }

    /// Seed the mirror, e.g. with a snapshot restored by the caller
    pub fn with_mirror(mut self, mirror: StateMirror) -> Self {
        self.mirror = mirror;
        self
    }

    pub fn mode(&self) -> WorkerMode {
        self.mode
    }

    pub fn scope(&self) -> &Url {
        &self.scope
    }

    pub fn cache_name(&self) -> &str {
        self.assets.cache_name()
    }

    pub fn snapshot(&self) -> TimerStateSnapshot {
        self.mirror.snapshot()
    }

    pub fn phase(&self) -> WorkerPhase {
        *self.phase_tx.borrow()
    }

    /// Watch lifecycle transitions
    pub fn subscribe_phase(&self) -> watch::Receiver<WorkerPhase> {
        self.phase_tx.subscribe()
    }

    fn set_phase(&self, phase: WorkerPhase) {
        debug!("Worker phase: {:?}", phase);
        self.phase_tx.send_replace(phase);
    }

    /// Install event. On failure the worker becomes redundant.
    pub async fn install(&self) -> Result<()> {
        self.set_phase(WorkerPhase::Installing);

        let result = match self.mode {
            WorkerMode::Full => self.assets.install().await,
            WorkerMode::Minimal => Ok(()),
        };

        match result {
            Ok(()) => {
                // Skip waiting: become active as soon as activate runs.
                self.set_phase(WorkerPhase::Installed);
                Ok(())
            }
            Err(e) => {
                error!("Install failed: {}", e);
                self.set_phase(WorkerPhase::Redundant);
                Err(e)
            }
        }
    }

    /// Activate event: drop stale buckets and claim every client.
    /// A worker whose install failed stays redundant and is never activated.
    pub async fn activate(&self) -> Result<()> {
        if self.phase() == WorkerPhase::Redundant {
            return Err(WorkerError::Install(format!(
                "{} did not install, refusing to activate",
                self.cache_name()
            )));
        }
        self.set_phase(WorkerPhase::Activating);

        match self.mode {
            WorkerMode::Full => {
                let deleted = self.assets.activate().await?;
                info!("Activated {} (removed {} stale buckets)", self.cache_name(), deleted.len());
            }
            WorkerMode::Minimal => {
                self.clients.claim().await?;
                info!("Activated in minimal mode");
            }
        }

        self.set_phase(WorkerPhase::Activated);
        Ok(())
    }

    /// Fetch event. GETs go through the asset cache; everything else, and
    /// everything in minimal mode, goes straight to the network.
    pub async fn fetch(&self, request: &Request) -> Result<Response> {
        if self.mode == WorkerMode::Full {
            if let Some(response) = self.assets.handle_fetch(request).await {
                return Ok(response);
            }
        }

        debug!("Passing {} {} through", request.method, request.url);
        self.fetcher.fetch(request).await
    }

    /// Message event. A state update is merged, then published; the merged
    /// snapshot is returned. Other messages are ignored.
    pub async fn message(&self, message: ActionMessage) -> Result<Option<TimerStateSnapshot>> {
        let update = match message {
            ActionMessage::TimerStateUpdate(update) => update,
            other => {
                debug!("Ignoring {} sent to the worker", other.kind());
                return Ok(None);
            }
        };

        if self.mode == WorkerMode::Minimal {
            debug!("Minimal mode, ignoring state update");
            return Ok(None);
        }

        let snapshot = self.mirror.merge_update(&update);
        self.publisher.publish(&snapshot).await?;
        Ok(Some(snapshot))
    }

    /// Notification click event for the notification tagged `tag`
    pub async fn notification_click(&self, action: Option<&str>, tag: &str) -> Result<DispatchOutcome> {
        self.dispatcher.dispatch(action, tag).await
    }
}
