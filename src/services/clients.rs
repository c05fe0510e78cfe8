//! Foreground windows connected to the worker

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Mutex, PoisonError,
    },
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::{process::Command, sync::mpsc};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    error::{Result, WorkerError},
    protocol::ActionMessage,
};

pub type ClientId = u64;

/// Kind of execution context behind a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientType {
    Window,
    Worker,
}

/// What the worker knows about one client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub id: ClientId,
    pub kind: ClientType,
    pub url: String,
    /// Served by this worker
    pub controlled: bool,
    pub focused: bool,
}

/// Enumeration of clients and the operations the worker can perform on them
#[async_trait]
pub trait ClientRegistry: Send + Sync {
    /// Clients of `kind`, optionally including ones this worker does not control
    async fn match_all(&self, kind: ClientType, include_uncontrolled: bool) -> Result<Vec<ClientInfo>>;

    async fn post_message(&self, id: ClientId, message: &ActionMessage) -> Result<()>;

    /// Bring a window to the front
    async fn focus(&self, id: ClientId) -> Result<()>;

    /// Open a new window at `url`
    async fn open_window(&self, url: &Url) -> Result<()>;

    /// Take control of every client without a reload
    async fn claim(&self) -> Result<()>;
}

/// Event delivered down a client's connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Message(ActionMessage),
    Focus,
}

#[derive(Debug)]
struct Connection {
    info: ClientInfo,
    tx: mpsc::UnboundedSender<ClientEvent>,
}

/// Registry of live client connections.
///
/// Each connected window owns the receiving half of a channel; a dropped
/// receiver means the window went away.
#[derive(Debug)]
pub struct ClientHub {
    connections: Mutex<BTreeMap<ClientId, Connection>>,
    next_id: AtomicU64,
    claimed: AtomicBool,
    opener: Option<String>,
}

impl ClientHub {
    /// `opener` is the command used to open new windows, invoked with the URL
    pub fn new(opener: Option<String>) -> Self {
        Self {
            connections: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            claimed: AtomicBool::new(false),
            opener,
        }
    }

    /// Register a new client and return the receiver for its events
    pub fn connect(&self, kind: ClientType, url: String) -> (ClientInfo, mpsc::UnboundedReceiver<ClientEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let info = ClientInfo {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            kind,
            url,
            controlled: self.claimed.load(Ordering::Relaxed),
            focused: false,
        };

        info!("Client {} connected ({:?} at {})", info.id, info.kind, info.url);
        self.lock().insert(info.id, Connection { info: info.clone(), tx });
        (info, rx)
    }

    pub fn disconnect(&self, id: ClientId) {
        if self.lock().remove(&id).is_some() {
            info!("Client {} disconnected", id);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<ClientId, Connection>> {
        self.connections.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn send(&self, id: ClientId, event: ClientEvent) -> Result<()> {
        let mut connections = self.lock();
        let connection = connections
            .get(&id)
            .ok_or_else(|| WorkerError::Client(format!("Client {} is not connected", id)))?;

        if connection.tx.send(event).is_err() {
            connections.remove(&id);
            return Err(WorkerError::Client(format!("Client {} went away", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl ClientRegistry for ClientHub {
    async fn match_all(&self, kind: ClientType, include_uncontrolled: bool) -> Result<Vec<ClientInfo>> {
        Ok(self
            .lock()
            .values()
            .filter(|c| c.info.kind == kind)
            .filter(|c| include_uncontrolled || c.info.controlled)
            .map(|c| c.info.clone())
            .collect())
    }

    async fn post_message(&self, id: ClientId, message: &ActionMessage) -> Result<()> {
        debug!("Posting {} to client {}", message.kind(), id);
        self.send(id, ClientEvent::Message(message.clone()))
    }

    async fn focus(&self, id: ClientId) -> Result<()> {
        self.send(id, ClientEvent::Focus)?;
        for (client_id, connection) in self.lock().iter_mut() {
            connection.info.focused = *client_id == id;
        }
        Ok(())
    }

    async fn open_window(&self, url: &Url) -> Result<()> {
        let Some(opener) = &self.opener else {
            warn!("No window opener configured, cannot open {}", url);
            return Ok(());
        };

        info!("Opening window at {}", url);
        let status = Command::new(opener)
            .arg(url.as_str())
            .status()
            .await
            .map_err(|e| WorkerError::Client(format!("Failed to execute {}: {}", opener, e)))?;

        if !status.success() {
            return Err(WorkerError::Client(format!("{} exited with {}", opener, status)));
        }
        Ok(())
    }

    async fn claim(&self) -> Result<()> {
        self.claimed.store(true, Ordering::Relaxed);
        let mut connections = self.lock();
        for connection in connections.values_mut() {
            connection.info.controlled = true;
        }
        info!("Claimed {} clients", connections.len());
        Ok(())
    }
}
