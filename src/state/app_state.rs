//! Shared state of the HTTP adapter

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Instant,
};

use chrono::{DateTime, Utc};

use crate::{
    services::{ClientHub, NotificationCenter},
    worker::ServiceWorker,
};

/// Everything the request handlers need
pub struct AppState {
    pub worker: Arc<ServiceWorker>,
    /// Connected foreground windows
    pub clients: Arc<ClientHub>,
    /// Notifications shown by the worker
    pub notifications: Arc<NotificationCenter>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last event tracking
    last_event: Mutex<Option<(String, DateTime<Utc>)>>,
}

impl AppState {
    pub fn new(
        worker: Arc<ServiceWorker>,
        clients: Arc<ClientHub>,
        notifications: Arc<NotificationCenter>,
        port: u16,
        host: String,
    ) -> Self {
        Self {
            worker,
            clients,
            notifications,
            start_time: Instant::now(),
            port,
            host,
            last_event: Mutex::new(None),
        }
    }

    /// Remember the most recent event delivered to the worker
    pub fn record_event(&self, event: &str) {
        *self.last_event.lock().unwrap_or_else(PoisonError::into_inner) =
            Some((event.to_string(), Utc::now()));
    }

    /// Get last event information
    pub fn get_last_event(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        match self.last_event.lock().unwrap_or_else(PoisonError::into_inner).clone() {
            Some((event, at)) => (Some(event), Some(at)),
            None => (None, None),
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let secs = self.start_time.elapsed().as_secs();
        let hours = secs / 3600;
        let minutes = (secs % 3600) / 60;
        let seconds = secs % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}
