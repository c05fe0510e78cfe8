//! System notification display

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Mutex, PoisonError,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{error::Result, state::TimerStateSnapshot};

/// A button shown on a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

impl NotificationAction {
    pub fn new(action: &str, title: &str) -> Self {
        Self {
            action: action.to_string(),
            title: title.to_string(),
        }
    }
}

/// Options for a single notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOptions {
    pub body: String,
    /// Notifications sharing a tag replace each other
    pub tag: String,
    /// Alert again even when replacing a notification with the same tag
    pub renotify: bool,
    /// Stay visible until the user interacts
    pub require_interaction: bool,
    pub icon: String,
    pub badge: String,
    pub actions: Vec<NotificationAction>,
    /// Snapshot the notification was rendered from
    pub data: TimerStateSnapshot,
}

/// A notification as it is currently displayed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub title: String,
    #[serde(flatten)]
    pub options: NotificationOptions,
    pub shown_at: DateTime<Utc>,
}

/// Where notifications are shown
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Display a notification, replacing any other with the same tag
    async fn show(&self, title: &str, options: NotificationOptions) -> Result<()>;

    /// Dismiss the notification with `tag`, if displayed
    async fn close(&self, tag: &str) -> Result<()>;

    /// Notifications currently displayed
    async fn displayed(&self) -> Result<Vec<NotificationRecord>>;
}

/// In-process notification registry.
///
/// Keeps the displayed set with tag replacement and logs every alert.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    displayed: Mutex<Vec<NotificationRecord>>,
    alerts: AtomicU64,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times a notification surfaced to the user
    pub fn alert_count(&self) -> u64 {
        self.alerts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl NotificationSink for NotificationCenter {
    async fn show(&self, title: &str, options: NotificationOptions) -> Result<()> {
        let mut displayed = self.displayed.lock().unwrap_or_else(PoisonError::into_inner);
        let replaced = displayed.iter().position(|n| n.options.tag == options.tag);
        let alerts = replaced.is_none() || options.renotify;

        let record = NotificationRecord {
            title: title.to_string(),
            options,
            shown_at: Utc::now(),
        };
        match replaced {
            Some(index) => displayed[index] = record,
            None => displayed.push(record),
        }
        drop(displayed);

        if alerts {
            self.alerts.fetch_add(1, Ordering::Relaxed);
            info!("Notification shown: {}", title);
        } else {
            debug!("Notification updated silently: {}", title);
        }
        Ok(())
    }

    async fn close(&self, tag: &str) -> Result<()> {
        let mut displayed = self.displayed.lock().unwrap_or_else(PoisonError::into_inner);
        let before = displayed.len();
        displayed.retain(|n| n.options.tag != tag);
        if displayed.len() != before {
            debug!("Closed notification {}", tag);
        }
        Ok(())
    }

    async fn displayed(&self) -> Result<Vec<NotificationRecord>> {
        Ok(self
            .displayed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}
