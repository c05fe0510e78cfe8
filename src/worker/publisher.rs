//! Renders the timer snapshot into the persistent notification

use std::sync::Arc;

use tracing::debug;

use crate::{
    error::Result,
    services::{NotificationAction, NotificationOptions, NotificationSink},
    state::TimerStateSnapshot,
    utils::{format_clock_hms, format_clock_ms},
};

pub const NOTIFICATION_TITLE: &str = "Hypertrofia Tracker";
/// Fixed tag so each publish replaces the previous notification
pub const NOTIFICATION_TAG: &str = "hypertrofia-timer";
pub const NOTIFICATION_ICON: &str = "./icon.png";

pub const ACTION_ADD_SERIES: &str = "add-series";
pub const ACTION_RESET_SERIES: &str = "reset-series";
pub const ACTION_OPEN_APP: &str = "open-app";

const RUNNING_GLYPH: &str = "▶️";
const PAUSED_GLYPH: &str = "⏸️";
const SEPARATOR: &str = " · ";

fn glyph(running: bool) -> &'static str {
    if running {
        RUNNING_GLYPH
    } else {
        PAUSED_GLYPH
    }
}

/// Three-line summary of the timer
pub fn render_body(snapshot: &TimerStateSnapshot) -> String {
    [
        format!("Tiempo: {} {}", format_clock_hms(snapshot.gym_seconds), glyph(snapshot.gym_running)),
        format!("Descanso: {} {}", format_clock_ms(snapshot.rest_seconds), glyph(snapshot.rest_running)),
        format!("Series: {}", snapshot.series_count),
    ]
    .join(SEPARATOR)
}

/// Full notification options for a snapshot
pub fn compose(snapshot: &TimerStateSnapshot) -> NotificationOptions {
    NotificationOptions {
        body: render_body(snapshot),
        tag: NOTIFICATION_TAG.to_string(),
        renotify: true,
        require_interaction: true,
        icon: NOTIFICATION_ICON.to_string(),
        badge: NOTIFICATION_ICON.to_string(),
        actions: vec![
            NotificationAction::new(ACTION_ADD_SERIES, "+1 Serie"),
            NotificationAction::new(ACTION_RESET_SERIES, "Reset Series"),
            NotificationAction::new(ACTION_OPEN_APP, "Abrir app"),
        ],
        data: *snapshot,
    }
}

pub struct NotificationPublisher {
    sink: Arc<dyn NotificationSink>,
}

impl NotificationPublisher {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Show the timer notification unless the user has not opted in.
    /// Returns whether anything was shown.
    pub async fn publish(&self, snapshot: &TimerStateSnapshot) -> Result<bool> {
        if !snapshot.notifications_enabled {
            debug!("Notifications disabled, skipping publish");
            return Ok(false);
        }

        self.sink.show(NOTIFICATION_TITLE, compose(snapshot)).await?;
        Ok(true)
    }
}
