//! Routes notification clicks to foreground windows

use std::sync::Arc;

use tracing::{info, warn};
use url::Url;

use super::publisher::{ACTION_ADD_SERIES, ACTION_OPEN_APP, ACTION_RESET_SERIES};
use crate::{
    error::Result,
    protocol::ActionMessage,
    services::{ClientId, ClientRegistry, ClientType, NotificationSink},
};

/// Deep link opened when no window is around
pub const OPEN_TIMER_TARGET: &str = "./index.html#cronometro";

/// Which notification button was pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickAction {
    AddSeries,
    ResetSeries,
    /// Body tap, the explicit open button, or anything unrecognised
    Open,
}

impl ClickAction {
    pub fn from_id(id: Option<&str>) -> Self {
        match id {
            Some(ACTION_ADD_SERIES) => Self::AddSeries,
            Some(ACTION_RESET_SERIES) => Self::ResetSeries,
            _ => Self::Open,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::AddSeries => ACTION_ADD_SERIES,
            Self::ResetSeries => ACTION_RESET_SERIES,
            Self::Open => ACTION_OPEN_APP,
        }
    }
}

/// Side effect of a dispatched click
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Message fanned out; `delivered` counts windows that accepted it
    Broadcast { message: ActionMessage, delivered: usize },
    /// An existing window was focused and told to show the timer
    Focused(ClientId),
    /// No window existed, so a new one was opened
    Opened(Url),
}

pub struct ActionDispatcher {
    clients: Arc<dyn ClientRegistry>,
    notifications: Arc<dyn NotificationSink>,
    open_target: Url,
}

impl ActionDispatcher {
    pub fn new(
        scope: &Url,
        clients: Arc<dyn ClientRegistry>,
        notifications: Arc<dyn NotificationSink>,
    ) -> Result<Self> {
        Ok(Self {
            clients,
            notifications,
            open_target: scope.join(OPEN_TIMER_TARGET)?,
        })
    }

    /// Close the clicked notification and act on `action`
    pub async fn dispatch(&self, action: Option<&str>, tag: &str) -> Result<DispatchOutcome> {
        let action = ClickAction::from_id(action);
        info!("Notification action: {}", action.id());
        self.notifications.close(tag).await?;

        match action {
            ClickAction::AddSeries => self.broadcast(ActionMessage::AddSeries).await,
            ClickAction::ResetSeries => self.broadcast(ActionMessage::ResetSeries).await,
            ClickAction::Open => self.focus_or_open().await,
        }
    }

    /// Post `message` to every window, controlled or not. Delivery is best-effort.
    pub async fn broadcast(&self, message: ActionMessage) -> Result<DispatchOutcome> {
        let windows = self.clients.match_all(ClientType::Window, true).await?;

        let mut delivered = 0;
        for window in &windows {
            match self.clients.post_message(window.id, &message).await {
                Ok(()) => delivered += 1,
                Err(e) => warn!("Failed to deliver {} to client {}: {}", message.kind(), window.id, e),
            }
        }

        info!("Broadcast {} to {}/{} windows", message.kind(), delivered, windows.len());
        Ok(DispatchOutcome::Broadcast { message, delivered })
    }

    async fn focus_or_open(&self) -> Result<DispatchOutcome> {
        let windows = self.clients.match_all(ClientType::Window, true).await?;

        if let Some(first) = windows.first() {
            self.clients.focus(first.id).await?;
            self.clients.post_message(first.id, &ActionMessage::OpenTimer).await?;
            return Ok(DispatchOutcome::Focused(first.id));
        }

        self.clients.open_window(&self.open_target).await?;
        Ok(DispatchOutcome::Opened(self.open_target.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_or_unknown_action_means_open() {
        assert_eq!(ClickAction::from_id(None), ClickAction::Open);
        assert_eq!(ClickAction::from_id(Some("open-app")), ClickAction::Open);
        assert_eq!(ClickAction::from_id(Some("snooze")), ClickAction::Open);
        assert_eq!(ClickAction::from_id(Some("add-series")), ClickAction::AddSeries);
        assert_eq!(ClickAction::from_id(Some("reset-series")), ClickAction::ResetSeries);
    }
}
