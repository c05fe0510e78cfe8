//! API response structures

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response as HttpResponse},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    protocol::Response,
    state::TimerStateSnapshot,
    worker::{DispatchOutcome, WorkerMode, WorkerPhase},
};

/// API response structure for lifecycle and message events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub state: TimerStateSnapshot,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: &str, message: String, state: TimerStateSnapshot) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            state,
        }
    }

    /// The event was handled
    pub fn handled(message: String, state: TimerStateSnapshot) -> Self {
        Self::new("handled", message, state)
    }

    /// The event was accepted but had no effect
    pub fn ignored(message: String, state: TimerStateSnapshot) -> Self {
        Self::new("ignored", message, state)
    }
}

/// Body of `POST /sw/notificationclick`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationClickRequest {
    /// Button id; absent for a tap on the notification body
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

/// Result of a notification click
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum ClickResponse {
    Broadcast { message: String, delivered: usize },
    Focused { client: u64 },
    Opened { url: String },
}

impl From<DispatchOutcome> for ClickResponse {
    fn from(outcome: DispatchOutcome) -> Self {
        match outcome {
            DispatchOutcome::Broadcast { message, delivered } => Self::Broadcast {
                message: message.kind().to_string(),
                delivered,
            },
            DispatchOutcome::Focused(client) => Self::Focused { client },
            DispatchOutcome::Opened(url) => Self::Opened { url: url.to_string() },
        }
    }
}

/// Worker status with the mirrored timer state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub state: TimerStateSnapshot,
    pub phase: WorkerPhase,
    pub mode: WorkerMode,
    pub cache_name: String,
    pub scope: String,
    pub clients: usize,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_event: Option<String>,
    pub last_event_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl IntoResponse for Response {
    fn into_response(self) -> HttpResponse {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);
        let mut response = HttpResponse::new(Body::from(self.body));
        *response.status_mut() = status;

        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.append(name, value);
            }
        }
        response
    }
}
