//! Error type shared by the worker and its capabilities

use thiserror::Error;

/// Failures surfaced by cache, network, notification and client operations
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request for {url} failed with status {status}")]
    BadStatus { url: String, status: u16 },

    #[error("Install failed: {0}")]
    Install(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("Unknown message type: {0}")]
    UnknownMessage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, WorkerError>;
