//! Timer Relay - offline asset cache and notification relay for the
//! Hypertrofia workout timer
//!
//! This library serves the app's assets cache-first, mirrors the timer state
//! posted by open windows into a persistent notification, and relays clicks on
//! that notification back to the windows.

pub mod api;
pub mod config;
pub mod error;
pub mod protocol;
pub mod services;
pub mod state;
pub mod tasks;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod utils;
pub mod worker;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::{Result, WorkerError};
pub use state::AppState;
pub use utils::signals::shutdown_signal;
pub use worker::{Capabilities, ServiceWorker, WorkerMode};
