//! Utility functions module
//!
//! Clock formatting and shutdown signal handling.

pub mod format;
pub mod signals;

// Re-export main functions
pub use format::{coerce_seconds, format_clock_hms, format_clock_ms};
pub use signals::shutdown_signal;
