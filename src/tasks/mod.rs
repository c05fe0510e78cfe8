//! Background tasks module
//!
//! Tasks that run alongside the HTTP server.

pub mod lifecycle;

// Re-export main functions
pub use lifecycle::lifecycle_task;
