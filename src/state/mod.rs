//! State management module
//!
//! The mirrored timer state and the shared state of the HTTP adapter.

pub mod app_state;
pub mod mirror;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use mirror::StateMirror;
pub use timer_state::{PartialTimerState, TimerStateSnapshot};
