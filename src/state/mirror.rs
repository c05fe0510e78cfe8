//! Background copy of the foreground timer state

use std::sync::{Mutex, PoisonError};

use tracing::debug;

use super::{PartialTimerState, TimerStateSnapshot};

/// Owns the last known snapshot for the lifetime of the worker.
///
/// The lock is only held for the synchronous merge, never across an await.
#[derive(Debug, Default)]
pub struct StateMirror {
    snapshot: Mutex<TimerStateSnapshot>,
}

impl StateMirror {
    /// Create a mirror holding the zeroed snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mirror seeded with a known snapshot
    pub fn with_snapshot(snapshot: TimerStateSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
        }
    }

    /// Current snapshot by value
    pub fn snapshot(&self) -> TimerStateSnapshot {
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Shallow-merge `update` into the held snapshot and return the result.
    /// Last merge wins.
    pub fn merge_update(&self, update: &PartialTimerState) -> TimerStateSnapshot {
        let mut snapshot = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
        *snapshot = snapshot.merged(update);
        debug!("Merged timer state update: {:?}", *snapshot);
        *snapshot
    }
}
