//! Optional progress reporting for long pipeline runs.

use std::sync::{Arc, Mutex};
use tracing::trace;

/// A point-in-time view of pipeline progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    /// Items processed so far. Monotonically increasing.
    pub processed: u64,
    /// Human-readable description of the current activity.
    pub current: String,
}

/// Shared progress state updated by pipeline stages.
///
/// Purely informational: omitting it changes nothing about pipeline
/// behavior. Cheap to clone; all clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    inner: Arc<Mutex<Progress>>,
}

impl ProgressReporter {
    /// Creates a reporter with zero progress.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bumps the processed count.
    pub fn increment(&self) {
        let mut progress = self.inner.lock().expect("progress lock poisoned");
        progress.processed += 1;
    }

    /// Replaces the current-activity message.
    pub fn set_current(&self, current: impl Into<String>) {
        let current = current.into();
        trace!(activity = %current, "progress");
        self.inner.lock().expect("progress lock poisoned").current = current;
    }

    /// Returns a snapshot of the current state.
    pub fn snapshot(&self) -> Progress {
        self.inner.lock().expect("progress lock poisoned").clone()
    }
}
