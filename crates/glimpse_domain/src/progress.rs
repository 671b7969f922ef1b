//! Tagged progress reporting (§9 design note: replaces dynamically-typed
//! progress callbacks with a single capability).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressEvent {
    Scanning { current: usize, total: usize },
    Chunking { current: usize, total: usize },
    Embedding { current: usize, total: usize },
    Storing { current: usize, total: usize },
}

/// A capability that accepts progress events. `()` is a valid no-op sink.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, event: ProgressEvent);
}

impl ProgressSink for () {
    fn on_progress(&self, _event: ProgressEvent) {}
}

impl<F: Fn(ProgressEvent) + Send + Sync> ProgressSink for F {
    fn on_progress(&self, event: ProgressEvent) {
        self(event)
    }
}
