//! Shared lifecycle call recorder.

use std::sync::{Arc, Mutex};

/// Records lifecycle calls (`"start:db"`, `"stop:db"`, ...) in the order
/// they happen, across every mock that shares it.
#[derive(Default)]
pub struct EventTracker {
    log: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl EventTracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.log.lock().unwrap().push(entry.into());
    }

    /// Snapshot of everything recorded so far.
    pub fn entries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    /// Entries starting with `prefix` (e.g. `"stop:"`), in order.
    pub fn with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.starts_with(prefix))
            .collect()
    }

    /// Index of the first occurrence of `entry`.
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| *e == entry).count()
    }
}
