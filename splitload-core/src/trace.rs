//! Render-pass reference trace

use indexmap::IndexSet;
use std::sync::Mutex;

/// Ordered set of logical references touched during one render pass.
///
/// Units report into the trace as they render; the pass owner flushes it
/// once at pass end. Flushing clears the trace, so one instance can serve
/// consecutive passes.
#[derive(Debug, Default)]
pub struct ReferenceTrace {
    entries: Mutex<IndexSet<String>>,
}

impl ReferenceTrace {
    /// Create an empty trace
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one logical reference, keeping first-seen order
    pub fn record(&self, reference: &str) {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.insert(reference.to_string());
    }

    /// Number of distinct references recorded so far
    pub fn len(&self) -> usize {
        match self.entries.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// True when nothing has been recorded since the last flush
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read and clear the trace, returning references in first-seen order
    pub fn flush(&self) -> Vec<String> {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::take(&mut *entries).into_iter().collect()
    }
}
