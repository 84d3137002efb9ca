use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;

/// Global runtime metrics.
///
/// Purpose:
/// - Track how many workers were launched and how many delivered
/// - Track selector outcomes (fallbacks, late deliveries, drains)
/// - Track verification failures
///
/// Design:
/// - Lock-free (Atomics)
/// - Safe in async + multithreaded contexts
#[derive(Default)]
pub struct RuntimeMetrics {
    // Workers
    pub workers_spawned: AtomicUsize,
    pub workers_delivered: AtomicUsize,

    // Selector
    pub selections: AtomicUsize,
    pub fallbacks: AtomicUsize,
    pub late_deliveries: AtomicUsize,
    pub drained: AtomicUsize,

    // Collector
    pub mismatches: AtomicUsize,
    pub task_errors: AtomicUsize,
}

impl RuntimeMetrics {
    pub fn incr(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// One-line snapshot, logged by `main` before exit.
    pub fn summary(&self) -> String {
        format!(
            "spawned={} delivered={} selections={} fallbacks={} late={} drained={} mismatches={} errors={}",
            self.workers_spawned.load(Ordering::Relaxed),
            self.workers_delivered.load(Ordering::Relaxed),
            self.selections.load(Ordering::Relaxed),
            self.fallbacks.load(Ordering::Relaxed),
            self.late_deliveries.load(Ordering::Relaxed),
            self.drained.load(Ordering::Relaxed),
            self.mismatches.load(Ordering::Relaxed),
            self.task_errors.load(Ordering::Relaxed),
        )
    }
}

/// Global metrics registry (singleton)
pub static METRICS: Lazy<Arc<RuntimeMetrics>> =
    Lazy::new(|| Arc::new(RuntimeMetrics::default()));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_reflects_counters() {
        let m = RuntimeMetrics::default();
        RuntimeMetrics::incr(&m.fallbacks);
        RuntimeMetrics::incr(&m.fallbacks);
        assert!(m.summary().contains("fallbacks=2"));
        assert!(m.summary().starts_with("spawned=0"));
    }
}
