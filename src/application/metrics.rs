//! Observability metrics for admission control.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking admission statistics.
///
/// All metrics use atomic operations for thread-safe updates and reads.
/// Clones share the same counters.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    /// Total number of admitted checks
    checks_admitted: AtomicU64,
    /// Total number of throttled checks
    checks_throttled: AtomicU64,
    /// Total number of per-key buckets evicted from storage
    keys_evicted: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                checks_admitted: AtomicU64::new(0),
                checks_throttled: AtomicU64::new(0),
                keys_evicted: AtomicU64::new(0),
            }),
        }
    }

    pub(crate) fn record_admitted(&self) {
        self.inner.checks_admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_throttled(&self) {
        self.inner.checks_throttled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_eviction(&self) {
        self.inner.keys_evicted.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the total number of admitted checks.
    pub fn checks_admitted(&self) -> u64 {
        self.inner.checks_admitted.load(Ordering::Relaxed)
    }

    /// Get the total number of throttled checks.
    pub fn checks_throttled(&self) -> u64 {
        self.inner.checks_throttled.load(Ordering::Relaxed)
    }

    /// Get the total number of evicted per-key buckets.
    ///
    /// Counts both policy evictions and idle sweeps.
    pub fn keys_evicted(&self) -> u64 {
        self.inner.keys_evicted.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            checks_admitted: self.checks_admitted(),
            checks_throttled: self.checks_throttled(),
            keys_evicted: self.keys_evicted(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Total number of admitted checks
    pub checks_admitted: u64,
    /// Total number of throttled checks
    pub checks_throttled: u64,
    /// Total number of per-key buckets evicted
    pub keys_evicted: u64,
}

impl MetricsSnapshot {
    /// Calculate the throttle rate (0.0 to 1.0).
    ///
    /// Returns 0.0 if no checks have been made.
    pub fn throttle_rate(&self) -> f64 {
        let total = self.total_checks();
        if total == 0 {
            0.0
        } else {
            self.checks_throttled as f64 / total as f64
        }
    }

    /// Get the total number of checks (admitted + throttled).
    pub fn total_checks(&self) -> u64 {
        self.checks_admitted.saturating_add(self.checks_throttled)
    }
}
