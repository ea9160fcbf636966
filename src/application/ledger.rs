//! Throttle ledger: how often each key was rejected.
//!
//! Callers read the ledger to emit their own metrics or logs about throttled
//! events. Counters only grow; there is no reset.

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Per-key and total rejection counters.
///
/// Clones share the same counters. Entries are created on a key's first
/// rejection and survive eviction of that key's bucket.
#[derive(Debug, Clone, Default)]
pub struct ThrottleLedger {
    inner: Arc<LedgerInner>,
}

#[derive(Debug, Default)]
struct LedgerInner {
    by_key: DashMap<String, u64>,
    total: AtomicU64,
}

impl ThrottleLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one rejection for `key`.
    ///
    /// Returns the key's updated count.
    pub(crate) fn record(&self, key: &str) -> u64 {
        let count = match self.inner.by_key.get_mut(key) {
            Some(mut count) => {
                *count += 1;
                *count
            }
            None => {
                let mut count = self.inner.by_key.entry(key.to_owned()).or_insert(0);
                *count += 1;
                *count
            }
        };
        self.inner.total.fetch_add(1, Ordering::Relaxed);
        count
    }

    /// Total rejections across all keys.
    pub fn throttled_total(&self) -> u64 {
        self.inner.total.load(Ordering::Relaxed)
    }

    /// Rejections recorded for `key`, zero if it was never throttled.
    pub fn throttled_count(&self, key: &str) -> u64 {
        self.inner.by_key.get(key).map(|count| *count).unwrap_or(0)
    }

    /// Owned snapshot of every key's rejection count.
    pub fn throttled_by_key(&self) -> HashMap<String, u64> {
        self.inner
            .by_key
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    /// Number of distinct keys that were throttled at least once.
    pub fn len(&self) -> usize {
        self.inner.by_key.len()
    }

    /// Check if nothing was ever throttled.
    pub fn is_empty(&self) -> bool {
        self.inner.by_key.is_empty()
    }
}
