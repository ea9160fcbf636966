//! Central registry of per-key buckets.
//!
//! The registry owns the first-access policy: a key seen for the first time
//! gets a full bucket with no refill, every later access refills lazily from
//! the clock before the caller sees the bucket.

use crate::application::ports::{Clock, Storage};
use crate::domain::bucket::BucketState;
use std::sync::Arc;

/// Registry managing all per-key bucket state.
///
/// This type is generic over the storage implementation, allowing different
/// storage backends to be used. In production, use `Arc<ShardedStorage>`.
#[derive(Clone)]
pub struct BucketRegistry<S>
where
    S: Storage<String, BucketState> + Clone,
{
    storage: S,
    clock: Arc<dyn Clock>,
    capacity: u64,
    fill_per_second: f64,
}

impl<S> BucketRegistry<S>
where
    S: Storage<String, BucketState> + Clone,
{
    /// Create a new registry with storage, clock, and the per-key limits.
    pub fn new(storage: S, clock: Arc<dyn Clock>, capacity: u64, fill_per_second: f64) -> Self {
        Self {
            storage,
            clock,
            capacity,
            fill_per_second,
        }
    }

    /// Access the bucket for `key`, creating or refilling it first.
    ///
    /// The bucket stays locked while `f` runs, so `f` can check and consume
    /// tokens atomically with respect to other callers using the same key.
    pub fn with_bucket<F, R>(&self, key: &str, f: F) -> R
    where
        F: FnOnce(&mut BucketState) -> R,
    {
        let capacity = self.capacity;
        self.storage.with_entry_mut(
            key.to_owned(),
            || BucketState::full(capacity),
            |bucket, created| {
                if created {
                    tracing::trace!(key, capacity, "created bucket");
                } else {
                    bucket.refill(self.clock.now_secs(), capacity, self.fill_per_second);
                }
                f(bucket)
            },
        )
    }

    /// Current state of `key`'s bucket without refilling it.
    pub fn peek(&self, key: &str) -> Option<BucketState> {
        self.storage.read(&key.to_owned(), |bucket| *bucket)
    }

    /// Get the clock used for refills.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Get the number of tracked keys.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Clear all tracked state.
    pub fn clear(&self) {
        self.storage.clear();
    }

    /// Iterate over all buckets with a callback.
    pub fn for_each<F>(&self, f: F)
    where
        F: FnMut(&String, &BucketState),
    {
        self.storage.for_each(f);
    }

    /// Keep only the buckets for which the predicate returns true.
    pub fn cleanup<F>(&self, f: F)
    where
        F: FnMut(&String, &mut BucketState) -> bool,
    {
        self.storage.retain(f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mocks::MockClock;
    use crate::infrastructure::storage::ShardedStorage;
    use std::time::Duration;

    fn registry(clock: &MockClock) -> BucketRegistry<Arc<ShardedStorage<String, BucketState>>> {
        BucketRegistry::new(
            Arc::new(ShardedStorage::new()),
            Arc::new(clock.clone()),
            5,
            1.0,
        )
    }

    #[test]
    fn test_registry_creation() {
        let registry = registry(&MockClock::at_secs(0));
        assert_eq!(registry.len(), 0);
        assert!(registry.is_empty());
        assert_eq!(registry.peek("missing"), None);
    }

    #[test]
    fn test_first_access_is_full_without_refill() {
        let registry = registry(&MockClock::at_secs(100));

        let state = registry.with_bucket("a", |bucket| *bucket);
        assert_eq!(state.tokens(), 5);
        assert_eq!(state.last_refill(), None);
    }

    #[test]
    fn test_second_access_refills() {
        let clock = MockClock::at_secs(100);
        let registry = registry(&clock);

        registry.with_bucket("a", |bucket| {
            bucket.try_consume();
            bucket.try_consume();
        });

        // Second access stamps the time without adding tokens
        clock.advance(Duration::from_secs(30));
        let state = registry.with_bucket("a", |bucket| *bucket);
        assert_eq!(state.tokens(), 3);
        assert_eq!(state.last_refill(), Some(130));

        clock.advance(Duration::from_secs(1));
        let state = registry.with_bucket("a", |bucket| *bucket);
        assert_eq!(state.tokens(), 4);
    }

    #[test]
    fn test_peek_does_not_refill() {
        let clock = MockClock::at_secs(0);
        let registry = registry(&clock);

        registry.with_bucket("a", |bucket| bucket.try_consume());
        registry.with_bucket("a", |_| ());
        clock.advance(Duration::from_secs(60));

        assert_eq!(registry.peek("a").map(|b| b.tokens()), Some(4));
    }

    #[test]
    fn test_cleanup_and_clear() {
        let registry = registry(&MockClock::at_secs(0));

        for i in 0..10 {
            registry.with_bucket(&format!("key{}", i), |_| ());
        }
        assert_eq!(registry.len(), 10);

        registry.cleanup(|key, _| key.ends_with('0'));
        assert_eq!(registry.len(), 1);

        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_concurrent_access() {
        use std::thread;

        let registry = Arc::new(registry(&MockClock::at_secs(0)));
        let mut handles = vec![];

        for i in 0..10 {
            let registry_clone = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                for j in 0..100 {
                    registry_clone.with_bucket(&format!("key_{}_{}", i, j), |_| ());
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.len(), 1000);
    }
}
