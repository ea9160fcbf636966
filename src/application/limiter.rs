//! Admission control over per-key buckets and the global bucket.
//!
//! Every check refills the key's bucket, refills the global bucket, and
//! admits only if both hold a token.

use crate::application::global_bucket::GlobalBucket;
use crate::application::ledger::ThrottleLedger;
use crate::application::metrics::Metrics;
use crate::application::ports::Storage;
use crate::application::registry::BucketRegistry;
use crate::domain::{bucket::BucketState, config::ThrottleConfig, decision::LimitDecision};
use crate::infrastructure::storage::ShardedStorage;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Default storage used by [`EventThrottle`].
pub type DefaultStorage = Arc<ShardedStorage<String, BucketState>>;

/// Two-level token bucket limiter.
///
/// Each key draws from its own bucket of `capacity` tokens and from a global
/// bucket of `total_capacity` tokens shared by all keys. All buckets refill
/// at `fill_per_second`, in whole-second steps, when they are touched.
///
/// Clones share all state.
///
/// # Example
/// ```
/// use event_bucket_throttle::EventThrottle;
///
/// let throttle = EventThrottle::new(2, 3, 0.01).unwrap();
///
/// assert!(throttle.take("login"));
/// assert!(throttle.take("login"));
/// // Per-key bucket is empty
/// assert!(!throttle.take("login"));
///
/// assert!(throttle.take("search"));
/// // Global bucket is empty
/// assert!(!throttle.take("search"));
///
/// assert_eq!(throttle.throttled_count("login"), 1);
/// assert_eq!(throttle.throttled_total(), 2);
/// ```
///
/// # Concurrency
///
/// A check holds the key's storage entry for its whole duration and takes the
/// global bucket lock second. Two checks on the same key are serialized; checks
/// on different keys only contend on the global bucket. Tokens are never
/// spent twice.
#[derive(Clone)]
pub struct EventThrottle<S = DefaultStorage>
where
    S: Storage<String, BucketState> + Clone,
{
    config: ThrottleConfig,
    registry: BucketRegistry<S>,
    global: Arc<GlobalBucket>,
    ledger: ThrottleLedger,
    metrics: Metrics,
}

impl<S> EventThrottle<S>
where
    S: Storage<String, BucketState> + Clone,
{
    /// Assemble a limiter from already wired parts.
    ///
    /// Most callers want [`EventThrottle::new`] or [`EventThrottle::builder`].
    pub fn from_parts(config: ThrottleConfig, registry: BucketRegistry<S>, metrics: Metrics) -> Self {
        Self {
            global: Arc::new(GlobalBucket::new(config.total_capacity())),
            config,
            registry,
            ledger: ThrottleLedger::new(),
            metrics,
        }
    }

    /// Try to admit one event for `key`.
    ///
    /// Returns `true` if a token was taken from both the key's bucket and the
    /// global bucket, `false` if the event was throttled.
    pub fn take(&self, key: &str) -> bool {
        self.check(key).is_admit()
    }

    /// Try to admit one event for `key`, returning the decision.
    ///
    /// Refills happen whether or not the event is admitted. A throttled
    /// event is recorded in the ledger and consumes no tokens.
    pub fn check(&self, key: &str) -> LimitDecision {
        let fill_per_second = self.config.fill_per_second();
        let clock = self.registry.clock();

        let (decision, key_tokens, global_tokens) = self.registry.with_bucket(key, |bucket| {
            let now = clock.now_secs();
            bucket.mark_seen(now);
            let mut global = self.global.refill(now, fill_per_second);

            let decision = if bucket.has_tokens() && global.has_tokens() {
                bucket.try_consume();
                global.try_consume();
                LimitDecision::Admit
            } else {
                LimitDecision::Throttle
            };
            (decision, bucket.tokens(), global.tokens())
        });

        match decision {
            LimitDecision::Admit => self.metrics.record_admitted(),
            LimitDecision::Throttle => {
                let throttled = self.ledger.record(key);
                self.metrics.record_throttled();
                tracing::debug!(
                    key,
                    key_tokens,
                    global_tokens,
                    throttled,
                    throttled_total = self.ledger.throttled_total(),
                    "event throttled"
                );
            }
        }

        decision
    }

    /// Remove buckets that have not been checked for at least `idle_for`.
    ///
    /// A key checked only once is swept like any other. Returns the number
    /// of buckets removed.
    pub fn sweep_idle(&self, idle_for: Duration) -> usize {
        let now = self.registry.clock().now_secs();
        let idle_secs = idle_for.as_secs();
        let mut removed = 0;

        self.registry.cleanup(|_, bucket| match bucket.last_activity() {
            Some(last_activity) if now.saturating_sub(last_activity) >= idle_secs => {
                removed += 1;
                false
            }
            _ => true,
        });

        for _ in 0..removed {
            self.metrics.record_eviction();
        }
        if removed > 0 {
            tracing::debug!(removed, remaining = self.registry.len(), "swept idle buckets");
        }
        removed
    }

    /// Total rejections across all keys.
    pub fn throttled_total(&self) -> u64 {
        self.ledger.throttled_total()
    }

    /// Rejections recorded for `key`.
    pub fn throttled_count(&self, key: &str) -> u64 {
        self.ledger.throttled_count(key)
    }

    /// Snapshot of rejections per key.
    pub fn throttled_by_key(&self) -> HashMap<String, u64> {
        self.ledger.throttled_by_key()
    }

    /// Get the throttle ledger.
    pub fn ledger(&self) -> &ThrottleLedger {
        &self.ledger
    }

    /// Tokens left in `key`'s bucket, as of its last refill.
    ///
    /// `None` if the key has no bucket.
    pub fn available_tokens(&self, key: &str) -> Option<u64> {
        self.registry.peek(key).map(|bucket| bucket.tokens())
    }

    /// Tokens left in the global bucket, as of its last refill.
    pub fn global_tokens(&self) -> u64 {
        self.global.peek().tokens()
    }

    /// Number of per-key buckets currently held.
    pub fn key_count(&self) -> usize {
        self.registry.len()
    }

    /// Get the limiter configuration.
    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    /// Get the metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Get a reference to the registry.
    pub fn registry(&self) -> &BucketRegistry<S> {
        &self.registry
    }
}

impl<S> std::fmt::Debug for EventThrottle<S>
where
    S: Storage<String, BucketState> + Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventThrottle")
            .field("config", &self.config)
            .field("keys", &self.registry.len())
            .field("global_tokens", &self.global_tokens())
            .field("throttled_total", &self.throttled_total())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mocks::MockClock;

    fn throttle(capacity: u64, total: u64, fill: f64, clock: &MockClock) -> EventThrottle {
        EventThrottle::builder()
            .with_capacity(capacity)
            .with_total_capacity(total)
            .with_fill_per_second(fill)
            .with_clock(Arc::new(clock.clone()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_scenario_frozen_clock() {
        let clock = MockClock::at_secs(1_000);
        let throttle = throttle(20, 40, 3.0, &clock);

        for i in 0..20 {
            assert!(throttle.take("x"), "call {} on x should be admitted", i);
        }
        assert!(!throttle.take("x"));
        assert_eq!(throttle.throttled_count("x"), 1);
        assert_eq!(throttle.global_tokens(), 20);

        for i in 0..20 {
            assert!(throttle.take("y"), "call {} on y should be admitted", i);
        }
        assert!(!throttle.take("y"));
        assert_eq!(throttle.global_tokens(), 0);
        assert_eq!(throttle.available_tokens("x"), Some(0));
        assert_eq!(throttle.available_tokens("y"), Some(0));
        assert_eq!(throttle.throttled_total(), 2);
    }

    #[test]
    fn test_global_cap_shared_between_keys() {
        let clock = MockClock::at_secs(0);
        let throttle = throttle(10, 15, 1.0, &clock);

        let admitted = (0..10).filter(|_| throttle.take("a")).count()
            + (0..10).filter(|_| throttle.take("b")).count();

        assert_eq!(admitted, 15);
        assert_eq!(throttle.throttled_count("a"), 0);
        assert_eq!(throttle.throttled_count("b"), 5);
        // b's bucket kept the tokens the global bucket refused
        assert_eq!(throttle.available_tokens("b"), Some(5));
    }

    #[test]
    fn test_rejection_consumes_nothing() {
        let clock = MockClock::at_secs(0);
        let throttle = throttle(1, 5, 1.0, &clock);

        assert!(throttle.take("a"));
        for _ in 0..3 {
            assert!(!throttle.take("a"));
        }
        assert_eq!(throttle.global_tokens(), 4);
        assert_eq!(throttle.metrics().checks_throttled(), 3);
        assert_eq!(throttle.metrics().checks_admitted(), 1);
    }

    #[test]
    fn test_refill_after_clock_advance() {
        let clock = MockClock::at_secs(0);
        let throttle = throttle(5, 100, 2.0, &clock);

        for _ in 0..5 {
            assert!(throttle.take("a"));
        }
        // Stamps the key bucket's refill time
        assert!(!throttle.take("a"));

        clock.advance(Duration::from_secs(1));
        assert!(throttle.take("a"));
        assert!(throttle.take("a"));
        assert!(!throttle.take("a"));
    }

    #[test]
    fn test_refill_clamped_at_capacity() {
        let clock = MockClock::at_secs(0);
        let throttle = throttle(3, 3, 1.0, &clock);

        assert!(throttle.take("a"));
        assert!(throttle.take("a"));
        clock.advance(Duration::from_secs(3_600));

        assert!(throttle.take("a"));
        assert_eq!(throttle.available_tokens("a"), Some(2));
        assert_eq!(throttle.global_tokens(), 2);
    }

    #[test]
    fn test_check_reports_decision() {
        let clock = MockClock::at_secs(0);
        let throttle = throttle(1, 1, 1.0, &clock);

        assert_eq!(throttle.check("a"), LimitDecision::Admit);
        assert_eq!(throttle.check("a"), LimitDecision::Throttle);
    }

    #[test]
    fn test_sweep_idle_removes_stale_buckets() {
        let clock = MockClock::at_secs(0);
        let throttle = throttle(5, 100, 1.0, &clock);

        throttle.take("stale");
        throttle.take("stale");
        throttle.take("once");

        clock.advance(Duration::from_secs(60));
        throttle.take("active");

        assert_eq!(throttle.sweep_idle(Duration::from_secs(30)), 2);
        assert_eq!(throttle.available_tokens("stale"), None);
        assert_eq!(throttle.available_tokens("once"), None);
        assert!(throttle.available_tokens("active").is_some());
        assert_eq!(throttle.metrics().keys_evicted(), 2);
    }

    #[test]
    fn test_sweep_reclaims_single_check_keys_without_eviction() {
        let clock = MockClock::at_secs(0);
        let throttle = EventThrottle::builder()
            .with_capacity(1)
            .with_total_capacity(10)
            .with_fill_per_second(1.0)
            .with_unlimited_keys()
            .with_clock(Arc::new(clock.clone()))
            .build()
            .unwrap();

        for i in 0..1_000 {
            throttle.take(&format!("visitor{}", i));
        }
        clock.advance(Duration::from_secs(86_400));

        assert_eq!(throttle.sweep_idle(Duration::from_secs(60)), 1_000);
        assert_eq!(throttle.key_count(), 0);
    }

    #[test]
    fn test_clones_share_state() {
        let clock = MockClock::at_secs(0);
        let throttle = throttle(1, 10, 1.0, &clock);
        let clone = throttle.clone();

        assert!(throttle.take("a"));
        assert!(!clone.take("a"));
        assert_eq!(throttle.throttled_total(), 1);
    }
}
