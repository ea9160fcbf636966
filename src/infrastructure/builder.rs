//! Fluent construction of an [`EventThrottle`].

use crate::application::{
    limiter::{DefaultStorage, EventThrottle},
    metrics::Metrics,
    ports::{Clock, EvictionPolicy},
    registry::BucketRegistry,
};
use crate::domain::{
    bucket::BucketState,
    config::{ConfigError, ThrottleConfig, DEFAULT_MAX_KEYS},
};
use crate::infrastructure::{clock::SystemClock, eviction::LruEviction, storage::ShardedStorage};
use std::sync::Arc;

/// Error returned when building an [`EventThrottle`] fails.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    /// No per-key capacity was given
    #[error("per-key capacity is required")]
    MissingCapacity,
    /// No global capacity was given
    #[error("total capacity is required")]
    MissingTotalCapacity,
    /// No fill rate was given
    #[error("fill rate is required")]
    MissingFillRate,
    /// The resulting configuration is invalid
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Builder for constructing an [`EventThrottle`].
///
/// Capacity, total capacity and fill rate have no defaults and must be set,
/// either one by one or through [`EventThrottleBuilder::with_config`].
pub struct EventThrottleBuilder {
    capacity: Option<u64>,
    total_capacity: Option<u64>,
    fill_per_second: Option<f64>,
    max_keys: Option<usize>,
    clock: Option<Arc<dyn Clock>>,
}

impl EventThrottleBuilder {
    pub(crate) fn new() -> Self {
        Self {
            capacity: None,
            total_capacity: None,
            fill_per_second: None,
            max_keys: Some(DEFAULT_MAX_KEYS),
            clock: None,
        }
    }

    /// Set the capacity of every per-key bucket.
    pub fn with_capacity(mut self, capacity: u64) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Set the capacity of the global bucket.
    pub fn with_total_capacity(mut self, total_capacity: u64) -> Self {
        self.total_capacity = Some(total_capacity);
        self
    }

    /// Set the refill rate, in tokens per second, shared by all buckets.
    pub fn with_fill_per_second(mut self, fill_per_second: f64) -> Self {
        self.fill_per_second = Some(fill_per_second);
        self
    }

    /// Take every limit from an existing configuration.
    pub fn with_config(mut self, config: &ThrottleConfig) -> Self {
        self.capacity = Some(config.capacity());
        self.total_capacity = Some(config.total_capacity());
        self.fill_per_second = Some(config.fill_per_second());
        self.max_keys = config.max_keys();
        self
    }

    /// Set a custom clock (mainly for testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set the maximum number of per-key buckets to keep.
    ///
    /// When this limit is reached, the least recently used bucket is evicted.
    /// An evicted key starts over with a full bucket on its next check.
    ///
    /// Default: 10,000 keys
    ///
    /// The value will be validated when `build()` is called.
    pub fn with_max_keys(mut self, max_keys: usize) -> Self {
        self.max_keys = Some(max_keys);
        self
    }

    /// Disable the key limit, allowing unbounded growth.
    ///
    /// **Warning**: memory then grows with every distinct key ever checked.
    /// Only use this if keys have bounded cardinality or buckets are swept.
    pub fn with_unlimited_keys(mut self) -> Self {
        self.max_keys = None;
        self
    }

    /// Build the limiter.
    ///
    /// # Errors
    /// Returns `BuildError` if a required value is missing or the
    /// configuration is invalid.
    pub fn build(self) -> Result<EventThrottle, BuildError> {
        let capacity = self.capacity.ok_or(BuildError::MissingCapacity)?;
        let total_capacity = self.total_capacity.ok_or(BuildError::MissingTotalCapacity)?;
        let fill_per_second = self.fill_per_second.ok_or(BuildError::MissingFillRate)?;

        let config = ThrottleConfig::new(capacity, total_capacity, fill_per_second)?;
        let config = match self.max_keys {
            Some(max_keys) => config.with_max_keys(max_keys)?,
            None => config.with_unlimited_keys(),
        };

        let metrics = Metrics::new();
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock::new()));

        let mut storage = ShardedStorage::new().with_metrics(metrics.clone());
        if let Some(max_keys) = config.max_keys() {
            let policy: Arc<dyn EvictionPolicy<String, BucketState>> =
                Arc::new(LruEviction::new(max_keys));
            storage = storage.with_eviction_policy(policy);
        }

        let storage: DefaultStorage = Arc::new(storage);
        let registry = BucketRegistry::new(storage, clock, capacity, fill_per_second);

        tracing::debug!(
            capacity,
            total_capacity,
            fill_per_second,
            max_keys = ?config.max_keys(),
            "built event throttle"
        );

        Ok(EventThrottle::from_parts(config, registry, metrics))
    }
}

impl Default for EventThrottleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EventThrottle<DefaultStorage> {
    /// Create a limiter with the given limits and default settings.
    ///
    /// Uses the system clock and keeps at most 10,000 per-key buckets.
    ///
    /// # Errors
    /// Returns `BuildError::Config` if a capacity is zero or the fill rate is
    /// not a finite positive number.
    pub fn new(
        capacity: u64,
        total_capacity: u64,
        fill_per_second: f64,
    ) -> Result<Self, BuildError> {
        Self::builder()
            .with_capacity(capacity)
            .with_total_capacity(total_capacity)
            .with_fill_per_second(fill_per_second)
            .build()
    }

    /// Create a builder for configuring the limiter.
    ///
    /// Defaults:
    /// - Clock: system clock
    /// - Max keys: 10,000 (with LRU eviction)
    pub fn builder() -> EventThrottleBuilder {
        EventThrottleBuilder::new()
    }
}
