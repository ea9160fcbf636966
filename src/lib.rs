//! # event-bucket-throttle
//!
//! Two-level token bucket admission control for keyed events.
//!
//! Every event carries a key (an event name, a user id, an endpoint). Each key
//! draws from its own bucket, and every key also draws from one global bucket,
//! so a single noisy key cannot starve the others and all keys together cannot
//! exceed the global budget.
//!
//! ## Quick Start
//!
//! ```rust
//! use event_bucket_throttle::EventThrottle;
//!
//! // 20 events per key, 40 events across all keys, refilling 3 tokens/sec
//! let throttle = EventThrottle::new(20, 40, 3.0).expect("valid limits");
//!
//! if throttle.take("payment_failed") {
//!     // emit the event
//! }
//!
//! // Report what was dropped
//! for (key, count) in throttle.throttled_by_key() {
//!     println!("{key}: {count} throttled");
//! }
//! ```
//!
//! ## How Refill Works
//!
//! Buckets are refilled lazily, only when they are checked, never by a timer:
//!
//! - A key seen for the first time gets a full bucket of `capacity` tokens.
//! - On each later check the bucket gains `floor(elapsed_secs * fill_per_second)`
//!   tokens, capped at `capacity`. Time is measured in whole seconds.
//! - The global bucket is refilled the same way on every check, with
//!   `total_capacity` as its cap.
//! - An event is admitted only if both buckets hold a token; admission takes
//!   one from each. A throttled event takes nothing and is counted in the
//!   throttle ledger.
//!
//! At a frozen clock a single key therefore gets exactly
//! `min(capacity, total_capacity)` admissions in a row.
//!
//! ## Configuration
//!
//! ```rust
//! use event_bucket_throttle::EventThrottle;
//!
//! let throttle = EventThrottle::builder()
//!     .with_capacity(10)
//!     .with_total_capacity(100)
//!     .with_fill_per_second(0.5)
//!     .with_max_keys(50_000)
//!     .build()
//!     .expect("valid config");
//! # assert!(throttle.take("k"));
//! ```
//!
//! With the `serde` feature, [`ThrottleConfig`] can be loaded from a config
//! file and passed to [`EventThrottleBuilder::with_config`].
//!
//! ## Memory Management
//!
//! Per-key buckets are kept in a sharded map. By default at most 10,000 keys
//! are tracked; beyond that the least recently used bucket is evicted and
//! that key starts over with a full bucket. The throttle ledger is not
//! affected by eviction.
//!
//! - Use `.with_max_keys(n)` to change the bound.
//! - Use `.with_unlimited_keys()` to keep every bucket forever. Only safe when
//!   the set of keys is bounded.
//! - Call [`EventThrottle::sweep_idle`] to drop buckets that have not been
//!   checked for a while. With the `async` feature,
//!   `EventThrottle::start_idle_sweeper` does this on an interval.
//!
//! ## Observability
//!
//! - [`EventThrottle::throttled_total`], [`EventThrottle::throttled_count`]
//!   and [`EventThrottle::throttled_by_key`] expose the throttle ledger.
//! - [`EventThrottle::metrics`] counts admitted and throttled checks and
//!   evicted buckets.
//! - Internals log through `tracing`: bucket creation at `trace`, throttled
//!   events, evictions and sweeps at `debug`, sweeper lifecycle at `info`.
//!
//! ## Thread Safety
//!
//! [`EventThrottle`] is `Send + Sync` and cheap to clone; clones share state.
//! Checks on the same key are serialized, checks on different keys only
//! contend briefly on the global bucket.

// Domain layer - pure business logic
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    bucket::BucketState,
    config::{ConfigError, ThrottleConfig, DEFAULT_MAX_KEYS},
    decision::LimitDecision,
};

pub use application::{
    global_bucket::GlobalBucket,
    ledger::ThrottleLedger,
    limiter::{DefaultStorage, EventThrottle},
    metrics::{Metrics, MetricsSnapshot},
    ports::{Clock, EvictionCandidate, EvictionPolicy, Storage},
    registry::BucketRegistry,
};

#[cfg(feature = "async")]
pub use application::sweeper::{ShutdownError, SweeperConfig, SweeperConfigError, SweeperHandle};

pub use infrastructure::{
    builder::{BuildError, EventThrottleBuilder},
    clock::SystemClock,
    eviction::LruEviction,
    storage::ShardedStorage,
};
