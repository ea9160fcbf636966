//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates the domain logic and manages the runtime behavior:
//! - Bucket registry (storage and lazy refill of per-key buckets)
//! - Global bucket (the shared reservoir)
//! - Event throttle (admission decisions)
//! - Throttle ledger and metrics (what was rejected, and how often)
//! - Idle sweeper (periodic cleanup, `async` feature)
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details.

pub mod global_bucket;
pub mod ledger;
pub mod limiter;
pub mod metrics;
pub mod ports;
pub mod registry;

#[cfg(feature = "async")]
pub mod sweeper;
