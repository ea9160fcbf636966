//! Infrastructure layer - external adapters.
//!
//! This layer provides adapters for:
//! - Clock abstraction (system time vs mock)
//! - Storage implementations (sharded maps)
//! - Eviction policies (LRU)
//! - Limiter construction (builder)

pub mod builder;
pub mod clock;
pub mod eviction;
pub mod storage;

/// Mock implementations for testing.
///
/// This module is only available when the `test-helpers` feature is enabled,
/// or during test builds. It provides a controllable clock for testing
/// refill behavior.
#[cfg(any(test, feature = "test-helpers"))]
pub mod mocks;
