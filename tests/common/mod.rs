//! Shared helpers for integration tests.

use event_bucket_throttle::infrastructure::mocks::MockClock;
use event_bucket_throttle::EventThrottle;
use std::sync::Arc;

#[allow(dead_code)]
pub fn throttle_with(capacity: u64, total: u64, fill: f64, clock: &MockClock) -> EventThrottle {
    EventThrottle::builder()
        .with_capacity(capacity)
        .with_total_capacity(total)
        .with_fill_per_second(fill)
        .with_clock(Arc::new(clock.clone()))
        .build()
        .unwrap()
}
