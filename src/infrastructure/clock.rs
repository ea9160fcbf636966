//! Wall-clock adapter.
//!
//! Refill arithmetic works on whole seconds since the Unix epoch, so the
//! clock must report wall time rather than a monotonic `Instant`. The
//! consequence is that the clock can jump backwards (NTP, manual changes);
//! bucket refills treat a backwards step as zero elapsed time.
//!
//! Tests drive time with `MockClock` from `crate::infrastructure::mocks`,
//! available in test builds or with the `test-helpers` feature.

use crate::application::ports::Clock;
use std::time::SystemTime;

/// Production clock reading `SystemTime::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}
