//! Mock clock for testing.

use crate::application::ports::Clock;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Mock clock for testing.
///
/// Allows tests to control time progression explicitly, enabling deterministic
/// testing of refill timing.
///
/// # Examples
///
/// Requires the `test-helpers` feature outside of this crate's own tests.
///
/// ```ignore
/// use event_bucket_throttle::infrastructure::mocks::MockClock;
/// use event_bucket_throttle::Clock;
/// use std::time::Duration;
///
/// let clock = MockClock::at_secs(1_000);
/// assert_eq!(clock.now_secs(), 1_000);
///
/// // Advance time explicitly
/// clock.advance(Duration::from_secs(10));
/// assert_eq!(clock.now_secs(), 1_010);
///
/// // Or let every read move time forward
/// let ticking = MockClock::ticking(Duration::ZERO, Duration::from_millis(500));
/// assert_eq!(ticking.now_secs(), 0);
/// assert_eq!(ticking.now_secs(), 1);
/// ```
///
/// # Thread Safety
///
/// All clones share the same underlying time value, so advancing time in
/// one clone affects all clones.
#[derive(Debug, Clone)]
pub struct MockClock {
    current_time: Arc<Mutex<SystemTime>>,
    step: Duration,
}

impl MockClock {
    /// Create a frozen mock clock at a specific time.
    pub fn new(start: SystemTime) -> Self {
        Self {
            current_time: Arc::new(Mutex::new(start)),
            step: Duration::ZERO,
        }
    }

    /// Create a frozen mock clock `secs` seconds after the Unix epoch.
    pub fn at_secs(secs: u64) -> Self {
        Self::new(UNIX_EPOCH + Duration::from_secs(secs))
    }

    /// Create a clock that moves forward by `step` before every read.
    ///
    /// `start` is the offset from the Unix epoch; the first read returns
    /// `start + step`.
    pub fn ticking(start: Duration, step: Duration) -> Self {
        Self {
            current_time: Arc::new(Mutex::new(UNIX_EPOCH + start)),
            step,
        }
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, duration: Duration) {
        let mut time = self.lock();
        *time += duration;
    }

    /// Set the clock to a specific time.
    pub fn set(&self, time: SystemTime) {
        *self.lock() = time;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SystemTime> {
        self.current_time
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for MockClock {
    fn now(&self) -> SystemTime {
        let mut time = self.lock();
        *time += self.step;
        *time
    }
}
