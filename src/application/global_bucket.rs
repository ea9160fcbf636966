//! The single global bucket shared by every key.

use crate::domain::bucket::BucketState;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Global token reservoir bounding aggregate throughput.
///
/// Created full. Its refill timestamp stays unset until the first admission
/// check.
#[derive(Debug)]
pub struct GlobalBucket {
    capacity: u64,
    state: Mutex<BucketState>,
}

impl GlobalBucket {
    /// Create a full global bucket.
    pub fn new(capacity: u64) -> Self {
        Self {
            capacity,
            state: Mutex::new(BucketState::full(capacity)),
        }
    }

    /// Global capacity.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Current state without refilling.
    pub fn peek(&self) -> BucketState {
        *self.lock()
    }

    /// Lock the bucket, refill it to `now_secs`, and hand back the guard.
    ///
    /// Callers holding a per-key bucket lock must take this lock second.
    pub(crate) fn refill(&self, now_secs: u64, fill_per_second: f64) -> MutexGuard<'_, BucketState> {
        let mut state = self.lock();
        state.refill(now_secs, self.capacity, fill_per_second);
        state
    }

    // A panic while holding the lock cannot leave the state half-written:
    // every mutation is a single assignment.
    fn lock(&self) -> MutexGuard<'_, BucketState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
