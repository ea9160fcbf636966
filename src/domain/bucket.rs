//! Token bucket state and the lazy refill algorithm.
//!
//! A bucket holds a whole number of tokens and remembers the second at which
//! it was last refilled. Tokens are added only when a caller touches the
//! bucket, proportionally to the whole seconds elapsed since the previous
//! refill.

/// State of a single token reservoir.
///
/// Used both for per-key buckets and for the global bucket. The state does
/// not know its own capacity; the capacity is supplied on every refill so
/// that one configuration value governs every bucket of a kind.
///
/// # Example
/// ```
/// use event_bucket_throttle::BucketState;
///
/// let mut bucket = BucketState::full(3);
/// assert!(bucket.try_consume());
/// assert_eq!(bucket.tokens(), 2);
///
/// // First refill only records the timestamp
/// bucket.refill(100, 3, 1.0);
/// assert_eq!(bucket.tokens(), 2);
///
/// // Five seconds later the bucket is back at capacity
/// bucket.refill(105, 3, 1.0);
/// assert_eq!(bucket.tokens(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketState {
    tokens: u64,
    last_refill: Option<u64>,
    last_seen: Option<u64>,
}

impl BucketState {
    /// Create a bucket filled to `capacity` that has never been refilled.
    pub fn full(capacity: u64) -> Self {
        Self {
            tokens: capacity,
            last_refill: None,
            last_seen: None,
        }
    }

    /// Tokens currently available.
    pub fn tokens(&self) -> u64 {
        self.tokens
    }

    /// Second (since the Unix epoch) of the last refill, if any.
    pub fn last_refill(&self) -> Option<u64> {
        self.last_refill
    }

    /// Second (since the Unix epoch) of the last admission check, if any.
    ///
    /// Unlike the refill timestamp this is set on a bucket's very first check,
    /// and it never affects how many tokens a refill adds.
    pub fn last_seen(&self) -> Option<u64> {
        self.last_seen
    }

    /// Latest second at which the bucket was checked or refilled.
    ///
    /// `None` only for a bucket that was never touched.
    pub fn last_activity(&self) -> Option<u64> {
        self.last_seen.max(self.last_refill)
    }

    /// Record that the bucket was checked at `now_secs`.
    pub fn mark_seen(&mut self, now_secs: u64) {
        self.last_seen = Some(now_secs);
    }

    /// Check whether at least one token is available.
    pub fn has_tokens(&self) -> bool {
        self.tokens > 0
    }

    /// Add the tokens earned since the last refill.
    ///
    /// The first refill of a bucket records `now_secs` and adds nothing.
    /// Later refills add `floor(elapsed * fill_per_second)` tokens, clamped at
    /// `capacity`. A clock that went backwards counts as zero elapsed time.
    /// The refill timestamp is always moved to `now_secs`.
    pub fn refill(&mut self, now_secs: u64, capacity: u64, fill_per_second: f64) {
        let last_refill = *self.last_refill.get_or_insert(now_secs);
        let elapsed = now_secs.saturating_sub(last_refill);

        self.tokens = self
            .tokens
            .saturating_add(tokens_earned(elapsed, fill_per_second))
            .min(capacity);
        self.last_refill = Some(now_secs);
    }

    /// Remove one token if any is available.
    ///
    /// Returns `false` and leaves the bucket untouched when it is empty.
    pub fn try_consume(&mut self) -> bool {
        if self.tokens == 0 {
            return false;
        }
        self.tokens -= 1;
        true
    }
}

/// Whole tokens earned over `elapsed_secs` at `fill_per_second`.
///
/// Float-to-int casts saturate, so absurd products clamp to `u64::MAX`.
fn tokens_earned(elapsed_secs: u64, fill_per_second: f64) -> u64 {
    if elapsed_secs == 0 {
        return 0;
    }
    (elapsed_secs as f64 * fill_per_second).floor() as u64
}
