//! Limiter configuration and its validation rules.

/// Default bound on the number of per-key buckets kept in memory.
pub const DEFAULT_MAX_KEYS: usize = 10_000;

/// Error returned when a [`ThrottleConfig`] is invalid.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Per-key capacity must be greater than zero
    #[error("per-key capacity must be greater than 0")]
    ZeroCapacity,
    /// Global capacity must be greater than zero
    #[error("total capacity must be greater than 0")]
    ZeroTotalCapacity,
    /// Fill rate must be finite and greater than zero
    #[error("fill rate must be a finite number greater than 0, got {0}")]
    InvalidFillRate(f64),
    /// Key limit, when set, must be greater than zero
    #[error("max_keys must be greater than 0")]
    ZeroMaxKeys,
}

/// Immutable limiter configuration.
///
/// `capacity` bounds each per-key bucket, `total_capacity` bounds the global
/// bucket, and `fill_per_second` is the refill rate shared by all of them.
///
/// # Example
/// ```
/// use event_bucket_throttle::{ConfigError, ThrottleConfig};
///
/// let config = ThrottleConfig::new(20, 40, 3.0).unwrap();
/// assert_eq!(config.capacity(), 20);
/// assert_eq!(config.max_keys(), Some(10_000));
///
/// assert_eq!(
///     ThrottleConfig::new(20, 40, 0.0).unwrap_err(),
///     ConfigError::InvalidFillRate(0.0)
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThrottleConfig {
    capacity: u64,
    total_capacity: u64,
    fill_per_second: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_max_keys"))]
    max_keys: Option<usize>,
}

#[cfg(feature = "serde")]
fn default_max_keys() -> Option<usize> {
    Some(DEFAULT_MAX_KEYS)
}

impl ThrottleConfig {
    /// Create a validated configuration with the default key limit.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if a capacity is zero or the fill rate is not
    /// a finite positive number.
    pub fn new(
        capacity: u64,
        total_capacity: u64,
        fill_per_second: f64,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            capacity,
            total_capacity,
            fill_per_second,
            max_keys: Some(DEFAULT_MAX_KEYS),
        };
        config.validate()?;
        Ok(config)
    }

    /// Bound the number of per-key buckets kept in memory.
    ///
    /// # Errors
    /// Returns [`ConfigError::ZeroMaxKeys`] if `max_keys` is zero.
    pub fn with_max_keys(mut self, max_keys: usize) -> Result<Self, ConfigError> {
        if max_keys == 0 {
            return Err(ConfigError::ZeroMaxKeys);
        }
        self.max_keys = Some(max_keys);
        Ok(self)
    }

    /// Keep every per-key bucket for the lifetime of the limiter.
    ///
    /// Memory then grows with the number of distinct keys ever seen.
    pub fn with_unlimited_keys(mut self) -> Self {
        self.max_keys = None;
        self
    }

    /// Check every field.
    ///
    /// Needed after deserializing, since serde bypasses [`ThrottleConfig::new`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.total_capacity == 0 {
            return Err(ConfigError::ZeroTotalCapacity);
        }
        if !self.fill_per_second.is_finite() || self.fill_per_second <= 0.0 {
            return Err(ConfigError::InvalidFillRate(self.fill_per_second));
        }
        if self.max_keys == Some(0) {
            return Err(ConfigError::ZeroMaxKeys);
        }
        Ok(())
    }

    /// Per-key bucket capacity.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Global bucket capacity.
    pub fn total_capacity(&self) -> u64 {
        self.total_capacity
    }

    /// Tokens added per elapsed second to every bucket.
    pub fn fill_per_second(&self) -> f64 {
        self.fill_per_second
    }

    /// Maximum number of per-key buckets, `None` if unbounded.
    pub fn max_keys(&self) -> Option<usize> {
        self.max_keys
    }

    /// Most consecutive admissions a single key can get without refill.
    pub fn burst(&self) -> u64 {
        self.capacity.min(self.total_capacity)
    }
}
