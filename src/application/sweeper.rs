//! Background sweeping of idle buckets.
//!
//! Periodically calls [`EventThrottle::sweep_idle`] so that keys which stopped
//! sending events give their memory back without waiting for LRU pressure.

use crate::application::{limiter::EventThrottle, ports::Storage};
use crate::domain::bucket::BucketState;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval_at, Instant};

/// Error returned when sweeper configuration validation fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SweeperConfigError {
    /// Sweep interval must be greater than zero
    #[error("sweep interval must be greater than 0")]
    ZeroInterval,
}

/// Error returned when the sweeper task did not stop cleanly.
#[derive(Debug, thiserror::Error)]
pub enum ShutdownError {
    /// The task panicked or was aborted before it could stop
    #[error("sweeper task failed: {0}")]
    Task(#[from] JoinError),
}

/// Configuration for the idle sweeper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweeperConfig {
    /// How often to sweep
    pub interval: Duration,
    /// How long a bucket must go unchecked before it is removed
    pub idle_for: Duration,
}

impl SweeperConfig {
    /// Create a sweeper config.
    ///
    /// # Errors
    /// Returns `SweeperConfigError::ZeroInterval` if `interval` is zero.
    pub fn new(interval: Duration, idle_for: Duration) -> Result<Self, SweeperConfigError> {
        if interval.is_zero() {
            return Err(SweeperConfigError::ZeroInterval);
        }
        Ok(Self { interval, idle_for })
    }
}

/// Handle to a running sweeper task.
///
/// Dropping the handle leaves the task running; call
/// [`SweeperHandle::shutdown`] or [`SweeperHandle::abort`] to stop it.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the sweeper and wait for it to finish its current sweep.
    ///
    /// # Errors
    /// Returns `ShutdownError` if the task panicked or was aborted.
    pub async fn shutdown(mut self) -> Result<(), ShutdownError> {
        if let Some(tx) = self.shutdown_tx.take() {
            // The task may already be gone, in which case joining reports why.
            let _ = tx.send(());
        }
        self.task.await?;
        Ok(())
    }

    /// Stop the sweeper without waiting.
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Check if the task has stopped.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl<S> EventThrottle<S>
where
    S: Storage<String, BucketState> + Clone + 'static,
{
    /// Start sweeping idle buckets in the background.
    ///
    /// The first sweep runs one `interval` after the call. Must be called
    /// from within a tokio runtime.
    pub fn start_idle_sweeper(&self, config: SweeperConfig) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let throttle = self.clone();

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + config.interval, config.interval);
            tracing::info!(
                interval_ms = config.interval.as_millis() as u64,
                idle_for_secs = config.idle_for.as_secs(),
                "idle sweeper started"
            );

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        throttle.sweep_idle(config.idle_for);
                    }
                }
            }

            tracing::info!("idle sweeper stopped");
        });

        SweeperHandle {
            shutdown_tx: Some(shutdown_tx),
            task,
        }
    }
}
