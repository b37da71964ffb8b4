//! Periodic emission of observability snapshots.
//!
//! Publishes the gate's [`StatsSnapshot`] at a fixed interval so external
//! metrics pipelines can scrape rate, pressure, block rate, and store
//! occupancy without polling the gate themselves.

use crate::application::metrics::StatsSnapshot;
use std::time::Duration;

#[cfg(feature = "async")]
use tokio::time::interval;

/// Error returned when emitter configuration validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitterConfigError {
    /// Emission interval duration must be greater than zero
    ZeroInterval,
}

impl std::fmt::Display for EmitterConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmitterConfigError::ZeroInterval => {
                write!(f, "emission interval must be greater than 0")
            }
        }
    }
}

impl std::error::Error for EmitterConfigError {}

/// Configuration for periodic stats emission.
#[derive(Debug, Clone, PartialEq)]
pub struct EmitterConfig {
    /// How often to emit a snapshot.
    pub interval: Duration,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
        }
    }
}

impl EmitterConfig {
    /// Create a new emitter config with the specified interval.
    ///
    /// # Errors
    /// Returns `EmitterConfigError::ZeroInterval` if `interval` is zero.
    pub fn new(interval: Duration) -> Result<Self, EmitterConfigError> {
        if interval.is_zero() {
            return Err(EmitterConfigError::ZeroInterval);
        }
        Ok(Self { interval })
    }
}

/// Emits periodic observability snapshots.
///
/// Generic over the snapshot source so it can observe a gate, a bare
/// controller, or a test fixture alike.
pub struct StatsEmitter<P>
where
    P: Fn() -> StatsSnapshot + Send + 'static,
{
    source: P,
    config: EmitterConfig,
}

impl<P> StatsEmitter<P>
where
    P: Fn() -> StatsSnapshot + Send + 'static,
{
    /// Create a new emitter over a snapshot source.
    pub fn new(source: P, config: EmitterConfig) -> Self {
        Self { source, config }
    }

    /// Take one snapshot from the source.
    pub fn collect(&self) -> StatsSnapshot {
        (self.source)()
    }

    /// Get the emitter configuration.
    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    /// Start emitting snapshots periodically on a background task.
    ///
    /// The task runs until aborted; drop the handle's owner or call
    /// `abort()` on it to stop emission.
    #[cfg(feature = "async")]
    pub fn start<F>(self, mut emit_fn: F) -> tokio::task::JoinHandle<()>
    where
        F: FnMut(StatsSnapshot) + Send + 'static,
    {
        tokio::spawn(async move {
            let mut ticker = interval(self.config.interval);

            loop {
                ticker.tick().await;
                emit_fn(self.collect());
            }
        })
    }
}
