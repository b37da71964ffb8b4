//! Observability metrics for admission control.
//!
//! Provides cumulative counters about admission behavior for monitoring and
//! debugging, plus the periodic stats snapshot exposed to external metrics
//! consumers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking admission-control statistics.
///
/// All counters use atomic operations for thread-safe updates and reads.
/// Counters are cumulative for the lifetime of the gate; the per-cycle
/// figures the tuner consumes live in the pressure monitor instead.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    /// Requests admitted to the downstream handler
    admitted: AtomicU64,
    /// Requests rejected by the limiter
    rejected: AtomicU64,
    /// Requests admitted unconditionally for lack of an identity
    passthrough: AtomicU64,
    /// Identity states evicted from the store
    evicted: AtomicU64,
    /// Monotonic clock regressions observed (clamped, never fatal)
    clock_anomalies: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                admitted: AtomicU64::new(0),
                rejected: AtomicU64::new(0),
                passthrough: AtomicU64::new(0),
                evicted: AtomicU64::new(0),
                clock_anomalies: AtomicU64::new(0),
            }),
        }
    }

    /// Record an admitted request.
    pub(crate) fn record_admitted(&self) {
        self.inner.admitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rejected request.
    pub(crate) fn record_rejected(&self) {
        self.inner.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an identity-less pass-through.
    pub(crate) fn record_passthrough(&self) {
        self.inner.passthrough.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an evicted identity state.
    pub(crate) fn record_eviction(&self) {
        self.inner.evicted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a clock regression.
    pub(crate) fn record_clock_anomaly(&self) {
        self.inner.clock_anomalies.fetch_add(1, Ordering::Relaxed);
    }

    /// Total requests admitted to the downstream handler.
    pub fn admitted(&self) -> u64 {
        self.inner.admitted.load(Ordering::Relaxed)
    }

    /// Total requests rejected.
    pub fn rejected(&self) -> u64 {
        self.inner.rejected.load(Ordering::Relaxed)
    }

    /// Total identity-less pass-throughs.
    pub fn passthrough(&self) -> u64 {
        self.inner.passthrough.load(Ordering::Relaxed)
    }

    /// Total identity states evicted.
    pub fn evicted(&self) -> u64 {
        self.inner.evicted.load(Ordering::Relaxed)
    }

    /// Total clock regressions observed.
    pub fn clock_anomalies(&self) -> u64 {
        self.inner.clock_anomalies.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            admitted: self.admitted(),
            rejected: self.rejected(),
            passthrough: self.passthrough(),
            evicted: self.evicted(),
            clock_anomalies: self.clock_anomalies(),
        }
    }

    /// Reset all counters to zero.
    ///
    /// Useful for testing or when starting a new monitoring period.
    pub fn reset(&self) {
        self.inner.admitted.store(0, Ordering::Relaxed);
        self.inner.rejected.store(0, Ordering::Relaxed);
        self.inner.passthrough.store(0, Ordering::Relaxed);
        self.inner.evicted.store(0, Ordering::Relaxed);
        self.inner.clock_anomalies.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of the cumulative counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricsSnapshot {
    /// Requests admitted to the downstream handler
    pub admitted: u64,
    /// Requests rejected by the limiter
    pub rejected: u64,
    /// Requests admitted unconditionally for lack of an identity
    pub passthrough: u64,
    /// Identity states evicted from the store
    pub evicted: u64,
    /// Monotonic clock regressions observed
    pub clock_anomalies: u64,
}

impl MetricsSnapshot {
    /// Total limited requests (admitted + rejected, pass-throughs excluded).
    pub fn total_decided(&self) -> u64 {
        self.admitted.saturating_add(self.rejected)
    }

    /// Lifetime ratio of rejected to decided requests (0.0 to 1.0).
    ///
    /// Returns 0.0 if no request has been decided.
    pub fn block_rate(&self) -> f64 {
        let total = self.total_decided();
        if total == 0 {
            0.0
        } else {
            self.rejected as f64 / total as f64
        }
    }
}

/// Periodic observability snapshot of the whole gate.
///
/// Published for external metrics consumption; see
/// [`AdmissionGate::stats`](crate::infrastructure::gate::AdmissionGate::stats).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatsSnapshot {
    /// Tuned replenishment rate for the default tier, tokens per second.
    pub current_rate: f64,
    /// Burst capacity of the default tier (`current_rate × burst_factor`).
    pub burst_capacity: f64,
    /// Current burst multiplier.
    pub burst_factor: f64,
    /// Normalized load indicator from the latency distribution, 0.0 to 1.0.
    pub pressure: f64,
    /// Blocked share of the current tuning cycle, 0.0 to 1.0.
    pub block_rate: f64,
    /// Tracked identities relative to the store bound (0.0 to 1.0;
    /// 0.0 when the store is unbounded).
    pub store_occupancy_ratio: f64,
}
