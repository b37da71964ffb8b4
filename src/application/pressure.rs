//! Bounded-memory load tracking for the auto-tuner.
//!
//! The monitor keeps a rolling window of recent request latencies plus
//! per-cycle admit/block counters. From these it derives *pressure*, a
//! normalized indicator of how skewed the latency distribution is: the
//! closer the mean sits to the 95th percentile, the more uniformly loaded
//! the system is.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Default number of latency samples retained.
pub const DEFAULT_SAMPLE_WINDOW: usize = 1000;

/// Bounded-memory aggregator of request latencies and block counts.
///
/// Recording is O(1): one bounded-FIFO append plus two atomic increments.
/// The percentile computation is deferred to [`snapshot`](Self::snapshot),
/// which runs once per tuning cycle rather than once per request.
///
/// Cloning shares the underlying window and counters.
#[derive(Debug, Clone)]
pub struct PressureMonitor {
    inner: Arc<PressureInner>,
}

#[derive(Debug)]
struct PressureInner {
    /// Rolling latency window, seconds; oldest evicted past `max_samples`
    latencies: Mutex<VecDeque<f64>>,
    max_samples: usize,
    /// Per-cycle counters, reset by the tuner each cycle
    total_requests: AtomicU64,
    blocked_requests: AtomicU64,
}

impl PressureMonitor {
    /// Create a monitor retaining up to `max_samples` latencies.
    pub fn new(max_samples: usize) -> Self {
        Self {
            inner: Arc::new(PressureInner {
                latencies: Mutex::new(VecDeque::with_capacity(max_samples.min(1024))),
                max_samples,
                total_requests: AtomicU64::new(0),
                blocked_requests: AtomicU64::new(0),
            }),
        }
    }

    /// Record one completed decision.
    ///
    /// `latency` is the full handling time for admitted requests and the
    /// decision time for rejected ones.
    pub fn record(&self, latency: Duration, blocked: bool) {
        let mut latencies = self
            .inner
            .latencies
            .lock()
            .expect("pressure monitor mutex poisoned");
        if latencies.len() == self.inner.max_samples {
            latencies.pop_front();
        }
        latencies.push_back(latency.as_secs_f64());
        drop(latencies);

        self.inner.total_requests.fetch_add(1, Ordering::Relaxed);
        if blocked {
            self.inner.blocked_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Number of latency samples currently held.
    pub fn sample_count(&self) -> usize {
        self.inner
            .latencies
            .lock()
            .expect("pressure monitor mutex poisoned")
            .len()
    }

    /// Compute a read-only snapshot of the current cycle.
    pub fn snapshot(&self) -> PressureSnapshot {
        let total = self.inner.total_requests.load(Ordering::Relaxed);
        let blocked = self.inner.blocked_requests.load(Ordering::Relaxed);
        let block_rate = if total == 0 {
            0.0
        } else {
            blocked as f64 / total as f64
        };

        PressureSnapshot {
            pressure: self.pressure(),
            block_rate,
            total_requests: total,
            blocked_requests: blocked,
        }
    }

    /// Normalized pressure: `clamp(mean / p95, 0, 1)`.
    ///
    /// Returns 0.0 with no samples, or when the p95 latency is zero (all
    /// samples below timer resolution), avoiding a division by zero.
    pub fn pressure(&self) -> f64 {
        let latencies = self
            .inner
            .latencies
            .lock()
            .expect("pressure monitor mutex poisoned");
        if latencies.is_empty() {
            return 0.0;
        }

        let mut sorted: Vec<f64> = latencies.iter().copied().collect();
        drop(latencies);
        sorted.sort_by(|a, b| a.partial_cmp(b).expect("latencies are finite"));

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let p95 = sorted[((count as f64 * 0.95) as usize).min(count - 1)];

        if p95 <= 0.0 {
            0.0
        } else {
            (mean / p95).clamp(0.0, 1.0)
        }
    }

    /// Reset the per-cycle counters, preserving the latency window.
    ///
    /// Called by the tuner after each tuning cycle so that block rate
    /// reflects the current cycle only while pressure keeps its rolling
    /// history.
    pub fn begin_cycle(&self) {
        self.inner.total_requests.store(0, Ordering::Relaxed);
        self.inner.blocked_requests.store(0, Ordering::Relaxed);
    }
}

impl Default for PressureMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_WINDOW)
    }
}

/// Read-only view of one tuning cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PressureSnapshot {
    /// Normalized load indicator, 0.0 to 1.0.
    pub pressure: f64,
    /// Blocked share of this cycle's requests, 0.0 to 1.0.
    pub block_rate: f64,
    /// Requests decided this cycle.
    pub total_requests: u64,
    /// Requests blocked this cycle.
    pub blocked_requests: u64,
}
