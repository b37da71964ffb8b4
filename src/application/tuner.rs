//! Closed-loop tuning of the global rate parameters.
//!
//! The tuner reads one pressure/block-rate snapshot per cycle and derives a
//! successor [`GlobalParameters`] snapshot from the current one: a
//! PID-flavoured rate adjustment squashed through `tanh`, plus stepwise
//! burst-factor adaptation. Publication is an atomic replacement of the
//! whole snapshot, so decisions never observe a half-updated rate/burst
//! pair.

use crate::application::pressure::PressureMonitor;
use crate::domain::params::{GlobalParameters, TunerConfig};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;

/// Shared cell holding the published parameter snapshot.
///
/// Readers take an `Arc` to the current snapshot; the tuner replaces the
/// `Arc` wholesale. Every reader therefore sees either the old or the new
/// complete snapshot, never a mix.
#[derive(Debug, Clone)]
pub struct ParamsCell {
    inner: Arc<RwLock<Arc<GlobalParameters>>>,
}

impl ParamsCell {
    /// Create a cell holding the initial snapshot.
    pub fn new(params: GlobalParameters) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(params))),
        }
    }

    /// Get the current snapshot.
    pub fn load(&self) -> Arc<GlobalParameters> {
        self.inner
            .read()
            .expect("params cell lock poisoned")
            .clone()
    }

    /// Replace the snapshot.
    pub fn publish(&self, params: GlobalParameters) {
        *self.inner.write().expect("params cell lock poisoned") = Arc::new(params);
    }
}

/// Periodic feedback controller over the published parameters.
///
/// Self-throttled: however often [`maybe_tune`](Self::maybe_tune) is
/// called, at most one tuning computation runs per cooldown interval, and
/// exactly one caller performs it.
#[derive(Debug)]
pub struct AutoTuner {
    cell: ParamsCell,
    config: TunerConfig,
    monitor: PressureMonitor,
    last_tuned: Mutex<Instant>,
    enabled: bool,
}

impl AutoTuner {
    /// Create a tuner.
    ///
    /// The first cycle can run one cooldown after `start`, matching a
    /// freshly started service with no load history.
    pub fn new(
        cell: ParamsCell,
        config: TunerConfig,
        monitor: PressureMonitor,
        start: Instant,
        enabled: bool,
    ) -> Self {
        Self {
            cell,
            config,
            monitor,
            last_tuned: Mutex::new(start),
            enabled,
        }
    }

    /// Run a tuning cycle if the cooldown has elapsed.
    ///
    /// Returns `true` if this call performed the cycle. Cheap when it does
    /// not: one mutex lock and one comparison.
    pub fn maybe_tune(&self, now: Instant) -> bool {
        if !self.enabled {
            return false;
        }

        {
            let mut last = self.last_tuned.lock().expect("tuner gate poisoned");
            if now.saturating_duration_since(*last) < self.config.cooldown {
                return false;
            }
            *last = now;
        }

        let load = self.monitor.snapshot();
        let current = self.cell.load();
        let next = next_parameters(&current, &self.config, load.pressure, load.block_rate);

        if next != *current {
            tracing::debug!(
                rate = next.current_rate,
                burst_factor = next.burst_factor,
                pressure = load.pressure,
                block_rate = load.block_rate,
                "tuned rate parameters"
            );
        }

        self.cell.publish(next);
        // New cycle: block-rate counters restart, the latency window rolls on.
        self.monitor.begin_cycle();
        true
    }

    /// Whether tuning is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The tuner's configuration.
    pub fn config(&self) -> &TunerConfig {
        &self.config
    }
}

/// One step of the control law: derive the successor snapshot.
///
/// ```text
/// error_p    = target_pressure - pressure
/// error_i    = target_block_rate - block_rate
/// adjustment = α·error_p + β·error_i − γ·pressure
/// rate_delta = tanh(adjustment) · max_step
/// new_rate   = clamp(current_rate · (1 + rate_delta), min_rps, max_rps)
/// ```
///
/// When the block rate is past the high threshold the system is overloaded;
/// the rate step is additionally capped at zero so sustained overload can
/// never raise the limit, whatever the pressure term says.
pub(crate) fn next_parameters(
    params: &GlobalParameters,
    config: &TunerConfig,
    pressure: f64,
    block_rate: f64,
) -> GlobalParameters {
    let error_p = config.target_pressure - pressure;
    let error_i = config.target_block_rate - block_rate;
    let adjustment =
        config.pressure_gain * error_p + config.block_gain * error_i - config.damping * pressure;

    let mut rate_delta = adjustment.tanh() * config.max_step;
    if block_rate > config.high_block_threshold {
        rate_delta = rate_delta.min(0.0);
    }
    let rate = params.current_rate * (1.0 + rate_delta);

    let burst_factor = if block_rate > config.high_block_threshold {
        params.burst_factor - config.burst_decrease
    } else if block_rate < config.low_block_threshold {
        params.burst_factor + config.burst_increase
    } else {
        params.burst_factor
    };

    params.adjusted(rate, burst_factor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn params() -> GlobalParameters {
        GlobalParameters::new(10.0, 2.0, 4.0, 80.0, 1.5, 3.0)
    }

    #[test]
    fn test_idle_system_raises_rate_and_burst() {
        let next = next_parameters(&params(), &TunerConfig::default(), 0.0, 0.0);

        assert!(next.current_rate > 10.0);
        // Rate step is capped at max_step per cycle.
        assert!(next.current_rate <= 10.0 * 1.1 + 1e-9);
        assert!((next.burst_factor - 2.02).abs() < 1e-9);
    }

    #[test]
    fn test_overload_lowers_rate_and_burst() {
        let next = next_parameters(&params(), &TunerConfig::default(), 1.0, 0.5);

        assert!(next.current_rate < 10.0);
        assert!((next.burst_factor - 1.95).abs() < 1e-9);
    }

    #[test]
    fn test_heavy_blocking_never_raises_rate() {
        // Low pressure would push the rate up; the overload guard wins.
        let next = next_parameters(&params(), &TunerConfig::default(), 0.0, 0.35);
        assert!(next.current_rate <= 10.0);

        // And repeated cycles stay within bounds and keep not increasing.
        let mut current = params();
        for _ in 0..50 {
            let next = next_parameters(&current, &TunerConfig::default(), 0.2, 0.4);
            assert!(next.current_rate <= current.current_rate + 1e-9);
            assert!(next.current_rate >= current.min_rps);
            assert!(next.current_rate <= current.max_rps);
            current = next;
        }
        assert!(current.current_rate >= 4.0);
    }

    #[test]
    fn test_rate_clamped_to_bounds() {
        let mut current = params();
        // Drive upward long enough to hit the ceiling.
        for _ in 0..200 {
            current = next_parameters(&current, &TunerConfig::default(), 0.0, 0.0);
        }
        assert!(current.current_rate <= 80.0);
        assert!(current.burst_factor <= 3.0);
    }

    #[test]
    fn test_moderate_blocking_keeps_burst() {
        // Between the thresholds: burst factor untouched.
        let next = next_parameters(&params(), &TunerConfig::default(), 0.7, 0.1);
        assert_eq!(next.burst_factor, 2.0);
    }

    #[test]
    fn test_params_cell_publishes_whole_snapshots() {
        let cell = ParamsCell::new(params());
        let before = cell.load();
        assert_eq!(before.current_rate, 10.0);

        cell.publish(before.adjusted(20.0, 2.5));

        let after = cell.load();
        assert_eq!(after.current_rate, 20.0);
        assert_eq!(after.burst_factor, 2.5);
        // The old snapshot is unchanged for holders of the old Arc.
        assert_eq!(before.current_rate, 10.0);
    }

    #[test]
    fn test_cooldown_gates_tuning() {
        let start = Instant::now();
        let monitor = PressureMonitor::new(100);
        let cell = ParamsCell::new(params());
        let tuner = AutoTuner::new(
            cell,
            TunerConfig::default(),
            monitor,
            start,
            true,
        );

        // Within the cooldown nothing runs, however often we ask.
        assert!(!tuner.maybe_tune(start + Duration::from_secs(1)));
        assert!(!tuner.maybe_tune(start + Duration::from_secs(4)));

        // One cycle once the cooldown elapses, then gated again.
        assert!(tuner.maybe_tune(start + Duration::from_secs(6)));
        assert!(!tuner.maybe_tune(start + Duration::from_secs(7)));
        assert!(tuner.maybe_tune(start + Duration::from_secs(12)));
    }

    #[test]
    fn test_tuning_resets_cycle_counters() {
        let start = Instant::now();
        let monitor = PressureMonitor::new(100);
        for _ in 0..10 {
            monitor.record(Duration::from_millis(5), true);
        }
        let tuner = AutoTuner::new(
            ParamsCell::new(params()),
            TunerConfig::default(),
            monitor.clone(),
            start,
            true,
        );

        assert!(tuner.maybe_tune(start + Duration::from_secs(6)));

        let after = monitor.snapshot();
        assert_eq!(after.total_requests, 0);
        assert_eq!(after.blocked_requests, 0);
        // The latency window survives for the pressure signal.
        assert_eq!(monitor.sample_count(), 10);
    }

    #[test]
    fn test_disabled_tuner_never_runs() {
        let start = Instant::now();
        let cell = ParamsCell::new(params());
        let tuner = AutoTuner::new(
            cell.clone(),
            TunerConfig::default(),
            PressureMonitor::new(100),
            start,
            false,
        );

        assert!(!tuner.maybe_tune(start + Duration::from_secs(60)));
        assert_eq!(cell.load().current_rate, 10.0);
    }
}
