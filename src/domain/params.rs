//! Globally tuned rate parameters and tuner configuration.
//!
//! [`GlobalParameters`] is an immutable snapshot: the auto-tuner derives a
//! new snapshot from the old one and publishes it atomically, so a decision
//! never observes a half-updated rate/burst pair.

use std::time::Duration;

/// Immutable snapshot of the globally tuned rate parameters.
///
/// `current_rate` is the tuned tokens-per-second for the default tier;
/// per-category tiers scale proportionally (see
/// [`TierTable::effective`](crate::domain::tier::TierTable::effective)).
/// The bounds travel with the snapshot so that a tuning step is a pure
/// function of the snapshot and the observed load.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlobalParameters {
    /// Tuned replenishment rate for the default tier, tokens per second.
    pub current_rate: f64,
    /// Burst multiplier applied to every tier's baseline capacity.
    pub burst_factor: f64,
    /// Lower clamp for `current_rate`.
    pub min_rps: f64,
    /// Upper clamp for `current_rate`.
    pub max_rps: f64,
    /// Lower clamp for `burst_factor`.
    pub min_burst_factor: f64,
    /// Upper clamp for `burst_factor`.
    pub max_burst_factor: f64,
    /// The construction-time rate, the anchor against which tier rates scale.
    base_rate: f64,
}

impl GlobalParameters {
    /// Create the initial snapshot.
    ///
    /// `initial_rate` becomes both `current_rate` and the scaling anchor.
    /// Bounds are not validated here; the gate builder rejects inverted or
    /// out-of-range configurations before any snapshot is created.
    pub fn new(
        initial_rate: f64,
        burst_factor: f64,
        min_rps: f64,
        max_rps: f64,
        min_burst_factor: f64,
        max_burst_factor: f64,
    ) -> Self {
        Self {
            current_rate: initial_rate,
            burst_factor,
            min_rps,
            max_rps,
            min_burst_factor,
            max_burst_factor,
            base_rate: initial_rate,
        }
    }

    /// Ratio of the tuned rate to the construction-time rate.
    pub fn rate_scale(&self) -> f64 {
        self.current_rate / self.base_rate
    }

    /// The construction-time anchor rate.
    pub fn base_rate(&self) -> f64 {
        self.base_rate
    }

    /// Burst capacity of the default tier: `current_rate × burst_factor`.
    pub fn burst_capacity(&self) -> f64 {
        self.current_rate * self.burst_factor
    }

    /// Derive a successor snapshot with a new rate and burst factor, both
    /// clamped into this snapshot's bounds. Everything else carries over.
    pub(crate) fn adjusted(&self, rate: f64, burst_factor: f64) -> Self {
        Self {
            current_rate: rate.clamp(self.min_rps, self.max_rps),
            burst_factor: burst_factor.clamp(self.min_burst_factor, self.max_burst_factor),
            ..self.clone()
        }
    }
}

/// Feedback-controller configuration for the auto-tuner.
///
/// The control law combines a proportional term on pressure error, a small
/// integral-like term on block-rate error, and a damping term, squashed
/// through `tanh` and capped at ±`max_step` per cycle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TunerConfig {
    /// Minimum interval between tuning cycles.
    pub cooldown: Duration,
    /// Pressure the controller steers toward.
    pub target_pressure: f64,
    /// Block rate the controller steers toward.
    pub target_block_rate: f64,
    /// Gain on the pressure error term.
    pub pressure_gain: f64,
    /// Gain on the block-rate error term.
    pub block_gain: f64,
    /// Damping applied against absolute pressure.
    pub damping: f64,
    /// Cap on the per-cycle relative rate change.
    pub max_step: f64,
    /// Additive burst-factor decrease when blocking is heavy.
    pub burst_decrease: f64,
    /// Additive burst-factor increase when blocking is light.
    pub burst_increase: f64,
    /// Block rate above which the burst factor shrinks.
    pub high_block_threshold: f64,
    /// Block rate below which the burst factor grows.
    pub low_block_threshold: f64,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(5),
            target_pressure: 0.7,
            target_block_rate: 0.10,
            pressure_gain: 0.5,
            block_gain: 0.01,
            damping: 0.1,
            max_step: 0.1,
            burst_decrease: 0.05,
            burst_increase: 0.02,
            high_block_threshold: 0.2,
            low_block_threshold: 0.05,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_snapshot() {
        let params = GlobalParameters::new(10.0, 2.0, 4.0, 80.0, 1.5, 3.0);
        assert_eq!(params.current_rate, 10.0);
        assert_eq!(params.base_rate(), 10.0);
        assert!((params.rate_scale() - 1.0).abs() < 1e-9);
        assert!((params.burst_capacity() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_adjusted_clamps_rate() {
        let params = GlobalParameters::new(10.0, 2.0, 4.0, 80.0, 1.5, 3.0);

        let floored = params.adjusted(1.0, 2.0);
        assert_eq!(floored.current_rate, 4.0);

        let ceiled = params.adjusted(500.0, 2.0);
        assert_eq!(ceiled.current_rate, 80.0);

        // Anchor is preserved across adjustments.
        assert_eq!(ceiled.base_rate(), 10.0);
        assert!((ceiled.rate_scale() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_adjusted_clamps_burst_factor() {
        let params = GlobalParameters::new(10.0, 2.0, 4.0, 80.0, 1.5, 3.0);

        assert_eq!(params.adjusted(10.0, 0.1).burst_factor, 1.5);
        assert_eq!(params.adjusted(10.0, 9.0).burst_factor, 3.0);
        assert_eq!(params.adjusted(10.0, 2.2).burst_factor, 2.2);
    }

    #[test]
    fn test_tuner_config_defaults() {
        let config = TunerConfig::default();
        assert_eq!(config.cooldown, Duration::from_secs(5));
        assert_eq!(config.target_pressure, 0.7);
        assert_eq!(config.target_block_rate, 0.10);
        assert_eq!(config.max_step, 0.1);
    }
}
