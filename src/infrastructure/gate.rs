//! Admission gate facade.
//!
//! Provides the packaged engine: a builder that validates the full
//! configuration surface at construction time and wires storage, clock,
//! eviction, limiter, monitor, and tuner together. The gate wraps a
//! downstream handler and behaves as a handler of the same shape.

use crate::application::{
    controller::{AdmissionController, Verdict},
    metrics::{Metrics, StatsSnapshot},
    pressure::{PressureMonitor, DEFAULT_SAMPLE_WINDOW},
    ports::{Clock, EvictionPolicy},
    store::{BucketStore, IdentityState},
    tuner::{AutoTuner, ParamsCell},
};
use crate::domain::{
    event::{BucketKey, Category, Event},
    params::{GlobalParameters, TunerConfig},
    strategy::Strategy,
    tier::{LimitTier, TierTable},
};
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::eviction::{IdleEviction, LruEviction};
use crate::infrastructure::storage::ShardedStorage;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "async")]
use crate::application::emitter::{EmitterConfig, EmitterConfigError, StatsEmitter};

/// The storage adapter the gate wires in.
pub type GateStorage = Arc<ShardedStorage<BucketKey, IdentityState>>;

/// Error returned when building an AdmissionGate fails.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildError {
    /// The default rate must be positive and finite
    NonPositiveRate(f64),
    /// A tier capacity must be positive and finite
    NonPositiveCapacity(f64),
    /// A tier override rate must be finite and non-negative
    InvalidTierRate(f64),
    /// Rate bounds must satisfy `0 < min_rps <= max_rps`
    InvalidRateBounds {
        /// Configured lower bound
        min: f64,
        /// Configured upper bound
        max: f64,
    },
    /// The default rate must lie within the rate bounds
    RateOutOfBounds {
        /// Configured default rate
        rate: f64,
        /// Configured lower bound
        min: f64,
        /// Configured upper bound
        max: f64,
    },
    /// Burst bounds must satisfy `0 < min <= max`
    InvalidBurstBounds {
        /// Configured lower bound
        min: f64,
        /// Configured upper bound
        max: f64,
    },
    /// The initial burst factor must lie within the burst bounds
    BurstOutOfBounds {
        /// Configured initial burst factor
        burst_factor: f64,
        /// Configured lower bound
        min: f64,
        /// Configured upper bound
        max: f64,
    },
    /// `max_identities` must be greater than zero (or unlimited)
    ZeroMaxIdentities,
    /// The idle TTL must be greater than zero when set
    ZeroIdleTtl,
    /// The tuning cooldown must be greater than zero
    ZeroCooldown,
    /// A tuning target must lie in its valid range
    InvalidTarget {
        /// Which target was rejected
        name: &'static str,
        /// The rejected value
        value: f64,
    },
    /// The sliding-window length must be greater than zero
    ZeroWindow,
    /// The pressure sample window must hold at least one sample
    ZeroPressureSamples,
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::NonPositiveRate(rate) => {
                write!(f, "default rate must be positive and finite, got {rate}")
            }
            BuildError::NonPositiveCapacity(capacity) => {
                write!(f, "tier capacity must be positive and finite, got {capacity}")
            }
            BuildError::InvalidTierRate(rate) => {
                write!(f, "tier rate must be finite and non-negative, got {rate}")
            }
            BuildError::InvalidRateBounds { min, max } => {
                write!(f, "rate bounds must satisfy 0 < min <= max, got [{min}, {max}]")
            }
            BuildError::RateOutOfBounds { rate, min, max } => {
                write!(f, "default rate {rate} outside rate bounds [{min}, {max}]")
            }
            BuildError::InvalidBurstBounds { min, max } => {
                write!(f, "burst bounds must satisfy 0 < min <= max, got [{min}, {max}]")
            }
            BuildError::BurstOutOfBounds {
                burst_factor,
                min,
                max,
            } => {
                write!(
                    f,
                    "burst factor {burst_factor} outside burst bounds [{min}, {max}]"
                )
            }
            BuildError::ZeroMaxIdentities => {
                write!(f, "max_identities must be greater than 0")
            }
            BuildError::ZeroIdleTtl => write!(f, "idle TTL must be greater than 0"),
            BuildError::ZeroCooldown => write!(f, "tuning cooldown must be greater than 0"),
            BuildError::InvalidTarget { name, value } => {
                write!(f, "{name} must lie in its valid range, got {value}")
            }
            BuildError::ZeroWindow => {
                write!(f, "sliding-window length must be greater than 0")
            }
            BuildError::ZeroPressureSamples => {
                write!(f, "pressure sample window must hold at least one sample")
            }
        }
    }
}

impl std::error::Error for BuildError {}

/// Builder for constructing an [`AdmissionGate`].
pub struct AdmissionGateBuilder {
    strategy: Strategy,
    default_rate: f64,
    default_capacity: Option<f64>,
    tiers: BTreeMap<Category, LimitTier>,
    max_identities: Option<usize>,
    idle_ttl: Option<Duration>,
    burst_factor: f64,
    min_rps: f64,
    max_rps: f64,
    min_burst_factor: f64,
    max_burst_factor: f64,
    tuner: TunerConfig,
    auto_tune: bool,
    pressure_samples: usize,
    clock: Option<Arc<dyn Clock>>,
}

impl Default for AdmissionGateBuilder {
    fn default() -> Self {
        Self {
            strategy: Strategy::TokenBucket,
            default_rate: 10.0,
            default_capacity: None,
            tiers: BTreeMap::new(),
            max_identities: Some(25_000),
            idle_ttl: None,
            burst_factor: 2.0,
            min_rps: 4.0,
            max_rps: 80.0,
            min_burst_factor: 1.5,
            max_burst_factor: 3.0,
            tuner: TunerConfig::default(),
            auto_tune: true,
            pressure_samples: DEFAULT_SAMPLE_WINDOW,
            clock: None,
        }
    }
}

impl AdmissionGateBuilder {
    /// Select the accounting strategy.
    ///
    /// Default: token bucket.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the default tier's replenishment rate in requests per second.
    ///
    /// This is also the initial tuned rate and the anchor against which
    /// per-category overrides scale. Default: 10.
    pub fn with_default_rate(mut self, rate: f64) -> Self {
        self.default_rate = rate;
        self
    }

    /// Set the default tier's baseline burst capacity.
    ///
    /// The enforced burst is this value times the current burst factor.
    /// Default: equal to the default rate.
    pub fn with_default_capacity(mut self, capacity: f64) -> Self {
        self.default_capacity = Some(capacity);
        self
    }

    /// Add a per-category tier override.
    ///
    /// Categories without an override use the default tier.
    pub fn with_tier(mut self, category: Category, tier: LimitTier) -> Self {
        self.tiers.insert(category, tier);
        self
    }

    /// Bound the identity store to at most `max` tracked entries.
    ///
    /// When the bound is exceeded, the least recently updated entries are
    /// evicted in one batch. Default: 25,000.
    pub fn with_max_identities(mut self, max: usize) -> Self {
        self.max_identities = Some(max);
        self
    }

    /// Disable the identity bound, allowing unbounded growth.
    ///
    /// **Warning**: with many distinct identities and no idle TTL this
    /// grows without limit. Prefer a bound or at least an idle TTL.
    pub fn with_unlimited_identities(mut self) -> Self {
        self.max_identities = None;
        self
    }

    /// Drop identity state that has been idle longer than `ttl`.
    ///
    /// Default: no TTL; entries leave only via the capacity bound.
    pub fn with_idle_ttl(mut self, ttl: Duration) -> Self {
        self.idle_ttl = Some(ttl);
        self
    }

    /// Set the initial burst multiplier. Default: 2.0.
    pub fn with_burst_factor(mut self, burst_factor: f64) -> Self {
        self.burst_factor = burst_factor;
        self
    }

    /// Set the bounds the tuner may move the rate within.
    ///
    /// Default: [4, 80] requests per second.
    pub fn with_rate_bounds(mut self, min_rps: f64, max_rps: f64) -> Self {
        self.min_rps = min_rps;
        self.max_rps = max_rps;
        self
    }

    /// Set the bounds the tuner may move the burst factor within.
    ///
    /// Default: [1.5, 3.0].
    pub fn with_burst_factor_bounds(mut self, min: f64, max: f64) -> Self {
        self.min_burst_factor = min;
        self.max_burst_factor = max;
        self
    }

    /// Set the minimum interval between tuning cycles. Default: 5 s.
    pub fn with_tuning_cooldown(mut self, cooldown: Duration) -> Self {
        self.tuner.cooldown = cooldown;
        self
    }

    /// Set the pressure the tuner steers toward. Default: 0.7.
    pub fn with_target_pressure(mut self, target: f64) -> Self {
        self.tuner.target_pressure = target;
        self
    }

    /// Set the block rate the tuner steers toward. Default: 0.10.
    pub fn with_target_block_rate(mut self, target: f64) -> Self {
        self.tuner.target_block_rate = target;
        self
    }

    /// Replace the full tuner configuration (gains, steps, thresholds).
    pub fn with_tuner_config(mut self, config: TunerConfig) -> Self {
        self.tuner = config;
        self
    }

    /// Enable or disable auto-tuning. Default: enabled.
    ///
    /// With tuning disabled the initial parameters stay in force for the
    /// gate's lifetime.
    pub fn with_auto_tuning(mut self, enabled: bool) -> Self {
        self.auto_tune = enabled;
        self
    }

    /// Set how many latency samples the pressure monitor retains.
    ///
    /// Default: 1000.
    pub fn with_pressure_samples(mut self, samples: usize) -> Self {
        self.pressure_samples = samples;
        self
    }

    /// Set a custom clock (mainly for testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the gate.
    ///
    /// # Errors
    /// Returns `BuildError` if the configuration is invalid. Validation
    /// happens only here; the request path never re-checks configuration.
    pub fn build(self) -> Result<AdmissionGate, BuildError> {
        if !self.default_rate.is_finite() || self.default_rate <= 0.0 {
            return Err(BuildError::NonPositiveRate(self.default_rate));
        }
        let default_capacity = self.default_capacity.unwrap_or(self.default_rate);
        if !default_capacity.is_finite() || default_capacity <= 0.0 {
            return Err(BuildError::NonPositiveCapacity(default_capacity));
        }
        for tier in self.tiers.values() {
            if !tier.rate.is_finite() || tier.rate < 0.0 {
                return Err(BuildError::InvalidTierRate(tier.rate));
            }
            if !tier.capacity.is_finite() || tier.capacity <= 0.0 {
                return Err(BuildError::NonPositiveCapacity(tier.capacity));
            }
        }
        if !self.min_rps.is_finite()
            || !self.max_rps.is_finite()
            || self.min_rps <= 0.0
            || self.min_rps > self.max_rps
        {
            return Err(BuildError::InvalidRateBounds {
                min: self.min_rps,
                max: self.max_rps,
            });
        }
        if self.default_rate < self.min_rps || self.default_rate > self.max_rps {
            return Err(BuildError::RateOutOfBounds {
                rate: self.default_rate,
                min: self.min_rps,
                max: self.max_rps,
            });
        }
        if !self.min_burst_factor.is_finite()
            || !self.max_burst_factor.is_finite()
            || self.min_burst_factor <= 0.0
            || self.min_burst_factor > self.max_burst_factor
        {
            return Err(BuildError::InvalidBurstBounds {
                min: self.min_burst_factor,
                max: self.max_burst_factor,
            });
        }
        if self.burst_factor < self.min_burst_factor || self.burst_factor > self.max_burst_factor {
            return Err(BuildError::BurstOutOfBounds {
                burst_factor: self.burst_factor,
                min: self.min_burst_factor,
                max: self.max_burst_factor,
            });
        }
        if self.max_identities == Some(0) {
            return Err(BuildError::ZeroMaxIdentities);
        }
        if self.idle_ttl == Some(Duration::ZERO) {
            return Err(BuildError::ZeroIdleTtl);
        }
        if self.tuner.cooldown.is_zero() {
            return Err(BuildError::ZeroCooldown);
        }
        if !(0.0..=1.0).contains(&self.tuner.target_pressure) || self.tuner.target_pressure == 0.0 {
            return Err(BuildError::InvalidTarget {
                name: "target_pressure",
                value: self.tuner.target_pressure,
            });
        }
        if !(0.0..1.0).contains(&self.tuner.target_block_rate) {
            return Err(BuildError::InvalidTarget {
                name: "target_block_rate",
                value: self.tuner.target_block_rate,
            });
        }
        if let Strategy::SlidingWindow { window } = self.strategy {
            if window.is_zero() {
                return Err(BuildError::ZeroWindow);
            }
        }
        if self.pressure_samples == 0 {
            return Err(BuildError::ZeroPressureSamples);
        }

        let params = GlobalParameters::new(
            self.default_rate,
            self.burst_factor,
            self.min_rps,
            self.max_rps,
            self.min_burst_factor,
            self.max_burst_factor,
        );
        let cell = ParamsCell::new(params);

        let mut tiers = TierTable::new(LimitTier::new(self.default_rate, default_capacity));
        for (category, tier) in self.tiers {
            tiers.set(category, tier);
        }

        let metrics = Metrics::new();
        let monitor = PressureMonitor::new(self.pressure_samples);
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock::new()));

        let eviction: Option<Arc<dyn EvictionPolicy<BucketKey>>> =
            match (self.max_identities, self.idle_ttl) {
                (Some(max), Some(ttl)) => {
                    Some(Arc::new(LruEviction::new(max).with_idle_ttl(ttl)))
                }
                (Some(max), None) => Some(Arc::new(LruEviction::new(max))),
                (None, Some(ttl)) => Some(Arc::new(IdleEviction::new(ttl))),
                (None, None) => None,
            };

        let storage: GateStorage = Arc::new(ShardedStorage::new());
        let store = BucketStore::new(
            storage,
            clock.clone(),
            self.strategy,
            eviction,
            metrics.clone(),
        );
        let limiter = crate::application::limiter::RateLimiter::new(store, tiers, cell.clone());
        let tuner = AutoTuner::new(
            cell,
            self.tuner,
            monitor.clone(),
            clock.now(),
            self.auto_tune,
        );
        let controller = AdmissionController::new(limiter, monitor, tuner, metrics, clock);

        Ok(AdmissionGate {
            controller: Arc::new(controller),
            max_identities: self.max_identities,
        })
    }
}

/// The packaged admission-control engine.
///
/// Wraps a downstream handler: [`process`](Self::process) calls through on
/// admit and short-circuits on reject. Cloning is cheap and clones share
/// all state.
///
/// # Example
///
/// ```
/// use admission_throttle::{AdmissionGate, Category, Event, Identity};
///
/// struct Inbound {
///     sender: u64,
/// }
///
/// impl Event for Inbound {
///     fn identity(&self) -> Option<Identity> {
///         Some(Identity(self.sender))
///     }
/// }
///
/// let gate = AdmissionGate::builder()
///     .with_default_rate(10.0)
///     .build()
///     .unwrap();
///
/// let verdict = gate.process(&Inbound { sender: 42 }, |_event| "handled");
/// assert!(verdict.is_handled());
/// ```
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    controller: Arc<AdmissionController<GateStorage>>,
    max_identities: Option<usize>,
}

impl AdmissionGate {
    /// Create a gate with default configuration.
    pub fn new() -> Self {
        Self::builder()
            .build()
            .expect("default configuration is valid")
    }

    /// Create a builder for custom configuration.
    pub fn builder() -> AdmissionGateBuilder {
        AdmissionGateBuilder::default()
    }

    /// Process one request, invoking `handler` only on admission.
    ///
    /// See [`AdmissionController::process`].
    pub fn process<E, T, F>(&self, event: &E, handler: F) -> Verdict<T>
    where
        E: Event + ?Sized,
        F: FnOnce(&E) -> T,
    {
        self.controller.process(event, handler)
    }

    /// Process one request with an async handler.
    ///
    /// See [`AdmissionController::process_async`].
    pub async fn process_async<E, T, F, Fut>(&self, event: &E, handler: F) -> Verdict<T>
    where
        E: Event + ?Sized,
        F: FnOnce(&E) -> Fut,
        Fut: std::future::Future<Output = T>,
    {
        self.controller.process_async(event, handler).await
    }

    /// Take the periodic observability snapshot.
    pub fn stats(&self) -> StatsSnapshot {
        let params = self.controller.limiter().params();
        let load = self.controller.monitor().snapshot();
        let occupancy = self.controller.limiter().store().len();

        StatsSnapshot {
            current_rate: params.current_rate,
            burst_capacity: params.burst_capacity(),
            burst_factor: params.burst_factor,
            pressure: load.pressure,
            block_rate: load.block_rate,
            store_occupancy_ratio: match self.max_identities {
                Some(max) if max > 0 => occupancy as f64 / max as f64,
                _ => 0.0,
            },
        }
    }

    /// Number of (identity, category) entries currently tracked.
    pub fn occupancy(&self) -> usize {
        self.controller.limiter().store().len()
    }

    /// The current parameter snapshot.
    pub fn params(&self) -> Arc<GlobalParameters> {
        self.controller.limiter().params()
    }

    /// Cumulative counters.
    pub fn metrics(&self) -> &Metrics {
        self.controller.metrics()
    }

    /// The underlying controller, for advanced composition.
    pub fn controller(&self) -> &AdmissionController<GateStorage> {
        &self.controller
    }

    /// Spawn a background task emitting the stats snapshot as a `tracing`
    /// info event every `interval`.
    ///
    /// Abort the returned handle to stop emission.
    ///
    /// # Errors
    /// Returns `EmitterConfigError::ZeroInterval` if `interval` is zero.
    #[cfg(feature = "async")]
    pub fn spawn_stats_emitter(
        &self,
        interval: Duration,
    ) -> Result<tokio::task::JoinHandle<()>, EmitterConfigError> {
        let config = EmitterConfig::new(interval)?;
        let gate = self.clone();
        let emitter = StatsEmitter::new(move || gate.stats(), config);
        Ok(emitter.start(|stats| {
            tracing::info!(
                current_rate = stats.current_rate,
                burst_capacity = stats.burst_capacity,
                pressure = stats.pressure,
                block_rate = stats.block_rate,
                store_occupancy_ratio = stats.store_occupancy_ratio,
                "admission stats"
            );
        }))
    }
}

impl Default for AdmissionGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::Identity;
    use crate::infrastructure::mocks::MockClock;
    use std::time::Instant;

    struct Req(Option<u64>, Category);

    impl Event for Req {
        fn identity(&self) -> Option<Identity> {
            self.0.map(Identity)
        }

        fn category(&self) -> Category {
            self.1
        }
    }

    #[test]
    fn test_default_build_succeeds() {
        let gate = AdmissionGate::new();
        let params = gate.params();
        assert_eq!(params.current_rate, 10.0);
        assert_eq!(params.burst_factor, 2.0);
    }

    #[test]
    fn test_rejects_non_positive_rate() {
        let err = AdmissionGate::builder()
            .with_default_rate(0.0)
            .build()
            .unwrap_err();
        assert_eq!(err, BuildError::NonPositiveRate(0.0));

        let err = AdmissionGate::builder()
            .with_default_rate(f64::NAN)
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::NonPositiveRate(_)));
    }

    #[test]
    fn test_rejects_inverted_rate_bounds() {
        let err = AdmissionGate::builder()
            .with_rate_bounds(50.0, 10.0)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::InvalidRateBounds {
                min: 50.0,
                max: 10.0
            }
        );
    }

    #[test]
    fn test_rejects_rate_outside_bounds() {
        let err = AdmissionGate::builder()
            .with_default_rate(200.0)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::RateOutOfBounds {
                rate: 200.0,
                min: 4.0,
                max: 80.0
            }
        );
    }

    #[test]
    fn test_rejects_burst_outside_bounds() {
        let err = AdmissionGate::builder()
            .with_burst_factor(10.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::BurstOutOfBounds { .. }));
    }

    #[test]
    fn test_rejects_zero_max_identities() {
        let err = AdmissionGate::builder()
            .with_max_identities(0)
            .build()
            .unwrap_err();
        assert_eq!(err, BuildError::ZeroMaxIdentities);
    }

    #[test]
    fn test_rejects_zero_cooldown() {
        let err = AdmissionGate::builder()
            .with_tuning_cooldown(Duration::ZERO)
            .build()
            .unwrap_err();
        assert_eq!(err, BuildError::ZeroCooldown);
    }

    #[test]
    fn test_rejects_bad_targets() {
        let err = AdmissionGate::builder()
            .with_target_pressure(1.5)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::InvalidTarget {
                name: "target_pressure",
                ..
            }
        ));

        let err = AdmissionGate::builder()
            .with_target_block_rate(1.0)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::InvalidTarget {
                name: "target_block_rate",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_zero_window() {
        let err = AdmissionGate::builder()
            .with_strategy(Strategy::SlidingWindow {
                window: Duration::ZERO,
            })
            .build()
            .unwrap_err();
        assert_eq!(err, BuildError::ZeroWindow);
    }

    #[test]
    fn test_process_through_gate() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let gate = AdmissionGate::builder()
            .with_default_rate(5.0)
            .with_default_capacity(2.0)
            .with_burst_factor(1.5)
            .with_clock(clock)
            .build()
            .unwrap();

        let event = Req(Some(1), Category::Message);

        // capacity 2 × burst 1.5 = 3 admits.
        assert!(gate.process(&event, |_| ()).is_handled());
        assert!(gate.process(&event, |_| ()).is_handled());
        assert!(gate.process(&event, |_| ()).is_handled());
        assert!(gate.process(&event, |_| ()).is_rejected());

        assert_eq!(gate.metrics().admitted(), 3);
        assert_eq!(gate.metrics().rejected(), 1);
    }

    #[test]
    fn test_tier_override_through_gate() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let gate = AdmissionGate::builder()
            .with_default_rate(10.0)
            .with_burst_factor(1.5)
            .with_tier(Category::Command, LimitTier::new(1.0, 1.0))
            .with_clock(clock)
            .build()
            .unwrap();

        let command = Req(Some(1), Category::Command);
        let message = Req(Some(1), Category::Message);

        // Command tier: capacity 1 × burst 1.5 = one admit.
        assert!(gate.process(&command, |_| ()).is_handled());
        assert!(gate.process(&command, |_| ()).is_rejected());

        // Message tier for the same identity is independent.
        assert!(gate.process(&message, |_| ()).is_handled());
    }

    #[test]
    fn test_stats_snapshot() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let gate = AdmissionGate::builder()
            .with_default_rate(10.0)
            .with_max_identities(100)
            .with_clock(clock)
            .build()
            .unwrap();

        for id in 0..10 {
            let _ = gate.process(&Req(Some(id), Category::Default), |_| ());
        }

        let stats = gate.stats();
        assert_eq!(stats.current_rate, 10.0);
        assert_eq!(stats.burst_factor, 2.0);
        assert!((stats.burst_capacity - 20.0).abs() < 1e-9);
        assert!((stats.store_occupancy_ratio - 0.1).abs() < 1e-9);
        assert_eq!(stats.block_rate, 0.0);
    }

    #[test]
    fn test_unlimited_identities_with_ttl() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let gate = AdmissionGate::builder()
            .with_unlimited_identities()
            .with_idle_ttl(Duration::from_secs(60))
            .with_clock(clock.clone())
            .build()
            .unwrap();

        for id in 0..10 {
            let _ = gate.process(&Req(Some(id), Category::Default), |_| ());
        }
        assert_eq!(gate.occupancy(), 10);
        // Unbounded store reports zero occupancy ratio.
        assert_eq!(gate.stats().store_occupancy_ratio, 0.0);

        clock.advance(Duration::from_secs(120));
        gate.controller().limiter().store().sweep(clock.now());
        assert_eq!(gate.occupancy(), 0);
    }

    #[test]
    fn test_gate_clone_shares_state() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let gate = AdmissionGate::builder()
            .with_default_rate(5.0)
            .with_default_capacity(1.0)
            .with_burst_factor(1.5)
            .with_clock(clock)
            .build()
            .unwrap();
        let clone = gate.clone();

        let event = Req(Some(1), Category::Default);
        assert!(gate.process(&event, |_| ()).is_handled());
        // The clone sees the consumed budget.
        assert!(clone.process(&event, |_| ()).is_rejected());
    }
}
