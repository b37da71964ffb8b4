//! # admission-throttle
//!
//! Adaptive per-identity admission control for message-processing services.
//!
//! This crate decides, per sender identity and per request category,
//! whether to admit or reject each incoming request before it reaches
//! downstream processing. It combines token-bucket or sliding-window
//! accounting with a bounded identity store (LRU/TTL eviction) and a
//! closed-loop auto-tuner that adjusts the global rate parameters from
//! observed latency pressure and block rate.
//!
//! ## Quick Start
//!
//! ```rust
//! use admission_throttle::{AdmissionGate, Category, Event, Identity, Verdict};
//!
//! // Tell the gate who sent a request and what kind it is.
//! struct Inbound {
//!     sender: Option<u64>,
//!     text: String,
//! }
//!
//! impl Event for Inbound {
//!     fn identity(&self) -> Option<Identity> {
//!         self.sender.map(Identity)
//!     }
//!
//!     fn category(&self) -> Category {
//!         if self.text.starts_with('/') {
//!             Category::Command
//!         } else {
//!             Category::Message
//!         }
//!     }
//! }
//!
//! // Sensible defaults: 10 req/s, burst factor 2, 25k tracked identities,
//! // auto-tuning enabled.
//! let gate = AdmissionGate::new();
//!
//! let event = Inbound { sender: Some(42), text: "hello".into() };
//! match gate.process(&event, |event| format!("echo: {}", event.text)) {
//!     Verdict::Handled(reply) => println!("{reply}"),
//!     Verdict::Rejected(rejection) => println!("throttled: {rejection:?}"),
//! }
//! ```
//!
//! Or customize for your traffic shape:
//!
//! ```rust
//! use admission_throttle::{AdmissionGate, Category, LimitTier, Strategy};
//! use std::time::Duration;
//!
//! let gate = AdmissionGate::builder()
//!     .with_default_rate(20.0)
//!     .with_rate_bounds(5.0, 200.0)
//!     .with_tier(Category::Command, LimitTier::new(2.0, 3.0))  // commands are expensive
//!     .with_max_identities(50_000)
//!     .with_idle_ttl(Duration::from_secs(1800))
//!     .build()
//!     .unwrap();
//! # let _ = gate;
//! ```
//!
//! ## Features
//!
//! ### Accounting Strategies
//! - **Token bucket** (default): burst tolerance with smooth replenishment;
//!   one token per admitted request, replenished continuously at the tier
//!   rate, capped at the tier's burst capacity.
//! - **Sliding window**: hard cap on admitted events within a trailing
//!   interval, with lazy timestamp pruning.
//!
//! ### Adaptive Tuning
//! A periodic feedback controller observes latency *pressure*
//! (`mean / p95` over a rolling window) and the per-cycle block rate, then
//! republishes the global rate and burst factor - at most once per cooldown
//! interval, clamped into configured bounds, and always as a whole
//! immutable snapshot. Sustained overload can lower the rate but never
//! raise it.
//!
//! ### Bounded Memory
//! Per-identity state lives in a sharded concurrent map with a strict entry
//! bound. Overflow evicts the least recently updated entries in one batch;
//! an optional idle TTL expires dormant identities. Both triggers run
//! opportunistically on the request path - there are no background timers.
//!
//! ### Observability
//! Every rejection yields a [`Rejection`] record and a `tracing` debug
//! event. [`AdmissionGate::stats`] returns the periodic snapshot (rate,
//! burst capacity, pressure, block rate, store occupancy); cumulative
//! counters live in [`Metrics`]. With the `async` feature, the gate can
//! spawn a tokio task emitting stats at a fixed interval.
//!
//! ## Semantics worth knowing
//!
//! - **No identity, no throttling**: events whose extractor returns `None`
//!   are admitted unconditionally and touch no state.
//! - **Cold start grants full burst**: the first contact from a new
//!   identity is always admitted when capacity ≥ 1.
//! - **Fail-closed dispatch**: the token is consumed before the handler
//!   runs and is not refunded if the handler errors or is cancelled, so
//!   retry storms cannot mint extra capacity.
//! - **Rejection is control flow, not an error**: the hot path never
//!   panics or returns `Err` for ordinary throttling.
//! - **Clock anomalies are survivable**: a monotonic regression clamps
//!   elapsed time to zero, is counted and logged, and never corrupts a
//!   bucket.
//!
//! ## Architecture
//!
//! The crate follows a hexagonal layout. `domain` holds the pure
//! accounting and parameter types; `application` orchestrates them behind
//! ports (`Clock`, `Storage`, `EvictionPolicy`); `infrastructure` provides
//! the adapters (system clock, DashMap-backed sharded storage, eviction
//! policies) and the builder-validated [`AdmissionGate`] facade.

// Domain layer - pure business logic
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    event::{BucketKey, Category, Event, Identity},
    params::{GlobalParameters, TunerConfig},
    strategy::{Decision, RateState, Strategy},
    tier::{EffectiveLimit, LimitTier, TierTable},
};

pub use application::{
    controller::{AdmissionController, Rejection, Verdict},
    emitter::{EmitterConfig, EmitterConfigError},
    limiter::RateLimiter,
    metrics::{Metrics, MetricsSnapshot, StatsSnapshot},
    ports::{Clock, EvictionCandidate, EvictionPolicy, Storage},
    pressure::{PressureMonitor, PressureSnapshot},
    store::{BucketStore, IdentityState},
    tuner::{AutoTuner, ParamsCell},
};

#[cfg(feature = "async")]
pub use application::emitter::StatsEmitter;

pub use infrastructure::{
    clock::SystemClock,
    eviction::{IdleEviction, LruEviction},
    gate::{AdmissionGate, AdmissionGateBuilder, BuildError, GateStorage},
    storage::ShardedStorage,
};
