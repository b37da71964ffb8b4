//! Per-request admission orchestration.
//!
//! The controller composes the whole flow: identity extraction, the
//! admission decision, downstream dispatch, latency accounting, and the
//! opportunistic tuning/eviction triggers. It wraps a downstream handler
//! and behaves as a handler of the same shape: calls through on admit,
//! short-circuits on reject.

use crate::application::limiter::RateLimiter;
use crate::application::metrics::Metrics;
use crate::application::ports::{Clock, Storage};
use crate::application::pressure::PressureMonitor;
use crate::application::store::IdentityState;
use crate::application::tuner::AutoTuner;
use crate::domain::event::{BucketKey, Category, Event, Identity};
use crate::domain::strategy::Decision;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// How many requests pass between idle-entry sweeps of the store.
const SWEEP_INTERVAL: u64 = 64;

/// Outcome of processing one request through the controller.
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict<T> {
    /// The request was admitted and handled; carries the handler's output.
    Handled(T),
    /// The request was rejected before reaching the handler.
    Rejected(Rejection),
}

impl<T> Verdict<T> {
    /// Check if the request was handled.
    pub fn is_handled(&self) -> bool {
        matches!(self, Verdict::Handled(_))
    }

    /// Check if the request was rejected.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Verdict::Rejected(_))
    }

    /// The handler output, if the request was handled.
    pub fn into_handled(self) -> Option<T> {
        match self {
            Verdict::Handled(out) => Some(out),
            Verdict::Rejected(_) => None,
        }
    }

    /// The rejection details, if the request was rejected.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Verdict::Handled(_) => None,
            Verdict::Rejected(rejection) => Some(rejection),
        }
    }
}

/// Observability record emitted for every rejected request.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rejection {
    /// The throttled identity.
    pub identity: Identity,
    /// The request's category.
    pub category: Category,
    /// The tuned rate in force when the request was rejected.
    pub current_rate: f64,
    /// The default-tier burst capacity in force.
    pub current_capacity: f64,
}

/// Orchestrates the per-request admission flow.
pub struct AdmissionController<S>
where
    S: Storage<BucketKey, IdentityState> + Clone,
{
    limiter: RateLimiter<S>,
    monitor: PressureMonitor,
    tuner: AutoTuner,
    metrics: Metrics,
    clock: Arc<dyn Clock>,
    request_seq: AtomicU64,
}

impl<S> AdmissionController<S>
where
    S: Storage<BucketKey, IdentityState> + Clone,
{
    /// Create a controller from its collaborators.
    pub fn new(
        limiter: RateLimiter<S>,
        monitor: PressureMonitor,
        tuner: AutoTuner,
        metrics: Metrics,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            limiter,
            monitor,
            tuner,
            metrics,
            clock,
            request_seq: AtomicU64::new(0),
        }
    }

    /// Process one request, invoking `handler` only on admission.
    ///
    /// Events without an identity are admitted unconditionally and touch no
    /// rate-limit state. The token is consumed before dispatch and is not
    /// refunded if the handler fails: its output - including an error - is
    /// returned unchanged in [`Verdict::Handled`].
    pub fn process<E, T, F>(&self, event: &E, handler: F) -> Verdict<T>
    where
        E: Event + ?Sized,
        F: FnOnce(&E) -> T,
    {
        let identity = match event.identity() {
            Some(identity) => identity,
            None => {
                self.metrics.record_passthrough();
                return Verdict::Handled(handler(event));
            }
        };
        let category = event.category();
        let started = self.clock.now();

        match self.limiter.decide(identity, category) {
            Decision::Admit => {
                let output = handler(event);
                self.record(started, false);
                self.metrics.record_admitted();
                self.housekeeping();
                Verdict::Handled(output)
            }
            Decision::Reject => {
                self.record(started, true);
                self.metrics.record_rejected();
                let rejection = self.rejection(identity, category);
                self.housekeeping();
                Verdict::Rejected(rejection)
            }
        }
    }

    /// Process one request with an async handler.
    ///
    /// The decision and all bookkeeping run outside any await point; no
    /// lock is held across the handler's future. Cancellation after the
    /// decision leaves the token spent, like any other handler failure.
    pub async fn process_async<E, T, F, Fut>(&self, event: &E, handler: F) -> Verdict<T>
    where
        E: Event + ?Sized,
        F: FnOnce(&E) -> Fut,
        Fut: std::future::Future<Output = T>,
    {
        let identity = match event.identity() {
            Some(identity) => identity,
            None => {
                self.metrics.record_passthrough();
                return Verdict::Handled(handler(event).await);
            }
        };
        let category = event.category();
        let started = self.clock.now();

        match self.limiter.decide(identity, category) {
            Decision::Admit => {
                let output = handler(event).await;
                self.record(started, false);
                self.metrics.record_admitted();
                self.housekeeping();
                Verdict::Handled(output)
            }
            Decision::Reject => {
                self.record(started, true);
                self.metrics.record_rejected();
                let rejection = self.rejection(identity, category);
                self.housekeeping();
                Verdict::Rejected(rejection)
            }
        }
    }

    /// Measure and record one completed decision.
    fn record(&self, started: Instant, blocked: bool) {
        let latency = self.clock.now().saturating_duration_since(started);
        self.monitor.record(latency, blocked);
    }

    /// Build the rejection record and emit the observability event.
    fn rejection(&self, identity: Identity, category: Category) -> Rejection {
        let params = self.limiter.params();
        let rejection = Rejection {
            identity,
            category,
            current_rate: params.current_rate,
            current_capacity: params.burst_capacity(),
        };
        tracing::debug!(
            identity = identity.get(),
            category = %category,
            current_rate = rejection.current_rate,
            current_capacity = rejection.current_capacity,
            "request rejected"
        );
        rejection
    }

    /// Opportunistic periodic work, triggered from the request path.
    ///
    /// Tuning is self-throttled, so it is offered every request; the
    /// idle-entry sweep runs every `SWEEP_INTERVAL` requests. Both are
    /// batch-bounded and never block on I/O.
    fn housekeeping(&self) {
        let now = self.clock.now();
        self.tuner.maybe_tune(now);

        let seq = self.request_seq.fetch_add(1, Ordering::Relaxed) + 1;
        if seq % SWEEP_INTERVAL == 0 {
            self.limiter.store().sweep(now);
        }
    }

    /// Get a reference to the rate limiter.
    pub fn limiter(&self) -> &RateLimiter<S> {
        &self.limiter
    }

    /// Get a reference to the pressure monitor.
    pub fn monitor(&self) -> &PressureMonitor {
        &self.monitor
    }

    /// Get a reference to the auto-tuner.
    pub fn tuner(&self) -> &AutoTuner {
        &self.tuner
    }

    /// Get a reference to the cumulative metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// The clock this controller reads.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

impl<S> std::fmt::Debug for AdmissionController<S>
where
    S: Storage<BucketKey, IdentityState> + Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionController")
            .field("limiter", &self.limiter)
            .field("tuner", &self.tuner)
            .finish()
    }
}
