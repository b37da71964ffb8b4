//! Rate-limiting strategies and their per-key state.
//!
//! Two interchangeable strategies sit behind one decision interface:
//! a token bucket (smooth replenishment with burst tolerance) and a sliding
//! window (hard cap on events per trailing interval). The [`Strategy`]
//! selector creates fresh [`RateState`] values; every decision is a single
//! [`RateState::register`] call against the effective limit for that
//! request's tier.

use crate::domain::tier::EffectiveLimit;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Admission decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Let the request through to the downstream handler.
    Admit,
    /// Reject the request; the handler is never invoked.
    Reject,
}

impl Decision {
    /// Check if this decision is Admit.
    pub fn is_admit(&self) -> bool {
        matches!(self, Decision::Admit)
    }

    /// Check if this decision is Reject.
    pub fn is_reject(&self) -> bool {
        matches!(self, Decision::Reject)
    }
}

/// Strategy selector: which accounting scheme every bucket uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Token bucket: capacity-capped token count replenished continuously
    /// at the tier rate; one token consumed per admit.
    TokenBucket,
    /// Sliding window: at most `capacity` admitted events within the
    /// trailing `window`; timestamps pruned lazily on each decision.
    SlidingWindow {
        /// Length of the trailing interval.
        window: Duration,
    },
}

impl Strategy {
    /// Create the state a key starts with on first contact.
    ///
    /// Cold-start policy: a fresh token bucket carries its full effective
    /// capacity, so the first request from a new identity is always
    /// admitted when `capacity ≥ 1`. A fresh window starts empty, which
    /// admits for the same reason.
    pub fn initial_state(&self, limit: &EffectiveLimit, now: Instant) -> RateState {
        match *self {
            Strategy::TokenBucket => RateState::Bucket {
                tokens: limit.capacity.max(0.0),
                last_update: now,
            },
            Strategy::SlidingWindow { window } => RateState::Window {
                window,
                admitted: VecDeque::new(),
            },
        }
    }
}

/// Per-key rate-limit state, mutated by exactly one decision at a time.
///
/// # Example
///
/// ```
/// use admission_throttle::{Decision, EffectiveLimit, Strategy};
/// use std::time::{Duration, Instant};
///
/// let limit = EffectiveLimit { rate: 5.0, capacity: 2.0 };
/// let now = Instant::now();
/// let mut state = Strategy::TokenBucket.initial_state(&limit, now);
///
/// // Full burst on cold start: two admits, then rejection.
/// assert_eq!(state.register(now, &limit), Decision::Admit);
/// assert_eq!(state.register(now, &limit), Decision::Admit);
/// assert_eq!(state.register(now, &limit), Decision::Reject);
///
/// // One fifth of a second replenishes one token at 5/s.
/// let later = now + Duration::from_millis(200);
/// assert_eq!(state.register(later, &limit), Decision::Admit);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RateState {
    /// Token-bucket accounting.
    Bucket {
        /// Available tokens, always within `[0, capacity]`.
        tokens: f64,
        /// Time of the last state transition.
        last_update: Instant,
    },
    /// Sliding-window accounting.
    Window {
        /// Length of the trailing interval.
        window: Duration,
        /// Timestamps of admitted events, oldest first.
        admitted: VecDeque<Instant>,
    },
}

impl RateState {
    /// Register a request at `now` against `limit` and decide admission.
    ///
    /// Token bucket: replenish `elapsed × rate` capped at capacity, then
    /// admit iff at least one whole token is available, consuming it. The
    /// timestamp advances on rejection too, so partial refills accumulate
    /// in `tokens` and a steady over-limit stream still recovers at the
    /// tier rate.
    ///
    /// Sliding window: expire timestamps older than the window, admit iff
    /// the remaining count is below the cap, appending only on admit.
    ///
    /// Clock regressions never increase tokens past capacity nor drive
    /// them negative: elapsed time saturates at zero and the stored
    /// timestamp only moves forward.
    pub fn register(&mut self, now: Instant, limit: &EffectiveLimit) -> Decision {
        match self {
            RateState::Bucket {
                tokens,
                last_update,
            } => {
                let elapsed = now.saturating_duration_since(*last_update);
                let replenished =
                    (*tokens + elapsed.as_secs_f64() * limit.rate).min(limit.capacity);
                *last_update = (*last_update).max(now);

                if replenished >= 1.0 {
                    *tokens = replenished - 1.0;
                    Decision::Admit
                } else {
                    *tokens = replenished.max(0.0);
                    Decision::Reject
                }
            }
            RateState::Window { window, admitted } => {
                while let Some(&oldest) = admitted.front() {
                    if now.saturating_duration_since(oldest) > *window {
                        admitted.pop_front();
                    } else {
                        break;
                    }
                }

                if admitted.len() < limit.window_slots() {
                    admitted.push_back(now);
                    Decision::Admit
                } else {
                    Decision::Reject
                }
            }
        }
    }

    /// Whole tokens currently available (token bucket) or free window slots
    /// (sliding window), without advancing time. Diagnostic only.
    pub fn available(&self, limit: &EffectiveLimit) -> usize {
        match self {
            RateState::Bucket { tokens, .. } => *tokens as usize,
            RateState::Window { admitted, .. } => {
                limit.window_slots().saturating_sub(admitted.len())
            }
        }
    }
}
