//! Bounded store of per-identity rate-limit state.
//!
//! The store maintains one [`RateState`] per (identity, category) key,
//! created lazily on first contact and evicted when the store outgrows its
//! bound or an entry sits idle past its TTL. All state access goes through
//! a single per-key critical section.

use crate::application::metrics::Metrics;
use crate::application::ports::{Clock, EvictionCandidate, EvictionPolicy, Storage};
use crate::domain::event::BucketKey;
use crate::domain::strategy::{RateState, Strategy};
use crate::domain::tier::EffectiveLimit;
use std::sync::Arc;
use std::time::Instant;

/// State tracked for each (identity, category) key.
#[derive(Debug, Clone)]
pub struct IdentityState {
    /// The rate-limit accounting state.
    pub state: RateState,
    /// When this entry last changed; drives least-recently-updated eviction.
    pub last_touch: Instant,
}

impl IdentityState {
    /// Create new state for a key first seen at `now`.
    pub fn new(state: RateState, now: Instant) -> Self {
        Self {
            state,
            last_touch: now,
        }
    }
}

/// Bounded mapping from (identity, category) to rate-limit state.
///
/// Generic over the storage implementation. In production, use
/// `Arc<ShardedStorage>`; the sharded map serializes the get-compute-put
/// sequence per key, which is the engine's only critical section.
///
/// Eviction is opportunistic: a capacity check runs synchronously whenever
/// an insert creates a new entry (keeping the bound strict), and the
/// request path triggers a periodic [`sweep`](Self::sweep) for idle
/// entries. Both are batched so neither dominates any single request.
#[derive(Clone)]
pub struct BucketStore<S>
where
    S: Storage<BucketKey, IdentityState> + Clone,
{
    storage: S,
    clock: Arc<dyn Clock>,
    strategy: Strategy,
    eviction: Option<Arc<dyn EvictionPolicy<BucketKey>>>,
    metrics: Metrics,
}

impl<S> BucketStore<S>
where
    S: Storage<BucketKey, IdentityState> + Clone,
{
    /// Create a new store.
    ///
    /// # Arguments
    /// * `storage` - The concurrent map adapter
    /// * `clock` - Time source for state transitions and eviction
    /// * `strategy` - Accounting scheme used for fresh entries
    /// * `eviction` - Eviction policy, or `None` for an unbounded store
    /// * `metrics` - Shared counters (evictions, clock anomalies)
    pub fn new(
        storage: S,
        clock: Arc<dyn Clock>,
        strategy: Strategy,
        eviction: Option<Arc<dyn EvictionPolicy<BucketKey>>>,
        metrics: Metrics,
    ) -> Self {
        Self {
            storage,
            clock,
            strategy,
            eviction,
            metrics,
        }
    }

    /// Run `f` inside the key's critical section, creating state on miss.
    ///
    /// A missing entry is created with full burst available (cold-start
    /// policy). The callback receives the mutable state and the decision
    /// timestamp; no other caller can observe or mutate the same key's
    /// state while it runs.
    ///
    /// If the clock reads earlier than the entry's last update, the
    /// regression is counted and logged; the entry's `last_touch` only
    /// moves forward, and the strategy math clamps elapsed time to zero.
    pub fn with_state<F, R>(&self, key: BucketKey, limit: &EffectiveLimit, f: F) -> R
    where
        F: FnOnce(&mut RateState, Instant) -> R,
    {
        let now = self.clock.now();
        let mut created = false;

        let result = self.storage.with_entry_mut(
            key,
            || {
                created = true;
                IdentityState::new(self.strategy.initial_state(limit, now), now)
            },
            |entry| {
                if now < entry.last_touch {
                    self.metrics.record_clock_anomaly();
                    tracing::warn!(
                        identity = key.identity.get(),
                        category = %key.category,
                        "monotonic clock regression; elapsed clamped to zero"
                    );
                }
                let result = f(&mut entry.state, now);
                entry.last_touch = entry.last_touch.max(now);
                result
            },
        );

        // Keep the bound strict: only an insert can grow the store, so the
        // capacity check runs exactly when one happened.
        if created {
            self.evict_if_needed(now);
        }

        result
    }

    /// Run a capacity-triggered eviction pass if the policy calls for one.
    ///
    /// Returns the number of entries evicted.
    pub fn evict_if_needed(&self, now: Instant) -> usize {
        match &self.eviction {
            Some(policy) if policy.should_evict(self.storage.len()) => self.run_eviction(now),
            _ => 0,
        }
    }

    /// Run an unconditional eviction pass (idle-TTL expiry plus any
    /// overflow). Triggered periodically from the request path.
    ///
    /// Returns the number of entries evicted.
    pub fn sweep(&self, now: Instant) -> usize {
        match &self.eviction {
            Some(_) => self.run_eviction(now),
            None => 0,
        }
    }

    fn run_eviction(&self, now: Instant) -> usize {
        let policy = match &self.eviction {
            Some(policy) => policy,
            None => return 0,
        };

        let mut candidates = Vec::with_capacity(self.storage.len());
        self.storage.for_each(|key, entry| {
            candidates.push(EvictionCandidate {
                key: *key,
                last_touch: entry.last_touch,
            });
        });

        let victims = policy.select_victims(&candidates, now);
        let mut evicted = 0;
        for key in &victims {
            if self.storage.remove(key) {
                self.metrics.record_eviction();
                evicted += 1;
            }
        }

        if evicted > 0 {
            tracing::debug!(evicted, occupancy = self.storage.len(), "evicted identity state");
        }
        evicted
    }

    /// Number of tracked (identity, category) entries.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Drop all tracked state.
    pub fn clear(&self) {
        self.storage.clear();
    }

    /// The clock this store reads.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// The strategy fresh entries are created with.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }
}

impl<S> std::fmt::Debug for BucketStore<S>
where
    S: Storage<BucketKey, IdentityState> + Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BucketStore")
            .field("occupancy", &self.storage.len())
            .field("strategy", &self.strategy)
            .field("eviction", &self.eviction)
            .finish()
    }
}
