//! Rate limiter coordination logic.
//!
//! The rate limiter turns one (identity, category) pair into an admission
//! decision: it resolves the category's tier against the current parameter
//! snapshot and registers the request inside the key's critical section.

use crate::application::store::{BucketStore, IdentityState};
use crate::application::ports::Storage;
use crate::application::tuner::ParamsCell;
use crate::domain::event::{BucketKey, Category, Identity};
use crate::domain::params::GlobalParameters;
use crate::domain::strategy::Decision;
use crate::domain::tier::TierTable;
use std::sync::Arc;

/// Decision engine over the bucket store.
///
/// Stateless apart from its collaborators; cloning shares the store and
/// the published parameters.
#[derive(Debug, Clone)]
pub struct RateLimiter<S>
where
    S: Storage<BucketKey, IdentityState> + Clone,
{
    store: BucketStore<S>,
    tiers: TierTable,
    params: ParamsCell,
}

impl<S> RateLimiter<S>
where
    S: Storage<BucketKey, IdentityState> + Clone,
{
    /// Create a new rate limiter.
    ///
    /// # Arguments
    /// * `store` - The bounded per-identity state store
    /// * `tiers` - Per-category tier table
    /// * `params` - The tuner-published parameter cell
    pub fn new(store: BucketStore<S>, tiers: TierTable, params: ParamsCell) -> Self {
        Self {
            store,
            tiers,
            params,
        }
    }

    /// Decide admission for one request.
    ///
    /// Reads the parameter snapshot once, so the rate/capacity pair used
    /// for this decision is always internally consistent even while the
    /// tuner republishes concurrently.
    ///
    /// # Performance
    /// This method is designed for the hot path:
    /// - One atomic snapshot read
    /// - One sharded-map entry access
    /// - O(1) token-bucket math, O(k) window pruning
    pub fn decide(&self, identity: Identity, category: Category) -> Decision {
        let params = self.params.load();
        let limit = self.tiers.effective(category, &params);
        self.store
            .with_state(BucketKey::new(identity, category), &limit, |state, now| {
                state.register(now, &limit)
            })
    }

    /// The current parameter snapshot.
    pub fn params(&self) -> Arc<GlobalParameters> {
        self.params.load()
    }

    /// Get a reference to the bucket store.
    pub fn store(&self) -> &BucketStore<S> {
        &self.store
    }

    /// Get a reference to the tier table.
    pub fn tiers(&self) -> &TierTable {
        &self.tiers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::metrics::Metrics;
    use crate::domain::strategy::Strategy;
    use crate::domain::tier::LimitTier;
    use crate::infrastructure::mocks::MockClock;
    use crate::infrastructure::storage::ShardedStorage;
    use std::time::{Duration, Instant};

    fn limiter_with(
        clock: Arc<MockClock>,
        strategy: Strategy,
        tiers: TierTable,
        params: GlobalParameters,
    ) -> (
        RateLimiter<Arc<ShardedStorage<BucketKey, IdentityState>>>,
        ParamsCell,
    ) {
        let cell = ParamsCell::new(params);
        let store = BucketStore::new(
            Arc::new(ShardedStorage::new()),
            clock,
            strategy,
            None,
            Metrics::new(),
        );
        (
            RateLimiter::new(store, tiers, cell.clone()),
            cell,
        )
    }

    fn flat_params(rate: f64) -> GlobalParameters {
        // burst_factor 1.0 keeps effective capacity == tier capacity
        GlobalParameters::new(rate, 1.0, 0.1, 1000.0, 1.0, 1.0)
    }

    #[test]
    fn test_decide_basic_burst() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let tiers = TierTable::new(LimitTier::new(5.0, 3.0));
        let (limiter, _) = limiter_with(clock, Strategy::TokenBucket, tiers, flat_params(5.0));

        let id = Identity(1);
        assert!(limiter.decide(id, Category::Default).is_admit());
        assert!(limiter.decide(id, Category::Default).is_admit());
        assert!(limiter.decide(id, Category::Default).is_admit());
        assert!(limiter.decide(id, Category::Default).is_reject());
    }

    #[test]
    fn test_identities_are_independent() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let tiers = TierTable::new(LimitTier::new(5.0, 1.0));
        let (limiter, _) = limiter_with(clock, Strategy::TokenBucket, tiers, flat_params(5.0));

        assert!(limiter.decide(Identity(1), Category::Default).is_admit());
        assert!(limiter.decide(Identity(1), Category::Default).is_reject());

        // A different identity still has its full burst.
        assert!(limiter.decide(Identity(2), Category::Default).is_admit());
    }

    #[test]
    fn test_categories_are_isolated() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let mut tiers = TierTable::new(LimitTier::new(5.0, 2.0));
        tiers.set(Category::Command, LimitTier::new(1.0, 1.0));
        let (limiter, _) = limiter_with(clock, Strategy::TokenBucket, tiers, flat_params(5.0));

        let id = Identity(7);

        // Exhaust the command tier.
        assert!(limiter.decide(id, Category::Command).is_admit());
        assert!(limiter.decide(id, Category::Command).is_reject());

        // The message tier for the same identity is untouched.
        assert!(limiter.decide(id, Category::Message).is_admit());
        assert!(limiter.decide(id, Category::Message).is_admit());
        assert!(limiter.decide(id, Category::Message).is_reject());
    }

    #[test]
    fn test_unknown_category_uses_default_tier() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let tiers = TierTable::new(LimitTier::new(5.0, 1.0));
        let (limiter, _) = limiter_with(clock, Strategy::TokenBucket, tiers, flat_params(5.0));

        // No override for Other: default tier's single token applies.
        assert!(limiter.decide(Identity(1), Category::Other).is_admit());
        assert!(limiter.decide(Identity(1), Category::Other).is_reject());
    }

    #[test]
    fn test_republished_params_apply_to_next_decision() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let tiers = TierTable::new(LimitTier::per_second(10.0));
        let params = GlobalParameters::new(10.0, 1.0, 0.1, 1000.0, 0.5, 4.0);
        let (limiter, cell) = limiter_with(clock.clone(), Strategy::TokenBucket, tiers, params);

        let id = Identity(1);
        // Drain the default burst of 10.
        for _ in 0..10 {
            assert!(limiter.decide(id, Category::Default).is_admit());
        }
        assert!(limiter.decide(id, Category::Default).is_reject());

        // Double the burst factor: capacity 20, and replenishment over one
        // second at rate 10 grants ten more admits.
        let doubled = limiter.params().adjusted(10.0, 2.0);
        cell.publish(doubled);
        clock.advance(Duration::from_secs(1));

        for _ in 0..10 {
            assert!(limiter.decide(id, Category::Default).is_admit());
        }
        assert!(limiter.decide(id, Category::Default).is_reject());
    }

    #[test]
    fn test_sliding_window_strategy() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let tiers = TierTable::new(LimitTier::new(0.0, 3.0));
        let (limiter, _) = limiter_with(
            clock.clone(),
            Strategy::SlidingWindow {
                window: Duration::from_secs(10),
            },
            tiers,
            flat_params(1.0),
        );

        let id = Identity(1);
        assert!(limiter.decide(id, Category::Default).is_admit());
        clock.advance(Duration::from_secs(1));
        assert!(limiter.decide(id, Category::Default).is_admit());
        clock.advance(Duration::from_secs(1));
        assert!(limiter.decide(id, Category::Default).is_admit());
        clock.advance(Duration::from_secs(1));
        assert!(limiter.decide(id, Category::Default).is_reject());

        // t=11: the t=0 event has left the window.
        clock.advance(Duration::from_secs(8));
        assert!(limiter.decide(id, Category::Default).is_admit());
    }
}
