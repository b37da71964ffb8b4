//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the
//! application layer needs. Infrastructure adapters implement these ports.

use std::fmt::Debug;
use std::hash::Hash;
use std::time::Instant;

/// Port for obtaining current time.
///
/// This abstraction allows the application layer to work with time without
/// depending on system clock implementation details. Infrastructure
/// provides concrete implementations (SystemClock, MockClock).
pub trait Clock: Send + Sync + Debug {
    /// Get the current instant.
    fn now(&self) -> Instant;
}

/// Candidate entry for eviction consideration.
///
/// Carries only what the shipped policies need: the key and its
/// last-update time. Keys are cloned out of the concurrent map to avoid
/// holding guards across the selection.
#[derive(Debug, Clone)]
pub struct EvictionCandidate<K> {
    /// The key of the entry.
    pub key: K,
    /// When the entry's state last changed.
    pub last_touch: Instant,
}

/// Port for eviction policy decisions.
///
/// The bucket store delegates both questions to the policy: whether the
/// current occupancy warrants an eviction pass, and which entries to drop.
/// Selection is batched - one pass may evict many entries - so that
/// opportunistic, request-path-triggered eviction stays amortized instead
/// of running per request.
pub trait EvictionPolicy<K>: Send + Sync + Debug
where
    K: Clone,
{
    /// Check if a capacity-triggered eviction pass should run.
    fn should_evict(&self, occupancy: usize) -> bool;

    /// Select the entries to evict from the given candidates.
    ///
    /// Returns an empty vector when nothing should be dropped.
    fn select_victims(&self, candidates: &[EvictionCandidate<K>], now: Instant) -> Vec<K>;
}

/// Port for concurrent key-value storage.
///
/// This abstraction allows the application layer to store and retrieve
/// per-identity state without depending on a specific concurrent data
/// structure. Infrastructure provides concrete implementations
/// (ShardedStorage).
///
/// `with_entry_mut` is the per-key critical section: the accessor runs
/// while the implementation holds exclusive access to that entry, so a
/// get-compute-put sequence is a single atomic unit.
pub trait Storage<K, V>: Send + Sync + Debug
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Send + Sync,
{
    /// Access an entry with mutable access, creating it if necessary.
    ///
    /// # Arguments
    /// * `key` - The key to look up
    /// * `factory` - Function to create a new value if the key doesn't exist
    /// * `accessor` - Function that gets mutable access to the value
    ///
    /// # Returns
    /// The result from the accessor function
    fn with_entry_mut<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&mut V) -> R;

    /// Remove a key, returning whether it was present.
    fn remove(&self, key: &K) -> bool;

    /// Get the number of entries in the storage.
    fn len(&self) -> usize;

    /// Check if the storage is empty.
    fn is_empty(&self) -> bool;

    /// Clear all entries from the storage.
    fn clear(&self);

    /// Iterate over all entries, providing access to both key and value.
    fn for_each<F>(&self, f: F)
    where
        F: FnMut(&K, &V);

    /// Remove entries for which the predicate returns false.
    fn retain<F>(&self, f: F)
    where
        F: FnMut(&K, &mut V) -> bool;
}
