//! Storage implementations for per-identity state.
//!
//! Provides concurrent, sharded storage for tracking rate-limit state.

use crate::application::ports::Storage;
use dashmap::DashMap;
use std::hash::Hash;

/// Thread-safe sharded storage backed by DashMap with ahash keys.
///
/// DashMap shards the key space and locks per shard, so the entry access in
/// `with_entry_mut` serializes exactly the get-compute-put sequence for one
/// key while other keys proceed in parallel.
#[derive(Debug)]
pub struct ShardedStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    map: DashMap<K, V, ahash::RandomState>,
}

impl<K, V> ShardedStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create a new sharded storage instance.
    pub fn new() -> Self {
        Self {
            map: DashMap::with_hasher(ahash::RandomState::new()),
        }
    }

    /// Create storage sized for an expected number of entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: DashMap::with_capacity_and_hasher(capacity, ahash::RandomState::new()),
        }
    }

    /// Insert or update a value.
    pub fn insert(&self, key: K, value: V) {
        self.map.insert(key, value);
    }

    /// Get a reference to a value.
    pub fn get<Q>(&self, key: &Q) -> Option<dashmap::mapref::one::Ref<'_, K, V>>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.get(key)
    }

    /// Check if a key exists.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    /// Remove a key and return its value.
    pub fn take<Q>(&self, key: &Q) -> Option<(K, V)>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.remove(key)
    }

    /// Get the number of entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the storage is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.map.clear();
    }

    /// Iterate over all key-value pairs.
    pub fn iter(&self) -> dashmap::iter::Iter<'_, K, V, ahash::RandomState> {
        self.map.iter()
    }
}

impl<K, V> Default for ShardedStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

// Implement the Storage port
impl<K, V> Storage<K, V> for ShardedStorage<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + std::fmt::Debug,
    V: Send + Sync + std::fmt::Debug,
{
    fn with_entry_mut<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&mut V) -> R,
    {
        let entry = self.map.entry(key);
        let mut value_ref = entry.or_insert_with(factory);
        accessor(&mut value_ref)
    }

    fn remove(&self, key: &K) -> bool {
        self.map.remove(key).is_some()
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn clear(&self) {
        self.map.clear()
    }

    fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        for entry in self.map.iter() {
            f(entry.key(), entry.value());
        }
    }

    fn retain<F>(&self, f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        self.map.retain(f);
    }
}

// Implement Storage for Arc<ShardedStorage> to allow it to be used directly
impl<K, V> Storage<K, V> for std::sync::Arc<ShardedStorage<K, V>>
where
    K: Hash + Eq + Clone + Send + Sync + std::fmt::Debug,
    V: Send + Sync + std::fmt::Debug,
{
    fn with_entry_mut<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&mut V) -> R,
    {
        (**self).with_entry_mut(key, factory, accessor)
    }

    fn remove(&self, key: &K) -> bool {
        (**self).remove(key)
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }

    fn clear(&self) {
        (**self).clear()
    }

    fn for_each<F>(&self, f: F)
    where
        F: FnMut(&K, &V),
    {
        (**self).for_each(f)
    }

    fn retain<F>(&self, f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        (**self).retain(f)
    }
}
