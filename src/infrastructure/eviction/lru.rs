//! LRU (least recently updated) eviction adapter.

use crate::application::ports::{EvictionCandidate, EvictionPolicy};
use std::time::{Duration, Instant};

/// LRU eviction policy with an entry count limit.
///
/// Evicts the least recently updated entries when the limit is exceeded,
/// in one batch down to the bound. Optionally also expires entries that
/// have been idle longer than a TTL, whatever the occupancy.
#[derive(Debug, Clone)]
pub struct LruEviction {
    /// Maximum number of entries before eviction
    max_entries: usize,
    /// Optional idle expiry applied on every selection
    idle_ttl: Option<Duration>,
}

impl LruEviction {
    /// Create a new LRU eviction policy with the given entry limit.
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries,
            idle_ttl: None,
        }
    }

    /// Additionally expire entries idle longer than `ttl`.
    pub fn with_idle_ttl(mut self, ttl: Duration) -> Self {
        self.idle_ttl = Some(ttl);
        self
    }

    /// The entry limit.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// The idle TTL, if configured.
    pub fn idle_ttl(&self) -> Option<Duration> {
        self.idle_ttl
    }

    fn expired(&self, candidate: &EvictionCandidate<impl Clone>, now: Instant) -> bool {
        match self.idle_ttl {
            Some(ttl) => now.saturating_duration_since(candidate.last_touch) > ttl,
            None => false,
        }
    }
}

impl<K> EvictionPolicy<K> for LruEviction
where
    K: Clone + Send + Sync + std::fmt::Debug,
{
    fn should_evict(&self, occupancy: usize) -> bool {
        occupancy > self.max_entries
    }

    fn select_victims(&self, candidates: &[EvictionCandidate<K>], now: Instant) -> Vec<K> {
        let mut victims: Vec<K> = candidates
            .iter()
            .filter(|candidate| self.expired(candidate, now))
            .map(|candidate| candidate.key.clone())
            .collect();

        let surviving = candidates.len() - victims.len();
        let overflow = surviving.saturating_sub(self.max_entries);
        if overflow > 0 {
            // Oldest first among the non-expired entries.
            let mut by_age: Vec<&EvictionCandidate<K>> = candidates
                .iter()
                .filter(|candidate| !self.expired(candidate, now))
                .collect();
            by_age.sort_by_key(|candidate| candidate.last_touch);
            victims.extend(by_age.iter().take(overflow).map(|c| c.key.clone()));
        }

        victims
    }
}
