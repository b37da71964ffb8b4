//! Idle-TTL eviction adapter.

use crate::application::ports::{EvictionCandidate, EvictionPolicy};
use std::time::{Duration, Instant};

/// TTL-only eviction policy for unbounded stores.
///
/// Never triggers capacity eviction; entries are dropped solely once they
/// have been idle longer than the TTL, during the periodic sweep.
#[derive(Debug, Clone)]
pub struct IdleEviction {
    /// How long an entry may sit untouched before it is dropped
    idle_ttl: Duration,
}

impl IdleEviction {
    /// Create a new idle-TTL eviction policy.
    pub fn new(idle_ttl: Duration) -> Self {
        Self { idle_ttl }
    }

    /// The configured TTL.
    pub fn idle_ttl(&self) -> Duration {
        self.idle_ttl
    }
}

impl<K> EvictionPolicy<K> for IdleEviction
where
    K: Clone + Send + Sync + std::fmt::Debug,
{
    fn should_evict(&self, _occupancy: usize) -> bool {
        false
    }

    fn select_victims(&self, candidates: &[EvictionCandidate<K>], now: Instant) -> Vec<K> {
        candidates
            .iter()
            .filter(|candidate| {
                now.saturating_duration_since(candidate.last_touch) > self.idle_ttl
            })
            .map(|candidate| candidate.key.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_triggers_capacity_eviction() {
        let policy = IdleEviction::new(Duration::from_secs(60));
        assert!(!<IdleEviction as EvictionPolicy<String>>::should_evict(
            &policy, 1_000_000
        ));
    }

    #[test]
    fn test_expires_only_idle_entries() {
        let policy = IdleEviction::new(Duration::from_secs(60));
        let now = Instant::now();

        let candidates = vec![
            EvictionCandidate {
                key: "active".to_string(),
                last_touch: now - Duration::from_secs(59),
            },
            EvictionCandidate {
                key: "idle".to_string(),
                last_touch: now - Duration::from_secs(61),
            },
        ];

        let victims = policy.select_victims(&candidates, now);
        assert_eq!(victims, vec!["idle".to_string()]);
    }

    #[test]
    fn test_exact_ttl_boundary_survives() {
        let policy = IdleEviction::new(Duration::from_secs(60));
        let now = Instant::now();

        let candidates = vec![EvictionCandidate {
            key: "boundary".to_string(),
            last_touch: now - Duration::from_secs(60),
        }];

        assert!(policy.select_victims(&candidates, now).is_empty());
    }
}
