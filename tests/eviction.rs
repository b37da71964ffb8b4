//! Integration tests for bounded memory and eviction.

use admission_throttle::infrastructure::mocks::MockClock;
use admission_throttle::{AdmissionGate, Category, Event, Identity};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Req(u64);

impl Event for Req {
    fn identity(&self) -> Option<Identity> {
        Some(Identity(self.0))
    }

    fn category(&self) -> Category {
        Category::Default
    }
}

struct Categorized(u64, Category);

impl Event for Categorized {
    fn identity(&self) -> Option<Identity> {
        Some(Identity(self.0))
    }

    fn category(&self) -> Category {
        self.1
    }
}

#[test]
fn store_size_stays_bounded() {
    let clock = Arc::new(MockClock::new(Instant::now()));
    let gate = AdmissionGate::builder()
        .with_max_identities(50)
        .with_clock(clock.clone())
        .build()
        .unwrap();

    // Ten times more distinct identities than the bound allows.
    for id in 0..500 {
        clock.advance(Duration::from_millis(1));
        let _ = gate.process(&Req(id), |_| ());
    }

    assert!(
        gate.occupancy() <= 50,
        "store holds {} entries past the bound",
        gate.occupancy()
    );
    assert!(gate.metrics().evicted() >= 450);
}

#[test]
fn eviction_prefers_stale_identities() {
    let clock = Arc::new(MockClock::new(Instant::now()));
    let gate = AdmissionGate::builder()
        .with_default_rate(10.0)
        .with_default_capacity(5.0)
        .with_burst_factor(1.5)
        .with_max_identities(3)
        .with_auto_tuning(false)
        .with_clock(clock.clone())
        .build()
        .unwrap();

    // Fill the store, with identity 1 as the most recently active.
    let _ = gate.process(&Req(2), |_| ());
    clock.advance(Duration::from_secs(1));
    let _ = gate.process(&Req(3), |_| ());
    clock.advance(Duration::from_secs(1));
    let _ = gate.process(&Req(1), |_| ());

    // Drain identity 1's remaining budget so state loss would be visible.
    for _ in 0..10 {
        let _ = gate.process(&Req(1), |_| ());
    }
    assert!(gate.process(&Req(1), |_| ()).is_rejected());

    // A new identity overflows the bound and evicts the oldest entry -
    // which is identity 2, not the just-active identity 1.
    clock.advance(Duration::from_millis(10));
    let _ = gate.process(&Req(4), |_| ());
    assert_eq!(gate.occupancy(), 3);

    // Identity 1's exhausted bucket survived the eviction: still rejected.
    assert!(gate.process(&Req(1), |_| ()).is_rejected());
}

#[test]
fn idle_ttl_expires_dormant_identities() {
    let clock = Arc::new(MockClock::new(Instant::now()));
    let gate = AdmissionGate::builder()
        .with_max_identities(1000)
        .with_idle_ttl(Duration::from_secs(600))
        .with_clock(clock.clone())
        .build()
        .unwrap();

    for id in 0..20 {
        let _ = gate.process(&Req(id), |_| ());
    }
    assert_eq!(gate.occupancy(), 20);

    // Everyone goes quiet for twice the TTL; the periodic sweep (every
    // 64th request) then clears the dormant entries.
    clock.advance(Duration::from_secs(1200));
    for _ in 0..70 {
        let _ = gate.process(&Req(9000), |_| ());
    }

    assert!(
        gate.occupancy() <= 2,
        "dormant identities survived the sweep: {}",
        gate.occupancy()
    );
}

#[test]
fn eviction_does_not_fail_requests() {
    let clock = Arc::new(MockClock::new(Instant::now()));
    let gate = AdmissionGate::builder()
        .with_max_identities(10)
        .with_clock(clock.clone())
        .build()
        .unwrap();

    // Every request from a brand-new identity rides the overflow path;
    // each must still be admitted normally (cold start).
    for id in 0..1000 {
        clock.advance(Duration::from_millis(1));
        assert!(gate.process(&Req(id), |_| ()).is_handled());
    }
}

#[test]
fn per_category_entries_count_toward_the_bound() {
    let clock = Arc::new(MockClock::new(Instant::now()));
    let gate = AdmissionGate::builder()
        .with_max_identities(10)
        .with_clock(clock.clone())
        .build()
        .unwrap();

    // Five identities × two categories = ten entries, exactly at the bound.
    for id in 0..5 {
        clock.advance(Duration::from_millis(1));
        let _ = gate.process(&Categorized(id, Category::Command), |_| ());
        let _ = gate.process(&Categorized(id, Category::Message), |_| ());
    }
    assert_eq!(gate.occupancy(), 10);

    // One more identity pushes two entries over; the bound holds.
    clock.advance(Duration::from_millis(1));
    let _ = gate.process(&Categorized(99, Category::Command), |_| ());
    let _ = gate.process(&Categorized(99, Category::Message), |_| ());
    assert!(gate.occupancy() <= 10);
}
