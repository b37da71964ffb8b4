//! Auto-tuning example: watch the rate parameters adapt under load.
//!
//! Drives synthetic traffic through the gate in phases - calm, overload,
//! calm again - and prints the published parameter snapshot after each
//! phase.

use admission_throttle::{AdmissionGate, Category, Event, Identity};
use std::time::{Duration, Instant};

struct Req(u64);

impl Event for Req {
    fn identity(&self) -> Option<Identity> {
        Some(Identity(self.0))
    }

    fn category(&self) -> Category {
        Category::Message
    }
}

fn drive(gate: &AdmissionGate, requests: u64, senders: u64, pace: Duration) {
    let deadline = Instant::now() + Duration::from_secs(6);
    let mut sent = 0;
    while sent < requests && Instant::now() < deadline {
        let _ = gate.process(&Req(sent % senders), |_| {
            // Simulated handler work.
            std::thread::sleep(Duration::from_micros(200));
        });
        sent += 1;
        if !pace.is_zero() {
            std::thread::sleep(pace);
        }
    }
}

fn report(gate: &AdmissionGate, phase: &str) {
    let stats = gate.stats();
    println!(
        "{phase:<18} rate={:>5.1}/s burst={:>5.1} pressure={:.2} block_rate={:.2}",
        stats.current_rate, stats.burst_capacity, stats.pressure, stats.block_rate
    );
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("admission_throttle=info")
        .init();

    let gate = AdmissionGate::builder()
        .with_default_rate(10.0)
        .with_rate_bounds(4.0, 80.0)
        .with_tuning_cooldown(Duration::from_secs(2))
        .build()
        .unwrap();

    println!("=== Auto-Tuning Example ===\n");
    report(&gate, "initial");

    // Phase 1: calm traffic, well under budget.
    drive(&gate, 40, 8, Duration::from_millis(50));
    std::thread::sleep(Duration::from_millis(2200));
    drive(&gate, 1, 1, Duration::ZERO);
    report(&gate, "after calm");

    // Phase 2: a flood from few senders; blocking climbs, the tuner
    // reins in the burst factor and holds the rate down.
    drive(&gate, 2000, 2, Duration::ZERO);
    std::thread::sleep(Duration::from_millis(2200));
    drive(&gate, 1, 1, Duration::ZERO);
    report(&gate, "after overload");

    // Phase 3: calm again; the burst factor recovers step by step.
    for _ in 0..3 {
        drive(&gate, 20, 8, Duration::from_millis(50));
        std::thread::sleep(Duration::from_millis(2200));
    }
    drive(&gate, 1, 1, Duration::ZERO);
    report(&gate, "after recovery");

    println!("\n=== Example Complete ===");
}
