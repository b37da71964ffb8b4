//! Per-category tiers: expensive commands, cheap messages.
//!
//! Shows how tier overrides give each request category its own budget for
//! the same sender.

use admission_throttle::{AdmissionGate, Category, Event, Identity, LimitTier};

struct Inbound {
    sender: u64,
    category: Category,
}

impl Event for Inbound {
    fn identity(&self) -> Option<Identity> {
        Some(Identity(self.sender))
    }

    fn category(&self) -> Category {
        self.category
    }
}

fn send(gate: &AdmissionGate, category: Category, label: &str, count: usize) {
    let mut admitted = 0;
    let mut rejected = 0;
    for _ in 0..count {
        let event = Inbound {
            sender: 7,
            category,
        };
        if gate.process(&event, |_| ()).is_handled() {
            admitted += 1;
        } else {
            rejected += 1;
        }
    }
    println!("{label:<10} admitted={admitted:<3} rejected={rejected}");
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("admission_throttle=debug")
        .init();

    let gate = AdmissionGate::builder()
        .with_default_rate(20.0)
        .with_rate_bounds(1.0, 200.0)
        .with_burst_factor(1.0)
        .with_burst_factor_bounds(1.0, 1.0)
        // Commands are expensive: 2/s with a burst of 3.
        .with_tier(Category::Command, LimitTier::new(2.0, 3.0))
        // Callbacks are cheap UI chatter: generous budget.
        .with_tier(Category::Callback, LimitTier::new(30.0, 60.0))
        .with_auto_tuning(false)
        .build()
        .unwrap();

    println!("=== Category Tiers Example ===\n");
    println!("Same sender, one burst of 20 per category:\n");

    send(&gate, Category::Command, "commands", 20);
    send(&gate, Category::Message, "messages", 20);
    send(&gate, Category::Callback, "callbacks", 20);

    println!("\nExhausting commands left messages and callbacks untouched.");
    println!("\n=== Example Complete ===");
}
