//! Basic example demonstrating per-identity admission control.
//!
//! This example shows how to wrap a handler with the admission gate so a
//! single noisy sender is throttled while others keep flowing.

use admission_throttle::{AdmissionGate, Category, Event, Identity, Verdict};

struct Inbound {
    sender: u64,
    text: &'static str,
}

impl Event for Inbound {
    fn identity(&self) -> Option<Identity> {
        Some(Identity(self.sender))
    }

    fn category(&self) -> Category {
        if self.text.starts_with('/') {
            Category::Command
        } else {
            Category::Message
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("admission_throttle=debug")
        .init();

    // 2 req/s with a small burst; tuning off so the behavior is easy to
    // follow.
    let gate = AdmissionGate::builder()
        .with_default_rate(2.0)
        .with_default_capacity(3.0)
        .with_burst_factor(1.0)
        .with_burst_factor_bounds(1.0, 1.0)
        .with_rate_bounds(0.5, 100.0)
        .with_auto_tuning(false)
        .build()
        .unwrap();

    println!("=== Basic Admission Control Example ===\n");
    println!("Budget: burst of 3, then 2 requests/second\n");

    // Sender 1 floods; sender 2 sends a single message.
    for i in 1..=8 {
        let event = Inbound {
            sender: 1,
            text: "spam spam spam",
        };
        match gate.process(&event, |event| format!("handled: {}", event.text)) {
            Verdict::Handled(reply) => println!("sender 1, message {i}: {reply}"),
            Verdict::Rejected(rejection) => println!(
                "sender 1, message {i}: throttled (rate {:.1}/s, capacity {:.1})",
                rejection.current_rate, rejection.current_capacity
            ),
        }
    }

    println!();

    let event = Inbound {
        sender: 2,
        text: "/help",
    };
    match gate.process(&event, |_| "help text".to_string()) {
        Verdict::Handled(reply) => println!("sender 2: {reply}"),
        Verdict::Rejected(_) => println!("sender 2: throttled"),
    }

    println!("\n=== Example Complete ===");
    println!(
        "admitted={} rejected={}",
        gate.metrics().admitted(),
        gate.metrics().rejected()
    );
    println!("Notice: sender 1's flood never starved sender 2.");
}
