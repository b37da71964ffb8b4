//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates the domain logic and manages the runtime behavior:
//! - Bucket store (bounded per-identity state with eviction)
//! - Rate limiter (decision making)
//! - Pressure monitor and auto-tuner (the feedback loop)
//! - Admission controller (the per-request flow)
//! - Stats emitter (periodic observability snapshots)
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details.

pub mod controller;
pub mod emitter;
pub mod limiter;
pub mod metrics;
pub mod ports;
pub mod pressure;
pub mod store;
pub mod tuner;
