//! Eviction policy adapters for identity-state management.
//!
//! This module provides the adapters implementing the EvictionPolicy port:
//! least-recently-updated eviction with an entry bound, and idle-TTL expiry
//! for unbounded stores.
//!
//! In hexagonal architecture, these are adapters (infrastructure layer)
//! that implement the EvictionPolicy port (application layer).

pub mod idle;
pub mod lru;

pub use idle::IdleEviction;
pub use lru::LruEviction;
