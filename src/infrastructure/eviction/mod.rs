//! Eviction policy adapters for bucket management.
//!
//! In hexagonal architecture, these are adapters (infrastructure layer)
//! that implement the EvictionPolicy port (application layer).

pub mod lru;

pub use lru::LruEviction;
