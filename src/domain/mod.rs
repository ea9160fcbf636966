//! Domain layer - pure business logic with no external dependencies.
//!
//! This layer contains the core concepts and invariants of the limiter:
//! - Token bucket state and the lazy refill algorithm
//! - Limiter configuration and its validation
//! - Admission decisions
//!
//! All types in this layer are pure and easily testable.

pub mod bucket;
pub mod config;
pub mod decision;
