//! Schedule domain model.
//!
//! # Responsibility
//! - Define the meeting record evaluated by conflict detection.
//! - Provide pure value helpers: day-pattern parsing and interval overlap.
//!
//! # Invariants
//! - Nothing in this module touches storage.

pub mod day_pattern;
pub mod interval;
pub mod meeting;
