//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the schedule query/store capabilities conflict detection needs.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes enforce `ScheduleMeeting::validate()` before persistence.
//! - Both adapters return identical results for identical data.

pub mod memory_repo;
pub mod schedule_repo;
