//! Conflict detection services.
//!
//! # Responsibility
//! - Evaluate conflict rules for single meetings.
//! - Orchestrate batch flag recomputation and live conflict reports.
//! - Stay storage-agnostic behind `ScheduleQuery`/`ScheduleStore`.

pub mod conflict_detector;
pub mod conflict_rules;
pub mod conflict_scanner;
