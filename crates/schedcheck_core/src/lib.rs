//! Schedule conflict detection core.
//! Owns the rules that decide whether two course meetings collide and the
//! batch process that keeps each meeting's conflicted flag current.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::day_pattern::{parse_day_pattern, DayPatternCache, DaySet, Weekday};
pub use model::interval::overlaps;
pub use model::meeting::{
    AcademicPeriod, Department, DepartmentId, FacultyId, MeetingId, MeetingStatus,
    MeetingValidationError, Room, RoomId, ScheduleMeeting, Subject, SubjectId,
};
pub use repo::memory_repo::InMemoryScheduleRepository;
pub use repo::schedule_repo::{
    ConflictFlagUpdate, RepoError, RepoResult, ScheduleFilter, ScheduleQuery, ScheduleStore,
    SqliteScheduleRepository,
};
pub use service::conflict_detector::{ConflictDetector, ConflictPolicy};
pub use service::conflict_rules::{
    ConflictKind, ConflictRecord, ConflictRule, DuplicateSubjectSectionRule, RoomTimeRule,
    SectionTimeRule,
};
pub use service::conflict_scanner::{
    ConflictScanner, ConflictedMeeting, ScanError, ScanPlan, ScanStats,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
