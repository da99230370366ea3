//! Per-meeting conflict evaluation and standalone validation.
//!
//! # Responsibility
//! - Run the default rule chain (room-time, then section-time) for one meeting.
//! - Expose the duplicate subject-section check as a separate entry point.
//! - Report time-range and room-capacity problems as messages.
//!
//! # Invariants
//! - A meeting without a room never conflicts.
//! - Validation never fails; it returns every violation found.
//! - `update_conflict_status` mutates the in-memory flag only; callers persist.
//! - Parsed day patterns are cached for one evaluation call only; the
//!   detector itself holds no per-pattern state.

use crate::model::day_pattern::DayPatternCache;
use crate::model::meeting::ScheduleMeeting;
use crate::repo::schedule_repo::{RepoResult, ScheduleQuery};
use crate::service::conflict_rules::{
    evaluate_rule, ConflictRecord, DuplicateSubjectSectionRule, RoomTimeRule, SectionTimeRule,
};
use log::debug;
use serde::{Deserialize, Serialize};

/// Tunable bounds applied by meeting validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictPolicy {
    pub min_duration_minutes: u32,
    pub max_duration_minutes: u32,
}

impl Default for ConflictPolicy {
    fn default() -> Self {
        Self {
            min_duration_minutes: 30,
            max_duration_minutes: 8 * 60,
        }
    }
}

/// Conflict evaluator bound to one schedule query.
pub struct ConflictDetector<Q: ScheduleQuery> {
    query: Q,
    policy: ConflictPolicy,
}

impl<Q: ScheduleQuery> ConflictDetector<Q> {
    pub fn new(query: Q) -> Self {
        Self::with_policy(query, ConflictPolicy::default())
    }

    pub fn with_policy(query: Q, policy: ConflictPolicy) -> Self {
        Self { query, policy }
    }

    pub fn query(&self) -> &Q {
        &self.query
    }

    pub fn policy(&self) -> &ConflictPolicy {
        &self.policy
    }

    /// Returns room-time conflicts, then section-time conflicts.
    ///
    /// `exclude_self` drops the meeting's own id from candidate pools; pass
    /// `false` for drafts that are not stored yet.
    pub fn detect_conflicts(
        &self,
        meeting: &ScheduleMeeting,
        exclude_self: bool,
    ) -> RepoResult<Vec<ConflictRecord>> {
        self.detect_conflicts_with(meeting, exclude_self, &DayPatternCache::new())
    }

    /// Same as `detect_conflicts`, parsing day patterns through a
    /// caller-scoped cache so a batch parses each pattern once.
    pub fn detect_conflicts_with(
        &self,
        meeting: &ScheduleMeeting,
        exclude_self: bool,
        day_patterns: &DayPatternCache,
    ) -> RepoResult<Vec<ConflictRecord>> {
        if meeting.room.is_none() {
            return Ok(Vec::new());
        }

        let mut conflicts = evaluate_rule(
            &RoomTimeRule,
            &self.query,
            meeting,
            exclude_self,
            day_patterns,
        )?;

        if meeting.section_label().is_some() {
            conflicts.extend(evaluate_rule(
                &SectionTimeRule,
                &self.query,
                meeting,
                exclude_self,
                day_patterns,
            )?);
        }

        debug!(
            "event=conflict_detect module=service status=ok meeting_id={} conflicts={}",
            meeting.id,
            conflicts.len()
        );
        Ok(conflicts)
    }

    /// Lists every other active listing of the same subject-section and period.
    pub fn check_duplicate_subject_section(
        &self,
        meeting: &ScheduleMeeting,
        exclude_self: bool,
    ) -> RepoResult<Vec<ConflictRecord>> {
        evaluate_rule(
            &DuplicateSubjectSectionRule,
            &self.query,
            meeting,
            exclude_self,
            &DayPatternCache::new(),
        )
    }

    /// Recomputes `meeting.is_conflicted` against the stored schedule.
    ///
    /// Returns the new flag value.
    pub fn update_conflict_status(&self, meeting: &mut ScheduleMeeting) -> RepoResult<bool> {
        let conflicted = !self.detect_conflicts(meeting, true)?.is_empty();
        meeting.is_conflicted = conflicted;
        Ok(conflicted)
    }

    /// Checks that the meeting window is ordered and within duration bounds.
    pub fn validate_time_range(&self, meeting: &ScheduleMeeting) -> Vec<String> {
        let mut errors = Vec::new();

        if meeting.end_time <= meeting.start_time {
            errors.push("End time must be after start time".to_string());
        }

        let minutes = (meeting.end_time - meeting.start_time).num_minutes();
        if minutes < i64::from(self.policy.min_duration_minutes) {
            errors.push(format!(
                "Schedule duration must be at least {}",
                describe_minutes(self.policy.min_duration_minutes)
            ));
        }
        if minutes > i64::from(self.policy.max_duration_minutes) {
            errors.push(format!(
                "Schedule duration cannot exceed {}",
                describe_minutes(self.policy.max_duration_minutes)
            ));
        }

        errors
    }

    /// Checks enrollment against the room's seat count, when it has one.
    pub fn validate_room_capacity(&self, meeting: &ScheduleMeeting) -> Vec<String> {
        let Some(room) = meeting.room.as_ref() else {
            return Vec::new();
        };
        match room.capacity {
            Some(capacity) if meeting.enrolled_students > capacity => vec![format!(
                "Enrolled students ({}) exceed capacity of room {} ({})",
                meeting.enrolled_students, room.name, capacity
            )],
            _ => Vec::new(),
        }
    }

    /// Runs every standalone validation and concatenates the messages.
    pub fn validate_meeting(&self, meeting: &ScheduleMeeting) -> Vec<String> {
        let mut errors = self.validate_time_range(meeting);
        errors.extend(self.validate_room_capacity(meeting));
        errors
    }
}

fn describe_minutes(minutes: u32) -> String {
    match (minutes / 60, minutes % 60) {
        (1, 0) => "1 hour".to_string(),
        (hours, 0) if hours > 0 => format!("{hours} hours"),
        _ => format!("{minutes} minutes"),
    }
}
