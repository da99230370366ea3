//! Conflict predicates and their candidate pools.
//!
//! # Responsibility
//! - Define the three conflict rules: room-time, section-time and duplicate
//!   subject-section.
//! - Pair every rule with the scoped query that yields its candidates.
//!
//! # Invariants
//! - Every pool is restricted to `MeetingStatus::Active` and the meeting's
//!   own academic period.
//! - A rule that cannot apply (no room, no section) yields no pool at all.
//! - Rules never read the `is_conflicted` flag.

use crate::model::day_pattern::DayPatternCache;
use crate::model::interval::overlaps;
use crate::model::meeting::{MeetingId, ScheduleMeeting};
use crate::repo::schedule_repo::{RepoResult, ScheduleFilter, ScheduleQuery};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Category of a detected conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    RoomTime,
    SectionTime,
    DuplicateSubjectSection,
}

/// One conflict between an evaluated meeting and an existing one.
///
/// Request-scoped: produced per evaluation and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub kind: ConflictKind,
    /// The existing meeting the evaluated one collides with.
    pub conflicting: ScheduleMeeting,
    pub message: String,
}

impl ConflictRecord {
    pub fn conflicting_id(&self) -> MeetingId {
        self.conflicting.id
    }
}

/// A conflict predicate plus the query that scopes its candidates.
pub trait ConflictRule {
    fn kind(&self) -> ConflictKind;

    /// Candidate pool filter, or `None` when the rule does not apply.
    fn candidate_filter(
        &self,
        meeting: &ScheduleMeeting,
        exclude_self: bool,
    ) -> Option<ScheduleFilter>;

    /// Whether `candidate` collides with `meeting`.
    ///
    /// Defaults to shared weekday plus overlapping time window.
    fn clashes(
        &self,
        meeting: &ScheduleMeeting,
        candidate: &ScheduleMeeting,
        day_patterns: &DayPatternCache,
    ) -> bool {
        day_patterns
            .get(&meeting.day_pattern)
            .intersects(&day_patterns.get(&candidate.day_pattern))
            && overlaps(
                meeting.start_time,
                meeting.end_time,
                candidate.start_time,
                candidate.end_time,
            )
    }

    fn describe(&self, meeting: &ScheduleMeeting, candidate: &ScheduleMeeting) -> String;
}

/// Evaluates one rule for `meeting`, querying its pool through `query`.
pub fn evaluate_rule<R, Q>(
    rule: &R,
    query: &Q,
    meeting: &ScheduleMeeting,
    exclude_self: bool,
    day_patterns: &DayPatternCache,
) -> RepoResult<Vec<ConflictRecord>>
where
    R: ConflictRule + ?Sized,
    Q: ScheduleQuery + ?Sized,
{
    let Some(filter) = rule.candidate_filter(meeting, exclude_self) else {
        return Ok(Vec::new());
    };

    let conflicts = query
        .find_active(&filter)?
        .into_iter()
        .filter(|candidate| rule.clashes(meeting, candidate, day_patterns))
        .map(|candidate| ConflictRecord {
            kind: rule.kind(),
            message: rule.describe(meeting, &candidate),
            conflicting: candidate,
        })
        .collect();

    Ok(conflicts)
}

/// Same room, same period, shared day and overlapping time.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoomTimeRule;

impl ConflictRule for RoomTimeRule {
    fn kind(&self) -> ConflictKind {
        ConflictKind::RoomTime
    }

    fn candidate_filter(
        &self,
        meeting: &ScheduleMeeting,
        exclude_self: bool,
    ) -> Option<ScheduleFilter> {
        let room = meeting.room.as_ref()?;
        Some(
            ScheduleFilter {
                room_id: Some(room.id),
                exclude_id: exclude_self.then_some(meeting.id),
                ..ScheduleFilter::default()
            }
            .in_period(&meeting.period),
        )
    }

    fn describe(&self, meeting: &ScheduleMeeting, candidate: &ScheduleMeeting) -> String {
        format!(
            "Room {} is already booked for {} on {} from {} to {} (Section: {})",
            room_name(meeting),
            candidate.subject.code,
            candidate.day_pattern,
            clock(candidate.start_time),
            clock(candidate.end_time),
            candidate.section_label().unwrap_or("N/A"),
        )
    }
}

/// Same subject-section in the same period meeting at the same time,
/// possibly in a different room.
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionTimeRule;

impl ConflictRule for SectionTimeRule {
    fn kind(&self) -> ConflictKind {
        ConflictKind::SectionTime
    }

    fn candidate_filter(
        &self,
        meeting: &ScheduleMeeting,
        exclude_self: bool,
    ) -> Option<ScheduleFilter> {
        subject_section_filter(meeting, exclude_self)
    }

    fn describe(&self, _meeting: &ScheduleMeeting, candidate: &ScheduleMeeting) -> String {
        format!(
            "Section {} of {} already meets on {} from {} to {} in {}",
            candidate.section_label().unwrap_or("N/A"),
            candidate.subject.code,
            candidate.day_pattern,
            clock(candidate.start_time),
            clock(candidate.end_time),
            room_name(candidate),
        )
    }
}

/// Any second active listing of the same subject-section in the period,
/// regardless of day or time.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicateSubjectSectionRule;

impl ConflictRule for DuplicateSubjectSectionRule {
    fn kind(&self) -> ConflictKind {
        ConflictKind::DuplicateSubjectSection
    }

    fn candidate_filter(
        &self,
        meeting: &ScheduleMeeting,
        exclude_self: bool,
    ) -> Option<ScheduleFilter> {
        subject_section_filter(meeting, exclude_self)
    }

    fn clashes(
        &self,
        _meeting: &ScheduleMeeting,
        _candidate: &ScheduleMeeting,
        _day_patterns: &DayPatternCache,
    ) -> bool {
        true
    }

    fn describe(&self, _meeting: &ScheduleMeeting, candidate: &ScheduleMeeting) -> String {
        format!(
            "Duplicate listing: {} section {} is already scheduled on {} from {} to {} in {}",
            candidate.subject.code,
            candidate.section_label().unwrap_or("N/A"),
            candidate.day_pattern,
            clock(candidate.start_time),
            clock(candidate.end_time),
            room_name(candidate),
        )
    }
}

fn subject_section_filter(meeting: &ScheduleMeeting, exclude_self: bool) -> Option<ScheduleFilter> {
    let section = meeting.section_label()?;
    Some(
        ScheduleFilter {
            subject_id: Some(meeting.subject.id),
            section: Some(section.to_string()),
            exclude_id: exclude_self.then_some(meeting.id),
            ..ScheduleFilter::default()
        }
        .in_period(&meeting.period),
    )
}

fn room_name(meeting: &ScheduleMeeting) -> &str {
    meeting
        .room
        .as_ref()
        .map_or("(unassigned)", |room| room.name.as_str())
}

/// Formats a time of day on the 12-hour clock, e.g. `9:30 AM`.
pub fn clock(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::clock;
    use chrono::NaiveTime;

    #[test]
    fn clock_uses_twelve_hour_format() {
        assert_eq!(clock(NaiveTime::from_hms_opt(9, 5, 0).unwrap()), "9:05 AM");
        assert_eq!(clock(NaiveTime::from_hms_opt(13, 30, 0).unwrap()), "1:30 PM");
        assert_eq!(clock(NaiveTime::from_hms_opt(0, 0, 0).unwrap()), "12:00 AM");
    }
}
