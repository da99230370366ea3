//! Schedule meeting domain model.
//!
//! # Responsibility
//! - Define the canonical meeting record evaluated by conflict detection.
//! - Carry the room/subject references needed to scope candidate pools.
//!
//! # Invariants
//! - `start_time` is strictly before `end_time`.
//! - `is_conflicted` is derived state; it is only written back by
//!   conflict recomputation and never authored by callers.
//! - Only `MeetingStatus::Active` meetings participate in conflict checks.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type MeetingId = Uuid;
pub type RoomId = Uuid;
pub type SubjectId = Uuid;
pub type DepartmentId = Uuid;
pub type FacultyId = Uuid;

/// Lifecycle state of a scheduled meeting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    /// Counts toward conflicts.
    #[default]
    Active,
    /// Temporarily withdrawn.
    Inactive,
    /// Permanently withdrawn.
    Cancelled,
}

impl MeetingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Academic department owning subjects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub code: String,
    pub name: String,
}

/// Physical room a meeting is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    /// Display name, e.g. `CL-204`.
    pub name: String,
    /// Seat count. `None` means the room has no enforced limit.
    pub capacity: Option<u32>,
}

/// Subject (course) offered by a department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    /// Catalog code, e.g. `CS101`.
    pub code: String,
    pub department_id: Option<DepartmentId>,
}

/// `(academic year, semester)` pair scoping every conflict comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AcademicPeriod {
    /// Free-form year label, e.g. `2024-2025`.
    pub academic_year: String,
    /// Free-form semester label, e.g. `1st Semester`.
    pub semester: String,
}

impl AcademicPeriod {
    pub fn new(academic_year: impl Into<String>, semester: impl Into<String>) -> Self {
        Self {
            academic_year: academic_year.into(),
            semester: semester.into(),
        }
    }
}

/// One scheduled occurrence of a subject-section in a room and time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleMeeting {
    pub id: MeetingId,
    /// `None` while the meeting is still a draft without room assignment.
    pub room: Option<Room>,
    pub subject: Subject,
    pub section: Option<String>,
    pub faculty_id: Option<FacultyId>,
    pub period: AcademicPeriod,
    /// Loosely formatted day code, e.g. `MWF` or `TTh`.
    pub day_pattern: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub enrolled_students: u32,
    pub status: MeetingStatus,
    pub is_conflicted: bool,
}

impl ScheduleMeeting {
    /// Creates an active, unconflicted meeting with a generated ID.
    pub fn new(
        subject: Subject,
        period: AcademicPeriod,
        day_pattern: impl Into<String>,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            room: None,
            subject,
            section: None,
            faculty_id: None,
            period,
            day_pattern: day_pattern.into(),
            start_time,
            end_time,
            enrolled_students: 0,
            status: MeetingStatus::Active,
            is_conflicted: false,
        }
    }

    pub fn with_room(mut self, room: Room) -> Self {
        self.room = Some(room);
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == MeetingStatus::Active
    }

    /// Section label with blank values treated as absent.
    pub fn section_label(&self) -> Option<&str> {
        self.section
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Checks structural invariants required before persistence.
    pub fn validate(&self) -> Result<(), MeetingValidationError> {
        if self.start_time >= self.end_time {
            return Err(MeetingValidationError::InvalidTimeRange {
                start: self.start_time,
                end: self.end_time,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeetingValidationError {
    InvalidTimeRange { start: NaiveTime, end: NaiveTime },
}

impl Display for MeetingValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimeRange { start, end } => {
                write!(f, "meeting end time {end} must be after start time {start}")
            }
        }
    }
}

impl Error for MeetingValidationError {}
