#![allow(dead_code)]

use chrono::NaiveTime;
use schedcheck_core::{
    AcademicPeriod, ConflictFlagUpdate, Department, MeetingId, Room, ScheduleMeeting,
    ScheduleStore, SqliteScheduleRepository, Subject,
};
use uuid::Uuid;

pub const YEAR: &str = "2024-2025";
pub const SEMESTER: &str = "1st Semester";

pub fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

pub fn period() -> AcademicPeriod {
    AcademicPeriod::new(YEAR, SEMESTER)
}

pub fn department(code: &str) -> Department {
    Department {
        id: Uuid::new_v4(),
        code: code.to_string(),
        name: format!("Department of {code}"),
    }
}

pub fn room(name: &str, capacity: Option<u32>) -> Room {
    Room {
        id: Uuid::new_v4(),
        name: name.to_string(),
        capacity,
    }
}

pub fn subject(code: &str, department: Option<&Department>) -> Subject {
    Subject {
        id: Uuid::new_v4(),
        code: code.to_string(),
        department_id: department.map(|d| d.id),
    }
}

/// Active meeting in the default period.
pub fn meeting(
    subject: &Subject,
    room: Option<&Room>,
    section: Option<&str>,
    day_pattern: &str,
    start: NaiveTime,
    end: NaiveTime,
) -> ScheduleMeeting {
    let mut meeting = ScheduleMeeting::new(subject.clone(), period(), day_pattern, start, end);
    meeting.room = room.cloned();
    meeting.section = section.map(str::to_string);
    meeting
}

/// Inserts reference rows and meetings into a SQLite repository.
pub fn seed(
    repo: &SqliteScheduleRepository<'_>,
    departments: &[&Department],
    rooms: &[&Room],
    subjects: &[&Subject],
    meetings: &[&ScheduleMeeting],
) {
    for department in departments {
        repo.create_department(department).unwrap();
    }
    for room in rooms {
        repo.create_room(room).unwrap();
    }
    for subject in subjects {
        repo.create_subject(subject).unwrap();
    }
    for meeting in meetings {
        repo.create_meeting(meeting).unwrap();
    }
}

/// Marks meetings conflicted through the only path that writes the flag.
pub fn mark_conflicted(store: &mut impl ScheduleStore, ids: &[MeetingId]) {
    let updates: Vec<ConflictFlagUpdate> = ids
        .iter()
        .map(|&meeting_id| ConflictFlagUpdate {
            meeting_id,
            is_conflicted: true,
        })
        .collect();
    store.apply_conflict_flags(&updates).unwrap();
}
