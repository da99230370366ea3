//! Schedule query contracts and SQLite implementation.
//!
//! # Responsibility
//! - Define the candidate-pool lookup used by conflict rules.
//! - Define the batched flag write used by conflict scans.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths must call `ScheduleMeeting::validate()` before SQL mutations.
//! - Write paths store the trimmed section label; blank sections become NULL.
//! - `is_conflicted` is written only by `apply_conflict_flags`. New meetings
//!   start unflagged and authored updates leave the flag as recomputed.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - `apply_conflict_flags` commits all updates or none.
//! - Query results are ordered by academic year, semester, subject code,
//!   section, start time, then id.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::meeting::{
    AcademicPeriod, Department, DepartmentId, MeetingId, MeetingStatus, MeetingValidationError,
    Room, RoomId, ScheduleMeeting, Subject, SubjectId,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const MEETING_SELECT_SQL: &str = "SELECT
    sch.id AS id,
    sch.room_id AS room_id,
    r.name AS room_name,
    r.capacity AS room_capacity,
    sch.subject_id AS subject_id,
    sub.code AS subject_code,
    sub.department_id AS department_id,
    sch.section AS section,
    sch.faculty_id AS faculty_id,
    sch.academic_year AS academic_year,
    sch.semester AS semester,
    sch.day_pattern AS day_pattern,
    sch.start_time AS start_time,
    sch.end_time AS end_time,
    sch.enrolled_students AS enrolled_students,
    sch.status AS status,
    sch.is_conflicted AS is_conflicted
FROM schedules sch
JOIN subjects sub ON sub.id = sch.subject_id
LEFT JOIN rooms r ON r.id = sch.room_id";

const MEETING_ORDER_SQL: &str = " ORDER BY
    sch.academic_year ASC,
    sch.semester ASC,
    sub.code ASC,
    sch.section ASC,
    sch.start_time ASC,
    sch.id ASC";

const REQUIRED_TABLES: &[&str] = &["departments", "rooms", "subjects", "schedules"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for schedule persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(MeetingValidationError),
    Db(DbError),
    NotFound(MeetingId),
    InvalidData(String),
    /// Connection has not been migrated to the schema this build expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    /// Non-SQLite backend refused the operation.
    Unavailable(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "schedule not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted schedule data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::Unavailable(message) => write!(f, "schedule store unavailable: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MeetingValidationError> for RepoError {
    fn from(value: MeetingValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Candidate-pool filter. Absent fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleFilter {
    pub room_id: Option<RoomId>,
    pub academic_year: Option<String>,
    pub semester: Option<String>,
    pub subject_id: Option<SubjectId>,
    /// Compared against the trimmed stored section.
    pub section: Option<String>,
    /// Joins through subject to its owning department.
    pub department_id: Option<DepartmentId>,
    /// Drops the meeting with this id from the result.
    pub exclude_id: Option<MeetingId>,
    pub status: MeetingStatus,
}

impl ScheduleFilter {
    /// Restricts the filter to one academic period.
    pub fn in_period(mut self, period: &AcademicPeriod) -> Self {
        self.academic_year = Some(period.academic_year.clone());
        self.semester = Some(period.semester.clone());
        self
    }

    /// Checks one meeting against every populated field.
    pub fn matches(&self, meeting: &ScheduleMeeting) -> bool {
        meeting.status == self.status
            && self
                .room_id
                .map_or(true, |id| meeting.room.as_ref().map(|room| room.id) == Some(id))
            && self
                .academic_year
                .as_deref()
                .map_or(true, |year| meeting.period.academic_year == year)
            && self
                .semester
                .as_deref()
                .map_or(true, |semester| meeting.period.semester == semester)
            && self.subject_id.map_or(true, |id| meeting.subject.id == id)
            && self
                .section
                .as_deref()
                .map_or(true, |section| meeting.section_label() == Some(section.trim()))
            && self
                .department_id
                .map_or(true, |id| meeting.subject.department_id == Some(id))
            && self.exclude_id.map_or(true, |id| meeting.id != id)
    }
}

/// One conflicted-flag mutation produced by a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictFlagUpdate {
    pub meeting_id: MeetingId,
    pub is_conflicted: bool,
}

/// Read-side capability used by conflict rules.
pub trait ScheduleQuery {
    /// Returns meetings matching `filter`, in the store's canonical order.
    fn find_active(&self, filter: &ScheduleFilter) -> RepoResult<Vec<ScheduleMeeting>>;

    /// Gets one meeting by id regardless of status.
    fn get_meeting(&self, id: MeetingId) -> RepoResult<Option<ScheduleMeeting>>;
}

impl<T: ScheduleQuery + ?Sized> ScheduleQuery for &T {
    fn find_active(&self, filter: &ScheduleFilter) -> RepoResult<Vec<ScheduleMeeting>> {
        (**self).find_active(filter)
    }

    fn get_meeting(&self, id: MeetingId) -> RepoResult<Option<ScheduleMeeting>> {
        (**self).get_meeting(id)
    }
}

/// Query capability plus the single write conflict scans need.
pub trait ScheduleStore: ScheduleQuery {
    /// Atomically writes every flag update. Returns rows written.
    fn apply_conflict_flags(&mut self, updates: &[ConflictFlagUpdate]) -> RepoResult<usize>;
}

/// SQLite-backed schedule repository.
pub struct SqliteScheduleRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteScheduleRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable` when the schema is incomplete.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_user_version(conn)?;
        if actual_version < expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        for &table in REQUIRED_TABLES {
            let exists: i64 = conn.query_row(
                "SELECT EXISTS(
                    SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
                );",
                [table],
                |row| row.get(0),
            )?;
            if exists == 0 {
                return Err(RepoError::MissingRequiredTable(table));
            }
        }

        Ok(Self { conn })
    }

    pub fn create_department(&self, department: &Department) -> RepoResult<DepartmentId> {
        self.conn.execute(
            "INSERT INTO departments (id, code, name) VALUES (?1, ?2, ?3);",
            params![
                department.id.to_string(),
                department.code.as_str(),
                department.name.as_str(),
            ],
        )?;
        Ok(department.id)
    }

    pub fn create_room(&self, room: &Room) -> RepoResult<RoomId> {
        self.conn.execute(
            "INSERT INTO rooms (id, name, capacity) VALUES (?1, ?2, ?3);",
            params![room.id.to_string(), room.name.as_str(), room.capacity],
        )?;
        Ok(room.id)
    }

    pub fn create_subject(&self, subject: &Subject) -> RepoResult<SubjectId> {
        self.conn.execute(
            "INSERT INTO subjects (id, code, department_id) VALUES (?1, ?2, ?3);",
            params![
                subject.id.to_string(),
                subject.code.as_str(),
                subject.department_id.map(|id| id.to_string()),
            ],
        )?;
        Ok(subject.id)
    }

    /// Inserts a meeting. Room and subject rows must already exist.
    ///
    /// The meeting is stored unflagged regardless of `is_conflicted`.
    pub fn create_meeting(&self, meeting: &ScheduleMeeting) -> RepoResult<MeetingId> {
        meeting.validate()?;

        self.conn.execute(
            "INSERT INTO schedules (
                id,
                room_id,
                subject_id,
                section,
                faculty_id,
                academic_year,
                semester,
                day_pattern,
                start_time,
                end_time,
                enrolled_students,
                status,
                is_conflicted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 0);",
            params![
                meeting.id.to_string(),
                meeting.room.as_ref().map(|room| room.id.to_string()),
                meeting.subject.id.to_string(),
                meeting.section_label(),
                meeting.faculty_id.map(|id| id.to_string()),
                meeting.period.academic_year.as_str(),
                meeting.period.semester.as_str(),
                meeting.day_pattern.as_str(),
                meeting.start_time,
                meeting.end_time,
                meeting.enrolled_students,
                meeting.status.as_str(),
            ],
        )?;

        Ok(meeting.id)
    }

    /// Replaces every authored column of an existing meeting.
    ///
    /// Leaves the stored `is_conflicted` flag untouched.
    pub fn update_meeting(&self, meeting: &ScheduleMeeting) -> RepoResult<()> {
        meeting.validate()?;

        let changed = self.conn.execute(
            "UPDATE schedules
             SET
                room_id = ?1,
                subject_id = ?2,
                section = ?3,
                faculty_id = ?4,
                academic_year = ?5,
                semester = ?6,
                day_pattern = ?7,
                start_time = ?8,
                end_time = ?9,
                enrolled_students = ?10,
                status = ?11,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?12;",
            params![
                meeting.room.as_ref().map(|room| room.id.to_string()),
                meeting.subject.id.to_string(),
                meeting.section_label(),
                meeting.faculty_id.map(|id| id.to_string()),
                meeting.period.academic_year.as_str(),
                meeting.period.semester.as_str(),
                meeting.day_pattern.as_str(),
                meeting.start_time,
                meeting.end_time,
                meeting.enrolled_students,
                meeting.status.as_str(),
                meeting.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(meeting.id));
        }

        Ok(())
    }
}

impl ScheduleQuery for SqliteScheduleRepository<'_> {
    fn find_active(&self, filter: &ScheduleFilter) -> RepoResult<Vec<ScheduleMeeting>> {
        let mut sql = format!("{MEETING_SELECT_SQL} WHERE sch.status = ?");
        let mut bind_values: Vec<Value> = vec![Value::Text(filter.status.as_str().to_string())];

        let mut push_text = |clause: &str, value: String| {
            sql.push_str(clause);
            bind_values.push(Value::Text(value));
        };

        if let Some(room_id) = filter.room_id {
            push_text(" AND sch.room_id = ?", room_id.to_string());
        }
        if let Some(year) = &filter.academic_year {
            push_text(" AND sch.academic_year = ?", year.clone());
        }
        if let Some(semester) = &filter.semester {
            push_text(" AND sch.semester = ?", semester.clone());
        }
        if let Some(subject_id) = filter.subject_id {
            push_text(" AND sch.subject_id = ?", subject_id.to_string());
        }
        if let Some(section) = &filter.section {
            push_text(" AND TRIM(sch.section) = ?", section.trim().to_string());
        }
        if let Some(department_id) = filter.department_id {
            push_text(" AND sub.department_id = ?", department_id.to_string());
        }
        if let Some(exclude_id) = filter.exclude_id {
            push_text(" AND sch.id <> ?", exclude_id.to_string());
        }

        sql.push_str(MEETING_ORDER_SQL);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut meetings = Vec::new();

        while let Some(row) = rows.next()? {
            meetings.push(parse_meeting_row(row)?);
        }

        Ok(meetings)
    }

    fn get_meeting(&self, id: MeetingId) -> RepoResult<Option<ScheduleMeeting>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MEETING_SELECT_SQL} WHERE sch.id = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_meeting_row(row)?));
        }

        Ok(None)
    }
}

impl ScheduleStore for SqliteScheduleRepository<'_> {
    fn apply_conflict_flags(&mut self, updates: &[ConflictFlagUpdate]) -> RepoResult<usize> {
        if updates.is_empty() {
            return Ok(0);
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        {
            let mut stmt = tx.prepare(
                "UPDATE schedules
                 SET
                    is_conflicted = ?1,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?2;",
            )?;
            for update in updates {
                let changed = stmt.execute(params![
                    bool_to_int(update.is_conflicted),
                    update.meeting_id.to_string(),
                ])?;
                if changed == 0 {
                    return Err(RepoError::NotFound(update.meeting_id));
                }
            }
        }
        tx.commit()?;

        Ok(updates.len())
    }
}

fn parse_meeting_row(row: &Row<'_>) -> RepoResult<ScheduleMeeting> {
    let id = parse_uuid(row.get("id")?, "schedules.id")?;

    let room = match row.get::<_, Option<String>>("room_id")? {
        Some(room_id) => Some(Room {
            id: parse_uuid(room_id, "schedules.room_id")?,
            name: row.get("room_name")?,
            capacity: row.get("room_capacity")?,
        }),
        None => None,
    };

    let department_id = match row.get::<_, Option<String>>("department_id")? {
        Some(value) => Some(parse_uuid(value, "subjects.department_id")?),
        None => None,
    };

    let faculty_id = match row.get::<_, Option<String>>("faculty_id")? {
        Some(value) => Some(parse_uuid(value, "schedules.faculty_id")?),
        None => None,
    };

    let status_text: String = row.get("status")?;
    let status = MeetingStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in schedules.status"))
    })?;

    let is_conflicted = match row.get::<_, i64>("is_conflicted")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_conflicted value `{other}` in schedules.is_conflicted"
            )));
        }
    };

    let meeting = ScheduleMeeting {
        id,
        room,
        subject: Subject {
            id: parse_uuid(row.get("subject_id")?, "schedules.subject_id")?,
            code: row.get("subject_code")?,
            department_id,
        },
        section: row.get("section")?,
        faculty_id,
        period: AcademicPeriod {
            academic_year: row.get("academic_year")?,
            semester: row.get("semester")?,
        },
        day_pattern: row.get("day_pattern")?,
        start_time: row.get("start_time")?,
        end_time: row.get("end_time")?,
        enrolled_students: row.get("enrolled_students")?,
        status,
        is_conflicted,
    };
    meeting.validate()?;
    Ok(meeting)
}

fn parse_uuid(text: String, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(&text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{text}` in {column}")))
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
