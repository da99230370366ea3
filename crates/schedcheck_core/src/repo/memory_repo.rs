//! In-memory schedule store.
//!
//! # Responsibility
//! - Provide a storage-free `ScheduleStore` for tests and embedding callers
//!   that already hold a schedule snapshot.
//!
//! # Invariants
//! - Query ordering matches `SqliteScheduleRepository`.
//! - Flag batches validate every target before mutating any meeting.
//! - Like the SQLite adapter, authored writes store the trimmed section and
//!   never set `is_conflicted`; only flag batches do.

use crate::model::meeting::{MeetingId, ScheduleMeeting};
use crate::repo::schedule_repo::{
    ConflictFlagUpdate, RepoError, RepoResult, ScheduleFilter, ScheduleQuery, ScheduleStore,
};

/// Vector-backed schedule store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryScheduleRepository {
    meetings: Vec<ScheduleMeeting>,
    fail_next_commit: bool,
    commits: usize,
}

impl InMemoryScheduleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from authored meetings. All start unflagged.
    pub fn from_meetings(meetings: impl IntoIterator<Item = ScheduleMeeting>) -> RepoResult<Self> {
        let mut repo = Self::new();
        for meeting in meetings {
            repo.insert(meeting)?;
        }
        Ok(repo)
    }

    /// Inserts or replaces a meeting by id.
    ///
    /// A new meeting starts unflagged; a replaced one keeps its stored flag.
    pub fn insert(&mut self, mut meeting: ScheduleMeeting) -> RepoResult<MeetingId> {
        meeting.validate()?;
        meeting.section = meeting.section_label().map(str::to_string);
        let id = meeting.id;
        match self.meetings.iter_mut().find(|existing| existing.id == id) {
            Some(existing) => {
                meeting.is_conflicted = existing.is_conflicted;
                *existing = meeting;
            }
            None => {
                meeting.is_conflicted = false;
                self.meetings.push(meeting);
            }
        }
        Ok(id)
    }

    pub fn get(&self, id: MeetingId) -> Option<&ScheduleMeeting> {
        self.meetings.iter().find(|meeting| meeting.id == id)
    }

    pub fn meetings(&self) -> &[ScheduleMeeting] {
        &self.meetings
    }

    /// Number of flag batches successfully committed.
    pub fn commit_count(&self) -> usize {
        self.commits
    }

    /// Makes the next `apply_conflict_flags` call fail without writing.
    pub fn fail_next_commit(&mut self) {
        self.fail_next_commit = true;
    }
}

impl ScheduleQuery for InMemoryScheduleRepository {
    fn find_active(&self, filter: &ScheduleFilter) -> RepoResult<Vec<ScheduleMeeting>> {
        let mut found: Vec<ScheduleMeeting> = self
            .meetings
            .iter()
            .filter(|meeting| filter.matches(meeting))
            .cloned()
            .collect();

        found.sort_by(|a, b| {
            (
                &a.period.academic_year,
                &a.period.semester,
                &a.subject.code,
                &a.section,
                a.start_time,
                a.id,
            )
                .cmp(&(
                    &b.period.academic_year,
                    &b.period.semester,
                    &b.subject.code,
                    &b.section,
                    b.start_time,
                    b.id,
                ))
        });

        Ok(found)
    }

    fn get_meeting(&self, id: MeetingId) -> RepoResult<Option<ScheduleMeeting>> {
        Ok(self.get(id).cloned())
    }
}

impl ScheduleStore for InMemoryScheduleRepository {
    fn apply_conflict_flags(&mut self, updates: &[ConflictFlagUpdate]) -> RepoResult<usize> {
        if std::mem::take(&mut self.fail_next_commit) {
            return Err(RepoError::Unavailable(format!(
                "injected commit failure for {} flag updates",
                updates.len()
            )));
        }
        if updates.is_empty() {
            return Ok(0);
        }

        let mut targets = Vec::with_capacity(updates.len());
        for update in updates {
            let index = self
                .meetings
                .iter()
                .position(|meeting| meeting.id == update.meeting_id)
                .ok_or(RepoError::NotFound(update.meeting_id))?;
            targets.push((index, update.is_conflicted));
        }

        for (index, is_conflicted) in targets {
            self.meetings[index].is_conflicted = is_conflicted;
        }
        self.commits += 1;

        Ok(updates.len())
    }
}
