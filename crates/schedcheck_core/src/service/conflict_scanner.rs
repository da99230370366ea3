//! Batch recomputation of materialized conflict flags.
//!
//! # Responsibility
//! - Re-evaluate every active meeting in scope and commit changed flags as
//!   one batch.
//! - Serve live conflict reports that never trust the stored flag.
//!
//! # Invariants
//! - Planning reads only; it produces an immutable list of flag diffs.
//! - Commit writes once, atomically; a failed commit leaves no partial flags.
//! - Evaluations within one scan never observe flags written by that scan.
//! - Each scan parses a given day pattern at most once.

use crate::model::day_pattern::DayPatternCache;
use crate::model::meeting::{DepartmentId, MeetingId, ScheduleMeeting};
use crate::repo::schedule_repo::{
    ConflictFlagUpdate, RepoError, ScheduleFilter, ScheduleQuery, ScheduleStore,
};
use crate::service::conflict_detector::{ConflictDetector, ConflictPolicy};
use crate::service::conflict_rules::ConflictRecord;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Counters reported by a scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub total_scanned: usize,
    /// Meetings conflicted after the scan.
    pub conflicts_found: usize,
    /// Meetings whose flag value actually changed.
    pub schedules_updated: usize,
}

/// Live conflict report entry for one meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictedMeeting {
    pub meeting: ScheduleMeeting,
    pub conflicts: Vec<ConflictRecord>,
    pub conflict_count: usize,
}

/// Phase-one output: counters plus the flag diffs still to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPlan {
    pub stats: ScanStats,
    pub updates: Vec<ConflictFlagUpdate>,
}

#[derive(Debug)]
pub enum ScanError {
    /// Loading meetings or candidate pools failed.
    Query(RepoError),
    /// The flag batch could not be committed; nothing was written.
    Commit { attempted: usize, source: RepoError },
    MeetingNotFound(MeetingId),
}

impl Display for ScanError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Query(err) => write!(f, "conflict scan query failed: {err}"),
            Self::Commit { attempted, source } => write!(
                f,
                "conflict scan commit failed for {attempted} flag updates: {source}"
            ),
            Self::MeetingNotFound(id) => write!(f, "schedule not found: {id}"),
        }
    }
}

impl Error for ScanError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Query(err) => Some(err),
            Self::Commit { source, .. } => Some(source),
            Self::MeetingNotFound(_) => None,
        }
    }
}

impl From<RepoError> for ScanError {
    fn from(value: RepoError) -> Self {
        Self::Query(value)
    }
}

/// Scanner owning the schedule store it recomputes.
pub struct ConflictScanner<S: ScheduleStore> {
    store: S,
    policy: ConflictPolicy,
}

impl<S: ScheduleStore> ConflictScanner<S> {
    pub fn new(store: S) -> Self {
        Self::with_policy(store, ConflictPolicy::default())
    }

    pub fn with_policy(store: S, policy: ConflictPolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Detector reading from this scanner's store.
    pub fn detector(&self) -> ConflictDetector<&S> {
        ConflictDetector::with_policy(&self.store, self.policy.clone())
    }

    /// Recomputes the flag of every active meeting, optionally limited to
    /// subjects of one department, and commits the changes as one batch.
    pub fn scan_and_update_all_conflicts(
        &mut self,
        department_id: Option<DepartmentId>,
    ) -> Result<ScanStats, ScanError> {
        let started_at = Instant::now();
        info!(
            "event=conflict_scan module=service status=start department_id={}",
            display_scope(department_id)
        );

        let meetings = self.store.find_active(&ScheduleFilter {
            department_id,
            ..ScheduleFilter::default()
        })?;
        let plan = self.plan(&meetings)?;
        let stats = self.commit(plan)?;

        info!(
            "event=conflict_scan module=service status=ok total_scanned={} conflicts_found={} schedules_updated={} duration_ms={}",
            stats.total_scanned,
            stats.conflicts_found,
            stats.schedules_updated,
            started_at.elapsed().as_millis()
        );
        Ok(stats)
    }

    /// Recomputes one meeting and every active meeting sharing its room or
    /// its subject-section in the same period.
    ///
    /// Call after editing a meeting. A meeting that moved rooms should also
    /// be refreshed before the edit, or covered by a full scan.
    pub fn refresh_meeting(&mut self, id: MeetingId) -> Result<ScanStats, ScanError> {
        let target = self
            .store
            .get_meeting(id)?
            .ok_or(ScanError::MeetingNotFound(id))?;

        let mut affected: BTreeMap<MeetingId, ScheduleMeeting> = BTreeMap::new();
        if let Some(room) = target.room.as_ref() {
            let filter = ScheduleFilter {
                room_id: Some(room.id),
                ..ScheduleFilter::default()
            }
            .in_period(&target.period);
            for meeting in self.store.find_active(&filter)? {
                affected.insert(meeting.id, meeting);
            }
        }
        if let Some(section) = target.section_label() {
            let filter = ScheduleFilter {
                subject_id: Some(target.subject.id),
                section: Some(section.to_string()),
                ..ScheduleFilter::default()
            }
            .in_period(&target.period);
            for meeting in self.store.find_active(&filter)? {
                affected.insert(meeting.id, meeting);
            }
        }
        if target.is_active() {
            affected.insert(target.id, target);
        }

        let meetings: Vec<ScheduleMeeting> = affected.into_values().collect();
        let plan = self.plan(&meetings)?;
        let stats = self.commit(plan)?;

        info!(
            "event=conflict_refresh module=service status=ok meeting_id={} total_scanned={} schedules_updated={}",
            id, stats.total_scanned, stats.schedules_updated
        );
        Ok(stats)
    }

    /// Returns active meetings in scope that conflict right now, each with a
    /// freshly computed conflict list.
    pub fn get_conflicted_schedules_with_details(
        &self,
        department_id: Option<DepartmentId>,
        academic_year: Option<&str>,
        semester: Option<&str>,
    ) -> Result<Vec<ConflictedMeeting>, ScanError> {
        let filter = ScheduleFilter {
            department_id,
            academic_year: academic_year.map(str::to_string),
            semester: semester.map(str::to_string),
            ..ScheduleFilter::default()
        };

        let detector = self.detector();
        let day_patterns = DayPatternCache::new();
        let mut report = Vec::new();
        for mut meeting in self.store.find_active(&filter)? {
            let conflicts = detector.detect_conflicts_with(&meeting, true, &day_patterns)?;
            if conflicts.is_empty() {
                continue;
            }
            meeting.is_conflicted = true;
            report.push(ConflictedMeeting {
                meeting,
                conflict_count: conflicts.len(),
                conflicts,
            });
        }

        Ok(report)
    }

    /// Phase one: evaluates `meetings` without writing anything.
    pub fn plan(&self, meetings: &[ScheduleMeeting]) -> Result<ScanPlan, ScanError> {
        let detector = self.detector();
        let day_patterns = DayPatternCache::new();
        let mut stats = ScanStats::default();
        let mut updates = Vec::new();

        for meeting in meetings {
            stats.total_scanned += 1;
            let conflicted = !detector
                .detect_conflicts_with(meeting, true, &day_patterns)?
                .is_empty();
            if conflicted {
                stats.conflicts_found += 1;
            }
            if conflicted != meeting.is_conflicted {
                updates.push(ConflictFlagUpdate {
                    meeting_id: meeting.id,
                    is_conflicted: conflicted,
                });
            }
        }
        stats.schedules_updated = updates.len();

        Ok(ScanPlan { stats, updates })
    }

    /// Phase two: writes the planned diffs as one atomic batch.
    pub fn commit(&mut self, plan: ScanPlan) -> Result<ScanStats, ScanError> {
        let attempted = plan.updates.len();
        if let Err(source) = self.store.apply_conflict_flags(&plan.updates) {
            error!(
                "event=conflict_commit module=service status=error attempted={} error={}",
                attempted, source
            );
            return Err(ScanError::Commit { attempted, source });
        }
        Ok(plan.stats)
    }
}

fn display_scope(department_id: Option<DepartmentId>) -> String {
    department_id.map_or_else(|| "all".to_string(), |id| id.to_string())
}
