mod support;

use schedcheck_core::{
    ConflictDetector, ConflictKind, InMemoryScheduleRepository, MeetingStatus, ScheduleMeeting,
};
use support::{at, meeting, room, subject};

fn detector(meetings: &[&ScheduleMeeting]) -> ConflictDetector<InMemoryScheduleRepository> {
    let repo =
        InMemoryScheduleRepository::from_meetings(meetings.iter().map(|m| (*m).clone())).unwrap();
    ConflictDetector::new(repo)
}

#[test]
fn disjoint_day_patterns_never_conflict_on_room() {
    let cl204 = room("CL-204", Some(40));
    let cs101 = subject("CS101", None);
    let math201 = subject("MATH201", None);

    let existing = meeting(&cs101, Some(&cl204), Some("A"), "MWF", at(9, 0), at(10, 0));
    let candidate = meeting(&math201, Some(&cl204), Some("B"), "TTh", at(9, 0), at(10, 30));

    let conflicts = detector(&[&existing, &candidate])
        .detect_conflicts(&candidate, true)
        .unwrap();
    assert!(conflicts.is_empty());
}

#[test]
fn overlapping_room_booking_yields_one_room_time_conflict() {
    let cl204 = room("CL-204", Some(40));
    let cs101 = subject("CS101", None);
    let math201 = subject("MATH201", None);

    let existing = meeting(&cs101, Some(&cl204), Some("A"), "MWF", at(9, 0), at(10, 0));
    let candidate = meeting(&math201, Some(&cl204), Some("B"), "MWF", at(9, 30), at(10, 30));

    let conflicts = detector(&[&existing, &candidate])
        .detect_conflicts(&candidate, true)
        .unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].kind, ConflictKind::RoomTime);
    assert_eq!(conflicts[0].conflicting_id(), existing.id);

    let message = &conflicts[0].message;
    assert!(message.contains("CL-204"));
    assert!(message.contains("CS101"));
    assert!(message.contains("MWF"));
    assert!(message.contains("9:00 AM"));
    assert!(message.contains("10:00 AM"));
    assert!(message.contains("Section: A"));
}

#[test]
fn room_time_message_uses_na_for_missing_section() {
    let cl204 = room("CL-204", None);
    let cs101 = subject("CS101", None);
    let math201 = subject("MATH201", None);

    let existing = meeting(&cs101, Some(&cl204), None, "TTh", at(13, 0), at(14, 30));
    let candidate = meeting(&math201, Some(&cl204), None, "Th", at(14, 0), at(15, 0));

    let conflicts = detector(&[&existing, &candidate])
        .detect_conflicts(&candidate, true)
        .unwrap();
    assert_eq!(conflicts.len(), 1);
    assert!(conflicts[0].message.contains("Section: N/A"));
    assert!(conflicts[0].message.contains("1:00 PM"));
}

#[test]
fn touching_meetings_do_not_conflict() {
    let cl204 = room("CL-204", None);
    let cs101 = subject("CS101", None);
    let math201 = subject("MATH201", None);

    let existing = meeting(&cs101, Some(&cl204), None, "MWF", at(9, 0), at(10, 0));
    let candidate = meeting(&math201, Some(&cl204), None, "MWF", at(10, 0), at(11, 0));

    let conflicts = detector(&[&existing, &candidate])
        .detect_conflicts(&candidate, true)
        .unwrap();
    assert!(conflicts.is_empty());
}

#[test]
fn meeting_without_room_short_circuits() {
    let cl204 = room("CL-204", None);
    let cs101 = subject("CS101", None);

    let existing = meeting(&cs101, Some(&cl204), Some("A"), "MWF", at(9, 0), at(10, 0));
    let draft = meeting(&cs101, None, Some("A"), "MWF", at(9, 0), at(10, 0));

    let conflicts = detector(&[&existing])
        .detect_conflicts(&draft, false)
        .unwrap();
    assert!(conflicts.is_empty());
}

#[test]
fn exclude_self_controls_self_matching() {
    let cl204 = room("CL-204", None);
    let cs101 = subject("CS101", None);
    let stored = meeting(&cs101, Some(&cl204), None, "MWF", at(9, 0), at(10, 0));
    let detector = detector(&[&stored]);

    assert!(detector.detect_conflicts(&stored, true).unwrap().is_empty());
    assert_eq!(detector.detect_conflicts(&stored, false).unwrap().len(), 1);
}

#[test]
fn same_section_in_another_room_is_a_section_time_conflict() {
    let cl204 = room("CL-204", None);
    let cl305 = room("CL-305", None);
    let cs101 = subject("CS101", None);

    let existing = meeting(&cs101, Some(&cl204), Some("A"), "MWF", at(9, 0), at(10, 0));
    let candidate = meeting(&cs101, Some(&cl305), Some("A"), "M", at(9, 30), at(11, 0));

    let conflicts = detector(&[&existing, &candidate])
        .detect_conflicts(&candidate, true)
        .unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].kind, ConflictKind::SectionTime);
    assert!(conflicts[0].message.contains("CL-204"));
    assert!(conflicts[0].message.contains("Section A"));
}

#[test]
fn room_conflicts_come_before_section_conflicts() {
    let cl204 = room("CL-204", None);
    let cs101 = subject("CS101", None);

    let existing = meeting(&cs101, Some(&cl204), Some("A"), "MWF", at(9, 0), at(10, 0));
    let candidate = meeting(&cs101, Some(&cl204), Some("A"), "MWF", at(9, 0), at(10, 0));

    let kinds: Vec<ConflictKind> = detector(&[&existing, &candidate])
        .detect_conflicts(&candidate, true)
        .unwrap()
        .into_iter()
        .map(|record| record.kind)
        .collect();
    assert_eq!(kinds, vec![ConflictKind::RoomTime, ConflictKind::SectionTime]);
}

#[test]
fn inactive_and_other_period_meetings_are_ignored() {
    let cl204 = room("CL-204", None);
    let cs101 = subject("CS101", None);
    let math201 = subject("MATH201", None);

    let mut cancelled = meeting(&cs101, Some(&cl204), None, "MWF", at(9, 0), at(10, 0));
    cancelled.status = MeetingStatus::Cancelled;
    let mut next_term = meeting(&cs101, Some(&cl204), None, "MWF", at(9, 0), at(10, 0));
    next_term.period.semester = "2nd Semester".to_string();
    let candidate = meeting(&math201, Some(&cl204), None, "MWF", at(9, 0), at(10, 0));

    let conflicts = detector(&[&cancelled, &next_term, &candidate])
        .detect_conflicts(&candidate, true)
        .unwrap();
    assert!(conflicts.is_empty());
}

#[test]
fn malformed_day_pattern_under_detects_instead_of_failing() {
    let cl204 = room("CL-204", None);
    let cs101 = subject("CS101", None);
    let math201 = subject("MATH201", None);

    let existing = meeting(&cs101, Some(&cl204), None, "MWF", at(9, 0), at(10, 0));
    let candidate = meeting(&math201, Some(&cl204), None, "???", at(9, 0), at(10, 0));

    let conflicts = detector(&[&existing, &candidate])
        .detect_conflicts(&candidate, true)
        .unwrap();
    assert!(conflicts.is_empty());
}

#[test]
fn duplicate_subject_section_ignores_days_and_times() {
    let cl204 = room("CL-204", None);
    let lab = room("LAB-1", None);
    let cs101 = subject("CS101", None);

    let lecture = meeting(&cs101, Some(&cl204), Some("A"), "MWF", at(8, 0), at(9, 0));
    let lab_session = meeting(&cs101, Some(&lab), Some("A"), "TTh", at(15, 0), at(17, 0));
    let detector = detector(&[&lecture, &lab_session]);

    assert!(detector.detect_conflicts(&lab_session, true).unwrap().is_empty());

    let duplicates = detector
        .check_duplicate_subject_section(&lab_session, true)
        .unwrap();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].kind, ConflictKind::DuplicateSubjectSection);
    assert_eq!(duplicates[0].conflicting_id(), lecture.id);
    assert!(duplicates[0].message.contains("CS101"));
    assert!(duplicates[0].message.contains("LAB-1") || duplicates[0].message.contains("CL-204"));
}

#[test]
fn duplicate_check_requires_a_section() {
    let cs101 = subject("CS101", None);
    let first = meeting(&cs101, None, None, "MWF", at(8, 0), at(9, 0));
    let second = meeting(&cs101, None, None, "MWF", at(8, 0), at(9, 0));

    let duplicates = detector(&[&first, &second])
        .check_duplicate_subject_section(&second, true)
        .unwrap();
    assert!(duplicates.is_empty());
}

#[test]
fn update_conflict_status_sets_flag_without_persisting() {
    let cl204 = room("CL-204", None);
    let cs101 = subject("CS101", None);
    let math201 = subject("MATH201", None);

    let existing = meeting(&cs101, Some(&cl204), None, "MWF", at(9, 0), at(10, 0));
    let mut candidate = meeting(&math201, Some(&cl204), None, "MW", at(9, 30), at(10, 30));
    let detector = detector(&[&existing, &candidate]);

    assert!(detector.update_conflict_status(&mut candidate).unwrap());
    assert!(candidate.is_conflicted);
    let stored = detector.query().get(candidate.id).unwrap();
    assert!(!stored.is_conflicted);

    candidate.day_pattern = "TTh".to_string();
    assert!(!detector.update_conflict_status(&mut candidate).unwrap());
    assert!(!candidate.is_conflicted);
}

#[test]
fn validate_meeting_collects_range_and_capacity_errors() {
    let small = room("SEM-1", Some(10));
    let cs101 = subject("CS101", None);
    let mut crowded = meeting(&cs101, Some(&small), None, "MWF", at(9, 0), at(9, 15));
    crowded.enrolled_students = 25;

    let errors = detector(&[]).validate_meeting(&crowded);
    assert_eq!(errors.len(), 2);
    assert!(errors[1].contains("25"));
    assert!(errors[1].contains("10"));
}

#[test]
fn padded_sections_still_match_their_peers() {
    let cl204 = room("CL-204", None);
    let cl305 = room("CL-305", None);
    let cs101 = subject("CS101", None);

    let first = meeting(&cs101, Some(&cl204), Some("A "), "MWF", at(9, 0), at(10, 0));
    let second = meeting(&cs101, Some(&cl305), Some("A "), "MWF", at(9, 0), at(10, 0));
    let detector = detector(&[&first, &second]);

    let conflicts = detector.detect_conflicts(&second, true).unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].kind, ConflictKind::SectionTime);
    assert_eq!(conflicts[0].conflicting_id(), first.id);

    let duplicates = detector
        .check_duplicate_subject_section(&second, true)
        .unwrap();
    assert_eq!(duplicates.len(), 1);
}
