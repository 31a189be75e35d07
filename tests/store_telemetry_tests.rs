mod common;

use std::io::Write;

use chrono::Duration;

use common::{now, store_with, task, today};
use tally::intent::IntentKind;
use tally::model::{MeetingTime, NewTask, Priority, TimeEntry};
use tally::store::{InMemoryTaskStore, StoreSnapshot, TaskStore};
use tally::patterns::PatternType;
use tally::telemetry::{ParseOutcome, PatternEventKind, TelemetryEvent, TelemetryRecorder};

#[test]
fn test_day_order_meetings_then_priority() {
    let mut meeting_late = task("M2", "Review", today());
    meeting_late.meeting_time = Some(MeetingTime {
        start: "14:00".to_string(),
        end: "15:00".to_string(),
    });
    let mut meeting_early = task("M1", "Daily", today());
    meeting_early.meeting_time = Some(MeetingTime {
        start: "09:30".to_string(),
        end: "10:30".to_string(),
    });
    let mut urgent = task("U", "Rechnung", today());
    urgent.priority = Priority::Urgent;
    let mut older = task("A", "Ablage", today());
    older.created_at = now() - Duration::days(1);
    let newer = task("B", "Bericht", today());

    let store = store_with(vec![newer, meeting_late, urgent, older, meeting_early]);

    let ids: Vec<String> = store
        .tasks_for_date_sorted(today())
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec!["M1", "M2", "U", "A", "B"]);
}

#[test]
fn test_unfinished_before_date_is_oldest_first() {
    let store = store_with(vec![
        task("T1", "Gestern", today() - Duration::days(1)),
        task("T2", "Letzte Woche", today() - Duration::days(7)),
        task("T3", "Heute", today()),
    ]);

    let ids: Vec<String> = store
        .unfinished_tasks_before_date(today())
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec!["T2", "T1"]);
}

#[test]
fn test_work_time_sums_entries() {
    let mut tracked = task("T1", "Bericht", today());
    let start = now();
    tracked.time_entries = vec![
        TimeEntry {
            start,
            end: Some(start + Duration::minutes(90)),
        },
        TimeEntry {
            start: start - Duration::days(1),
            end: Some(start - Duration::days(1) + Duration::minutes(30)),
        },
    ];
    let store = store_with(vec![tracked]);

    assert_eq!(store.net_work_time(today()), Duration::minutes(90));
    assert_eq!(store.weekly_work_time(today()), Duration::minutes(120));
    assert_eq!(store.monthly_work_time(today()), Duration::minutes(120));
}

#[test]
fn test_rejects_empty_title() {
    let mut store = InMemoryTaskStore::new();
    assert!(store.add_task(NewTask::todo("  ", today())).is_err());
    assert!(store.delete_task("nope").is_err());
}

#[test]
fn test_load_json_snapshot() {
    let snapshot = StoreSnapshot {
        tasks: vec![task("T1", "Bericht", today())],
        clients: vec![common::acme()],
        templates: Vec::new(),
    };
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", serde_json::to_string(&snapshot).unwrap()).unwrap();

    let store = InMemoryTaskStore::load_json(file.path()).unwrap();

    assert_eq!(store.tasks().len(), 1);
    assert_eq!(store.clients()[0].name, "Acme");
}

#[test]
fn test_load_json_missing_file_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    assert!(InMemoryTaskStore::load_json(&dir.path().join("tasks.json")).is_err());
}

#[test]
fn test_telemetry_snapshot_counts_parse_outcomes() {
    let mut recorder = TelemetryRecorder::new();
    for kind in [IntentKind::CreateTask, IntentKind::StatsQuery, IntentKind::Unknown, IntentKind::Suggest] {
        recorder.record(TelemetryEvent::Parsed {
            kind,
            outcome: ParseOutcome::from(kind),
        });
    }

    let snapshot = recorder.snapshot();

    assert_eq!(snapshot.parse.total, 4);
    assert_eq!(snapshot.parse.concrete, 2);
    assert_eq!(snapshot.parse.unknown, 1);
    assert_eq!(snapshot.parse.suggestions, 1);
    assert_eq!(snapshot.parse.understood_ratio(), 0.5);
}

#[test]
fn test_telemetry_ring_buffer_is_bounded() {
    let mut recorder = TelemetryRecorder::new();
    for _ in 0..10_050 {
        recorder.record(TelemetryEvent::Executed {
            kind: IntentKind::DeleteTask,
            success: true,
        });
    }
    assert_eq!(recorder.len(), 10_000);

    recorder.clear();
    assert!(recorder.is_empty());
}

#[test]
fn test_telemetry_events_serialize_with_type_tag() {
    let event = TelemetryEvent::Pattern {
        pattern_type: PatternType::Postpone,
        event: PatternEventKind::Dismissed { permanent: true },
    };

    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "pattern");
    assert_eq!(json["event"]["dismissed"]["permanent"], true);

    let back: TelemetryEvent = serde_json::from_value(json).unwrap();
    assert_eq!(back, event);
}
