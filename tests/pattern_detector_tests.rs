mod common;

use common::{acme, completed, now, postponed, store_with, task, today, with_deadline, with_subtasks};
use tally::config::PatternConfig;
use tally::model::Task;
use tally::patterns::{
    detect, AutoAction, Autonomy, DetectionOutcome, PatternPayload, PatternPriority, PatternStore,
    PatternType, RenderTarget,
};
use tally::store::TaskStore;

fn scan(patterns: &PatternStore, tasks: Vec<Task>) -> DetectionOutcome {
    let store = store_with(tasks);
    let snapshot = patterns.detection_snapshot(store.tasks(), store.clients(), today(), now());
    detect(&snapshot)
}

fn with_client_suggestions(autonomy: Autonomy) -> PatternStore {
    PatternStore::new(&PatternConfig {
        auto_client_autonomy: autonomy,
        ..PatternConfig::default()
    })
}

#[test]
fn test_postpone_priority_grows_with_count() {
    let outcome = scan(
        &PatternStore::default(),
        vec![
            postponed("T2", "Zwei", 2),
            postponed("T4", "Vier", 4),
            postponed("T5", "Fünf", 5),
        ],
    );

    let found: Vec<(&str, PatternPriority)> = outcome
        .patterns
        .iter()
        .map(|p| (p.task_ids[0].as_str(), p.priority))
        .collect();
    assert_eq!(
        found,
        vec![("T4", PatternPriority::Medium), ("T5", PatternPriority::High)]
    );
    assert_eq!(outcome.patterns[0].id, "postpone-T4");
    assert_eq!(outcome.patterns[0].render_target, RenderTarget::Inline);
    assert!(outcome.auto_actions.is_empty());
}

#[test]
fn test_postpone_skips_done_meetings_and_optional() {
    let mut meeting = postponed("T1", "Jour fixe", 6);
    meeting.is_meeting = true;
    let mut optional = postponed("T2", "Sport", 6);
    optional.is_optional = true;
    let done = completed(postponed("T3", "Ablage", 6));

    let outcome = scan(&PatternStore::default(), vec![meeting, optional, done]);

    assert!(outcome.patterns.is_empty());
}

#[test]
fn test_postpone_payload_offers_remedies() {
    let outcome = scan(&PatternStore::default(), vec![postponed("T1", "Steuer", 3)]);

    match &outcome.patterns[0].payload {
        PatternPayload::Postpone {
            postpone_count,
            original_date,
            suggested_actions,
        } => {
            assert_eq!(*postpone_count, 3);
            assert!(original_date.is_some());
            assert_eq!(suggested_actions.len(), 4);
        }
        other => panic!("Expected postpone payload, got {other:?}"),
    }
}

#[test]
fn test_auto_mode_marks_optional() {
    let patterns = PatternStore::new(&PatternConfig {
        postpone_autonomy: Autonomy::Auto,
        ..PatternConfig::default()
    });

    let outcome = scan(&patterns, vec![postponed("T1", "Steuer", 3)]);

    assert_eq!(
        outcome.auto_actions,
        vec![AutoAction::MarkOptional {
            task_id: "T1".to_string()
        }]
    );
    assert_eq!(outcome.patterns[0].render_target, RenderTarget::Toast);
}

#[test]
fn test_overdue_deadline_is_high_even_with_progress() {
    let overdue = with_subtasks(with_deadline("T1", "Angebot", -3), 3, 3);

    let outcome = scan(&PatternStore::default(), vec![overdue]);

    assert_eq!(outcome.patterns.len(), 1);
    let pattern = &outcome.patterns[0];
    assert_eq!(pattern.pattern_type, PatternType::DeadlineWarning);
    assert_eq!(pattern.priority, PatternPriority::High);
    assert_eq!(pattern.title, "Deadline überschritten");
    match &pattern.payload {
        PatternPayload::DeadlineWarning {
            days_remaining,
            subtask_progress,
            ..
        } => {
            assert_eq!(*days_remaining, -3);
            assert_eq!(*subtask_progress, Some((3, 3)));
        }
        other => panic!("Expected deadline payload, got {other:?}"),
    }
}

#[test]
fn test_due_today_is_high() {
    let outcome = scan(&PatternStore::default(), vec![with_deadline("T1", "Angebot", 0)]);
    assert_eq!(outcome.patterns[0].priority, PatternPriority::High);
    assert_eq!(outcome.patterns[0].title, "Deadline heute");
}

#[test]
fn test_upcoming_deadline_respects_progress_and_threshold() {
    let no_progress = with_subtasks(with_deadline("T1", "Angebot", 2), 1, 4);
    let good_progress = with_subtasks(with_deadline("T2", "Konzept", 2), 3, 4);
    let far_away = with_deadline("T3", "Umzug", 3);

    let outcome = scan(
        &PatternStore::default(),
        vec![no_progress, good_progress, far_away],
    );

    assert_eq!(outcome.patterns.len(), 1);
    assert_eq!(outcome.patterns[0].task_ids, vec!["T1".to_string()]);
    assert_eq!(outcome.patterns[0].priority, PatternPriority::Medium);
}

#[test]
fn test_client_name_needs_word_boundary() {
    let patterns = with_client_suggestions(Autonomy::Ask);
    let mut assigned = task("T3", "Acme Review", today());
    assigned.client_id = Some("c-acme".to_string());

    let outcome = scan(
        &patterns,
        vec![
            task("T1", "Angebot (Acme) schicken", today()),
            task("T2", "Acmeprojekt planen", today()),
            assigned,
        ],
    );

    assert_eq!(outcome.patterns.len(), 1);
    let pattern = &outcome.patterns[0];
    assert_eq!(pattern.id, "autoClient-T1");
    assert_eq!(pattern.priority, PatternPriority::Low);
    assert_eq!(
        pattern.payload,
        PatternPayload::AutoClient {
            client_id: acme().id,
            client_name: "Acme".to_string(),
        }
    );
}

#[test]
fn test_client_suggestions_are_off_by_default() {
    let outcome = scan(
        &PatternStore::default(),
        vec![task("T1", "Angebot Acme", today())],
    );
    assert!(outcome.patterns.is_empty());
}

#[test]
fn test_auto_client_assigns_without_asking() {
    let patterns = with_client_suggestions(Autonomy::Auto);
    let outcome = scan(&patterns, vec![task("T1", "Angebot Acme", today())]);
    assert_eq!(
        outcome.auto_actions,
        vec![AutoAction::AssignClient {
            task_id: "T1".to_string(),
            client_id: "c-acme".to_string(),
        }]
    );
}

#[test]
fn test_detection_order_is_by_type() {
    let patterns = with_client_suggestions(Autonomy::Ask);
    let outcome = scan(
        &patterns,
        vec![
            task("T1", "Angebot Acme", today()),
            with_deadline("T2", "Konzept", 1),
            postponed("T3", "Steuer", 3),
        ],
    );

    let types: Vec<PatternType> = outcome.patterns.iter().map(|p| p.pattern_type).collect();
    assert_eq!(
        types,
        vec![
            PatternType::Postpone,
            PatternType::DeadlineWarning,
            PatternType::AutoClient
        ]
    );
    assert_eq!(outcome.newly_shown.len(), 3);
}
