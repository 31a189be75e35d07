mod common;

use std::sync::Arc;

use common::{now, postponed, store_with, task, today};
use tally::config::IntentConfig;
use tally::kernel::{run_scan, Engine, FixedClock, Moment, Reply, Session};
use tally::model::{Priority, Task};
use tally::patterns::{PatternAccess, PatternStore, PostponeAction};
use tally::store::{InMemoryTaskStore, TaskStore};

fn setup(tasks: Vec<Task>) -> (Session, Engine<InMemoryTaskStore>) {
    let session = Session::new(IntentConfig::default(), Arc::new(FixedClock::on(today())));
    let engine = Engine::new(store_with(tasks), PatternStore::default());
    (session, engine)
}

fn scan(engine: &mut Engine<InMemoryTaskStore>) {
    run_scan(engine, Moment { today: today(), now: now() });
}

#[test]
fn test_create_requires_confirmation() {
    let (mut session, mut engine) = setup(Vec::new());

    // 1. Parse: nothing changes yet
    let reply = session.handle_input("Erstelle Meeting morgen um 15 Uhr mit Acme", &mut engine);
    match &reply {
        Reply::Confirm { question } => assert!(question.contains("Meeting mit Acme"), "{question}"),
        other => panic!("Expected a confirmation question, got {other:?}"),
    }
    assert!(engine.tasks.tasks().is_empty());
    assert!(session.has_pending());

    // 2. Confirm: the task exists and becomes the conversation reference
    let reply = session.confirm(&mut engine);
    let created_id = match reply {
        Reply::Executed { result } => {
            assert!(result.success, "{}", result.message);
            result.task_id.expect("created id")
        }
        other => panic!("Expected execution, got {other:?}"),
    };
    assert_eq!(engine.tasks.tasks().len(), 1);
    assert_eq!(
        session.context().last_referenced_task_id.as_deref(),
        Some(created_id.as_str())
    );
    assert_eq!(
        session.context().last_referenced_client_id.as_deref(),
        Some("c-acme")
    );
    assert!(!session.has_pending());

    // 3. Follow-up by pronoun
    let reply = session.handle_input("lösche das", &mut engine);
    assert_eq!(
        reply,
        Reply::Confirm {
            question: "„Meeting mit Acme“ wirklich löschen?".to_string()
        }
    );
    session.confirm(&mut engine);
    assert!(engine.tasks.tasks().is_empty());
}

#[test]
fn test_cancel_leaves_store_untouched() {
    let (mut session, mut engine) = setup(vec![task("T1", "Bericht", today())]);

    assert!(matches!(
        session.handle_input("Lösche Bericht", &mut engine),
        Reply::Confirm { .. }
    ));
    assert_eq!(session.cancel(&mut engine), Reply::Cancelled);

    assert_eq!(engine.tasks.tasks().len(), 1);
    assert!(matches!(session.confirm(&mut engine), Reply::Idle { .. }));
    let snapshot = engine.telemetry.snapshot();
    assert_eq!(snapshot.confirmation.asked, 1);
    assert_eq!(snapshot.confirmation.cancelled, 1);
    assert_eq!(snapshot.execution.succeeded, 0);
}

#[test]
fn test_delete_remembers_the_removed_task() {
    let (mut session, mut engine) = setup(vec![
        task("T1", "Bericht", today()),
        task("T2", "Einkauf", today()),
    ]);

    session.handle_input("Lösche Bericht", &mut engine);
    let reply = session.confirm(&mut engine);

    assert!(matches!(reply, Reply::Executed { ref result } if result.success));
    assert!(engine.tasks.task("T1").is_none());
    assert_eq!(session.context().last_referenced_task_id.as_deref(), Some("T1"));
    assert_eq!(session.context().recent_intents.len(), 1);
}

#[test]
fn test_new_input_replaces_pending_question() {
    let (mut session, mut engine) = setup(vec![task("T1", "Bericht", today())]);

    session.handle_input("Lösche Bericht", &mut engine);
    let reply = session.handle_input("Was steht heute an?", &mut engine);

    assert!(matches!(reply, Reply::Answer { .. }));
    assert!(matches!(session.confirm(&mut engine), Reply::Idle { .. }));
    assert_eq!(engine.tasks.tasks().len(), 1);
}

#[test]
fn test_read_only_question_is_answered_directly() {
    let (mut session, mut engine) = setup(vec![task("T1", "Bericht", today())]);

    let reply = session.handle_input("Was steht heute an?", &mut engine);

    match reply {
        Reply::Answer { message } => assert_eq!(message, "Heute (1):\n• Bericht"),
        other => panic!("Expected an answer, got {other:?}"),
    }
    assert!(!session.has_pending());
}

#[test]
fn test_blocked_intent_is_not_pending() {
    let (mut session, mut engine) = setup(vec![task("T1", "Bericht", today())]);

    let reply = session.handle_input("Lösche Urlaubsplanung", &mut engine);

    assert!(matches!(reply, Reply::Blocked { .. }));
    assert!(!session.has_pending());
}

#[test]
fn test_choosing_a_candidate_runs_the_action() {
    let (mut session, mut engine) = setup(vec![
        task("T1", "Bericht Q1", today()),
        task("T2", "Bericht Q2", today()),
    ]);

    let reply = session.handle_input("Lösche Bericht", &mut engine);
    match &reply {
        Reply::Candidates { options, .. } => assert_eq!(options.len(), 2),
        other => panic!("Expected candidates, got {other:?}"),
    }
    assert!(reply.text().contains("  2. Bericht Q2 (heute)"));

    // Out of range keeps the choice open.
    assert!(matches!(
        session.choose_candidate(5, &mut engine),
        Reply::Idle { .. }
    ));
    let reply = session.choose_candidate(1, &mut engine);

    assert!(matches!(reply, Reply::Executed { ref result } if result.success));
    let left: Vec<&str> = engine.tasks.tasks().iter().map(|t| t.id.as_str()).collect();
    assert_eq!(left, vec!["T1"]);
    assert_eq!(session.context().last_referenced_task_id.as_deref(), Some("T2"));
}

#[test]
fn test_accepting_postpone_suggestion_with_remedy() {
    let (mut session, mut engine) = setup(vec![postponed("T1", "Steuererklärung", 4)]);
    scan(&mut engine);
    let id = engine.patterns.active_patterns()[0].id.clone();

    let reply = session.accept_pattern_suggestion(&id, Some(PostponeAction::Deprioritize), &mut engine);

    assert!(matches!(reply, Reply::Executed { ref result } if result.success));
    assert_eq!(engine.tasks.task("T1").unwrap().priority, Priority::Low);
    assert!(engine.patterns.active_patterns().is_empty());
    assert_eq!(engine.telemetry.snapshot().patterns.accepted, 1);
}

#[test]
fn test_reschedule_moves_to_next_monday() {
    let (mut session, mut engine) = setup(vec![postponed("T1", "Steuererklärung", 4)]);
    scan(&mut engine);
    let id = engine.patterns.active_patterns()[0].id.clone();

    session.accept_pattern_suggestion(&id, Some(PostponeAction::Reschedule), &mut engine);

    let task = engine.tasks.task("T1").unwrap();
    // 2025-06-10 is a Tuesday.
    assert_eq!(task.scheduled_date, today() + chrono::Duration::days(6));
    assert_eq!(task.postpone_count, 5);
}

#[test]
fn test_default_remedy_marks_optional() {
    let (mut session, mut engine) = setup(vec![postponed("T1", "Steuererklärung", 4)]);
    scan(&mut engine);
    let id = engine.patterns.active_patterns()[0].id.clone();

    session.accept_pattern_suggestion(&id, None, &mut engine);

    assert!(engine.tasks.task("T1").unwrap().is_optional);
}

#[test]
fn test_stale_suggestion_is_ignored() {
    let (mut session, mut engine) = setup(Vec::new());
    let reply = session.accept_pattern_suggestion("postpone-T9", None, &mut engine);
    assert!(matches!(reply, Reply::Idle { .. }));
}

#[test]
fn test_dismissing_a_suggestion() {
    let (mut session, mut engine) = setup(vec![postponed("T1", "Steuererklärung", 4)]);
    scan(&mut engine);
    let id = engine.patterns.active_patterns()[0].id.clone();

    assert!(session.dismiss_pattern_suggestion(&id, false, &mut engine));
    assert!(!session.dismiss_pattern_suggestion(&id, false, &mut engine));

    scan(&mut engine);
    assert!(engine.patterns.active_patterns().is_empty());
    let snapshot = engine.telemetry.snapshot();
    assert_eq!(snapshot.patterns.dismissed, 1);
    assert_eq!(snapshot.patterns.scans, 2);
}

#[test]
fn test_pattern_query_lists_active_patterns() {
    let (mut session, mut engine) = setup(vec![postponed("T1", "Steuererklärung", 4)]);
    scan(&mut engine);

    let reply = session.handle_input("Welche Muster hast du erkannt?", &mut engine);

    match reply {
        Reply::Answer { message } => {
            assert!(message.starts_with("Erkannte Muster (1):"), "{message}");
            assert!(message.contains("Steuererklärung"));
        }
        other => panic!("Expected an answer, got {other:?}"),
    }
}
