mod common;

use common::{acme, completed, task, today, tomorrow};
use tally::intent::{
    build_confirmation, ConfirmSnapshot, Confirmation, Intent, MoveScope, PatternActionType,
    PatternQueryType, StatsQueryType, TaskScope,
};
use tally::model::{Client, Priority, Task};

fn confirm(intent: &Intent, tasks: &[Task], clients: &[Client]) -> Option<Confirmation> {
    let snapshot = ConfirmSnapshot {
        today: today(),
        tasks,
        clients,
        active_patterns: &[],
    };
    build_confirmation(intent, &snapshot)
}

fn by_title(title: &str) -> TaskScope {
    TaskScope::ByTitle(title.to_string())
}

#[test]
fn test_read_only_intents_need_no_confirmation() {
    let read_only = [
        Intent::StatsQuery {
            query: StatsQueryType::TasksToday,
            confidence: 0.9,
        },
        Intent::ExplainCapabilities { confidence: 0.9 },
        Intent::PatternQuery {
            query: PatternQueryType::All,
            confidence: 0.9,
        },
        Intent::Suggest {
            suggestions: Vec::new(),
            confidence: 0.4,
        },
    ];
    for intent in &read_only {
        assert_eq!(confirm(intent, &[], &[]), None, "{intent:?}");
    }
}

#[test]
fn test_create_task_question_names_details() {
    let intent = Intent::CreateTask {
        title: "Meeting mit Acme".to_string(),
        date: tomorrow(),
        priority: Some(Priority::High),
        client_id: Some("c-acme".to_string()),
        is_meeting: true,
        meeting_time: None,
        deadline: None,
        confidence: 1.0,
    };

    let confirmation = confirm(&intent, &[], &[acme()]).expect("question");

    assert!(!confirmation.is_blocked());
    let question = confirmation.message();
    assert!(question.contains("„Meeting mit Acme“"), "{question}");
    assert!(question.contains("morgen"), "{question}");
    assert!(question.contains("für Acme"), "{question}");
    assert!(question.contains("Priorität hoch"), "{question}");
    assert!(question.ends_with('?'));
}

#[test]
fn test_move_all_open_counts_tasks() {
    let tasks = vec![
        task("T1", "Bericht", today()),
        task("T2", "Einkauf", today()),
        completed(task("T3", "Sport", today())),
    ];
    let intent = Intent::MoveTasks {
        scope: MoveScope::AllOpen,
        from_date: today(),
        target_date: tomorrow(),
        confidence: 1.0,
    };

    match confirm(&intent, &tasks, &[]) {
        Some(Confirmation::Ask(question)) => assert!(question.starts_with("2 offene"), "{question}"),
        other => panic!("Expected a question, got {other:?}"),
    }
}

#[test]
fn test_move_all_open_without_open_tasks_is_blocked() {
    let tasks = vec![completed(task("T1", "Bericht", today()))];
    let intent = Intent::MoveTasks {
        scope: MoveScope::AllOpen,
        from_date: today(),
        target_date: tomorrow(),
        confidence: 1.0,
    };

    let confirmation = confirm(&intent, &tasks, &[]).expect("confirmation");
    assert!(confirmation.is_blocked());
}

#[test]
fn test_move_to_same_date_is_blocked() {
    let tasks = vec![task("T1", "Bericht", tomorrow())];
    let intent = Intent::MoveTasks {
        scope: MoveScope::Task(by_title("Bericht")),
        from_date: today(),
        target_date: tomorrow(),
        confidence: 1.0,
    };

    let confirmation = confirm(&intent, &tasks, &[]).expect("confirmation");
    assert!(confirmation.is_blocked());
    assert!(confirmation.message().contains("bereits für morgen"));
}

#[test]
fn test_same_priority_is_blocked() {
    let mut urgent = task("T1", "Bericht", today());
    urgent.priority = Priority::Urgent;
    let intent = Intent::SetPriority {
        scope: by_title("Bericht"),
        priority: Priority::Urgent,
        confidence: 1.0,
    };

    let confirmation = confirm(&intent, &[urgent], &[]).expect("confirmation");
    assert!(confirmation.is_blocked());
    assert!(confirmation.message().contains("bereits Priorität dringend"));
}

#[test]
fn test_completed_target_is_reported_as_done() {
    let tasks = vec![completed(task("T1", "Steuererklärung", today()))];
    let intent = Intent::DeleteTask {
        scope: by_title("steuer"),
        confidence: 1.0,
    };

    let confirmation = confirm(&intent, &tasks, &[]).expect("confirmation");
    assert_eq!(
        confirmation,
        Confirmation::Blocked("„Steuererklärung“ ist bereits erledigt.".to_string())
    );
}

#[test]
fn test_missing_target_is_blocked() {
    let intent = Intent::DeleteTask {
        scope: by_title("gibt es nicht"),
        confidence: 1.0,
    };
    let confirmation = confirm(&intent, &[task("T1", "Bericht", today())], &[]).expect("confirmation");
    assert!(confirmation.is_blocked());
}

#[test]
fn test_delete_asks_with_title() {
    let intent = Intent::DeleteTask {
        scope: TaskScope::ById("T1".to_string()),
        confidence: 1.0,
    };
    let confirmation = confirm(&intent, &[task("T1", "Bericht", today())], &[]).expect("confirmation");
    assert_eq!(
        confirmation,
        Confirmation::Ask("„Bericht“ wirklich löschen?".to_string())
    );
}

#[test]
fn test_pattern_action_guards() {
    let mut optional = task("T1", "Sport", today());
    optional.is_optional = true;
    let mut low = task("T2", "Ablage", today());
    low.priority = Priority::Low;
    let mut assigned = task("T3", "Angebot Acme", today());
    assigned.client_id = Some("c-acme".to_string());
    let unassigned = task("T4", "Rechnung", today());
    let tasks = vec![optional, low, assigned, unassigned];

    let cases = [
        (PatternActionType::MarkOptional, "T1", "bereits optional"),
        (PatternActionType::Deprioritize, "T2", "bereits niedrige Priorität"),
        (PatternActionType::AcceptClient, "T3", "bereits Acme zugeordnet"),
        (PatternActionType::AcceptClient, "T4", "kein Kundenvorschlag"),
    ];
    for (action, id, expected) in cases {
        let intent = Intent::PatternAction {
            action,
            scope: TaskScope::ById(id.to_string()),
            confidence: 1.0,
        };
        let confirmation = confirm(&intent, &tasks, &[acme()]).expect("confirmation");
        assert!(confirmation.is_blocked(), "{action:?} on {id}");
        assert!(
            confirmation.message().contains(expected),
            "{}",
            confirmation.message()
        );
    }
}

#[test]
fn test_unknown_is_blocked() {
    let intent = Intent::Unknown {
        text: "blorp".to_string(),
        confidence: 0.0,
    };
    assert!(confirm(&intent, &[], &[]).expect("confirmation").is_blocked());
}
