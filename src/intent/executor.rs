//! Runs a confirmed intent against the store.
//!
//! Every branch returns an `ExecutionResult`; store failures become
//! `success: false` with a readable message.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::confirm::{recurrence_label, NO_TASK_FOUND};
use super::resolve::resolve_task;
use super::types::{Intent, MoveScope, PatternActionType, PatternQueryType, StatsQueryType, TaskScope};
use crate::error::StoreError;
use crate::kernel::time::{date_label, format_duration, week_end, week_start};
use crate::model::{NewTask, NewTemplate, Priority, Task, TaskId, TaskPatch};
use crate::patterns::{AutoAction, DetectedPattern, PatternAccess, PatternPayload, PatternType};
use crate::store::TaskStore;

/// Lists longer than this are cut with "+N weitere".
pub const LIST_LIMIT: usize = 10;

pub const HELP_MESSAGE: &str = "Das habe ich nicht verstanden. Versuch zum Beispiel:\n\
• „Erstelle Meeting morgen um 15 Uhr mit Acme“\n\
• „Verschiebe alle offenen Aufgaben auf morgen“\n\
• „Lösche die Aufgabe Steuererklärung“\n\
• „Was steht heute an?“\n\
• „Welche Muster hast du erkannt?“";

pub const CAPABILITIES_MESSAGE: &str = "Ich kann:\n\
• Aufgaben und Meetings erstellen, auch wiederkehrend („jeden Montag“)\n\
• Aufgaben verschieben, löschen und priorisieren\n\
• Vorlagen aus Aufgaben erstellen\n\
• Fragen beantworten: Aufgaben heute, morgen und diese Woche, Meetings, Überfälliges, \
Erledigungsquote, Arbeitszeit, Kunden, wichtige Aufgaben, zuletzt Erledigtes\n\
• Muster erkennen: oft verschobene Aufgaben, nahe Deadlines, Kundennamen im Titel\n\
Vor jeder Änderung frage ich nach.";

pub const PICK_AN_OPTION: &str = "Bitte wähle eine der Optionen.";

pub struct ExecutionEnv<'a> {
    pub tasks: &'a mut dyn TaskStore,
    pub patterns: &'a mut dyn PatternAccess,
    pub today: NaiveDate,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub message: String,
    /// Task created or touched, when there is exactly one.
    pub task_id: Option<TaskId>,
}

impl ExecutionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            task_id: None,
        }
    }

    pub fn ok_with(message: impl Into<String>, task_id: TaskId) -> Self {
        Self {
            success: true,
            message: message.into(),
            task_id: Some(task_id),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            task_id: None,
        }
    }
}

impl From<StoreError> for ExecutionResult {
    fn from(err: StoreError) -> Self {
        warn!(error = %err, "store rejected mutation");
        ExecutionResult::failed(format!("Das hat nicht geklappt: {err}"))
    }
}

/// Id of the task `intent` targets, resolved before it runs.
pub fn resolve_target_task_id(intent: &Intent, tasks: &[Task], today: NaiveDate) -> Option<TaskId> {
    let scope = intent.task_scope()?;
    resolve_task(scope, tasks, today).map(|t| t.id.clone())
}

fn resolved(scope: &TaskScope, env: &ExecutionEnv) -> Result<Task, ExecutionResult> {
    resolve_task(scope, env.tasks.tasks(), env.today)
        .cloned()
        .ok_or_else(|| ExecutionResult::failed(NO_TASK_FOUND))
}

pub fn execute_intent(intent: &Intent, env: &mut ExecutionEnv) -> ExecutionResult {
    let result = match intent {
        Intent::CreateTask {
            title,
            date,
            priority,
            client_id,
            is_meeting,
            meeting_time,
            deadline,
            ..
        } => {
            let new = NewTask {
                priority: priority.unwrap_or_default(),
                client_id: client_id.clone(),
                is_meeting: *is_meeting,
                meeting_time: meeting_time.clone(),
                deadline: *deadline,
                ..NewTask::todo(title.clone(), *date)
            };
            match env.tasks.add_task(new) {
                Ok(task) => ExecutionResult::ok_with(
                    format!(
                        "„{}“ für {} erstellt.",
                        task.title,
                        date_label(task.scheduled_date, env.today)
                    ),
                    task.id,
                ),
                Err(e) => e.into(),
            }
        }

        Intent::CreateRecurringTask {
            title,
            start_date,
            recurrence,
            priority,
            client_id,
            ..
        } => {
            let new = NewTask {
                priority: priority.unwrap_or_default(),
                client_id: client_id.clone(),
                recurrence: Some(*recurrence),
                ..NewTask::todo(title.clone(), *start_date)
            };
            match env.tasks.add_task(new) {
                Ok(task) => ExecutionResult::ok_with(
                    format!(
                        "„{}“ angelegt ({}, ab {}).",
                        task.title,
                        recurrence_label(recurrence),
                        date_label(task.scheduled_date, env.today)
                    ),
                    task.id,
                ),
                Err(e) => e.into(),
            }
        }

        Intent::MoveTasks {
            scope: MoveScope::AllOpen,
            from_date,
            target_date,
            ..
        } => move_all_open(env, *from_date, *target_date),

        Intent::MoveTasks {
            scope: MoveScope::Task(scope),
            target_date,
            ..
        } => match resolved(scope, env) {
            Err(failed) => failed,
            Ok(task) => match env
                .tasks
                .update_task(&task.id, TaskPatch::postpone(&task, *target_date))
            {
                Ok(moved) => ExecutionResult::ok_with(
                    format!(
                        "„{}“ auf {} verschoben.",
                        moved.title,
                        date_label(*target_date, env.today)
                    ),
                    moved.id,
                ),
                Err(e) => e.into(),
            },
        },

        Intent::SetPriority {
            scope, priority, ..
        } => match resolved(scope, env) {
            Err(failed) => failed,
            Ok(task) => match env.tasks.set_task_priority(&task.id, *priority) {
                Ok(()) => ExecutionResult::ok_with(
                    format!("„{}“ hat jetzt Priorität {}.", task.title, priority.label()),
                    task.id,
                ),
                Err(e) => e.into(),
            },
        },

        Intent::DeleteTask { scope, .. } => match resolved(scope, env) {
            Err(failed) => failed,
            Ok(task) => match env.tasks.delete_task(&task.id) {
                Ok(deleted) => {
                    ExecutionResult::ok_with(format!("„{}“ gelöscht.", deleted.title), deleted.id)
                }
                Err(e) => e.into(),
            },
        },

        Intent::CreateTemplate { scope, name, .. } => match resolved(scope, env) {
            Err(failed) => failed,
            Ok(task) => {
                let name = name.clone().unwrap_or_else(|| task.title.clone());
                match env.tasks.add_template(NewTemplate::from_task(&task, name)) {
                    Ok(template) => ExecutionResult::ok_with(
                        format!("Vorlage „{}“ erstellt.", template.name),
                        task.id,
                    ),
                    Err(e) => e.into(),
                }
            }
        },

        Intent::StatsQuery { query, .. } => ExecutionResult::ok(answer_stats(*query, env)),

        Intent::ExplainCapabilities { .. } => ExecutionResult::ok(CAPABILITIES_MESSAGE),

        Intent::PatternQuery { query, .. } => {
            ExecutionResult::ok(list_patterns(*query, env.patterns.active_patterns()))
        }

        Intent::PatternAction { action, scope, .. } => apply_pattern_action(*action, scope, env),

        Intent::Suggest { .. } | Intent::Disambiguate { .. } => {
            ExecutionResult::failed(PICK_AN_OPTION)
        }

        Intent::Unknown { .. } => ExecutionResult::failed(HELP_MESSAGE),
    };

    if result.success && intent.is_mutation() {
        info!(kind = ?intent.kind(), "intent executed");
    }
    result
}

fn move_all_open(env: &mut ExecutionEnv, from: NaiveDate, target: NaiveDate) -> ExecutionResult {
    let open: Vec<Task> = env
        .tasks
        .tasks()
        .iter()
        .filter(|t| !t.is_completed() && t.scheduled_date == from)
        .cloned()
        .collect();
    if open.is_empty() {
        return ExecutionResult::failed(format!(
            "Für {} gibt es keine offenen Aufgaben.",
            date_label(from, env.today)
        ));
    }
    let mut moved = 0;
    for task in &open {
        match env.tasks.update_task(&task.id, TaskPatch::postpone(task, target)) {
            Ok(_) => moved += 1,
            Err(e) => warn!(error = %e, "skipped task while moving"),
        }
    }
    if moved == 0 {
        return ExecutionResult::failed("Keine Aufgabe konnte verschoben werden.");
    }
    ExecutionResult::ok(format!(
        "{moved} Aufgabe(n) auf {} verschoben.",
        date_label(target, env.today)
    ))
}

/// The pattern an action answers, if one is active for the task.
fn answered_pattern(
    action: PatternActionType,
    task_id: &str,
    patterns: &dyn PatternAccess,
) -> Option<DetectedPattern> {
    let pattern_type = match action {
        PatternActionType::MarkOptional | PatternActionType::Deprioritize => PatternType::Postpone,
        PatternActionType::AcceptClient => PatternType::AutoClient,
    };
    patterns.active_for(pattern_type, task_id).cloned()
}

fn apply_pattern_action(
    action: PatternActionType,
    scope: &TaskScope,
    env: &mut ExecutionEnv,
) -> ExecutionResult {
    let task = match resolved(scope, env) {
        Ok(task) => task,
        Err(failed) => return failed,
    };
    let pattern = answered_pattern(action, &task.id, &*env.patterns);

    let applied = match action {
        PatternActionType::MarkOptional => env
            .tasks
            .update_task(
                &task.id,
                TaskPatch {
                    is_optional: Some(true),
                    ..TaskPatch::default()
                },
            )
            .map(|_| format!("„{}“ ist jetzt optional.", task.title)),
        PatternActionType::Deprioritize => env
            .tasks
            .set_task_priority(&task.id, Priority::Low)
            .map(|_| format!("„{}“ hat jetzt niedrige Priorität.", task.title)),
        PatternActionType::AcceptClient => {
            let Some(PatternPayload::AutoClient {
                client_id,
                client_name,
            }) = pattern.as_ref().map(|p| &p.payload)
            else {
                return ExecutionResult::failed(format!(
                    "Für „{}“ liegt kein Kundenvorschlag vor.",
                    task.title
                ));
            };
            env.tasks
                .update_task(
                    &task.id,
                    TaskPatch {
                        client_id: Some(client_id.clone()),
                        ..TaskPatch::default()
                    },
                )
                .map(|_| format!("„{}“ ist jetzt {} zugeordnet.", task.title, client_name))
        }
    };

    match applied {
        Ok(message) => {
            if let Some(pattern) = pattern {
                env.patterns.accept_pattern(&pattern.id);
            }
            ExecutionResult::ok_with(message, task.id)
        }
        Err(e) => e.into(),
    }
}

/// Apply a remedy the detector chose on its own.
pub fn apply_auto_action(action: &AutoAction, tasks: &mut dyn TaskStore) -> Result<Task, StoreError> {
    let (task_id, patch) = match action {
        AutoAction::MarkOptional { task_id } => (
            task_id,
            TaskPatch {
                is_optional: Some(true),
                ..TaskPatch::default()
            },
        ),
        AutoAction::AssignClient { task_id, client_id } => (
            task_id,
            TaskPatch {
                client_id: Some(client_id.clone()),
                ..TaskPatch::default()
            },
        ),
    };
    let task = tasks.update_task(task_id, patch)?;
    info!(action = ?action, "auto action applied");
    Ok(task)
}

fn truncated(lines: Vec<String>) -> String {
    let extra = lines.len().saturating_sub(LIST_LIMIT);
    let mut out: Vec<String> = lines.into_iter().take(LIST_LIMIT).collect();
    if extra > 0 {
        out.push(format!("+{extra} weitere"));
    }
    out.join("\n")
}

fn task_line(task: &Task, today: NaiveDate, with_date: bool) -> String {
    let mark = if task.is_completed() { "✓" } else { "•" };
    let mut line = format!("{mark} {}", task.title);
    if let Some(time) = &task.meeting_time {
        line.push_str(&format!(" ({} Uhr)", time.start));
    }
    if with_date {
        line.push_str(&format!(" – {}", date_label(task.scheduled_date, today)));
    }
    if task.priority >= Priority::High {
        line.push_str(&format!(" [{}]", task.priority.label()));
    }
    line
}

fn task_list(header: String, tasks: &[Task], today: NaiveDate, with_date: bool, empty: &str) -> String {
    if tasks.is_empty() {
        return empty.to_string();
    }
    let lines = tasks.iter().map(|t| task_line(t, today, with_date)).collect();
    format!("{header}\n{}", truncated(lines))
}

fn completion_rate(label: &str, tasks: &[&Task]) -> String {
    if tasks.is_empty() {
        return format!("Für {label} sind keine Aufgaben geplant.");
    }
    let done = tasks.iter().filter(|t| t.is_completed()).count();
    let percent = (done as f64 / tasks.len() as f64 * 100.0).round() as u32;
    format!(
        "{label}: {done} von {} Aufgaben erledigt ({percent} %).",
        tasks.len()
    )
}

fn answer_stats(query: StatsQueryType, env: &ExecutionEnv) -> String {
    let today = env.today;
    let store = &*env.tasks;
    let in_week = |t: &&Task| t.scheduled_date >= week_start(today) && t.scheduled_date <= week_end(today);

    match query {
        StatsQueryType::TasksToday => {
            let tasks = store.tasks_for_date_sorted(today);
            task_list(
                format!("Heute ({}):", tasks.len()),
                &tasks,
                today,
                false,
                "Für heute ist nichts geplant.",
            )
        }
        StatsQueryType::TasksTomorrow => {
            let tasks = store.tasks_for_date_sorted(today + Duration::days(1));
            task_list(
                format!("Morgen ({}):", tasks.len()),
                &tasks,
                today,
                false,
                "Für morgen ist nichts geplant.",
            )
        }
        StatsQueryType::TasksThisWeek => {
            let mut tasks: Vec<Task> = store
                .tasks()
                .iter()
                .filter(in_week)
                .filter(|t| !t.is_completed())
                .cloned()
                .collect();
            tasks.sort_by_key(|t| t.scheduled_date);
            task_list(
                format!("Diese Woche offen ({}):", tasks.len()),
                &tasks,
                today,
                true,
                "Diese Woche ist nichts mehr offen.",
            )
        }
        StatsQueryType::MeetingsToday => {
            let meetings: Vec<Task> = store
                .tasks_for_date_sorted(today)
                .into_iter()
                .filter(|t| t.is_meeting)
                .collect();
            task_list(
                format!("Meetings heute ({}):", meetings.len()),
                &meetings,
                today,
                false,
                "Heute stehen keine Meetings an.",
            )
        }
        StatsQueryType::OverdueTasks => {
            let overdue = store.unfinished_tasks_before_date(today);
            task_list(
                format!("Überfällig ({}):", overdue.len()),
                &overdue,
                today,
                true,
                "Nichts überfällig.",
            )
        }
        StatsQueryType::OpenTaskCount => {
            let open: Vec<&Task> = store.tasks().iter().filter(|t| !t.is_completed()).collect();
            let due_today = open.iter().filter(|t| t.scheduled_date == today).count();
            format!(
                "Du hast {} offene Aufgabe(n), davon {due_today} für heute.",
                open.len()
            )
        }
        StatsQueryType::CompletionRateToday => {
            let tasks: Vec<&Task> = store
                .tasks()
                .iter()
                .filter(|t| t.scheduled_date == today)
                .collect();
            completion_rate("heute", &tasks)
        }
        StatsQueryType::CompletionRateWeek => {
            let tasks: Vec<&Task> = store.tasks().iter().filter(in_week).collect();
            completion_rate("diese Woche", &tasks)
        }
        StatsQueryType::WorkTimeToday => format!(
            "Heute gearbeitet: {}",
            format_duration(store.net_work_time(today))
        ),
        StatsQueryType::WorkTimeWeek => format!(
            "Diese Woche gearbeitet: {}",
            format_duration(store.weekly_work_time(today))
        ),
        StatsQueryType::WorkTimeMonth => format!(
            "Diesen Monat gearbeitet: {}",
            format_duration(store.monthly_work_time(today))
        ),
        StatsQueryType::ClientList => {
            let clients: Vec<String> = store
                .clients()
                .iter()
                .filter(|c| c.is_active)
                .map(|c| format!("• {}", c.name))
                .collect();
            if clients.is_empty() {
                "Es sind keine aktiven Kunden angelegt.".to_string()
            } else {
                format!("Kunden ({}):\n{}", clients.len(), truncated(clients))
            }
        }
        StatsQueryType::HighPriorityTasks => {
            let mut tasks: Vec<Task> = store
                .tasks()
                .iter()
                .filter(|t| !t.is_completed() && t.priority >= Priority::High)
                .cloned()
                .collect();
            tasks.sort_by(|a, b| {
                b.priority
                    .cmp(&a.priority)
                    .then(a.scheduled_date.cmp(&b.scheduled_date))
            });
            task_list(
                format!("Wichtige Aufgaben ({}):", tasks.len()),
                &tasks,
                today,
                true,
                "Keine offenen Aufgaben mit hoher Priorität.",
            )
        }
        StatsQueryType::LastCompleted => store
            .tasks()
            .iter()
            .filter(|t| t.is_completed())
            .max_by_key(|t| t.completed_at)
            .map(|t| format!("Zuletzt erledigt: „{}“.", t.title))
            .unwrap_or_else(|| "Du hast noch keine Aufgabe erledigt.".to_string()),
    }
}

fn list_patterns(query: PatternQueryType, active: &[DetectedPattern]) -> String {
    let wanted = match query {
        PatternQueryType::All => None,
        PatternQueryType::Postpone => Some(PatternType::Postpone),
        PatternQueryType::DeadlineWarning => Some(PatternType::DeadlineWarning),
        PatternQueryType::AutoClient => Some(PatternType::AutoClient),
    };
    let lines: Vec<String> = active
        .iter()
        .filter(|p| wanted.map_or(true, |t| p.pattern_type == t))
        .map(|p| format!("• {}: {}", p.title, p.description))
        .collect();
    if lines.is_empty() {
        return "Mir sind gerade keine Muster aufgefallen.".to_string();
    }
    format!("Erkannte Muster ({}):\n{}", lines.len(), truncated(lines))
}
