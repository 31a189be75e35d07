//! Confirmation questions for mutating intents.
//!
//! Read-only intents and clarifications need no confirmation. Everything
//! else either gets a yes/no question or is blocked up front because it
//! cannot or need not run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::resolve::resolve_task;
use super::types::{Intent, MoveScope, PatternActionType, TaskScope};
use crate::kernel::time::{date_label, weekday_name};
use crate::model::{Client, Priority, Recurrence, RecurrenceFrequency, Task};
use crate::patterns::{DetectedPattern, PatternPayload, PatternType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Confirmation {
    /// Yes/no question shown before the mutation runs.
    Ask(String),
    /// The intent cannot run; shown instead of a question.
    Blocked(String),
}

impl Confirmation {
    pub fn message(&self) -> &str {
        match self {
            Confirmation::Ask(m) | Confirmation::Blocked(m) => m,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Confirmation::Blocked(_))
    }
}

/// Read-only view used to phrase and guard confirmations.
#[derive(Debug, Clone, Copy)]
pub struct ConfirmSnapshot<'a> {
    pub today: NaiveDate,
    pub tasks: &'a [Task],
    pub clients: &'a [Client],
    pub active_patterns: &'a [DetectedPattern],
}

pub const NO_TASK_FOUND: &str = "Ich habe keine passende offene Aufgabe gefunden.";

fn client_name<'a>(clients: &'a [Client], id: Option<&String>) -> Option<&'a str> {
    let id = id?;
    clients.iter().find(|c| &c.id == id).map(|c| c.name.as_str())
}

pub fn recurrence_label(recurrence: &Recurrence) -> String {
    match (recurrence.frequency, recurrence.weekday) {
        (RecurrenceFrequency::Daily, _) => "täglich".to_string(),
        (RecurrenceFrequency::Weekdays, _) => "werktags".to_string(),
        (RecurrenceFrequency::Weekly, Some(day)) => format!("jeden {}", weekday_name(day)),
        (RecurrenceFrequency::Weekly, None) => "wöchentlich".to_string(),
        (RecurrenceFrequency::Monthly, _) => "monatlich".to_string(),
    }
}

/// A completed task the scope would have named, for a clearer message.
fn completed_match<'a>(scope: &TaskScope, tasks: &'a [Task]) -> Option<&'a Task> {
    let mut done = tasks.iter().filter(|t| t.is_completed());
    match scope {
        TaskScope::ById(id) => done.find(|t| &t.id == id),
        TaskScope::ByTitle(query) => {
            let query = query.to_lowercase();
            done.find(|t| t.title.to_lowercase().contains(&query))
        }
        TaskScope::Last => None,
    }
}

fn resolve_or_block<'a>(scope: &TaskScope, snapshot: &ConfirmSnapshot<'a>) -> Result<&'a Task, Confirmation> {
    if let Some(task) = resolve_task(scope, snapshot.tasks, snapshot.today) {
        return Ok(task);
    }
    match completed_match(scope, snapshot.tasks) {
        Some(task) => Err(Confirmation::Blocked(format!(
            "„{}“ ist bereits erledigt.",
            task.title
        ))),
        None => Err(Confirmation::Blocked(NO_TASK_FOUND.to_string())),
    }
}

fn pattern_action(
    action: PatternActionType,
    scope: &TaskScope,
    snapshot: &ConfirmSnapshot,
) -> Confirmation {
    let task = match resolve_or_block(scope, snapshot) {
        Ok(task) => task,
        Err(blocked) => return blocked,
    };
    match action {
        PatternActionType::MarkOptional if task.is_optional => {
            Confirmation::Blocked(format!("„{}“ ist bereits optional.", task.title))
        }
        PatternActionType::MarkOptional => {
            Confirmation::Ask(format!("„{}“ als optional markieren?", task.title))
        }
        PatternActionType::Deprioritize if task.priority == Priority::Low => Confirmation::Blocked(
            format!("„{}“ hat bereits niedrige Priorität.", task.title),
        ),
        PatternActionType::Deprioritize => Confirmation::Ask(format!(
            "Priorität von „{}“ auf niedrig senken?",
            task.title
        )),
        PatternActionType::AcceptClient => {
            if let Some(name) = client_name(snapshot.clients, task.client_id.as_ref()) {
                return Confirmation::Blocked(format!(
                    "„{}“ ist bereits {} zugeordnet.",
                    task.title, name
                ));
            }
            if task.client_id.is_some() {
                return Confirmation::Blocked(format!(
                    "„{}“ hat bereits einen Kunden.",
                    task.title
                ));
            }
            let suggestion = snapshot.active_patterns.iter().find(|p| {
                p.pattern_type == PatternType::AutoClient
                    && p.primary_task_id() == Some(&task.id)
            });
            match suggestion.map(|p| &p.payload) {
                Some(PatternPayload::AutoClient { client_name, .. }) => {
                    Confirmation::Ask(format!("„{}“ {} zuordnen?", task.title, client_name))
                }
                _ => Confirmation::Blocked(format!(
                    "Für „{}“ liegt kein Kundenvorschlag vor.",
                    task.title
                )),
            }
        }
    }
}

/// Question to ask before running `intent`, or `None` when it needs none.
pub fn build_confirmation(intent: &Intent, snapshot: &ConfirmSnapshot) -> Option<Confirmation> {
    let today = snapshot.today;
    let confirmation = match intent {
        Intent::StatsQuery { .. }
        | Intent::ExplainCapabilities { .. }
        | Intent::PatternQuery { .. }
        | Intent::Suggest { .. }
        | Intent::Disambiguate { .. } => return None,

        Intent::CreateTask {
            title,
            date,
            priority,
            client_id,
            meeting_time,
            deadline,
            ..
        } => {
            let mut question = match deadline {
                Some(due) => format!(
                    "Aufgabe „{title}“ mit Deadline {} erstellen",
                    date_label(*due, today)
                ),
                None => format!("Aufgabe „{title}“ für {} erstellen", date_label(*date, today)),
            };
            if let Some(time) = meeting_time {
                question.push_str(&format!(" ({}–{} Uhr)", time.start, time.end));
            }
            if let Some(name) = client_name(snapshot.clients, client_id.as_ref()) {
                question.push_str(&format!(" für {name}"));
            }
            if let Some(p) = priority {
                question.push_str(&format!(", Priorität {}", p.label()));
            }
            Confirmation::Ask(question + "?")
        }

        Intent::CreateRecurringTask {
            title,
            start_date,
            recurrence,
            ..
        } => Confirmation::Ask(format!(
            "Wiederkehrende Aufgabe „{title}“ ({}) ab {} anlegen?",
            recurrence_label(recurrence),
            date_label(*start_date, today)
        )),

        Intent::MoveTasks {
            scope: MoveScope::AllOpen,
            from_date,
            target_date,
            ..
        } => {
            let open = snapshot
                .tasks
                .iter()
                .filter(|t| !t.is_completed() && t.scheduled_date == *from_date)
                .count();
            if open == 0 {
                Confirmation::Blocked(format!(
                    "Für {} gibt es keine offenen Aufgaben.",
                    date_label(*from_date, today)
                ))
            } else {
                Confirmation::Ask(format!(
                    "{open} offene Aufgabe(n) von {} auf {} verschieben?",
                    date_label(*from_date, today),
                    date_label(*target_date, today)
                ))
            }
        }

        Intent::MoveTasks {
            scope: MoveScope::Task(scope),
            target_date,
            ..
        } => match resolve_or_block(scope, snapshot) {
            Err(blocked) => blocked,
            Ok(task) if task.scheduled_date == *target_date => Confirmation::Blocked(format!(
                "„{}“ ist bereits für {} geplant.",
                task.title,
                date_label(*target_date, today)
            )),
            Ok(task) => Confirmation::Ask(format!(
                "„{}“ auf {} verschieben?",
                task.title,
                date_label(*target_date, today)
            )),
        },

        Intent::SetPriority {
            scope, priority, ..
        } => match resolve_or_block(scope, snapshot) {
            Err(blocked) => blocked,
            Ok(task) if task.priority == *priority => Confirmation::Blocked(format!(
                "„{}“ hat bereits Priorität {}.",
                task.title,
                priority.label()
            )),
            Ok(task) => Confirmation::Ask(format!(
                "Priorität von „{}“ auf {} setzen?",
                task.title,
                priority.label()
            )),
        },

        Intent::DeleteTask { scope, .. } => match resolve_or_block(scope, snapshot) {
            Err(blocked) => blocked,
            Ok(task) => Confirmation::Ask(format!("„{}“ wirklich löschen?", task.title)),
        },

        Intent::CreateTemplate { scope, name, .. } => match resolve_or_block(scope, snapshot) {
            Err(blocked) => blocked,
            Ok(task) => Confirmation::Ask(format!(
                "Vorlage „{}“ aus „{}“ erstellen?",
                name.as_deref().unwrap_or(&task.title),
                task.title
            )),
        },

        Intent::PatternAction { action, scope, .. } => pattern_action(*action, scope, snapshot),

        Intent::Unknown { .. } => Confirmation::Blocked(
            "Das habe ich nicht verstanden. Sag „Hilfe“, um zu sehen, was ich kann.".to_string(),
        ),
    };
    Some(confirmation)
}

