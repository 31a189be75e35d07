use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::kernel::time::date_label;
use crate::model::{ClientId, MeetingTime, Priority, Recurrence, TaskId};

/// How the target task of a mutation is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "value", rename_all = "snake_case")]
pub enum TaskScope {
    /// Most recently created open task scheduled today.
    Last,
    /// First open task whose title contains the query.
    ByTitle(String),
    ById(TaskId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum MoveScope {
    /// Every open task scheduled on the source date.
    AllOpen,
    Task(TaskScope),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsQueryType {
    TasksToday,
    TasksTomorrow,
    TasksThisWeek,
    MeetingsToday,
    OverdueTasks,
    OpenTaskCount,
    CompletionRateToday,
    CompletionRateWeek,
    WorkTimeToday,
    WorkTimeWeek,
    WorkTimeMonth,
    ClientList,
    HighPriorityTasks,
    LastCompleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternQueryType {
    All,
    Postpone,
    DeadlineWarning,
    AutoClient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternActionType {
    MarkOptional,
    Deprioritize,
    AcceptClient,
}

/// A task offered to the user when a title matches more than one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCandidate {
    pub id: TaskId,
    pub title: String,
    pub scheduled_date: NaiveDate,
}

/// The mutation replayed once a disambiguation candidate is picked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeferredAction {
    Move {
        from_date: NaiveDate,
        target_date: NaiveDate,
    },
    SetPriority {
        priority: Priority,
    },
    Delete,
    CreateTemplate {
        name: Option<String>,
    },
    Pattern {
        action: PatternActionType,
    },
}

impl DeferredAction {
    pub fn replay(&self, scope: TaskScope, confidence: f32) -> Intent {
        match self.clone() {
            DeferredAction::Move {
                from_date,
                target_date,
            } => Intent::MoveTasks {
                scope: MoveScope::Task(scope),
                from_date,
                target_date,
                confidence,
            },
            DeferredAction::SetPriority { priority } => Intent::SetPriority {
                scope,
                priority,
                confidence,
            },
            DeferredAction::Delete => Intent::DeleteTask { scope, confidence },
            DeferredAction::CreateTemplate { name } => Intent::CreateTemplate {
                scope,
                name,
                confidence,
            },
            DeferredAction::Pattern { action } => Intent::PatternAction {
                action,
                scope,
                confidence,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub label: String,
    pub intent: Intent,
}

/// A structured, confidence-scored command derived from free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    CreateTask {
        title: String,
        date: NaiveDate,
        priority: Option<Priority>,
        client_id: Option<ClientId>,
        is_meeting: bool,
        meeting_time: Option<MeetingTime>,
        deadline: Option<NaiveDate>,
        confidence: f32,
    },
    CreateRecurringTask {
        title: String,
        start_date: NaiveDate,
        recurrence: Recurrence,
        priority: Option<Priority>,
        client_id: Option<ClientId>,
        confidence: f32,
    },
    MoveTasks {
        scope: MoveScope,
        from_date: NaiveDate,
        target_date: NaiveDate,
        confidence: f32,
    },
    SetPriority {
        scope: TaskScope,
        priority: Priority,
        confidence: f32,
    },
    DeleteTask {
        scope: TaskScope,
        confidence: f32,
    },
    StatsQuery {
        query: StatsQueryType,
        confidence: f32,
    },
    CreateTemplate {
        scope: TaskScope,
        name: Option<String>,
        confidence: f32,
    },
    ExplainCapabilities {
        confidence: f32,
    },
    PatternQuery {
        query: PatternQueryType,
        confidence: f32,
    },
    PatternAction {
        action: PatternActionType,
        scope: TaskScope,
        confidence: f32,
    },
    Unknown {
        text: String,
        confidence: f32,
    },
    Suggest {
        suggestions: Vec<Suggestion>,
        confidence: f32,
    },
    Disambiguate {
        candidates: Vec<TaskCandidate>,
        action: DeferredAction,
        confidence: f32,
    },
}

/// Content-free discriminant of `Intent`, used for logging and telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    CreateTask,
    CreateRecurringTask,
    MoveTasks,
    SetPriority,
    DeleteTask,
    StatsQuery,
    CreateTemplate,
    ExplainCapabilities,
    PatternQuery,
    PatternAction,
    Unknown,
    Suggest,
    Disambiguate,
}

impl From<&Intent> for IntentKind {
    fn from(intent: &Intent) -> Self {
        match intent {
            Intent::CreateTask { .. } => IntentKind::CreateTask,
            Intent::CreateRecurringTask { .. } => IntentKind::CreateRecurringTask,
            Intent::MoveTasks { .. } => IntentKind::MoveTasks,
            Intent::SetPriority { .. } => IntentKind::SetPriority,
            Intent::DeleteTask { .. } => IntentKind::DeleteTask,
            Intent::StatsQuery { .. } => IntentKind::StatsQuery,
            Intent::CreateTemplate { .. } => IntentKind::CreateTemplate,
            Intent::ExplainCapabilities { .. } => IntentKind::ExplainCapabilities,
            Intent::PatternQuery { .. } => IntentKind::PatternQuery,
            Intent::PatternAction { .. } => IntentKind::PatternAction,
            Intent::Unknown { .. } => IntentKind::Unknown,
            Intent::Suggest { .. } => IntentKind::Suggest,
            Intent::Disambiguate { .. } => IntentKind::Disambiguate,
        }
    }
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        IntentKind::from(self)
    }

    pub fn confidence(&self) -> f32 {
        match self {
            Intent::CreateTask { confidence, .. }
            | Intent::CreateRecurringTask { confidence, .. }
            | Intent::MoveTasks { confidence, .. }
            | Intent::SetPriority { confidence, .. }
            | Intent::DeleteTask { confidence, .. }
            | Intent::StatsQuery { confidence, .. }
            | Intent::CreateTemplate { confidence, .. }
            | Intent::ExplainCapabilities { confidence }
            | Intent::PatternQuery { confidence, .. }
            | Intent::PatternAction { confidence, .. }
            | Intent::Unknown { confidence, .. }
            | Intent::Suggest { confidence, .. }
            | Intent::Disambiguate { confidence, .. } => *confidence,
        }
    }

    /// Read-only intents are answered immediately, without confirmation.
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Intent::StatsQuery { .. }
                | Intent::ExplainCapabilities { .. }
                | Intent::PatternQuery { .. }
        )
    }

    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Intent::CreateTask { .. }
                | Intent::CreateRecurringTask { .. }
                | Intent::MoveTasks { .. }
                | Intent::SetPriority { .. }
                | Intent::DeleteTask { .. }
                | Intent::CreateTemplate { .. }
                | Intent::PatternAction { .. }
        )
    }

    /// Scope of a single-task mutation, if this intent has one.
    pub fn task_scope(&self) -> Option<&TaskScope> {
        match self {
            Intent::MoveTasks {
                scope: MoveScope::Task(scope),
                ..
            }
            | Intent::SetPriority { scope, .. }
            | Intent::DeleteTask { scope, .. }
            | Intent::CreateTemplate { scope, .. }
            | Intent::PatternAction { scope, .. } => Some(scope),
            _ => None,
        }
    }

    /// Copy of this intent targeting `scope`. Intents without a task scope
    /// are returned unchanged.
    pub fn with_scope(&self, scope: TaskScope) -> Intent {
        let mut next = self.clone();
        match &mut next {
            Intent::MoveTasks {
                scope: MoveScope::Task(target),
                ..
            }
            | Intent::SetPriority { scope: target, .. }
            | Intent::DeleteTask { scope: target, .. }
            | Intent::CreateTemplate { scope: target, .. }
            | Intent::PatternAction { scope: target, .. } => *target = scope,
            _ => {}
        }
        next
    }

    /// The action to replay after disambiguation, for single-task mutations.
    pub fn deferred_action(&self) -> Option<DeferredAction> {
        match self {
            Intent::MoveTasks {
                scope: MoveScope::Task(_),
                from_date,
                target_date,
                ..
            } => Some(DeferredAction::Move {
                from_date: *from_date,
                target_date: *target_date,
            }),
            Intent::SetPriority { priority, .. } => Some(DeferredAction::SetPriority {
                priority: *priority,
            }),
            Intent::DeleteTask { .. } => Some(DeferredAction::Delete),
            Intent::CreateTemplate { name, .. } => {
                Some(DeferredAction::CreateTemplate { name: name.clone() })
            }
            Intent::PatternAction { action, .. } => Some(DeferredAction::Pattern { action: *action }),
            _ => None,
        }
    }

    /// Short label for suggestion lists.
    pub fn label(&self, today: NaiveDate) -> String {
        match self {
            Intent::CreateTask { title, date, .. } => {
                format!("Aufgabe „{title}“ für {} erstellen", date_label(*date, today))
            }
            Intent::CreateRecurringTask { title, .. } => {
                format!("Wiederkehrende Aufgabe „{title}“ anlegen")
            }
            Intent::MoveTasks {
                scope: MoveScope::AllOpen,
                target_date,
                ..
            } => format!(
                "Offene Aufgaben auf {} verschieben",
                date_label(*target_date, today)
            ),
            Intent::MoveTasks { target_date, .. } => {
                format!("Aufgabe auf {} verschieben", date_label(*target_date, today))
            }
            Intent::SetPriority { priority, .. } => {
                format!("Priorität auf {} setzen", priority.label())
            }
            Intent::DeleteTask { .. } => "Aufgabe löschen".to_string(),
            Intent::StatsQuery { .. } => "Statistik anzeigen".to_string(),
            Intent::CreateTemplate { .. } => "Vorlage erstellen".to_string(),
            Intent::ExplainCapabilities { .. } => "Zeigen, was ich kann".to_string(),
            Intent::PatternQuery { .. } => "Erkannte Muster anzeigen".to_string(),
            Intent::PatternAction { action, .. } => match action {
                PatternActionType::MarkOptional => "Aufgabe als optional markieren".to_string(),
                PatternActionType::Deprioritize => "Aufgabe depriorisieren".to_string(),
                PatternActionType::AcceptClient => "Kunden zuordnen".to_string(),
            },
            Intent::Unknown { .. } => "Unbekannt".to_string(),
            Intent::Suggest { .. } => "Vorschläge".to_string(),
            Intent::Disambiguate { .. } => "Aufgabe auswählen".to_string(),
        }
    }
}

/// Ephemeral scorer output. Lives for one parse call.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub intent: Intent,
    pub score: f32,
}

impl ScoredCandidate {
    pub fn new(intent: Intent, score: f32) -> Self {
        Self {
            intent,
            score: score.clamp(0.0, 1.0),
        }
    }
}
