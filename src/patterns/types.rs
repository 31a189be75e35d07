use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::kernel::time::week_start;
use crate::model::{ClientId, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PatternType {
    Postpone,
    DeadlineWarning,
    AutoClient,
}

impl PatternType {
    pub const ALL: [PatternType; 3] = [
        PatternType::Postpone,
        PatternType::DeadlineWarning,
        PatternType::AutoClient,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::Postpone => "postpone",
            PatternType::DeadlineWarning => "deadlineWarning",
            PatternType::AutoClient => "autoClient",
        }
    }
}

/// How much the assistant may do on its own for a pattern type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Autonomy {
    /// Apply the remedy and notify.
    Auto,
    /// Surface a suggestion and wait for the user.
    Ask,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderTarget {
    Inline,
    Toast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternPriority {
    Low,
    Medium,
    High,
}

/// Remedies offered for a task that keeps getting postponed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostponeAction {
    MarkOptional,
    Reschedule,
    Deprioritize,
    Delete,
}

impl PostponeAction {
    pub const OFFERED: [PostponeAction; 4] = [
        PostponeAction::MarkOptional,
        PostponeAction::Reschedule,
        PostponeAction::Deprioritize,
        PostponeAction::Delete,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PatternPayload {
    Postpone {
        postpone_count: u32,
        original_date: Option<NaiveDate>,
        suggested_actions: Vec<PostponeAction>,
    },
    DeadlineWarning {
        deadline: NaiveDate,
        days_remaining: i64,
        /// `(done, total)` subtasks, when the task has any.
        subtask_progress: Option<(usize, usize)>,
    },
    AutoClient {
        client_id: ClientId,
        client_name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedPattern {
    /// Deterministic per type and task, so repeated scans yield the same id.
    pub id: String,
    pub pattern_type: PatternType,
    pub task_ids: Vec<TaskId>,
    pub title: String,
    pub description: String,
    pub detected_at: DateTime<Utc>,
    pub render_target: RenderTarget,
    pub priority: PatternPriority,
    pub payload: PatternPayload,
}

impl DetectedPattern {
    pub fn id_for(pattern_type: PatternType, task_id: &str) -> String {
        format!("{}-{}", pattern_type.as_str(), task_id)
    }

    pub fn primary_task_id(&self) -> Option<&TaskId> {
        self.task_ids.first()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternPreference {
    pub autonomy: Autonomy,
    /// Type-specific threshold (postpone count or days). `None` for types
    /// without one.
    pub threshold: Option<u32>,
}

/// Exactly one preference per pattern type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternPreferences {
    pub postpone: PatternPreference,
    pub deadline_warning: PatternPreference,
    pub auto_client: PatternPreference,
}

impl Default for PatternPreferences {
    fn default() -> Self {
        Self {
            postpone: PatternPreference {
                autonomy: Autonomy::Ask,
                threshold: Some(3),
            },
            deadline_warning: PatternPreference {
                autonomy: Autonomy::Ask,
                threshold: Some(2),
            },
            auto_client: PatternPreference {
                autonomy: Autonomy::Off,
                threshold: None,
            },
        }
    }
}

impl PatternPreferences {
    pub fn get(&self, pattern_type: PatternType) -> &PatternPreference {
        match pattern_type {
            PatternType::Postpone => &self.postpone,
            PatternType::DeadlineWarning => &self.deadline_warning,
            PatternType::AutoClient => &self.auto_client,
        }
    }

    pub fn get_mut(&mut self, pattern_type: PatternType) -> &mut PatternPreference {
        match pattern_type {
            PatternType::Postpone => &mut self.postpone,
            PatternType::DeadlineWarning => &mut self.deadline_warning,
            PatternType::AutoClient => &mut self.auto_client,
        }
    }
}

/// Append-only record of a user dismissal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DismissedPattern {
    pub pattern_type: PatternType,
    /// `None` silences the whole type.
    pub task_id: Option<TaskId>,
    pub dismissed_at: DateTime<Utc>,
    pub permanent: bool,
}

impl DismissedPattern {
    /// Whether this record silences `pattern_type` for `task_id`.
    ///
    /// Permanent records without a task silence the whole type. Task-scoped
    /// records silence that task for good.
    pub fn suppresses(&self, pattern_type: PatternType, task_id: &str) -> bool {
        if self.pattern_type != pattern_type {
            return false;
        }
        match &self.task_id {
            Some(id) => id == task_id,
            None => self.permanent,
        }
    }
}

/// Suggestion quota counters. Reset lazily when read on a later day/week.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitState {
    pub suggestions_shown_today: u32,
    pub last_suggestion_date: Option<NaiveDate>,
    pub suggestions_shown_this_week: u32,
    pub week_start_date: Option<NaiveDate>,
}

impl RateLimitState {
    /// Suggestions shown on `today`.
    pub fn shown_on(&self, today: NaiveDate) -> u32 {
        if self.last_suggestion_date == Some(today) {
            self.suggestions_shown_today
        } else {
            0
        }
    }

    /// Suggestions shown in the Monday-based week containing `today`.
    pub fn shown_in_week(&self, today: NaiveDate) -> u32 {
        if self.week_start_date == Some(week_start(today)) {
            self.suggestions_shown_this_week
        } else {
            0
        }
    }

    pub fn allows(&self, today: NaiveDate, quotas: Quotas) -> bool {
        self.shown_on(today) < quotas.per_day && self.shown_in_week(today) < quotas.per_week
    }

    /// Count one shown suggestion, rolling stale counters first.
    pub fn record(&mut self, today: NaiveDate) {
        self.suggestions_shown_today = self.shown_on(today) + 1;
        self.suggestions_shown_this_week = self.shown_in_week(today) + 1;
        self.last_suggestion_date = Some(today);
        self.week_start_date = Some(week_start(today));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quotas {
    pub per_day: u32,
    pub per_week: u32,
}

impl Default for Quotas {
    fn default() -> Self {
        Self {
            per_day: 3,
            per_week: 10,
        }
    }
}

/// A remedy the detector applies without asking (autonomy `auto`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AutoAction {
    MarkOptional { task_id: TaskId },
    AssignClient { task_id: TaskId, client_id: ClientId },
}
