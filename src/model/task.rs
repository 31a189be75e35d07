use chrono::{DateTime, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

use super::client::ClientId;

pub type TaskId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "niedrig",
            Priority::Medium => "mittel",
            Priority::High => "hoch",
            Priority::Urgent => "dringend",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

/// Wall-clock slot of a meeting, both ends formatted `HH:MM`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingTime {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub title: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub start: DateTime<Utc>,
    /// `None` while the timer is still running.
    pub end: Option<DateTime<Utc>>,
}

impl TimeEntry {
    pub fn duration(&self, now: DateTime<Utc>) -> Duration {
        let end = self.end.unwrap_or(now);
        if end > self.start {
            end - self.start
        } else {
            Duration::zero()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceFrequency {
    Daily,
    Weekdays,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    pub frequency: RecurrenceFrequency,
    /// Anchor weekday for weekly rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday: Option<Weekday>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    pub scheduled_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
    #[serde(default)]
    pub is_meeting: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_time: Option<MeetingTime>,
    #[serde(default)]
    pub is_optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(default)]
    pub time_entries: Vec<TimeEntry>,
    #[serde(default)]
    pub postpone_count: u32,
    /// Date the task was scheduled for before its first postponement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Recurrence>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// `(completed, total)` or `None` when the task has no subtasks.
    pub fn subtask_progress(&self) -> Option<(usize, usize)> {
        if self.subtasks.is_empty() {
            return None;
        }
        let done = self.subtasks.iter().filter(|s| s.completed).count();
        Some((done, self.subtasks.len()))
    }

    pub fn tracked_time(&self, now: DateTime<Utc>) -> Duration {
        self.time_entries
            .iter()
            .fold(Duration::zero(), |acc, e| acc + e.duration(now))
    }
}

/// Write-side shape handed to `TaskStore::add_task`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub scheduled_date: NaiveDate,
    pub client_id: Option<ClientId>,
    pub is_meeting: bool,
    pub meeting_time: Option<MeetingTime>,
    pub deadline: Option<NaiveDate>,
    pub recurrence: Option<Recurrence>,
}

impl NewTask {
    pub fn todo(title: impl Into<String>, scheduled_date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            status: TaskStatus::Todo,
            priority: Priority::default(),
            scheduled_date,
            client_id: None,
            is_meeting: false,
            meeting_time: None,
            deadline: None,
            recurrence: None,
        }
    }
}

/// Partial update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub scheduled_date: Option<NaiveDate>,
    pub client_id: Option<ClientId>,
    pub is_optional: Option<bool>,
    pub postpone_count: Option<u32>,
    pub original_date: Option<NaiveDate>,
}

impl TaskPatch {
    /// Postponement bookkeeping for moving `task` to `target`.
    /// `original_date` is only recorded on the first postponement.
    pub fn postpone(task: &Task, target: NaiveDate) -> Self {
        Self {
            scheduled_date: Some(target),
            postpone_count: Some(task.postpone_count + 1),
            original_date: match task.original_date {
                Some(_) => None,
                None => Some(task.scheduled_date),
            },
            ..Self::default()
        }
    }

    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(date) = self.scheduled_date {
            task.scheduled_date = date;
        }
        if let Some(client_id) = &self.client_id {
            task.client_id = Some(client_id.clone());
        }
        if let Some(optional) = self.is_optional {
            task.is_optional = optional;
        }
        if let Some(count) = self.postpone_count {
            task.postpone_count = count;
        }
        if let Some(original) = self.original_date {
            task.original_date = Some(original);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub id: String,
    pub name: String,
    pub title: String,
    pub priority: Priority,
    pub client_id: Option<ClientId>,
    pub is_meeting: bool,
    pub meeting_time: Option<MeetingTime>,
    pub subtasks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTemplate {
    pub name: String,
    pub title: String,
    pub priority: Priority,
    pub client_id: Option<ClientId>,
    pub is_meeting: bool,
    pub meeting_time: Option<MeetingTime>,
    pub subtasks: Vec<String>,
}

impl NewTemplate {
    pub fn from_task(task: &Task, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: task.title.clone(),
            priority: task.priority,
            client_id: task.client_id.clone(),
            is_meeting: task.is_meeting,
            meeting_time: task.meeting_time.clone(),
            subtasks: task.subtasks.iter().map(|s| s.title.clone()).collect(),
        }
    }
}
