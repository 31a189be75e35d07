use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::TaskStore;
use crate::error::StoreError;
use crate::kernel::time::{same_month, week_start};
use crate::model::{Client, NewTask, NewTemplate, Priority, Task, TaskPatch, TaskTemplate};

/// Serializable snapshot used to seed an in-memory store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub templates: Vec<TaskTemplate>,
}

/// Vec-backed implementation of the store trait. Linear scans are fine for
/// a personal task list.
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    tasks: Vec<Task>,
    clients: Vec<Client>,
    templates: Vec<TaskTemplate>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            tasks: snapshot.tasks,
            clients: snapshot.clients,
            templates: snapshot.templates,
        }
    }

    pub fn load_json(path: &Path) -> Result<Self, StoreError> {
        let content = fs::read_to_string(path)
            .map_err(|e| StoreError::Unavailable(format!("{}: {e}", path.display())))?;
        let snapshot: StoreSnapshot = serde_json::from_str(&content)
            .map_err(|e| StoreError::Unavailable(format!("{}: {e}", path.display())))?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            tasks: self.tasks.clone(),
            clients: self.clients.clone(),
            templates: self.templates.clone(),
        }
    }

    pub fn insert_task(&mut self, task: Task) {
        self.tasks.push(task);
    }

    pub fn insert_client(&mut self, client: Client) {
        self.clients.push(client);
    }

    pub fn templates(&self) -> &[TaskTemplate] {
        &self.templates
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn task_mut(&mut self, id: &str) -> Result<&mut Task, StoreError> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::TaskNotFound(id.to_string()))
    }

    fn tracked_where(&self, keep: impl Fn(NaiveDate) -> bool) -> Duration {
        let now = Utc::now();
        self.tasks
            .iter()
            .flat_map(|t| t.time_entries.iter())
            .filter(|e| keep(e.start.date_naive()))
            .fold(Duration::zero(), |acc, e| acc + e.duration(now))
    }
}

fn meeting_start(task: &Task) -> Option<&str> {
    task.meeting_time.as_ref().map(|m| m.start.as_str())
}

fn day_order(a: &Task, b: &Task) -> Ordering {
    match (meeting_start(a), meeting_start(b)) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b
            .priority
            .cmp(&a.priority)
            .then_with(|| a.created_at.cmp(&b.created_at)),
    }
}

impl TaskStore for InMemoryTaskStore {
    fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    fn clients(&self) -> &[Client] {
        &self.clients
    }

    fn add_task(&mut self, new: NewTask) -> Result<Task, StoreError> {
        if new.title.trim().is_empty() {
            return Err(StoreError::Invalid("empty title".to_string()));
        }
        let created_at: DateTime<Utc> = Utc::now();
        let task = Task {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            description: None,
            status: new.status,
            priority: new.priority,
            scheduled_date: new.scheduled_date,
            created_at,
            completed_at: None,
            client_id: new.client_id,
            is_meeting: new.is_meeting,
            meeting_time: new.meeting_time,
            is_optional: false,
            deadline: new.deadline,
            subtasks: Vec::new(),
            time_entries: Vec::new(),
            postpone_count: 0,
            original_date: None,
            recurrence: new.recurrence,
        };
        debug!(task_id = %task.id, "task added");
        self.tasks.push(task.clone());
        Ok(task)
    }

    fn update_task(&mut self, id: &str, patch: TaskPatch) -> Result<Task, StoreError> {
        let task = self.task_mut(id)?;
        patch.apply(task);
        Ok(task.clone())
    }

    fn delete_task(&mut self, id: &str) -> Result<Task, StoreError> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| StoreError::TaskNotFound(id.to_string()))?;
        Ok(self.tasks.remove(index))
    }

    fn set_task_priority(&mut self, id: &str, priority: Priority) -> Result<(), StoreError> {
        self.task_mut(id)?.priority = priority;
        Ok(())
    }

    fn add_template(&mut self, new: NewTemplate) -> Result<TaskTemplate, StoreError> {
        if new.name.trim().is_empty() {
            return Err(StoreError::Invalid("empty template name".to_string()));
        }
        let template = TaskTemplate {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            title: new.title,
            priority: new.priority,
            client_id: new.client_id,
            is_meeting: new.is_meeting,
            meeting_time: new.meeting_time,
            subtasks: new.subtasks,
        };
        self.templates.push(template.clone());
        Ok(template)
    }

    fn net_work_time(&self, date: NaiveDate) -> Duration {
        self.tracked_where(|d| d == date)
    }

    fn weekly_work_time(&self, date: NaiveDate) -> Duration {
        let start = week_start(date);
        self.tracked_where(|d| week_start(d) == start)
    }

    fn monthly_work_time(&self, date: NaiveDate) -> Duration {
        self.tracked_where(|d| same_month(d, date))
    }

    fn tasks_for_date_sorted(&self, date: NaiveDate) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .iter()
            .filter(|t| t.scheduled_date == date)
            .cloned()
            .collect();
        tasks.sort_by(day_order);
        tasks
    }

    fn unfinished_tasks_before_date(&self, date: NaiveDate) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .iter()
            .filter(|t| !t.is_completed() && t.scheduled_date < date)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| a.scheduled_date.cmp(&b.scheduled_date));
        tasks
    }
}
