//! Capability surface of the task-store collaborator.
//!
//! The core never owns task state. Parsing and detection read `tasks()` /
//! `clients()` snapshots; execution mutates exclusively through this trait.

pub mod memory;

pub use memory::*;

use chrono::{Duration, NaiveDate};

use crate::error::StoreError;
use crate::model::{Client, NewTask, NewTemplate, Priority, Task, TaskPatch, TaskTemplate};

pub trait TaskStore {
    fn tasks(&self) -> &[Task];
    fn clients(&self) -> &[Client];

    fn add_task(&mut self, task: NewTask) -> Result<Task, StoreError>;
    fn update_task(&mut self, id: &str, patch: TaskPatch) -> Result<Task, StoreError>;
    fn delete_task(&mut self, id: &str) -> Result<Task, StoreError>;
    fn set_task_priority(&mut self, id: &str, priority: Priority) -> Result<(), StoreError>;
    fn add_template(&mut self, template: NewTemplate) -> Result<TaskTemplate, StoreError>;

    /// Time tracked on `date`, summed over all time entries. An entry still
    /// running counts up to now.
    fn net_work_time(&self, date: NaiveDate) -> Duration;
    /// Tracked time for the Monday-based week containing `date`.
    fn weekly_work_time(&self, date: NaiveDate) -> Duration;
    fn monthly_work_time(&self, date: NaiveDate) -> Duration;

    /// Tasks scheduled on `date`: timed meetings first by start, then by
    /// priority (highest first), then creation order.
    fn tasks_for_date_sorted(&self, date: NaiveDate) -> Vec<Task>;
    fn unfinished_tasks_before_date(&self, date: NaiveDate) -> Vec<Task>;
}
