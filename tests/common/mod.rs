#![allow(dead_code)]

use chrono::{DateTime, Duration, NaiveDate, Utc};

use tally::model::{Client, Priority, Subtask, Task, TaskStatus};
use tally::store::InMemoryTaskStore;

/// Tuesday.
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
}

pub fn tomorrow() -> NaiveDate {
    today() + Duration::days(1)
}

pub fn now() -> DateTime<Utc> {
    today().and_hms_opt(9, 0, 0).unwrap().and_utc()
}

pub fn acme() -> Client {
    Client::new("c-acme", "Acme")
}

pub fn task(id: &str, title: &str, date: NaiveDate) -> Task {
    Task {
        id: id.to_string(),
        title: title.to_string(),
        description: None,
        status: TaskStatus::Todo,
        priority: Priority::Medium,
        scheduled_date: date,
        created_at: now() - Duration::hours(1),
        completed_at: None,
        client_id: None,
        is_meeting: false,
        meeting_time: None,
        is_optional: false,
        deadline: None,
        subtasks: Vec::new(),
        time_entries: Vec::new(),
        postpone_count: 0,
        original_date: None,
        recurrence: None,
    }
}

pub fn completed(mut task: Task) -> Task {
    task.status = TaskStatus::Completed;
    task.completed_at = Some(now());
    task
}

pub fn postponed(id: &str, title: &str, count: u32) -> Task {
    let mut task = task(id, title, today());
    task.postpone_count = count;
    task.original_date = Some(today() - Duration::days(count as i64));
    task
}

pub fn with_deadline(id: &str, title: &str, days_from_today: i64) -> Task {
    let mut task = task(id, title, today());
    task.deadline = Some(today() + Duration::days(days_from_today));
    task
}

pub fn with_subtasks(mut task: Task, done: usize, total: usize) -> Task {
    task.subtasks = (0..total)
        .map(|i| Subtask {
            id: format!("{}-s{i}", task.id),
            title: format!("Schritt {}", i + 1),
            completed: i < done,
        })
        .collect();
    task
}

pub fn store_with(tasks: Vec<Task>) -> InMemoryTaskStore {
    let mut store = InMemoryTaskStore::new();
    store.insert_client(acme());
    for task in tasks {
        store.insert_task(task);
    }
    store
}
