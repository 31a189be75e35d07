use chrono::NaiveDate;

use crate::intent::types::TaskScope;
use crate::model::Task;

/// Every open task selected by `scope`, in store order.
/// Completed tasks are never implicit targets.
pub fn matching_tasks<'a>(scope: &TaskScope, tasks: &'a [Task], today: NaiveDate) -> Vec<&'a Task> {
    let open = tasks.iter().filter(|t| !t.is_completed());
    match scope {
        TaskScope::Last => last_created_today(tasks, today).into_iter().collect(),
        TaskScope::ById(id) => open.filter(|t| &t.id == id).collect(),
        TaskScope::ByTitle(query) => {
            let query = query.trim().to_lowercase();
            if query.is_empty() {
                return Vec::new();
            }
            open.filter(|t| t.title.to_lowercase().contains(&query)).collect()
        }
    }
}

/// Resolve `scope` to at most one task.
pub fn resolve_task<'a>(scope: &TaskScope, tasks: &'a [Task], today: NaiveDate) -> Option<&'a Task> {
    matching_tasks(scope, tasks, today).into_iter().next()
}

fn last_created_today(tasks: &[Task], today: NaiveDate) -> Option<&Task> {
    // `max_by_key` keeps the later element on ties, so insertion order breaks
    // equal timestamps.
    tasks
        .iter()
        .filter(|t| !t.is_completed() && t.scheduled_date == today)
        .max_by_key(|t| t.created_at)
}
