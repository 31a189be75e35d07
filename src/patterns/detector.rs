//! Pure pattern detection.
//!
//! `detect` looks at one snapshot and decides what to surface. It never
//! touches the store: quota use and the active-set swap are applied by
//! `PatternStore::apply_scan`, auto remedies by the caller.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use super::types::{
    AutoAction, Autonomy, DetectedPattern, DismissedPattern, PatternPayload, PatternPreferences,
    PatternPriority, PatternType, PostponeAction, Quotas, RateLimitState, RenderTarget,
};
use crate::intent::resolve::title_mentions_name;
use crate::kernel::time::date_label;
use crate::model::{Client, Task};

pub const DEFAULT_POSTPONE_THRESHOLD: u32 = 3;
pub const DEFAULT_DEADLINE_THRESHOLD_DAYS: u32 = 2;
const POSTPONE_HIGH_AT: u32 = 5;
const PROGRESS_RATIO: f64 = 0.5;

/// Everything one scan reads.
#[derive(Debug, Clone)]
pub struct DetectionSnapshot<'a> {
    pub tasks: &'a [Task],
    pub clients: &'a [Client],
    pub preferences: PatternPreferences,
    pub dismissed: &'a [DismissedPattern],
    pub rate_limit: RateLimitState,
    pub quotas: Quotas,
    /// Ids of patterns visible before this scan.
    pub active_ids: HashSet<String>,
    pub today: NaiveDate,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionOutcome {
    /// New active set, in detection order.
    pub patterns: Vec<DetectedPattern>,
    /// Remedies to apply without asking.
    pub auto_actions: Vec<AutoAction>,
    /// Patterns that were not active before and count against the quota.
    pub newly_shown: Vec<String>,
}

/// A pattern the detector would like to show, before gating.
struct Finding {
    pattern: DetectedPattern,
    auto_action: Option<AutoAction>,
}

struct Gate<'a> {
    snapshot: &'a DetectionSnapshot<'a>,
    rate_limit: RateLimitState,
    outcome: DetectionOutcome,
}

impl<'a> Gate<'a> {
    fn new(snapshot: &'a DetectionSnapshot<'a>) -> Self {
        Self {
            snapshot,
            rate_limit: snapshot.rate_limit,
            outcome: DetectionOutcome::default(),
        }
    }

    fn dismissed(&self, pattern_type: PatternType, task_id: &str) -> bool {
        self.snapshot
            .dismissed
            .iter()
            .any(|d| d.suppresses(pattern_type, task_id))
    }

    fn offer(&mut self, finding: Finding) {
        let pattern = finding.pattern;
        // 1. Already visible: keep, no quota.
        if self.snapshot.active_ids.contains(&pattern.id) {
            self.outcome.patterns.push(pattern);
            return;
        }
        // 2. New: needs quota.
        if !self.rate_limit.allows(self.snapshot.today, self.snapshot.quotas) {
            debug!(pattern_type = pattern.pattern_type.as_str(), "quota exhausted, skipped");
            return;
        }
        self.rate_limit.record(self.snapshot.today);
        self.outcome.newly_shown.push(pattern.id.clone());
        if let Some(action) = finding.auto_action {
            self.outcome.auto_actions.push(action);
        }
        self.outcome.patterns.push(pattern);
    }
}

fn render_target(autonomy: Autonomy) -> RenderTarget {
    match autonomy {
        Autonomy::Auto => RenderTarget::Toast,
        _ => RenderTarget::Inline,
    }
}

fn postpone_finding(
    task: &Task,
    autonomy: Autonomy,
    threshold: u32,
    now: DateTime<Utc>,
) -> Option<Finding> {
    if task.is_completed() || task.is_meeting || task.is_optional || task.postpone_count < threshold {
        return None;
    }
    let priority = if task.postpone_count >= POSTPONE_HIGH_AT {
        PatternPriority::High
    } else {
        PatternPriority::Medium
    };
    let (description, auto_action) = match autonomy {
        Autonomy::Auto => (
            format!(
                "„{}“ wurde {}-mal verschoben und ist jetzt optional.",
                task.title, task.postpone_count
            ),
            Some(AutoAction::MarkOptional {
                task_id: task.id.clone(),
            }),
        ),
        _ => (
            format!(
                "„{}“ wurde schon {}-mal verschoben. Als optional markieren, neu planen, depriorisieren oder löschen?",
                task.title, task.postpone_count
            ),
            None,
        ),
    };
    Some(Finding {
        pattern: DetectedPattern {
            id: DetectedPattern::id_for(PatternType::Postpone, &task.id),
            pattern_type: PatternType::Postpone,
            task_ids: vec![task.id.clone()],
            title: "Immer wieder verschoben".to_string(),
            description,
            detected_at: now,
            render_target: render_target(autonomy),
            priority,
            payload: PatternPayload::Postpone {
                postpone_count: task.postpone_count,
                original_date: task.original_date,
                suggested_actions: PostponeAction::OFFERED.to_vec(),
            },
        },
        auto_action,
    })
}

/// Visible progress: more than half the subtasks done, or any tracked time
/// when there are no subtasks.
fn has_progress(task: &Task, now: DateTime<Utc>) -> bool {
    match task.subtask_progress() {
        Some((done, total)) => done as f64 / total as f64 > PROGRESS_RATIO,
        None => task.tracked_time(now) > chrono::Duration::zero(),
    }
}

fn deadline_finding(
    task: &Task,
    autonomy: Autonomy,
    threshold: u32,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Option<Finding> {
    let deadline = task.deadline?;
    if task.is_completed() || task.is_meeting {
        return None;
    }
    let days_remaining = (deadline - today).num_days();
    if days_remaining > i64::from(threshold) {
        return None;
    }
    // Overdue or due today is never suppressed.
    if days_remaining > 0 && has_progress(task, now) {
        return None;
    }
    let (title, priority) = if days_remaining < 0 {
        ("Deadline überschritten", PatternPriority::High)
    } else if days_remaining == 0 {
        ("Deadline heute", PatternPriority::High)
    } else {
        ("Deadline naht", PatternPriority::Medium)
    };
    let description = if days_remaining < 0 {
        format!(
            "„{}“ ist seit {} Tag(en) überfällig.",
            task.title,
            days_remaining.abs()
        )
    } else {
        format!(
            "„{}“ ist {} fällig und hat noch kaum Fortschritt.",
            task.title,
            date_label(deadline, today)
        )
    };
    Some(Finding {
        pattern: DetectedPattern {
            id: DetectedPattern::id_for(PatternType::DeadlineWarning, &task.id),
            pattern_type: PatternType::DeadlineWarning,
            task_ids: vec![task.id.clone()],
            title: title.to_string(),
            description,
            detected_at: now,
            render_target: render_target(autonomy),
            priority,
            payload: PatternPayload::DeadlineWarning {
                deadline,
                days_remaining,
                subtask_progress: task.subtask_progress(),
            },
        },
        auto_action: None,
    })
}

fn auto_client_finding(
    task: &Task,
    clients: &[Client],
    autonomy: Autonomy,
    now: DateTime<Utc>,
) -> Option<Finding> {
    if task.is_completed() || task.client_id.is_some() {
        return None;
    }
    let client = clients
        .iter()
        .filter(|c| c.is_active)
        .find(|c| title_mentions_name(&task.title, &c.name))?;
    let (description, auto_action) = match autonomy {
        Autonomy::Auto => (
            format!("„{}“ wurde {} zugeordnet.", task.title, client.name),
            Some(AutoAction::AssignClient {
                task_id: task.id.clone(),
                client_id: client.id.clone(),
            }),
        ),
        _ => (
            format!("„{}“ erwähnt {}. Kunden zuordnen?", task.title, client.name),
            None,
        ),
    };
    Some(Finding {
        pattern: DetectedPattern {
            id: DetectedPattern::id_for(PatternType::AutoClient, &task.id),
            pattern_type: PatternType::AutoClient,
            task_ids: vec![task.id.clone()],
            title: "Kunde erkannt".to_string(),
            description,
            detected_at: now,
            render_target: render_target(autonomy),
            priority: PatternPriority::Low,
            payload: PatternPayload::AutoClient {
                client_id: client.id.clone(),
                client_name: client.name.clone(),
            },
        },
        auto_action,
    })
}

/// Run all detectors over `snapshot`. Detection order is postpone, deadline,
/// client; within a type, store order. Quota is spent in that order.
pub fn detect(snapshot: &DetectionSnapshot) -> DetectionOutcome {
    let prefs = &snapshot.preferences;
    let mut gate = Gate::new(snapshot);

    for pattern_type in PatternType::ALL {
        let pref = prefs.get(pattern_type);
        if pref.autonomy == Autonomy::Off {
            continue;
        }
        for task in snapshot.tasks {
            if gate.dismissed(pattern_type, &task.id) {
                continue;
            }
            let finding = match pattern_type {
                PatternType::Postpone => postpone_finding(
                    task,
                    pref.autonomy,
                    pref.threshold.unwrap_or(DEFAULT_POSTPONE_THRESHOLD),
                    snapshot.now,
                ),
                PatternType::DeadlineWarning => deadline_finding(
                    task,
                    pref.autonomy,
                    pref.threshold.unwrap_or(DEFAULT_DEADLINE_THRESHOLD_DAYS),
                    snapshot.today,
                    snapshot.now,
                ),
                PatternType::AutoClient => {
                    auto_client_finding(task, snapshot.clients, pref.autonomy, snapshot.now)
                }
            };
            if let Some(finding) = finding {
                gate.offer(finding);
            }
        }
    }

    let outcome = gate.outcome;
    debug!(
        patterns = outcome.patterns.len(),
        newly_shown = outcome.newly_shown.len(),
        auto_actions = outcome.auto_actions.len(),
        "scan complete"
    );
    outcome
}
