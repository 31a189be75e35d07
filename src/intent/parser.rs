//! Text → `Intent`.
//!
//! 1. Run every scorer against the trimmed input.
//! 2. Keep the best candidate (ties keep scorer order).
//! 3. At or above the confidence threshold: resolve pronoun references
//!    against the conversation context, then check the title scope for
//!    ambiguity.
//! 4. Below it: offer up to `max_suggestions` candidates above the floor,
//!    or give up with `Unknown`.

use std::cmp::Ordering;

use chrono::NaiveDate;
use tracing::debug;

use super::context::{has_pronoun_reference, ConversationContext};
use super::resolve::matching_tasks;
use super::scorers::{ScoringInput, SCORERS};
use super::types::{Intent, ScoredCandidate, Suggestion, TaskCandidate, TaskScope};
use crate::config::IntentConfig;
use crate::model::{Client, Task};

/// Read-only view the parser works against.
#[derive(Debug, Clone, Copy)]
pub struct ParseSnapshot<'a> {
    pub today: NaiveDate,
    pub tasks: &'a [Task],
    pub clients: &'a [Client],
    pub context: &'a ConversationContext,
}

/// Every candidate the scorers produced for `text`, best first.
pub fn score_all(text: &str, snapshot: &ParseSnapshot) -> Vec<ScoredCandidate> {
    let input = ScoringInput::new(text, snapshot.today, snapshot.clients, snapshot.context);
    if input.raw.is_empty() {
        return Vec::new();
    }
    let mut candidates: Vec<ScoredCandidate> = SCORERS
        .iter()
        .filter_map(|(_, scorer)| scorer(&input))
        .collect();
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    candidates
}

/// Threshold step, without context resolution.
pub fn select(
    text: &str,
    candidates: Vec<ScoredCandidate>,
    config: &IntentConfig,
    today: NaiveDate,
) -> Intent {
    let Some(best) = candidates.first() else {
        return Intent::Unknown {
            text: text.trim().to_string(),
            confidence: 0.0,
        };
    };
    if best.score >= config.confidence_threshold {
        return best.intent.clone();
    }

    let top = best.score;
    let suggestions: Vec<Suggestion> = candidates
        .into_iter()
        .filter(|c| c.score > config.suggestion_floor)
        .take(config.max_suggestions)
        .map(|c| Suggestion {
            label: c.intent.label(today),
            intent: c.intent,
        })
        .collect();

    if suggestions.is_empty() {
        Intent::Unknown {
            text: text.trim().to_string(),
            confidence: top,
        }
    } else {
        Intent::Suggest {
            suggestions,
            confidence: top,
        }
    }
}

/// Rewrite a pronoun reference ("verschiebe das auf morgen") to the task
/// touched last.
pub fn resolve_reference(intent: Intent, text: &str, context: &ConversationContext) -> Intent {
    let (Some(_), Some(id)) = (intent.task_scope(), context.last_referenced_task_id.as_ref()) else {
        return intent;
    };
    if !has_pronoun_reference(text) {
        return intent;
    }
    debug!(kind = ?intent.kind(), "scope rewritten from conversation context");
    intent.with_scope(TaskScope::ById(id.clone()))
}

/// Replace a title scope that matches several open tasks with a choice.
pub fn disambiguate(intent: Intent, tasks: &[Task], today: NaiveDate) -> Intent {
    let Some(scope @ TaskScope::ByTitle(_)) = intent.task_scope() else {
        return intent;
    };
    let matches = matching_tasks(scope, tasks, today);
    if matches.len() < 2 {
        return intent;
    }
    let Some(action) = intent.deferred_action() else {
        return intent;
    };
    debug!(kind = ?intent.kind(), candidates = matches.len(), "ambiguous title scope");
    Intent::Disambiguate {
        candidates: matches
            .into_iter()
            .map(|t| TaskCandidate {
                id: t.id.clone(),
                title: t.title.clone(),
                scheduled_date: t.scheduled_date,
            })
            .collect(),
        action,
        confidence: intent.confidence(),
    }
}

/// Parse `text` into an intent. Never panics; unrecognised input yields
/// `Intent::Unknown`.
pub fn parse_intent(text: &str, snapshot: &ParseSnapshot, config: &IntentConfig) -> Intent {
    let candidates = score_all(text, snapshot);
    debug!(
        candidates = candidates.len(),
        best = candidates.first().map(|c| c.score),
        "scored input"
    );

    let selected = select(text, candidates, config, snapshot.today);
    if selected.confidence() < config.confidence_threshold || !selected.is_mutation() {
        return selected;
    }

    let resolved = resolve_reference(selected, text, snapshot.context);
    disambiguate(resolved, snapshot.tasks, snapshot.today)
}
