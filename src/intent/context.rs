use std::collections::VecDeque;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::types::Intent;
use crate::model::{ClientId, TaskId};

pub const DEFAULT_RECENT_LIMIT: usize = 5;

static PRONOUN_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        \b(?:diese\s+aufgabe|diesen\s+task|this\s+task|that\s+task|the\s+last\s+one|die\s+letzte|den\s+letzten|letzte\s+aufgabe)\b
        |(?:^|\s)(?:das|dies|diese[sn]?|es|that|this|it)
          (?:\s+(?:auf|nach|zu|zur|zum|to|bitte|please|als|as|mal|doch|jetzt|optional|wichtig|dringend|unwichtig|weg|löschen|verschieben|markieren)\b|\s*[.!?]?\s*$)",
    )
    .expect("valid pronoun reference regex")
});

/// True if `text` refers back to a task instead of naming one.
pub fn has_pronoun_reference(text: &str) -> bool {
    PRONOUN_REFERENCE.is_match(text.trim())
}

/// Rolling memory of the current session. Read-only while parsing;
/// updated after each successful execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    /// Newest first.
    pub recent_intents: VecDeque<Intent>,
    pub last_referenced_task_id: Option<TaskId>,
    pub last_referenced_client_id: Option<ClientId>,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_RECENT_LIMIT
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::with_limit(DEFAULT_RECENT_LIMIT)
    }
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            recent_intents: VecDeque::with_capacity(limit),
            last_referenced_task_id: None,
            last_referenced_client_id: None,
            limit: limit.max(1),
        }
    }

    /// Context where `task_id` was the last task touched.
    pub fn referencing(task_id: impl Into<TaskId>) -> Self {
        Self {
            last_referenced_task_id: Some(task_id.into()),
            ..Self::default()
        }
    }

    /// Record a successfully executed intent.
    ///
    /// `target_task_id` is the task resolved before execution (or the id of
    /// a task the intent created). `None` leaves the previous reference.
    pub fn record(
        &mut self,
        intent: &Intent,
        target_task_id: Option<TaskId>,
        created_client_id: Option<ClientId>,
    ) {
        if let Some(id) = target_task_id {
            self.last_referenced_task_id = Some(id);
        }
        if let Some(id) = created_client_id {
            self.last_referenced_client_id = Some(id);
        }
        self.recent_intents.push_front(intent.clone());
        self.recent_intents.truncate(self.limit);
    }

    pub fn last_intent(&self) -> Option<&Intent> {
        self.recent_intents.front()
    }
}
