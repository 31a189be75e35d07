//! Turn driver.
//!
//! A `Session` owns the conversation context and whatever the user is
//! currently being asked (a confirmation, a suggestion list, a task choice).
//! Mutations only run from `confirm`, `choose_candidate` or an accepted
//! pattern suggestion.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::engine::Engine;
use super::time::{date_label, next_weekday, Clock};
use crate::config::IntentConfig;
use crate::intent::confirm::{build_confirmation, ConfirmSnapshot, Confirmation};
use crate::intent::context::ConversationContext;
use crate::intent::executor::{execute_intent, resolve_target_task_id, ExecutionEnv, ExecutionResult};
use crate::intent::parser::{disambiguate, parse_intent, ParseSnapshot};
use crate::intent::types::{
    DeferredAction, Intent, MoveScope, PatternActionType, Suggestion, TaskCandidate, TaskScope,
};
use crate::model::TaskId;
use crate::patterns::{PatternAccess, PatternType, PostponeAction};
use crate::store::TaskStore;
use crate::telemetry::{ConfirmationStep, ParseOutcome, PatternEventKind, TelemetryEvent};

/// What the session answers to one user action.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum Reply {
    /// A read-only question, answered right away.
    Answer { message: String },
    /// Yes/no question; answer with `confirm` or `cancel`.
    Confirm { question: String },
    Blocked { message: String },
    /// Low-confidence alternatives; answer with `choose_suggestion`.
    Suggestions { prompt: String, options: Vec<String> },
    /// Several tasks match; answer with `choose_candidate`.
    Candidates { prompt: String, options: Vec<String> },
    Executed { result: ExecutionResult },
    Cancelled,
    /// Nothing was pending for the action.
    Idle { message: String },
}

impl Reply {
    pub fn text(&self) -> String {
        match self {
            Reply::Answer { message } | Reply::Blocked { message } | Reply::Idle { message } => {
                message.clone()
            }
            Reply::Confirm { question } => question.clone(),
            Reply::Suggestions { prompt, options } | Reply::Candidates { prompt, options } => {
                let lines: Vec<String> = options
                    .iter()
                    .enumerate()
                    .map(|(i, o)| format!("  {}. {o}", i + 1))
                    .collect();
                format!("{prompt}\n{}", lines.join("\n"))
            }
            Reply::Executed { result } => result.message.clone(),
            Reply::Cancelled => "Abgebrochen.".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
enum Pending {
    Confirm(Intent),
    Suggest(Vec<Suggestion>),
    Disambiguate {
        candidates: Vec<TaskCandidate>,
        action: DeferredAction,
        confidence: f32,
    },
}

pub struct Session {
    config: IntentConfig,
    clock: Arc<dyn Clock>,
    context: ConversationContext,
    pending: Option<Pending>,
}

impl Session {
    pub fn new(config: IntentConfig, clock: Arc<dyn Clock>) -> Self {
        let context = ConversationContext::with_limit(config.recent_intent_limit);
        Self {
            config,
            clock,
            context,
            pending: None,
        }
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn handle_input<S: TaskStore>(&mut self, text: &str, engine: &mut Engine<S>) -> Reply {
        let today = self.clock.today();
        let intent = {
            let snapshot = ParseSnapshot {
                today,
                tasks: engine.tasks.tasks(),
                clients: engine.tasks.clients(),
                context: &self.context,
            };
            parse_intent(text, &snapshot, &self.config)
        };
        engine.telemetry.record(TelemetryEvent::Parsed {
            kind: intent.kind(),
            outcome: ParseOutcome::from(intent.kind()),
        });
        debug!(kind = ?intent.kind(), confidence = intent.confidence(), "parsed input");
        self.pending = None;
        self.route(intent, engine)
    }

    /// Answer read-only intents, ask about everything else.
    fn route<S: TaskStore>(&mut self, intent: Intent, engine: &mut Engine<S>) -> Reply {
        match intent {
            Intent::Suggest { suggestions, .. } => {
                let options = suggestions.iter().map(|s| s.label.clone()).collect();
                self.pending = Some(Pending::Suggest(suggestions));
                Reply::Suggestions {
                    prompt: "Meintest du eins davon?".to_string(),
                    options,
                }
            }
            Intent::Disambiguate {
                candidates,
                action,
                confidence,
            } => {
                let today = self.clock.today();
                let options = candidates
                    .iter()
                    .map(|c| format!("{} ({})", c.title, date_label(c.scheduled_date, today)))
                    .collect();
                self.pending = Some(Pending::Disambiguate {
                    candidates,
                    action,
                    confidence,
                });
                Reply::Candidates {
                    prompt: "Welche Aufgabe meinst du?".to_string(),
                    options,
                }
            }
            intent if intent.is_read_only() => {
                let result = self.execute(&intent, engine);
                Reply::Answer {
                    message: result.message,
                }
            }
            intent => match self.confirmation_for(&intent, engine) {
                Some(Confirmation::Ask(question)) => {
                    engine.telemetry.record(TelemetryEvent::Confirmation {
                        kind: intent.kind(),
                        step: ConfirmationStep::Asked,
                    });
                    self.pending = Some(Pending::Confirm(intent));
                    Reply::Confirm { question }
                }
                Some(Confirmation::Blocked(message)) => {
                    engine.telemetry.record(TelemetryEvent::Confirmation {
                        kind: intent.kind(),
                        step: ConfirmationStep::Blocked,
                    });
                    Reply::Blocked { message }
                }
                None => Reply::Idle {
                    message: "Dazu gibt es nichts zu tun.".to_string(),
                },
            },
        }
    }

    fn confirmation_for<S: TaskStore>(&self, intent: &Intent, engine: &Engine<S>) -> Option<Confirmation> {
        let snapshot = ConfirmSnapshot {
            today: self.clock.today(),
            tasks: engine.tasks.tasks(),
            clients: engine.tasks.clients(),
            active_patterns: engine.patterns.active_patterns(),
        };
        build_confirmation(intent, &snapshot)
    }

    /// Run `intent` and update the conversation context on success.
    fn execute<S: TaskStore>(&mut self, intent: &Intent, engine: &mut Engine<S>) -> ExecutionResult {
        let moment = self.clock.moment();
        let target: Option<TaskId> = resolve_target_task_id(intent, engine.tasks.tasks(), moment.today);
        let result = {
            let mut env = ExecutionEnv {
                tasks: &mut engine.tasks,
                patterns: &mut engine.patterns,
                today: moment.today,
                now: moment.now,
            };
            execute_intent(intent, &mut env)
        };
        engine.telemetry.record(TelemetryEvent::Executed {
            kind: intent.kind(),
            success: result.success,
        });
        if result.success {
            let created_client = match intent {
                Intent::CreateTask { client_id, .. } | Intent::CreateRecurringTask { client_id, .. } => {
                    client_id.clone()
                }
                _ => None,
            };
            self.context
                .record(intent, target.or_else(|| result.task_id.clone()), created_client);
        }
        result
    }

    /// Run the pending confirmation.
    pub fn confirm<S: TaskStore>(&mut self, engine: &mut Engine<S>) -> Reply {
        let Some(Pending::Confirm(intent)) = self.pending.take() else {
            return Reply::Idle {
                message: "Es gibt gerade nichts zu bestätigen.".to_string(),
            };
        };
        engine.telemetry.record(TelemetryEvent::Confirmation {
            kind: intent.kind(),
            step: ConfirmationStep::Confirmed,
        });
        let result = self.execute(&intent, engine);
        Reply::Executed { result }
    }

    pub fn cancel<S: TaskStore>(&mut self, engine: &mut Engine<S>) -> Reply {
        match self.pending.take() {
            Some(Pending::Confirm(intent)) => {
                engine.telemetry.record(TelemetryEvent::Confirmation {
                    kind: intent.kind(),
                    step: ConfirmationStep::Cancelled,
                });
                Reply::Cancelled
            }
            Some(_) => Reply::Cancelled,
            None => Reply::Idle {
                message: "Es läuft gerade nichts.".to_string(),
            },
        }
    }

    /// Pick one of the offered suggestions (zero-based). Mutations still
    /// go through confirmation.
    pub fn choose_suggestion<S: TaskStore>(&mut self, index: usize, engine: &mut Engine<S>) -> Reply {
        let suggestions = match self.pending.take() {
            Some(Pending::Suggest(suggestions)) => suggestions,
            other => {
                self.pending = other;
                return Reply::Idle {
                    message: "Es gibt gerade keine Vorschläge.".to_string(),
                };
            }
        };
        let Some(chosen) = suggestions.get(index).cloned() else {
            let count = suggestions.len();
            self.pending = Some(Pending::Suggest(suggestions));
            return Reply::Idle {
                message: format!("Bitte wähle eine Zahl von 1 bis {count}."),
            };
        };
        let intent = disambiguate(chosen.intent, engine.tasks.tasks(), self.clock.today());
        self.route(intent, engine)
    }

    /// Pick one of the offered tasks (zero-based) and run the deferred
    /// action on it. The choice itself counts as confirmation.
    pub fn choose_candidate<S: TaskStore>(&mut self, index: usize, engine: &mut Engine<S>) -> Reply {
        let (candidates, action, confidence) = match self.pending.take() {
            Some(Pending::Disambiguate {
                candidates,
                action,
                confidence,
            }) => (candidates, action, confidence),
            other => {
                self.pending = other;
                return Reply::Idle {
                    message: "Es gibt gerade keine Auswahl.".to_string(),
                };
            }
        };
        let Some(candidate_id) = candidates.get(index).map(|c| c.id.clone()) else {
            let count = candidates.len();
            self.pending = Some(Pending::Disambiguate {
                candidates,
                action,
                confidence,
            });
            return Reply::Idle {
                message: format!("Bitte wähle eine Zahl von 1 bis {count}."),
            };
        };
        let intent = action.replay(TaskScope::ById(candidate_id), confidence);
        if let Some(Confirmation::Blocked(message)) = self.confirmation_for(&intent, engine) {
            return Reply::Blocked { message };
        }
        let result = self.execute(&intent, engine);
        Reply::Executed { result }
    }

    /// Apply an inline pattern suggestion the user clicked.
    ///
    /// Postpone suggestions take the chosen remedy (mark optional when
    /// none is given). Deadline warnings are only acknowledged.
    pub fn accept_pattern_suggestion<S: TaskStore>(
        &mut self,
        pattern_id: &str,
        remedy: Option<PostponeAction>,
        engine: &mut Engine<S>,
    ) -> Reply {
        let Some(pattern) = engine
            .patterns
            .active_patterns()
            .iter()
            .find(|p| p.id == pattern_id)
            .cloned()
        else {
            return Reply::Idle {
                message: "Dieser Vorschlag ist nicht mehr aktuell.".to_string(),
            };
        };
        let Some(task_id) = pattern.primary_task_id().cloned() else {
            engine.patterns.accept_pattern(&pattern.id);
            return Reply::Idle {
                message: "Erledigt.".to_string(),
            };
        };

        let today = self.clock.today();
        let scope = TaskScope::ById(task_id);
        let intent = match (pattern.pattern_type, remedy.unwrap_or(PostponeAction::MarkOptional)) {
            (PatternType::DeadlineWarning, _) => {
                engine.patterns.accept_pattern(&pattern.id);
                engine.telemetry.record(TelemetryEvent::Pattern {
                    pattern_type: pattern.pattern_type,
                    event: PatternEventKind::Accepted,
                });
                return Reply::Answer {
                    message: "Alles klar, ich behalte die Deadline im Blick.".to_string(),
                };
            }
            (PatternType::AutoClient, _) => Intent::PatternAction {
                action: PatternActionType::AcceptClient,
                scope,
                confidence: 1.0,
            },
            (PatternType::Postpone, PostponeAction::MarkOptional) => Intent::PatternAction {
                action: PatternActionType::MarkOptional,
                scope,
                confidence: 1.0,
            },
            (PatternType::Postpone, PostponeAction::Deprioritize) => Intent::PatternAction {
                action: PatternActionType::Deprioritize,
                scope,
                confidence: 1.0,
            },
            (PatternType::Postpone, PostponeAction::Reschedule) => Intent::MoveTasks {
                scope: MoveScope::Task(scope),
                from_date: today,
                target_date: next_weekday(today, chrono::Weekday::Mon),
                confidence: 1.0,
            },
            (PatternType::Postpone, PostponeAction::Delete) => Intent::DeleteTask {
                scope,
                confidence: 1.0,
            },
        };

        if let Some(Confirmation::Blocked(message)) = self.confirmation_for(&intent, engine) {
            return Reply::Blocked { message };
        }
        let result = self.execute(&intent, engine);
        if result.success {
            // No-op when the executor already consumed it.
            engine.patterns.accept_pattern(&pattern.id);
            engine.telemetry.record(TelemetryEvent::Pattern {
                pattern_type: pattern.pattern_type,
                event: PatternEventKind::Accepted,
            });
        }
        Reply::Executed { result }
    }

    /// Hide a pattern suggestion. Unknown ids are ignored.
    pub fn dismiss_pattern_suggestion<S: TaskStore>(
        &mut self,
        pattern_id: &str,
        permanent: bool,
        engine: &mut Engine<S>,
    ) -> bool {
        let pattern_type = engine
            .patterns
            .active_patterns()
            .iter()
            .find(|p| p.id == pattern_id)
            .map(|p| p.pattern_type);
        let dismissed = engine
            .patterns
            .dismiss_pattern(pattern_id, permanent, self.clock.now());
        if let (true, Some(pattern_type)) = (dismissed, pattern_type) {
            engine.telemetry.record(TelemetryEvent::Pattern {
                pattern_type,
                event: PatternEventKind::Dismissed { permanent },
            });
        }
        dismissed
    }
}
