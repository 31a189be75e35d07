use std::collections::VecDeque;

use serde::Serialize;

use super::event::{ConfirmationStep, ParseOutcome, PatternEventKind, TelemetryEvent};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub parse: ParseStats,
    pub confirmation: ConfirmationStats,
    pub execution: ExecutionStats,
    pub patterns: PatternStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseStats {
    pub total: u64,
    pub concrete: u64,
    pub suggestions: u64,
    pub disambiguations: u64,
    pub unknown: u64,
}

impl ParseStats {
    /// Share of inputs understood without clarification.
    pub fn understood_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.concrete as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfirmationStats {
    pub asked: u64,
    pub blocked: u64,
    pub confirmed: u64,
    pub cancelled: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutionStats {
    pub succeeded: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatternStats {
    pub scans: u64,
    pub surfaced: u64,
    pub accepted: u64,
    pub dismissed: u64,
    pub dismissed_permanently: u64,
    pub auto_applied: u64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for event in events {
        match event {
            TelemetryEvent::Parsed { outcome, .. } => {
                snap.parse.total += 1;
                match outcome {
                    ParseOutcome::Concrete => snap.parse.concrete += 1,
                    ParseOutcome::Suggest => snap.parse.suggestions += 1,
                    ParseOutcome::Disambiguate => snap.parse.disambiguations += 1,
                    ParseOutcome::Unknown => snap.parse.unknown += 1,
                }
            }
            TelemetryEvent::Confirmation { step, .. } => match step {
                ConfirmationStep::Asked => snap.confirmation.asked += 1,
                ConfirmationStep::Blocked => snap.confirmation.blocked += 1,
                ConfirmationStep::Confirmed => snap.confirmation.confirmed += 1,
                ConfirmationStep::Cancelled => snap.confirmation.cancelled += 1,
            },
            TelemetryEvent::Executed { success, .. } => {
                if *success {
                    snap.execution.succeeded += 1;
                } else {
                    snap.execution.failed += 1;
                }
            }
            TelemetryEvent::ScanCompleted { newly_shown, .. } => {
                snap.patterns.scans += 1;
                snap.patterns.surfaced += *newly_shown as u64;
            }
            TelemetryEvent::Pattern { event, .. } => match event {
                PatternEventKind::Accepted => snap.patterns.accepted += 1,
                PatternEventKind::Dismissed { permanent } => {
                    snap.patterns.dismissed += 1;
                    if *permanent {
                        snap.patterns.dismissed_permanently += 1;
                    }
                }
                PatternEventKind::AutoApplied => snap.patterns.auto_applied += 1,
            },
        }
    }

    snap
}
