use serde::{Deserialize, Serialize};

use crate::intent::types::IntentKind;
use crate::patterns::PatternType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseOutcome {
    Concrete,
    Suggest,
    Disambiguate,
    Unknown,
}

impl From<IntentKind> for ParseOutcome {
    fn from(kind: IntentKind) -> Self {
        match kind {
            IntentKind::Suggest => ParseOutcome::Suggest,
            IntentKind::Disambiguate => ParseOutcome::Disambiguate,
            IntentKind::Unknown => ParseOutcome::Unknown,
            _ => ParseOutcome::Concrete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationStep {
    Asked,
    Blocked,
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternEventKind {
    Accepted,
    Dismissed { permanent: bool },
    AutoApplied,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    Parsed {
        kind: IntentKind,
        outcome: ParseOutcome,
    },
    Confirmation {
        kind: IntentKind,
        step: ConfirmationStep,
    },
    Executed {
        kind: IntentKind,
        success: bool,
    },
    ScanCompleted {
        active: usize,
        newly_shown: usize,
        auto_actions: usize,
        changed: bool,
    },
    Pattern {
        pattern_type: PatternType,
        event: PatternEventKind,
    },
}
