use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::time::Moment;
use crate::intent::executor::apply_auto_action;
use crate::patterns::{detect, AutoAction, PatternStore, PatternType};
use crate::store::TaskStore;
use crate::telemetry::{PatternEventKind, TelemetryEvent, TelemetryRecorder};

/// Everything a turn or a scan mutates, kept behind one lock.
#[derive(Debug)]
pub struct Engine<S> {
    pub tasks: S,
    pub patterns: PatternStore,
    pub telemetry: TelemetryRecorder,
}

pub type SharedEngine<S> = Arc<Mutex<Engine<S>>>;

impl<S: TaskStore> Engine<S> {
    pub fn new(tasks: S, patterns: PatternStore) -> Self {
        Self {
            tasks,
            patterns,
            telemetry: TelemetryRecorder::new(),
        }
    }

    pub fn shared(self) -> SharedEngine<S> {
        Arc::new(Mutex::new(self))
    }
}

/// Content-free summary of one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub active: usize,
    pub newly_shown: usize,
    pub auto_applied: usize,
    pub changed: bool,
}

fn auto_action_type(action: &AutoAction) -> PatternType {
    match action {
        AutoAction::MarkOptional { .. } => PatternType::Postpone,
        AutoAction::AssignClient { .. } => PatternType::AutoClient,
    }
}

/// One full detection pass: detect, apply auto remedies, then record quota
/// use and swap the active set. Callers hold the engine lock for the whole
/// pass so concurrent scans cannot under-count the quota.
pub fn run_scan<S: TaskStore>(engine: &mut Engine<S>, moment: Moment) -> ScanReport {
    let outcome = {
        let snapshot = engine.patterns.detection_snapshot(
            engine.tasks.tasks(),
            engine.tasks.clients(),
            moment.today,
            moment.now,
        );
        detect(&snapshot)
    };

    let mut auto_applied = 0;
    for action in &outcome.auto_actions {
        match apply_auto_action(action, &mut engine.tasks) {
            Ok(_) => {
                auto_applied += 1;
                engine.telemetry.record(TelemetryEvent::Pattern {
                    pattern_type: auto_action_type(action),
                    event: PatternEventKind::AutoApplied,
                });
            }
            Err(e) => warn!(error = %e, "auto action failed"),
        }
    }

    let changed = engine.patterns.apply_scan(&outcome, moment.today);
    let report = ScanReport {
        active: outcome.patterns.len(),
        newly_shown: outcome.newly_shown.len(),
        auto_applied,
        changed,
    };
    engine.telemetry.record(TelemetryEvent::ScanCompleted {
        active: report.active,
        newly_shown: report.newly_shown,
        auto_actions: report.auto_applied,
        changed,
    });
    if changed || auto_applied > 0 {
        info!(?report, "pattern scan");
    }
    report
}
