//! When to scan.
//!
//! `ScanTrigger` is the pure policy: scan at startup, then every
//! `interval`, and additionally once the task count has changed and stayed
//! quiet for `debounce`. Bursts of changes coalesce into one scan.
//! `ScanScheduler` drives it with tokio timers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::engine::{run_scan, ScanReport, SharedEngine};
use super::time::Clock;
use crate::config::ScanConfig;
use crate::store::TaskStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanReason {
    Startup,
    Interval,
    TasksChanged,
}

#[derive(Debug, Clone)]
pub struct ScanTrigger {
    interval: Duration,
    debounce: Duration,
    last_scan: Option<Instant>,
    last_task_count: Option<usize>,
    /// Time of the latest unscanned task-count change.
    changed_at: Option<Instant>,
}

impl ScanTrigger {
    pub fn new(interval: Duration, debounce: Duration) -> Self {
        Self {
            interval,
            debounce,
            last_scan: None,
            last_task_count: None,
            changed_at: None,
        }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.interval(), config.debounce())
    }

    /// Report the current task count. A different count (re)starts the
    /// debounce window; the same count is ignored.
    pub fn observe_task_count(&mut self, count: usize, now: Instant) {
        match self.last_task_count {
            Some(previous) if previous == count => {}
            Some(_) => {
                self.last_task_count = Some(count);
                self.changed_at = Some(now);
            }
            // First observation is the baseline.
            None => self.last_task_count = Some(count),
        }
    }

    /// Reason to scan at `now`, if any.
    pub fn poll(&self, now: Instant) -> Option<ScanReason> {
        let Some(last) = self.last_scan else {
            return Some(ScanReason::Startup);
        };
        if let Some(changed) = self.changed_at {
            if now.saturating_duration_since(changed) >= self.debounce {
                return Some(ScanReason::TasksChanged);
            }
        }
        if now.saturating_duration_since(last) >= self.interval {
            return Some(ScanReason::Interval);
        }
        None
    }

    pub fn mark_scanned(&mut self, now: Instant) {
        self.last_scan = Some(now);
        self.changed_at = None;
    }

    /// How long until `poll` could next return a reason.
    pub fn next_wakeup(&self, now: Instant) -> Duration {
        let Some(last) = self.last_scan else {
            return Duration::ZERO;
        };
        let interval_left = (last + self.interval).saturating_duration_since(now);
        match self.changed_at {
            Some(changed) => interval_left.min((changed + self.debounce).saturating_duration_since(now)),
            None => interval_left,
        }
    }
}

/// Runs scans on the shared engine until cancelled.
pub struct ScanScheduler<S> {
    engine: SharedEngine<S>,
    clock: Arc<dyn Clock>,
    trigger: ScanTrigger,
    task_counts: mpsc::Receiver<usize>,
    reports: Option<mpsc::Sender<(ScanReason, ScanReport)>>,
}

impl<S: TaskStore + Send + 'static> ScanScheduler<S> {
    /// Returns the scheduler and the sender for task-count notifications.
    pub fn new(
        engine: SharedEngine<S>,
        clock: Arc<dyn Clock>,
        config: &ScanConfig,
    ) -> (Self, mpsc::Sender<usize>) {
        let (tx, rx) = mpsc::channel(64);
        let scheduler = Self {
            engine,
            clock,
            trigger: ScanTrigger::from_config(config),
            task_counts: rx,
            reports: None,
        };
        (scheduler, tx)
    }

    /// Forward every scan report to `reports`.
    pub fn with_reports(mut self, reports: mpsc::Sender<(ScanReason, ScanReport)>) -> Self {
        self.reports = Some(reports);
        self
    }

    async fn scan(&mut self, reason: ScanReason) {
        let report = {
            let mut engine = self.engine.lock().await;
            let report = run_scan(&mut *engine, self.clock.moment());
            self.trigger
                .observe_task_count(engine.tasks.tasks().len(), Instant::now());
            report
        };
        self.trigger.mark_scanned(Instant::now());
        debug!(?reason, ?report, "scan finished");
        if let Some(reports) = &self.reports {
            // A dropped receiver only means nobody listens any more.
            let _ = reports.send((reason, report)).await;
        }
    }

    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            interval_ms = self.trigger.interval.as_millis() as u64,
            debounce_ms = self.trigger.debounce.as_millis() as u64,
            "scan scheduler started"
        );
        let mut counts_open = true;

        while !cancel.is_cancelled() {
            if let Some(reason) = self.trigger.poll(Instant::now()) {
                self.scan(reason).await;
                continue;
            }
            let wait = self.trigger.next_wakeup(Instant::now());

            tokio::select! {
                _ = cancel.cancelled() => break,
                count = self.task_counts.recv(), if counts_open => match count {
                    Some(count) => self.trigger.observe_task_count(count, Instant::now()),
                    None => counts_open = false,
                },
                _ = sleep(wait) => {}
            }
        }

        info!("scan scheduler stopped");
    }
}
