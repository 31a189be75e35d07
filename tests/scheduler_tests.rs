mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use common::{postponed, store_with, today};
use tally::config::ScanConfig;
use tally::kernel::{Clock, Engine, FixedClock, ScanReason, ScanScheduler, ScanTrigger};
use tally::patterns::{PatternAccess, PatternStore};

const INTERVAL: Duration = Duration::from_secs(60);
const DEBOUNCE: Duration = Duration::from_millis(500);

#[test]
fn test_trigger_scans_once_at_startup() {
    let start = Instant::now();
    let mut trigger = ScanTrigger::new(INTERVAL, DEBOUNCE);

    assert_eq!(trigger.poll(start), Some(ScanReason::Startup));
    assert_eq!(trigger.next_wakeup(start), Duration::ZERO);

    trigger.mark_scanned(start);
    assert_eq!(trigger.poll(start), None);
    assert_eq!(trigger.next_wakeup(start), INTERVAL);
}

#[test]
fn test_trigger_interval() {
    let start = Instant::now();
    let mut trigger = ScanTrigger::new(INTERVAL, DEBOUNCE);
    trigger.mark_scanned(start);

    assert_eq!(trigger.poll(start + INTERVAL / 2), None);
    assert_eq!(trigger.poll(start + INTERVAL), Some(ScanReason::Interval));
}

#[test]
fn test_trigger_debounces_task_changes() {
    let start = Instant::now();
    let mut trigger = ScanTrigger::new(INTERVAL, DEBOUNCE);
    trigger.observe_task_count(4, start);
    trigger.mark_scanned(start);

    // Same count is not a change.
    trigger.observe_task_count(4, start + Duration::from_millis(100));
    assert_eq!(trigger.poll(start + Duration::from_secs(1)), None);

    // A burst of changes restarts the window each time.
    let first = start + Duration::from_secs(2);
    trigger.observe_task_count(5, first);
    trigger.observe_task_count(6, first + Duration::from_millis(300));
    assert_eq!(trigger.poll(first + DEBOUNCE), None);
    assert_eq!(
        trigger.next_wakeup(first + DEBOUNCE),
        Duration::from_millis(300)
    );
    let settled = first + Duration::from_millis(300) + DEBOUNCE;
    assert_eq!(trigger.poll(settled), Some(ScanReason::TasksChanged));

    trigger.mark_scanned(settled);
    assert_eq!(trigger.poll(settled + DEBOUNCE), None);
}

#[test]
fn test_first_count_is_only_a_baseline() {
    let start = Instant::now();
    let mut trigger = ScanTrigger::new(INTERVAL, DEBOUNCE);
    trigger.mark_scanned(start);

    trigger.observe_task_count(3, start);

    assert_eq!(trigger.poll(start + DEBOUNCE * 2), None);
}

#[test]
fn test_trigger_from_config() {
    let config = ScanConfig {
        interval_secs: 10,
        debounce_ms: 250,
    };
    let start = Instant::now();
    let mut trigger = ScanTrigger::from_config(&config);
    trigger.mark_scanned(start);
    assert_eq!(trigger.next_wakeup(start), Duration::from_secs(10));
}

#[tokio::test]
async fn test_scheduler_scans_on_startup_and_after_changes() {
    let engine = Engine::new(
        store_with(vec![postponed("T1", "Steuer", 3)]),
        PatternStore::default(),
    )
    .shared();
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::on(today()));
    let config = ScanConfig {
        interval_secs: 3600,
        debounce_ms: 20,
    };
    let (reports_tx, mut reports_rx) = mpsc::channel(8);
    let (scheduler, task_counts) = ScanScheduler::new(engine.clone(), clock, &config);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(scheduler.with_reports(reports_tx).run(cancel.clone()));

    // 1. Startup scan
    let (reason, report) = timeout(Duration::from_secs(2), reports_rx.recv())
        .await
        .expect("startup scan in time")
        .expect("report");
    assert_eq!(reason, ScanReason::Startup);
    assert_eq!(report.active, 1);
    assert!(report.changed);

    // 2. A new postponed task shows up
    {
        let mut guard = engine.lock().await;
        guard.tasks.insert_task(postponed("T2", "Ablage", 4));
    }
    task_counts.send(2).await.expect("scheduler listening");

    let (reason, report) = timeout(Duration::from_secs(2), reports_rx.recv())
        .await
        .expect("change scan in time")
        .expect("report");
    assert_eq!(reason, ScanReason::TasksChanged);
    assert_eq!(report.active, 2);
    assert_eq!(report.newly_shown, 1);

    // 3. Shutdown
    cancel.cancel();
    timeout(Duration::from_secs(2), handle)
        .await
        .expect("scheduler stops in time")
        .expect("scheduler task");
    assert_eq!(engine.lock().await.patterns.active_patterns().len(), 2);
}

#[tokio::test]
async fn test_scheduler_stops_when_cancelled_before_start() {
    let engine = Engine::new(store_with(Vec::new()), PatternStore::default()).shared();
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::on(today()));
    let (scheduler, _task_counts) = ScanScheduler::new(engine, clock, &ScanConfig::default());
    let cancel = CancellationToken::new();
    cancel.cancel();

    timeout(Duration::from_secs(1), scheduler.run(cancel))
        .await
        .expect("returns immediately");
}
