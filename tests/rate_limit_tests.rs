mod common;

use chrono::{Duration, NaiveDate};

use common::{now, postponed, store_with, today};
use tally::kernel::{run_scan, Engine, Moment};
use tally::patterns::{PatternAccess, PatternStore, PatternType, Quotas, RateLimitState};
use tally::store::InMemoryTaskStore;

fn moment(date: NaiveDate) -> Moment {
    Moment {
        today: date,
        now: date.and_hms_opt(9, 0, 0).unwrap().and_utc(),
    }
}

fn engine_with_postponed(count: usize) -> Engine<InMemoryTaskStore> {
    let tasks = (0..count)
        .map(|i| postponed(&format!("T{i}"), &format!("Aufgabe {i}"), 3))
        .collect();
    Engine::new(store_with(tasks), PatternStore::default())
}

#[test]
fn test_daily_quota_caps_new_suggestions() {
    let mut engine = engine_with_postponed(5);

    let report = run_scan(&mut engine, moment(today()));

    assert_eq!(report.active, 3);
    assert_eq!(report.newly_shown, 3);
    assert!(report.changed);
    assert!(!engine.patterns.can_show_pattern(PatternType::Postpone, today()));
    assert_eq!(engine.patterns.rate_limit().shown_on(today()), 3);
}

#[test]
fn test_rescan_keeps_visible_patterns_without_quota() {
    let mut engine = engine_with_postponed(5);
    run_scan(&mut engine, moment(today()));

    let report = run_scan(&mut engine, moment(today()));

    assert_eq!(report.active, 3);
    assert_eq!(report.newly_shown, 0);
    assert!(!report.changed);
    assert_eq!(engine.patterns.rate_limit().shown_on(today()), 3);
}

#[test]
fn test_quota_resets_next_day() {
    let mut engine = engine_with_postponed(5);
    run_scan(&mut engine, moment(today()));
    let next_day = today() + Duration::days(1);

    assert!(engine.patterns.can_show_pattern(PatternType::Postpone, next_day));
    let report = run_scan(&mut engine, moment(next_day));

    assert_eq!(report.active, 5);
    assert_eq!(report.newly_shown, 2);
    assert_eq!(engine.patterns.rate_limit().shown_on(next_day), 2);
    assert_eq!(engine.patterns.rate_limit().shown_in_week(next_day), 5);
}

#[test]
fn test_weekly_quota_rolls_over_on_monday() {
    let quotas = Quotas::default();
    let monday = NaiveDate::from_ymd_opt(2025, 6, 9).unwrap();
    let mut state = RateLimitState::default();

    // Three a day from Monday to Wednesday, one on Thursday.
    for day in 0..4 {
        let date = monday + Duration::days(day);
        let shown = if day < 3 { 3 } else { 1 };
        for _ in 0..shown {
            assert!(state.allows(date, quotas));
            state.record(date);
        }
    }

    let friday = monday + Duration::days(4);
    assert_eq!(state.shown_in_week(friday), 10);
    assert!(!state.allows(friday, quotas));
    assert!(state.allows(monday + Duration::days(7), quotas));
}

#[test]
fn test_dismissing_twice_equals_dismissing_once() {
    let mut engine = engine_with_postponed(1);
    run_scan(&mut engine, moment(today()));
    let id = engine.patterns.active_patterns()[0].id.clone();

    assert!(engine.patterns.dismiss_pattern(&id, false, now()));
    assert!(!engine.patterns.dismiss_pattern(&id, false, now()));

    assert_eq!(engine.patterns.dismissed().len(), 1);
    assert!(engine.patterns.active_patterns().is_empty());
}

#[test]
fn test_dismissed_task_stays_hidden() {
    let mut engine = engine_with_postponed(2);
    run_scan(&mut engine, moment(today()));
    let id = engine.patterns.active_patterns()[0].id.clone();
    engine.patterns.dismiss_pattern(&id, false, now());

    let report = run_scan(&mut engine, moment(today() + Duration::days(1)));

    assert_eq!(report.active, 1);
    assert!(engine.patterns.active_patterns().iter().all(|p| p.id != id));
}

#[test]
fn test_permanent_dismissal_silences_the_type() {
    let mut engine = engine_with_postponed(2);
    run_scan(&mut engine, moment(today()));
    let id = engine.patterns.active_patterns()[0].id.clone();

    engine.patterns.dismiss_pattern(&id, true, now());
    let report = run_scan(&mut engine, moment(today() + Duration::days(1)));

    assert_eq!(report.active, 0);
    assert_eq!(engine.patterns.dismissed()[0].task_id, None);
}

#[test]
fn test_unknown_id_is_ignored() {
    let mut engine = engine_with_postponed(0);
    assert!(!engine.patterns.dismiss_pattern("postpone-nope", true, now()));
    assert!(engine.patterns.dismissed().is_empty());
}
