//! End-to-end accounting flow: stop a timer, record it to the session
//! database, feed the ledger, and roll the stored sessions up.

use chrono::{DateTime, Duration, Utc};
use chronobank_core::storage::MemoryStore;
use chronobank_core::{
    aggregate, CompletedSession, DurationPresets, EnergyLedger, EnergyPolicy,
    MultiTimerRegistry, SessionDb, SessionKind, TaskSnapshot,
};

fn t0() -> DateTime<Utc> {
    "2026-03-04T09:00:00Z".parse().unwrap() // A Wednesday.
}

#[test]
fn stop_records_session_and_pays_focus_reward() {
    let start = t0();
    let mut reg = MultiTimerRegistry::new(
        Box::new(MemoryStore::new()),
        DurationPresets::default(),
    );
    let db = SessionDb::open_in_memory().unwrap();
    let policy = EnergyPolicy::default();
    let mut ledger = EnergyLedger::new(100, 100);

    let snapshot = TaskSnapshot {
        task_title: Some("Write report".into()),
        hourly_rate: Some(80.0),
        ..Default::default()
    };
    reg.start_timer_at("task-1", SessionKind::Focus, Some(snapshot), start)
        .unwrap();

    // 50 minutes of work.
    let end = start + Duration::minutes(50);
    let stopped = reg.stop_timer_at("task-1", None, end).unwrap();
    assert_eq!(stopped.outcome.actual_minutes, 50);

    let rate = stopped.session.metadata.as_ref().and_then(|m| m.hourly_rate);
    let record = db
        .record_session(
            stopped.session.task_id.as_deref(),
            stopped.session.kind,
            stopped.outcome.elapsed_secs,
            rate,
            stopped.session.started_at,
            end,
        )
        .unwrap();
    // 50 min at $80/h.
    assert_eq!(record.earnings_usd, Some(80.0 * 3000.0 / 3600.0));

    // Two full pomodoro units of reward, exactly one transaction.
    let tx = ledger
        .record_focus_completion(&policy, stopped.session.task_id.clone(), 50, end)
        .unwrap();
    assert_eq!(tx.energy_delta, 30);
    assert_eq!(ledger.transactions().len(), 1);

    // The stored rows feed the aggregator.
    let sessions: Vec<CompletedSession> =
        db.list_all().unwrap().iter().map(Into::into).collect();
    let agg = aggregate(&sessions, end);
    assert_eq!(agg.today.sessions, 1);
    assert_eq!(agg.today.hours, 3000.0 / 3600.0);
    assert_eq!(agg.today.earnings_usd, 66.67);
}

#[test]
fn short_focus_session_leaves_no_ledger_noise() {
    let start = t0();
    let mut reg = MultiTimerRegistry::new(
        Box::new(MemoryStore::new()),
        DurationPresets::default(),
    );
    let policy = EnergyPolicy::default();
    let mut ledger = EnergyLedger::new(100, 100);

    reg.start_timer_at("task-1", SessionKind::Focus, None, start).unwrap();
    let stopped = reg
        .stop_timer_at("task-1", None, start + Duration::minutes(10))
        .unwrap();
    assert_eq!(stopped.outcome.actual_minutes, 10);

    assert!(ledger
        .record_focus_completion(&policy, None, stopped.outcome.actual_minutes, start)
        .is_none());
    assert!(ledger.transactions().is_empty());
}

#[test]
fn mixed_rate_sessions_aggregate() {
    let db = SessionDb::open_in_memory().unwrap();
    let start = t0();

    // An hour at $100, then a rate-less half hour.
    db.record_session(
        Some("a"),
        SessionKind::Focus,
        3600,
        Some(100.0),
        start,
        start + Duration::hours(1),
    )
    .unwrap();
    db.record_session(
        Some("b"),
        SessionKind::Focus,
        1800,
        None,
        start + Duration::hours(2),
        start + Duration::hours(2) + Duration::minutes(30),
    )
    .unwrap();

    let sessions: Vec<CompletedSession> =
        db.list_all().unwrap().iter().map(Into::into).collect();
    let agg = aggregate(&sessions, start + Duration::hours(3));

    assert_eq!(agg.today.earnings_usd, 100.0);
    assert_eq!(agg.today.hours, 1.5);
    assert_eq!(agg.today.sessions, 2);
    // Rate-less hours stay in the average's denominator.
    assert_eq!(agg.average_hourly_rate, 66.67);
}
