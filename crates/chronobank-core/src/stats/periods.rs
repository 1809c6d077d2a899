//! Today/week/month earnings-and-hours aggregation.
//!
//! Boundary rules are fixed UTC so client and server compute identical
//! buckets: today at 00:00:00 UTC, the week at 00:00:00 UTC on the ISO
//! Monday, the month at 00:00:00 UTC on day 1. A session belongs to a
//! bucket iff `started_at >= bucket_start`; there is no upper bound
//! because "now" is always inside the current bucket.
//!
//! Monetary rounding happens once, at the very end, so intermediate sums
//! never compound cent-rounding error.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// A finished timer interval as stored by the server of record.
///
/// `earnings_usd = None` means no hourly rate was configured at session
/// time: the session counts toward hours but contributes nothing to
/// earnings (excluded, not $0).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedSession {
    pub duration_seconds: u64,
    pub earnings_usd: Option<f64>,
    pub started_at: DateTime<Utc>,
}

/// Totals for one bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodTotals {
    pub earnings_usd: f64,
    pub hours: f64,
    pub sessions: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeriodAggregates {
    pub today: PeriodTotals,
    pub week: PeriodTotals,
    pub month: PeriodTotals,
    pub total: PeriodTotals,
    /// Total earnings over total hours. Hours from rate-less sessions stay
    /// in the denominator. Zero when no hours at all.
    pub average_hourly_rate: f64,
}

/// 00:00:00 UTC of the current date.
pub fn day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_time(NaiveTime::MIN)
        .and_utc()
}

/// 00:00:00 UTC on the Monday of the current ISO week. A Sunday maps to
/// six days after the prior Monday.
pub fn week_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let days_since_monday = now.weekday().num_days_from_monday() as i64;
    day_start(now) - Duration::days(days_since_monday)
}

/// 00:00:00 UTC on day 1 of the current month.
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .with_day(1)
        .expect("day 1 exists in every month")
        .and_time(NaiveTime::MIN)
        .and_utc()
}

/// Roll completed sessions up into today/week/month/all-time totals.
pub fn aggregate(sessions: &[CompletedSession], now: DateTime<Utc>) -> PeriodAggregates {
    let today = day_start(now);
    let week = week_start(now);
    let month = month_start(now);

    let mut agg = PeriodAggregates::default();

    for session in sessions {
        let hours = session.duration_seconds as f64 / 3600.0;
        let earnings = session.earnings_usd.unwrap_or(0.0);

        accumulate(&mut agg.total, earnings, hours);
        if session.started_at >= month {
            accumulate(&mut agg.month, earnings, hours);
        }
        if session.started_at >= week {
            accumulate(&mut agg.week, earnings, hours);
        }
        if session.started_at >= today {
            accumulate(&mut agg.today, earnings, hours);
        }
    }

    agg.average_hourly_rate = if agg.total.hours > 0.0 {
        agg.total.earnings_usd / agg.total.hours
    } else {
        0.0
    };

    // Single rounding pass at the end, for monetary outputs only; hours
    // stay exact.
    for bucket in [
        &mut agg.today,
        &mut agg.week,
        &mut agg.month,
        &mut agg.total,
    ] {
        bucket.earnings_usd = round_cents(bucket.earnings_usd);
    }
    agg.average_hourly_rate = round_cents(agg.average_hourly_rate);

    agg
}

fn accumulate(bucket: &mut PeriodTotals, earnings: f64, hours: f64) {
    bucket.earnings_usd += earnings;
    bucket.hours += hours;
    bucket.sessions += 1;
}

fn round_cents(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(earnings: Option<f64>, duration: u64, started_at: &str) -> CompletedSession {
        CompletedSession {
            duration_seconds: duration,
            earnings_usd: earnings,
            started_at: started_at.parse().unwrap(),
        }
    }

    #[test]
    fn same_day_sessions_roll_up() {
        // 2026-03-04 is a Wednesday.
        let now: DateTime<Utc> = "2026-03-04T14:00:00Z".parse().unwrap();
        let sessions = vec![
            session(Some(100.0), 3600, "2026-03-04T00:00:00Z"),
            session(Some(50.0), 1800, "2026-03-04T02:00:00Z"),
        ];
        let agg = aggregate(&sessions, now);
        assert_eq!(agg.today.earnings_usd, 150.0);
        assert_eq!(agg.today.hours, 1.5);
        assert_eq!(agg.today.sessions, 2);
        assert_eq!(agg.average_hourly_rate, 100.0);
    }

    #[test]
    fn null_earnings_count_hours_not_earnings() {
        let now: DateTime<Utc> = "2026-03-04T14:00:00Z".parse().unwrap();
        let sessions = vec![
            session(Some(100.0), 3600, "2026-03-04T01:00:00Z"),
            session(None, 1800, "2026-03-04T02:00:00Z"),
        ];
        let agg = aggregate(&sessions, now);
        assert_eq!(agg.today.earnings_usd, 100.0);
        assert_eq!(agg.today.hours, 1.5);
        assert_eq!(agg.today.sessions, 2);
        // The rate-less half hour stays in the denominator.
        assert_eq!(agg.average_hourly_rate, 66.67);
    }

    #[test]
    fn sunday_belongs_to_prior_monday_week() {
        // Sunday 2026-03-08, one second before midnight.
        let now: DateTime<Utc> = "2026-03-08T23:59:59Z".parse().unwrap();
        assert_eq!(
            week_start(now),
            "2026-03-02T00:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );

        let sessions = vec![session(Some(10.0), 600, "2026-03-08T23:59:59Z")];
        let agg = aggregate(&sessions, now);
        assert_eq!(agg.week.sessions, 1);
    }

    #[test]
    fn monday_starts_its_own_week() {
        let monday: DateTime<Utc> = "2026-03-02T00:00:00Z".parse().unwrap();
        assert_eq!(week_start(monday), monday);
    }

    #[test]
    fn buckets_are_nested() {
        let now: DateTime<Utc> = "2026-03-18T12:00:00Z".parse().unwrap();
        let sessions = vec![
            session(Some(10.0), 3600, "2026-03-18T01:00:00Z"), // today
            session(Some(10.0), 3600, "2026-03-16T01:00:00Z"), // this week
            session(Some(10.0), 3600, "2026-03-03T01:00:00Z"), // this month
            session(Some(10.0), 3600, "2026-02-10T01:00:00Z"), // older
        ];
        let agg = aggregate(&sessions, now);
        assert_eq!(agg.today.sessions, 1);
        assert_eq!(agg.week.sessions, 2);
        assert_eq!(agg.month.sessions, 3);
        assert_eq!(agg.total.sessions, 4);
    }

    #[test]
    fn month_boundary_excludes_prior_month() {
        let now: DateTime<Utc> = "2026-03-01T06:00:00Z".parse().unwrap();
        let sessions = vec![
            session(Some(10.0), 3600, "2026-02-28T23:00:00Z"),
            session(Some(10.0), 3600, "2026-03-01T01:00:00Z"),
        ];
        let agg = aggregate(&sessions, now);
        assert_eq!(agg.month.sessions, 1);
        assert_eq!(agg.total.sessions, 2);
    }

    #[test]
    fn rounding_happens_once_at_the_end() {
        let now: DateTime<Utc> = "2026-03-04T14:00:00Z".parse().unwrap();
        // Three thirds of a cent only make one cent when summed first.
        let sessions = vec![
            session(Some(0.333), 1200, "2026-03-04T01:00:00Z"),
            session(Some(0.333), 1200, "2026-03-04T02:00:00Z"),
            session(Some(0.334), 1200, "2026-03-04T03:00:00Z"),
        ];
        let agg = aggregate(&sessions, now);
        assert_eq!(agg.today.earnings_usd, 1.0);
        assert_eq!(agg.today.hours, 1.0);
    }

    #[test]
    fn hours_are_not_rounded() {
        let now: DateTime<Utc> = "2026-03-04T14:00:00Z".parse().unwrap();
        // 1000s is 0.2777... hours; only money gets rounded to cents.
        let sessions = vec![session(Some(10.0), 1000, "2026-03-04T01:00:00Z")];
        let agg = aggregate(&sessions, now);
        assert_eq!(agg.today.hours, 1000.0 / 3600.0);
        assert_eq!(agg.total.hours, 1000.0 / 3600.0);
    }

    #[test]
    fn empty_input_has_zero_rate() {
        let now: DateTime<Utc> = "2026-03-04T14:00:00Z".parse().unwrap();
        let agg = aggregate(&[], now);
        assert_eq!(agg.average_hourly_rate, 0.0);
        assert_eq!(agg.total, PeriodTotals::default());
    }
}
