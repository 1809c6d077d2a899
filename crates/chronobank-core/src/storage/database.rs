//! SQLite-backed server of record for completed sessions.
//!
//! A timer session only lands here once it has stopped; rows are never
//! updated afterwards. The period aggregator consumes these rows.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::stats::CompletedSession;
use crate::storage::data_dir;
use crate::timer::SessionKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub task_id: Option<String>,
    pub kind: String,
    pub duration_seconds: u64,
    pub hourly_rate: Option<f64>,
    /// `None` when no hourly rate was configured at session time. Such
    /// sessions count toward hours totals but not earnings.
    pub earnings_usd: Option<f64>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl From<&SessionRecord> for CompletedSession {
    fn from(record: &SessionRecord) -> Self {
        CompletedSession {
            duration_seconds: record.duration_seconds,
            earnings_usd: record.earnings_usd,
            started_at: record.started_at,
        }
    }
}

/// SQLite database of completed sessions.
pub struct SessionDb {
    conn: Connection,
}

impl SessionDb {
    /// Open the database at `~/.config/chronobank/sessions.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open() -> Result<Self, StorageError> {
        let path = data_dir()
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?
            .join("sessions.db");
        let conn = Connection::open(&path).map_err(|source| StorageError::OpenFailed {
            path,
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (tests, dry runs).
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                task_id          TEXT,
                kind             TEXT NOT NULL,
                duration_seconds INTEGER NOT NULL,
                hourly_rate      REAL,
                earnings_usd     REAL,
                started_at       TEXT NOT NULL,
                ended_at         TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_started_at ON sessions(started_at);
            CREATE INDEX IF NOT EXISTS idx_sessions_task_id ON sessions(task_id);",
        )?;
        Ok(())
    }

    /// Durably record a completed session.
    ///
    /// Earnings are computed here, once: `hourly_rate * hours` when a rate
    /// is present, `NULL` otherwise.
    pub fn record_session(
        &self,
        task_id: Option<&str>,
        kind: SessionKind,
        duration_seconds: u64,
        hourly_rate: Option<f64>,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Result<SessionRecord, StorageError> {
        let kind_str = match kind {
            SessionKind::Focus => "focus",
            SessionKind::Break => "break",
            SessionKind::LongBreak => "long_break",
        };
        let earnings_usd = hourly_rate.map(|rate| rate * duration_seconds as f64 / 3600.0);
        self.conn.execute(
            "INSERT INTO sessions (task_id, kind, duration_seconds, hourly_rate, earnings_usd, started_at, ended_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                task_id,
                kind_str,
                duration_seconds,
                hourly_rate,
                earnings_usd,
                started_at.to_rfc3339(),
                ended_at.to_rfc3339(),
            ],
        )?;
        Ok(SessionRecord {
            id: self.conn.last_insert_rowid(),
            task_id: task_id.map(str::to_string),
            kind: kind_str.to_string(),
            duration_seconds,
            hourly_rate,
            earnings_usd,
            started_at,
            ended_at,
        })
    }

    /// All sessions, oldest first.
    pub fn list_all(&self) -> Result<Vec<SessionRecord>, StorageError> {
        self.query(
            "SELECT id, task_id, kind, duration_seconds, hourly_rate, earnings_usd, started_at, ended_at
             FROM sessions ORDER BY started_at",
            &[],
        )
    }

    /// Sessions started at or after `since`, oldest first.
    pub fn list_since(&self, since: DateTime<Utc>) -> Result<Vec<SessionRecord>, StorageError> {
        self.query(
            "SELECT id, task_id, kind, duration_seconds, hourly_rate, earnings_usd, started_at, ended_at
             FROM sessions WHERE started_at >= ?1 ORDER BY started_at",
            &[&since.to_rfc3339()],
        )
    }

    fn query(
        &self,
        sql: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<SessionRecord>, StorageError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(args, |row| {
            let started: String = row.get(6)?;
            let ended: String = row.get(7)?;
            Ok(SessionRecord {
                id: row.get(0)?,
                task_id: row.get(1)?,
                kind: row.get(2)?,
                duration_seconds: row.get(3)?,
                hourly_rate: row.get(4)?,
                earnings_usd: row.get(5)?,
                started_at: parse_rfc3339(&started, 6)?,
                ended_at: parse_rfc3339(&ended, 7)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

fn parse_rfc3339(value: &str, column: usize) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn record_computes_earnings_from_rate() {
        let db = SessionDb::open_in_memory().unwrap();
        let start: DateTime<Utc> = "2026-03-04T09:00:00Z".parse().unwrap();
        let record = db
            .record_session(
                Some("t1"),
                SessionKind::Focus,
                1800,
                Some(100.0),
                start,
                start + Duration::seconds(1800),
            )
            .unwrap();
        assert_eq!(record.earnings_usd, Some(50.0));

        let rows = db.list_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].earnings_usd, Some(50.0));
        assert_eq!(rows[0].started_at, start);
    }

    #[test]
    fn no_rate_means_null_earnings() {
        let db = SessionDb::open_in_memory().unwrap();
        let start: DateTime<Utc> = "2026-03-04T09:00:00Z".parse().unwrap();
        let record = db
            .record_session(None, SessionKind::Break, 300, None, start, start)
            .unwrap();
        assert_eq!(record.earnings_usd, None);
        assert_eq!(db.list_all().unwrap()[0].earnings_usd, None);
    }

    #[test]
    fn list_since_filters_by_start() {
        let db = SessionDb::open_in_memory().unwrap();
        let early: DateTime<Utc> = "2026-03-01T09:00:00Z".parse().unwrap();
        let late: DateTime<Utc> = "2026-03-04T09:00:00Z".parse().unwrap();
        db.record_session(None, SessionKind::Focus, 600, None, early, early)
            .unwrap();
        db.record_session(None, SessionKind::Focus, 600, None, late, late)
            .unwrap();

        let since: DateTime<Utc> = "2026-03-02T00:00:00Z".parse().unwrap();
        let rows = db.list_since(since).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].started_at, late);
    }
}
