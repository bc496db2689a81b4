//! SQLite-backed persistence for scheduling records.
//!
//! The store is the single write path for record state: the gateway queues
//! requests through it and the engine applies execution outcomes through
//! it. Outcome writes are compare-and-swap guarded on the `scheduled_for`
//! value observed when the execution started, so a request that arrives
//! mid-execution supersedes the in-flight result.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::info;

use crate::db::init_db;
use crate::error::Result;
use crate::machine;
use crate::types::{QueueAck, SchedulingRecord, StatusReport};

/// Shared handle to the schedules table. Cloning shares the underlying
/// connection; all access is serialised through its mutex.
#[derive(Clone)]
pub struct ScheduleStore {
    conn: Arc<Mutex<Connection>>,
}

impl ScheduleStore {
    /// Wrap a connection, initialising the schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Accept a schedule request for `key`, replacing any pending execution.
    ///
    /// The persisted `scheduled_for` is what arms the execution: the engine
    /// polls for due rows, so the write and the arming are one step.
    pub fn queue_execution(
        &self,
        key: &str,
        delay_seconds: u32,
        target_url: Option<String>,
    ) -> Result<QueueAck> {
        let now = Utc::now();
        let mut record = self.get(key)?.unwrap_or_default();
        let ack = machine::queue(&mut record, now, delay_seconds, target_url);
        self.put(key, &record)?;
        info!(
            %key,
            scheduled_for = %machine::iso(ack.scheduled_for),
            delay_ms = ack.delay_ms,
            "execution queued"
        );
        Ok(ack)
    }

    /// Caller-facing status projection. Absent rows report the empty
    /// default; this is a pure read.
    pub fn status(&self, key: &str) -> Result<StatusReport> {
        Ok(machine::project_status(self.get(key)?.as_ref()))
    }

    /// Load the record for `key`, or `None` if it was never created.
    pub fn get(&self, key: &str) -> Result<Option<SchedulingRecord>> {
        let conn = self.conn.lock().unwrap();
        match conn.query_row(
            "SELECT last_requested_at, scheduled_for, last_executed_at,
                    last_outcome, last_error, retry_count, delay_ms, target_url
             FROM schedules WHERE id = ?1",
            [key],
            row_to_record,
        ) {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Upsert the record for `key`.
    pub fn put(&self, key: &str, record: &SchedulingRecord) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO schedules
             (id, last_requested_at, scheduled_for, last_executed_at,
              last_outcome, last_error, retry_count, delay_ms, target_url, updated_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)
             ON CONFLICT(id) DO UPDATE SET
                 last_requested_at = excluded.last_requested_at,
                 scheduled_for     = excluded.scheduled_for,
                 last_executed_at  = excluded.last_executed_at,
                 last_outcome      = excluded.last_outcome,
                 last_error        = excluded.last_error,
                 retry_count       = excluded.retry_count,
                 delay_ms          = excluded.delay_ms,
                 target_url        = excluded.target_url,
                 updated_at        = excluded.updated_at",
            rusqlite::params![
                key,
                record.last_requested_at.map(machine::iso),
                record.scheduled_for.map(machine::iso),
                record.last_executed_at.map(machine::iso),
                record.last_outcome.map(|o| o.to_string()),
                record.last_error,
                record.retry_count,
                record.delay_ms,
                record.target_url,
                machine::iso(Utc::now()),
            ],
        )?;
        Ok(())
    }

    /// Write `record` only if the row's pending slot still matches
    /// `expected_scheduled_for`. Returns `false` when a concurrent schedule
    /// request superseded the execution and the write was dropped.
    pub fn put_if_scheduled_at(
        &self,
        key: &str,
        record: &SchedulingRecord,
        expected_scheduled_for: DateTime<Utc>,
    ) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE schedules SET
                 last_requested_at = ?2,
                 scheduled_for     = ?3,
                 last_executed_at  = ?4,
                 last_outcome      = ?5,
                 last_error        = ?6,
                 retry_count       = ?7,
                 delay_ms          = ?8,
                 target_url        = ?9,
                 updated_at        = ?10
             WHERE id = ?1 AND scheduled_for = ?11",
            rusqlite::params![
                key,
                record.last_requested_at.map(machine::iso),
                record.scheduled_for.map(machine::iso),
                record.last_executed_at.map(machine::iso),
                record.last_outcome.map(|o| o.to_string()),
                record.last_error,
                record.retry_count,
                record.delay_ms,
                record.target_url,
                machine::iso(Utc::now()),
                machine::iso(expected_scheduled_for),
            ],
        )?;
        Ok(changed > 0)
    }

    /// Keys whose pending execution is due at `now`, soonest first.
    pub fn due_keys(&self, now: DateTime<Utc>) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT id FROM schedules
             WHERE scheduled_for IS NOT NULL AND scheduled_for <= ?1
             ORDER BY scheduled_for",
        )?;
        let keys = stmt
            .query_map([machine::iso(now)], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(keys)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<SchedulingRecord> {
    Ok(SchedulingRecord {
        last_requested_at: parse_ts(row.get::<_, Option<String>>(0)?),
        scheduled_for: parse_ts(row.get::<_, Option<String>>(1)?),
        last_executed_at: parse_ts(row.get::<_, Option<String>>(2)?),
        last_outcome: row
            .get::<_, Option<String>>(3)?
            .and_then(|s| s.parse().ok()),
        last_error: row.get(4)?,
        retry_count: row.get(5)?,
        delay_ms: row.get(6)?,
        target_url: row.get(7)?,
    })
}

fn parse_ts(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
