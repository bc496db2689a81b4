use rusqlite::Connection;

use crate::error::Result;

/// Initialise the scheduler schema in `conn`.
///
/// Creates the `schedules` table (idempotent) and an index on
/// `scheduled_for` so the due-row poll stays cheap.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schedules (
            id                TEXT    NOT NULL PRIMARY KEY,
            last_requested_at TEXT,               -- ISO-8601 or NULL
            scheduled_for     TEXT,               -- ISO-8601 or NULL; NULL means idle
            last_executed_at  TEXT,               -- ISO-8601 or NULL
            last_outcome      TEXT,               -- 'success' | 'error' | NULL
            last_error        TEXT,
            retry_count       INTEGER NOT NULL DEFAULT 0,
            delay_ms          INTEGER,
            target_url        TEXT,
            updated_at        TEXT    NOT NULL
        ) STRICT;

        -- Due-row poll: SELECT … WHERE scheduled_for <= ?
        CREATE INDEX IF NOT EXISTS idx_schedules_scheduled_for
            ON schedules (scheduled_for);
        ",
    )?;
    Ok(())
}
