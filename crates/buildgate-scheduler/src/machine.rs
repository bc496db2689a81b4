//! Pure state transitions for the single-slot delayed-trigger record.
//!
//! Everything here is substrate-agnostic: functions take a record and a
//! clock value and return the mutated record. Persistence and timer arming
//! live in [`crate::store`] and [`crate::engine`].

use chrono::{DateTime, Duration, SecondsFormat, Utc};

use crate::types::{Outcome, QueueAck, SchedulingRecord, StatusReport};

/// Retry delays indexed by consecutive-failure count (1-based). Failure
/// streaks longer than the table stay at the last entry, so retries after
/// the third failure continue at a fixed 5-minute cadence with no cap.
const BACKOFF_MS: [i64; 3] = [60_000, 120_000, 300_000];

/// Hard cap on the persisted error description, marker included.
pub const MAX_ERROR_LEN: usize = 500;
const TRUNCATION_MARKER: &str = "... [truncated]";

/// Retry delay for the given consecutive-failure count (after increment).
pub fn retry_delay_ms(retry_count: u32) -> i64 {
    let idx = (retry_count.clamp(1, BACKOFF_MS.len() as u32) - 1) as usize;
    BACKOFF_MS[idx]
}

/// Accept a schedule request: replaces any pending execution wholesale and
/// resets the failure streak. The caller persists the record afterwards.
pub fn queue(
    record: &mut SchedulingRecord,
    now: DateTime<Utc>,
    delay_seconds: u32,
    target_url: Option<String>,
) -> QueueAck {
    let delay_ms = i64::from(delay_seconds) * 1000;
    let scheduled_for = now + Duration::milliseconds(delay_ms);

    record.last_requested_at = Some(now);
    record.scheduled_for = Some(scheduled_for);
    record.delay_ms = Some(delay_ms);
    record.target_url = target_url;
    record.retry_count = 0;

    QueueAck {
        last_requested_at: now,
        scheduled_for,
        delay_ms,
    }
}

/// Terminal success: clears the pending slot and the failure streak.
pub fn apply_success(record: &mut SchedulingRecord, now: DateTime<Utc>) {
    record.last_executed_at = Some(now);
    record.last_outcome = Some(Outcome::Success);
    record.last_error = None;
    record.retry_count = 0;
    record.scheduled_for = None;
}

/// Failed attempt: bumps the streak and re-arms at the backoff delay.
/// Returns the chosen retry delay in milliseconds.
pub fn apply_failure(record: &mut SchedulingRecord, now: DateTime<Utc>, error: &str) -> i64 {
    record.retry_count += 1;
    let delay_ms = retry_delay_ms(record.retry_count);

    record.last_executed_at = Some(now);
    record.last_outcome = Some(Outcome::Error);
    record.last_error = Some(truncate_error(error));
    record.scheduled_for = Some(now + Duration::milliseconds(delay_ms));

    delay_ms
}

/// No target was resolvable at fire time. Recorded like a failure but the
/// slot is not re-armed: the condition cannot clear without operator action.
pub fn apply_config_failure(record: &mut SchedulingRecord, now: DateTime<Utc>, error: &str) {
    record.retry_count += 1;
    record.last_executed_at = Some(now);
    record.last_outcome = Some(Outcome::Error);
    record.last_error = Some(truncate_error(error));
    record.scheduled_for = None;
}

/// Clamp `message` to [`MAX_ERROR_LEN`] characters, marker included.
pub fn truncate_error(message: &str) -> String {
    if message.chars().count() <= MAX_ERROR_LEN {
        return message.to_string();
    }
    let keep = MAX_ERROR_LEN - TRUNCATION_MARKER.chars().count();
    let mut out: String = message.chars().take(keep).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

/// Project a record (or its absence) into the caller-facing status shape.
pub fn project_status(record: Option<&SchedulingRecord>) -> StatusReport {
    match record {
        None => StatusReport::default(),
        Some(r) => StatusReport {
            last_webhook_at: r.last_requested_at.map(iso),
            scheduled_for: r.scheduled_for.map(iso),
            last_build_at: r.last_executed_at.map(iso),
            last_build_status: r.last_outcome,
            last_error: r.last_error.clone(),
            retry_count: r.retry_count,
            delay_ms: r.delay_ms,
            webhook_url: r.target_url.clone(),
        },
    }
}

/// RFC 3339 with millisecond precision — the canonical rendering for both
/// the wire and the database, chosen so stored strings compare
/// lexicographically in due-time order.
pub fn iso(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        "2026-08-07T12:00:00.000Z".parse().unwrap()
    }

    #[test]
    fn queue_sets_exact_scheduled_for() {
        let mut record = SchedulingRecord::default();
        let ack = queue(&mut record, now(), 60, None);

        assert_eq!(ack.delay_ms, 60_000);
        assert_eq!(ack.scheduled_for, now() + Duration::milliseconds(60_000));
        assert_eq!(record.scheduled_for, Some(ack.scheduled_for));
        assert_eq!(record.last_requested_at, Some(now()));
        assert_eq!(record.delay_ms, Some(60_000));
    }

    #[test]
    fn queue_resets_failure_streak() {
        let mut record = SchedulingRecord {
            retry_count: 3,
            last_outcome: Some(Outcome::Error),
            last_error: Some("boom".into()),
            ..Default::default()
        };
        queue(&mut record, now(), 30, Some("https://example.com/hook".into()));

        assert_eq!(record.retry_count, 0);
        // The last failure stays visible in status until the next run.
        assert_eq!(record.last_error.as_deref(), Some("boom"));
        assert_eq!(record.target_url.as_deref(), Some("https://example.com/hook"));
    }

    #[test]
    fn second_queue_supersedes_first() {
        let mut record = SchedulingRecord::default();
        queue(&mut record, now(), 60, None);
        let second = queue(&mut record, now() + Duration::seconds(10), 30, None);

        assert_eq!(record.scheduled_for, Some(second.scheduled_for));
        assert_eq!(
            second.scheduled_for,
            now() + Duration::seconds(10) + Duration::seconds(30)
        );
    }

    #[test]
    fn backoff_ladder() {
        let mut record = SchedulingRecord::default();
        let delays: Vec<i64> = (0..4)
            .map(|_| apply_failure(&mut record, now(), "HTTP 500"))
            .collect();

        assert_eq!(delays, vec![60_000, 120_000, 300_000, 300_000]);
        assert_eq!(record.retry_count, 4);
        assert_eq!(
            record.scheduled_for,
            Some(now() + Duration::milliseconds(300_000))
        );
    }

    #[test]
    fn retry_delay_clamps_to_last_entry() {
        assert_eq!(retry_delay_ms(1), 60_000);
        assert_eq!(retry_delay_ms(2), 120_000);
        assert_eq!(retry_delay_ms(3), 300_000);
        assert_eq!(retry_delay_ms(7), 300_000);
        assert_eq!(retry_delay_ms(1000), 300_000);
    }

    #[test]
    fn success_clears_pending_slot() {
        let mut record = SchedulingRecord::default();
        queue(&mut record, now(), 60, None);
        apply_failure(&mut record, now(), "transport error");
        apply_success(&mut record, now() + Duration::seconds(60));

        assert_eq!(record.scheduled_for, None);
        assert_eq!(record.retry_count, 0);
        assert_eq!(record.last_outcome, Some(Outcome::Success));
        assert_eq!(record.last_error, None);
        assert_eq!(record.last_executed_at, Some(now() + Duration::seconds(60)));
    }

    #[test]
    fn config_failure_is_not_rearmed() {
        let mut record = SchedulingRecord::default();
        queue(&mut record, now(), 60, None);
        apply_config_failure(&mut record, now(), "no webhook target configured");

        assert_eq!(record.scheduled_for, None);
        assert_eq!(record.retry_count, 1);
        assert_eq!(record.last_outcome, Some(Outcome::Error));
        assert!(record.last_error.as_deref().unwrap().contains("no webhook target"));
    }

    #[test]
    fn long_error_truncates_to_exactly_500_chars() {
        let long = "x".repeat(800);
        let truncated = truncate_error(&long);
        assert_eq!(truncated.chars().count(), MAX_ERROR_LEN);
        assert!(truncated.ends_with("[truncated]"));
    }

    #[test]
    fn short_error_is_untouched() {
        assert_eq!(truncate_error("HTTP 503"), "HTTP 503");
        let exact = "y".repeat(MAX_ERROR_LEN);
        assert_eq!(truncate_error(&exact), exact);
    }

    #[test]
    fn fresh_status_has_only_retry_count() {
        let report = project_status(None);
        assert_eq!(report.retry_count, 0);

        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(json, r#"{"retryCount":0}"#);
    }

    #[test]
    fn status_projects_all_fields() {
        let mut record = SchedulingRecord::default();
        queue(&mut record, now(), 60, Some("https://example.com/build".into()));
        apply_failure(&mut record, now() + Duration::seconds(60), "HTTP 500");

        let report = project_status(Some(&record));
        assert_eq!(report.last_webhook_at.as_deref(), Some("2026-08-07T12:00:00.000Z"));
        assert_eq!(report.scheduled_for.as_deref(), Some("2026-08-07T12:02:00.000Z"));
        assert_eq!(report.last_build_at.as_deref(), Some("2026-08-07T12:01:00.000Z"));
        assert_eq!(report.last_build_status, Some(Outcome::Error));
        assert_eq!(report.last_error.as_deref(), Some("HTTP 500"));
        assert_eq!(report.retry_count, 1);
        assert_eq!(report.delay_ms, Some(60_000));
        assert_eq!(report.webhook_url.as_deref(), Some("https://example.com/build"));

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains(r#""lastBuildStatus":"error""#));
    }
}
