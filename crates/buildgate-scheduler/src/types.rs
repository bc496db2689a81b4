use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of the most recent execution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Error,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Outcome::Success => "success",
            Outcome::Error => "error",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "success" => Ok(Outcome::Success),
            "error" => Ok(Outcome::Error),
            other => Err(format!("unknown outcome: {other}")),
        }
    }
}

/// The persisted scheduling state — one record per scheduler identity.
///
/// A freshly created record has every field empty and `retry_count` 0.
/// `scheduled_for` being set means exactly one execution is pending; it is
/// cleared on terminal success and on a configuration give-up, and replaced
/// wholesale by each new schedule request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulingRecord {
    /// Most recent accepted schedule request.
    pub last_requested_at: Option<DateTime<Utc>>,
    /// Due time of the pending execution, if one is pending.
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Most recent execution attempt, success or failure.
    pub last_executed_at: Option<DateTime<Utc>>,
    /// Outcome of the most recent attempt; unset until the first run.
    pub last_outcome: Option<Outcome>,
    /// Failure description of the most recent failed attempt, capped at
    /// 500 characters. Cleared on success.
    pub last_error: Option<String>,
    /// Consecutive failed attempts since the last success or fresh request.
    pub retry_count: u32,
    /// Delay used by the most recent schedule request (informational).
    pub delay_ms: Option<i64>,
    /// Per-request target, when the caller supplied one.
    pub target_url: Option<String>,
}

/// Echo payload returned to the caller when a schedule request is accepted.
#[derive(Debug, Clone, Copy)]
pub struct QueueAck {
    pub last_requested_at: DateTime<Utc>,
    pub scheduled_for: DateTime<Utc>,
    pub delay_ms: i64,
}

/// Caller-facing projection of a [`SchedulingRecord`].
///
/// Timestamps are ISO-8601 strings; optional fields are omitted from the
/// JSON body entirely when unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_webhook_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_build_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_build_status: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub retry_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}
