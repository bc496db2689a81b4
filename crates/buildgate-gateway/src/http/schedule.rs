//! Schedule ingress — POST /.
//!
//! Two deployment modes share this endpoint. Caller-targeted: the request
//! carries `x-webhook-url` and `x-delay-seconds`. Statically targeted: the
//! target URL and default delay come from `[trigger]` configuration and
//! the request carries only the optional secret.
//!
//! All input validation happens here; malformed requests never reach the
//! state machine.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::app::AppState;
use crate::auth;
use crate::http::{header_str, schedule_key};
use buildgate_scheduler::machine;

/// POST /
///
/// Accepts a schedule request, arms the delayed execution and acknowledges
/// with the computed due time. Returns 202 on success, 400 on invalid
/// input, 401 on a failed secret check.
pub async fn schedule_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    auth::verify_secret(state.config.gateway.secret.as_deref(), &headers, &query)
        .map_err(|reason| auth_error(&reason))?;

    let key = schedule_key(&headers, &query);

    // Per-request target, validated before anything is persisted.
    let target_url = match header_str(&headers, "x-webhook-url") {
        Some(raw) => Some(validate_target_url(raw).map_err(|e| client_error(&e))?),
        None => None,
    };
    if target_url.is_none() && state.config.trigger.url.is_none() {
        return Err(client_error(
            "missing x-webhook-url header and no trigger.url configured",
        ));
    }

    let delay_seconds = match header_str(&headers, "x-delay-seconds") {
        Some(raw) => parse_delay(raw).map_err(|e| client_error(&e))?,
        // A caller-supplied target must come with its own delay.
        None if target_url.is_some() => {
            return Err(client_error("missing x-delay-seconds header"));
        }
        None => state.config.trigger.delay_seconds,
    };

    let ack = state
        .store
        .queue_execution(&key, delay_seconds, target_url.clone())
        .map_err(|e| {
            warn!(error = %e, "failed to persist schedule request");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "internal error"})),
            )
        })?;

    info!(%key, delay_seconds, "schedule request accepted");

    let mut body = json!({
        "ok": true,
        "scheduledFor": machine::iso(ack.scheduled_for),
        "delaySeconds": delay_seconds,
    });
    if let Some(url) = target_url {
        body["webhookUrl"] = json!(url);
    }
    Ok((StatusCode::ACCEPTED, Json(body)))
}

/// Absolute http/https URLs only.
fn validate_target_url(raw: &str) -> Result<String, String> {
    let url = reqwest::Url::parse(raw).map_err(|e| format!("invalid x-webhook-url: {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(url.to_string()),
        other => Err(format!(
            "invalid x-webhook-url: unsupported scheme '{other}' (http/https only)"
        )),
    }
}

fn parse_delay(raw: &str) -> Result<u32, String> {
    match raw.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        Ok(_) => Err("x-delay-seconds must be a positive integer".to_string()),
        Err(_) => Err(format!(
            "invalid x-delay-seconds: '{raw}' is not a positive integer"
        )),
    }
}

fn client_error(reason: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({"error": reason})))
}

fn auth_error(reason: &str) -> (StatusCode, Json<Value>) {
    warn!(reason = %reason, "schedule request failed authentication");
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "authentication failed", "reason": reason})),
    )
}
