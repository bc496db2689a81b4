pub mod health;
pub mod schedule;
pub mod status;

use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::collections::HashMap;

use buildgate_core::config::DEFAULT_SCHEDULE_KEY;

/// Router fallback for unknown paths and unsupported methods: OPTIONS gets
/// the permissive pre-flight reply, anything else is 404.
pub async fn fallback(method: Method) -> Response {
    if method == Method::OPTIONS {
        return preflight();
    }
    (
        StatusCode::NOT_FOUND,
        axum::Json(json!({"error": "not found"})),
    )
        .into_response()
}

/// 204 + permissive cross-origin headers, no body.
fn preflight() -> Response {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"),
            (
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                "content-type, x-webhook-url, x-delay-seconds, x-webhook-secret, x-schedule-key",
            ),
        ],
    )
        .into_response()
}

/// Scheduler identity selected by the request (`x-schedule-key` header or
/// `?key=`), defaulting to the shared single slot.
pub(crate) fn schedule_key(headers: &HeaderMap, query: &HashMap<String, String>) -> String {
    header_str(headers, "x-schedule-key")
        .or_else(|| query.get("key").map(String::as_str))
        .filter(|k| !k.is_empty())
        .unwrap_or(DEFAULT_SCHEDULE_KEY)
        .to_string()
}

pub(crate) fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
