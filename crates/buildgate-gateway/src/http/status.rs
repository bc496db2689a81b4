//! Status projection — GET /status.
//!
//! Pure read over the persisted record; always 200 with best-known state.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use crate::app::AppState;
use crate::http::schedule_key;
use buildgate_scheduler::StatusReport;

/// GET /status
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Json<StatusReport>, (StatusCode, Json<Value>)> {
    let key = schedule_key(&headers, &query);
    let report = state.store.status(&key).map_err(|e| {
        warn!(%key, error = %e, "status read failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "internal error"})),
        )
    })?;
    Ok(Json(report))
}
