use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use buildgate_core::config::BuildgateConfig;
use buildgate_scheduler::ScheduleStore;

/// Central shared state — passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: BuildgateConfig,
    pub store: ScheduleStore,
}

/// Assemble the full Axum router.
///
/// Unknown paths and unsupported methods both answer 404; OPTIONS anywhere
/// answers the permissive pre-flight reply.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(crate::http::schedule::schedule_handler))
        .route("/status", get(crate::http::status::status_handler))
        .route("/health", get(crate::http::health::health_handler))
        .fallback(crate::http::fallback)
        .method_not_allowed_fallback(crate::http::fallback)
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
