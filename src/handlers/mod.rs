pub mod call;
pub mod health;
pub mod symptoms;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/call/start", post(call::start_call))
        .route("/api/call/stop", post(call::stop_call))
        .route("/api/call/events", post(call::provider_event))
        .route("/api/call/status", get(call::call_status))
        .route("/api/call/stream", get(call::call_stream))
        .route("/api/call/summary/retry", post(call::retry_summary))
        .route("/api/symptoms/extract", post(symptoms::extract_symptoms))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
