use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::startup::AppState;

/// Liveness probe; never touches the database.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "streaming-range-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness probe: ready once startup initialization has completed.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    if state.startup.is_initialized() {
        (
            StatusCode::OK,
            Json(json!({ "status": "ready", "initialized": true })),
        )
    } else {
        tracing::debug!("Readiness check failed - startup not initialized");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "initializing", "initialized": false })),
        )
    }
}
