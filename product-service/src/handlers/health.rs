use crate::services::get_metrics;
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Liveness: answers as long as the process is up, whatever the store state.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "product-service",
        "version": env!("CARGO_PKG_VERSION"),
        "lifecycle": state.lifecycle.state(),
    }))
}

/// Readiness: 200 only once the store is connected and seeding has run.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let Ok(store) = state.ready_store() else {
        return StatusCode::SERVICE_UNAVAILABLE;
    };

    match store.health_check().await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}
