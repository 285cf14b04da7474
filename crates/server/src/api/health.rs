use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::schemas::HealthResponse;

/// `GET /health` -- returns service status together with a metrics snapshot.
pub async fn health(State(watcher): State<AppState>) -> impl IntoResponse {
    let body = HealthResponse {
        status: "ok".into(),
        handlers: watcher.registry().len(),
        metrics: watcher.metrics().snapshot(),
    };
    (StatusCode::OK, Json(body))
}

/// `GET /metrics` -- returns watcher counters as JSON.
pub async fn metrics(State(watcher): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(watcher.metrics().snapshot()))
}
