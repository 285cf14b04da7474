use axum::Json;
use axum::extract::State;

use podwatch_queue::FailedJob;

use crate::error::ServerError;

use super::AppState;

/// `GET /v1/listeners/failed` -- listener registrations that gave up.
pub async fn failed_listeners(
    State(watcher): State<AppState>,
) -> Result<Json<Vec<FailedJob>>, ServerError> {
    Ok(Json(watcher.failed_listeners().await?))
}
