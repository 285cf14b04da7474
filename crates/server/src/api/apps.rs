use axum::Json;
use axum::extract::State;

use crate::error::ServerError;

use super::AppState;
use super::schemas::{AppRegisteredRequest, AppRegisteredResponse};

/// `POST /v1/apps/registered` -- an actor granted this application access.
pub async fn app_registered(
    State(watcher): State<AppState>,
    Json(request): Json<AppRegisteredRequest>,
) -> Result<Json<AppRegisteredResponse>, ServerError> {
    let enqueued = watcher
        .app_registered(
            &request.app_registration.registered_by,
            &request.access_grants,
        )
        .await?;
    Ok(Json(AppRegisteredResponse { enqueued }))
}
