use axum::Json;
use axum::extract::State;

use podwatch_core::NotificationEvent;

use crate::error::ServerError;

use super::AppState;
use super::schemas::WebhookResponse;

/// `POST /v1/webhook` -- a collection of a watched actor changed.
///
/// Expects `{"type", "object", "target"}`. A propagated matching or handler
/// failure answers 500 so the notification transport can redeliver.
pub async fn webhook(
    State(watcher): State<AppState>,
    Json(event): Json<NotificationEvent>,
) -> Result<Json<WebhookResponse>, ServerError> {
    let outcome = watcher
        .process_webhook(&event.kind, &event.object, &event.target)
        .await?;
    Ok(Json(outcome.into()))
}
