use axum::Json;
use axum::extract::State;

use podwatch_watcher::HandlerSummary;

use super::AppState;

/// `GET /v1/handlers` -- registered handlers in dispatch order.
pub async fn list_handlers(State(watcher): State<AppState>) -> Json<Vec<HandlerSummary>> {
    Json(
        watcher
            .get_handlers()
            .iter()
            .map(podwatch_watcher::HandlerEntry::summary)
            .collect(),
    )
}
