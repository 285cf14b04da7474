use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::api::schemas::ErrorResponse;

/// Errors that can occur when running the podwatch server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A watcher-level error surfaced through the API.
    #[error("watcher error: {0}")]
    Watcher(#[from] podwatch_watcher::WatcherError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Watcher(podwatch_watcher::WatcherError::Invalid(_)) => StatusCode::BAD_REQUEST,
            Self::Config(_) | Self::Watcher(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, axum::Json(body)).into_response()
    }
}
