use serde::{Deserialize, Serialize};

use podwatch_core::{ActorUri, AppAccessGrant};
use podwatch_watcher::{MetricsSnapshot, WebhookOutcome};

/// Error body returned by every failing route.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Result of `POST /v1/webhook`.
#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookResponse {
    /// `ignored`, `unavailable` or `dispatched`.
    pub outcome: String,
    /// Handlers invoked.
    pub invoked: usize,
}

impl From<WebhookOutcome> for WebhookResponse {
    fn from(outcome: WebhookOutcome) -> Self {
        let (name, invoked) = match outcome {
            WebhookOutcome::Ignored => ("ignored", 0),
            WebhookOutcome::Unavailable => ("unavailable", 0),
            WebhookOutcome::Dispatched { invoked } => ("dispatched", invoked),
        };
        Self {
            outcome: name.to_owned(),
            invoked,
        }
    }
}

/// The registration an application received.
#[derive(Debug, Serialize, Deserialize)]
pub struct AppRegistration {
    /// The actor who registered the application.
    #[serde(rename = "interop:registeredBy", alias = "registeredBy")]
    pub registered_by: ActorUri,
}

/// Body of `POST /v1/apps/registered`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppRegisteredRequest {
    pub app_registration: AppRegistration,
    #[serde(default)]
    pub access_grants: Vec<AppAccessGrant>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AppRegisteredResponse {
    /// Listener registrations enqueued.
    pub enqueued: usize,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub handlers: usize,
    pub metrics: MetricsSnapshot,
}
