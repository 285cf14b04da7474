pub mod apps;
pub mod handlers;
pub mod health;
pub mod listeners;
pub mod schemas;
pub mod webhook;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use podwatch_watcher::PodActivitiesWatcher;

/// Shared state handed to every handler.
pub type AppState = Arc<PodActivitiesWatcher>;

/// Build the Axum router with all API routes and middleware.
pub fn router(watcher: AppState) -> Router {
    Router::new()
        // Health & metrics
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics))
        // Notifications
        .route("/v1/webhook", post(webhook::webhook))
        .route("/v1/apps/registered", post(apps::app_registered))
        // Introspection
        .route("/v1/handlers", get(handlers::list_handlers))
        .route("/v1/listeners/failed", get(listeners::failed_listeners))
        .with_state(watcher)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
