use std::sync::Arc;

use tracing::info;

use podwatch_core::{ActionName, ActorUri, AppAccessGrant, BoxType, ListenerJob, NotificationEvent};
use podwatch_matcher::Matcher;
use podwatch_queue::{EnqueueOutcome, FailedJob};

use crate::dispatcher::{WebhookDispatcher, WebhookOutcome};
use crate::error::WatcherError;
use crate::listener::{ListenerJobProcessor, ListenerRegistrationQueue};
use crate::metrics::WatcherMetrics;
use crate::reconciler::{ReconcileReport, StartupReconciler};
use crate::registry::{HandlerEntry, HandlerRegistry};

/// Watches actors' inboxes and outboxes and invokes handlers for matching
/// activities.
///
/// Construct one with [`WatcherBuilder`](crate::WatcherBuilder).
pub struct PodActivitiesWatcher {
    pub(crate) registry: Arc<HandlerRegistry>,
    pub(crate) dispatcher: WebhookDispatcher,
    pub(crate) listeners: Arc<ListenerRegistrationQueue>,
    pub(crate) processor: Arc<ListenerJobProcessor>,
    pub(crate) reconciler: StartupReconciler,
    pub(crate) metrics: Arc<WatcherMetrics>,
}

impl PodActivitiesWatcher {
    /// Register a handler. Registering the same handler twice invokes it twice.
    pub fn watch(
        &self,
        matcher: impl Into<Matcher>,
        action_name: impl Into<ActionName>,
        box_types: &[BoxType],
        key: impl Into<String>,
    ) {
        let entry = HandlerEntry::new(matcher, action_name, box_types, key);
        info!(key = %entry.key, action = %entry.action_name, kind = entry.matcher.kind(), "handler registered");
        self.registry.register(entry);
    }

    /// Handle one notification from the transport.
    pub async fn process_webhook(
        &self,
        kind: &str,
        object: &str,
        target: &str,
    ) -> Result<WebhookOutcome, WatcherError> {
        self.dispatcher
            .process(&NotificationEvent::new(kind, object, target))
            .await
    }

    /// Current handlers in dispatch order.
    pub fn get_handlers(&self) -> Arc<Vec<HandlerEntry>> {
        self.registry.snapshot()
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    /// Enqueue a listener registration for one of `actor_uri`'s collections.
    pub async fn register_listener(
        &self,
        actor_uri: impl Into<ActorUri>,
        collection: BoxType,
    ) -> Result<EnqueueOutcome, WatcherError> {
        self.listeners
            .enqueue(&ListenerJob::new(actor_uri, collection))
            .await
    }

    /// See [`StartupReconciler::app_registered`].
    pub async fn app_registered(
        &self,
        registered_by: &ActorUri,
        grants: &[AppAccessGrant],
    ) -> Result<usize, WatcherError> {
        self.reconciler.app_registered(registered_by, grants).await
    }

    /// Start processing listener jobs and reconcile them with existing grants.
    pub async fn start(&self) -> Result<ReconcileReport, WatcherError> {
        self.listeners.start(Arc::clone(&self.processor));
        self.reconciler.reconcile().await
    }

    pub async fn failed_listeners(&self) -> Result<Vec<FailedJob>, WatcherError> {
        self.listeners.failed().await
    }

    pub fn metrics(&self) -> &Arc<WatcherMetrics> {
        &self.metrics
    }
}
