use std::sync::Arc;

use podwatch_provider::{
    ActorDirectory, GrantSource, HandlerInvoker, ListenerRegistrar, LocalAuthority, LocalResources,
    PodResources, ResourceFetcher,
};
use podwatch_queue::{JobPolicy, JobQueue, MemoryJobQueue};

use crate::dispatcher::WebhookDispatcher;
use crate::error::WatcherError;
use crate::listener::{ListenerJobProcessor, ListenerRegistrationQueue};
use crate::metrics::WatcherMetrics;
use crate::reconciler::StartupReconciler;
use crate::registry::HandlerRegistry;
use crate::watcher::PodActivitiesWatcher;

/// Fluent builder for a [`PodActivitiesWatcher`].
///
/// The base URL, callback URL and every collaborator except the grant
/// source are required. The queue defaults to a [`MemoryJobQueue`] and the
/// policy to [`JobPolicy::listener_registration`].
#[derive(Default)]
pub struct WatcherBuilder {
    base_url: Option<String>,
    callback_url: Option<String>,
    actors: Option<Arc<dyn ActorDirectory>>,
    local: Option<Arc<dyn LocalResources>>,
    remote: Option<Arc<dyn PodResources>>,
    registrar: Option<Arc<dyn ListenerRegistrar>>,
    invoker: Option<Arc<dyn HandlerInvoker>>,
    grants: Option<Arc<dyn GrantSource>>,
    queue: Option<Arc<dyn JobQueue>>,
    policy: Option<JobPolicy>,
    registry: Option<Arc<HandlerRegistry>>,
}

impl WatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The authority whose resources are fetched through the local path.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Where the notification service should deliver webhooks.
    #[must_use]
    pub fn callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn actors(mut self, actors: Arc<dyn ActorDirectory>) -> Self {
        self.actors = Some(actors);
        self
    }

    #[must_use]
    pub fn local_resources(mut self, local: Arc<dyn LocalResources>) -> Self {
        self.local = Some(local);
        self
    }

    #[must_use]
    pub fn pod_resources(mut self, remote: Arc<dyn PodResources>) -> Self {
        self.remote = Some(remote);
        self
    }

    #[must_use]
    pub fn registrar(mut self, registrar: Arc<dyn ListenerRegistrar>) -> Self {
        self.registrar = Some(registrar);
        self
    }

    #[must_use]
    pub fn invoker(mut self, invoker: Arc<dyn HandlerInvoker>) -> Self {
        self.invoker = Some(invoker);
        self
    }

    #[must_use]
    pub fn grants(mut self, grants: Arc<dyn GrantSource>) -> Self {
        self.grants = Some(grants);
        self
    }

    #[must_use]
    pub fn queue(mut self, queue: Arc<dyn JobQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    #[must_use]
    pub fn policy(mut self, policy: JobPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Share an existing registry instead of creating an empty one.
    #[must_use]
    pub fn registry(mut self, registry: Arc<HandlerRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> Result<PodActivitiesWatcher, WatcherError> {
        let base_url = self
            .base_url
            .ok_or_else(|| WatcherError::Configuration("base url is required".into()))?;
        let authority = LocalAuthority::parse(&base_url)
            .map_err(|e| WatcherError::Configuration(e.to_string()))?;
        let callback_url = self
            .callback_url
            .ok_or_else(|| WatcherError::Configuration("callback url is required".into()))?;
        let actors = self
            .actors
            .ok_or_else(|| WatcherError::Configuration("actor directory is required".into()))?;
        let local = self
            .local
            .ok_or_else(|| WatcherError::Configuration("local resources are required".into()))?;
        let remote = self
            .remote
            .ok_or_else(|| WatcherError::Configuration("pod resources are required".into()))?;
        let registrar = self
            .registrar
            .ok_or_else(|| WatcherError::Configuration("listener registrar is required".into()))?;
        let invoker = self
            .invoker
            .ok_or_else(|| WatcherError::Configuration("handler invoker is required".into()))?;

        let metrics = Arc::new(WatcherMetrics::default());
        let registry = self.registry.unwrap_or_default();
        let queue = self
            .queue
            .unwrap_or_else(|| Arc::new(MemoryJobQueue::default()));
        let policy = self.policy.unwrap_or_default();

        let listeners = Arc::new(ListenerRegistrationQueue::new(
            queue,
            policy,
            Arc::clone(&metrics),
        ));
        let processor = Arc::new(ListenerJobProcessor::new(
            Arc::clone(&actors),
            registrar,
            callback_url,
        ));
        let dispatcher = WebhookDispatcher::new(
            Arc::clone(&registry),
            actors,
            ResourceFetcher::new(authority, local, remote),
            invoker,
            Arc::clone(&metrics),
        );
        let reconciler =
            StartupReconciler::new(self.grants, Arc::clone(&listeners), Arc::clone(&metrics));

        Ok(PodActivitiesWatcher {
            registry,
            dispatcher,
            listeners,
            processor,
            reconciler,
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use podwatch_core::{ActorUri, AppAccessGrant, BoxType, RawGrant, grant::READ_INBOX_IRI};
    use podwatch_matcher::{Matcher, patterns};
    use podwatch_provider::testing::{
        MemoryActorDirectory, MemoryResources, RecordingInvoker, ScriptedRegistrar,
        StaticGrantSource,
    };

    use super::*;
    use crate::dispatcher::WebhookOutcome;

    struct Harness {
        resources: Arc<MemoryResources>,
        invoker: Arc<RecordingInvoker>,
        registrar: Arc<ScriptedRegistrar>,
        watcher: PodActivitiesWatcher,
    }

    fn harness(grants: Vec<RawGrant>) -> Harness {
        let resources = Arc::new(MemoryResources::new());
        let actors = Arc::new(MemoryActorDirectory::new());
        actors.add("https://local/alice");
        let invoker = Arc::new(RecordingInvoker::new());
        let registrar = Arc::new(ScriptedRegistrar::new());

        let watcher = WatcherBuilder::new()
            .base_url("https://local")
            .callback_url("https://local/v1/webhook")
            .actors(actors)
            .local_resources(Arc::clone(&resources) as _)
            .pod_resources(Arc::clone(&resources) as _)
            .registrar(Arc::clone(&registrar) as _)
            .invoker(Arc::clone(&invoker) as _)
            .grants(Arc::new(StaticGrantSource::new(grants)))
            .policy(JobPolicy::immediate())
            .build()
            .unwrap();

        Harness {
            resources,
            invoker,
            registrar,
            watcher,
        }
    }

    #[test]
    fn build_missing_collaborator_returns_error() {
        let result = WatcherBuilder::new()
            .base_url("https://local")
            .callback_url("https://local/v1/webhook")
            .build();
        let err = result.err().unwrap();
        assert!(err.to_string().contains("actor directory is required"));
    }

    #[test]
    fn build_missing_base_url_returns_error() {
        let err = WatcherBuilder::new().build().err().unwrap();
        assert!(err.to_string().contains("base url is required"));
    }

    #[test]
    fn build_rejects_base_url_without_host() {
        let err = WatcherBuilder::new().base_url("local").build().err().unwrap();
        assert!(matches!(err, WatcherError::Configuration(_)));
        assert!(err.to_string().contains("invalid base url"));
    }

    #[tokio::test]
    async fn watch_then_process_webhook() {
        let h = harness(Vec::new());
        h.watcher.watch(
            patterns::contact_request(),
            "contacts.handle",
            &[BoxType::Inbox],
            "contact-request",
        );
        h.watcher
            .watch(Matcher::predicate(|_| true), "log", &[BoxType::Inbox], "everything");
        h.resources.insert(
            "https://remote/activities/1",
            json!({"type": "Offer", "object": {"type": "Add", "object": {"type": "Profile"}}}),
        );

        let outcome = h
            .watcher
            .process_webhook("Add", "https://remote/activities/1", "https://local/alice/inbox")
            .await
            .unwrap();

        assert_eq!(outcome, WebhookOutcome::Dispatched { invoked: 2 });
        assert_eq!(h.invoker.keys(), vec!["contact-request", "everything"]);
        let handlers: Vec<_> = h.watcher.get_handlers().iter().map(|e| e.key.clone()).collect();
        assert_eq!(handlers, vec!["contact-request", "everything"]);
    }

    #[tokio::test]
    async fn missing_activity_returns_unavailable() {
        let h = harness(Vec::new());
        h.watcher
            .watch(Matcher::predicate(|_| true), "log", &[BoxType::Inbox], "everything");

        let outcome = h
            .watcher
            .process_webhook("Add", "https://local/alice/gone", "https://local/alice/inbox")
            .await
            .unwrap();

        assert!(!outcome.is_available());
        assert_eq!(h.invoker.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn start_registers_listeners_from_grants() {
        let h = harness(vec![RawGrant::new("https://local/alice", READ_INBOX_IRI)]);

        let report = h.watcher.start().await.unwrap();
        assert_eq!(report.enqueued, 1);

        while h.registrar.registered().is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(
            h.registrar.registered(),
            vec![(
                "https://local/alice/inbox".to_owned(),
                "https://local/v1/webhook".to_owned()
            )]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn app_registered_triggers_registration() {
        let h = harness(Vec::new());
        h.watcher.start().await.unwrap();

        let enqueued = h
            .watcher
            .app_registered(
                &ActorUri::new("https://local/alice"),
                &[AppAccessGrant::new(["apods:ReadOutbox"])],
            )
            .await
            .unwrap();
        assert_eq!(enqueued, 1);

        while h.registrar.registered().is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(h.registrar.registered()[0].0, "https://local/alice/outbox");
        assert_eq!(h.watcher.metrics().snapshot().listeners_enqueued, 1);
    }

    #[tokio::test]
    async fn register_listener_is_idempotent_per_key() {
        let h = harness(Vec::new());
        let first = h
            .watcher
            .register_listener("https://a.example/x", BoxType::Inbox)
            .await
            .unwrap();
        let second = h
            .watcher
            .register_listener("https://a.example/x", BoxType::Inbox)
            .await
            .unwrap();

        assert_eq!(first, podwatch_queue::EnqueueOutcome::Enqueued);
        assert_eq!(second, podwatch_queue::EnqueueOutcome::Duplicate);
    }
}
