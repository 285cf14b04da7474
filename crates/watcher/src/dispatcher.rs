use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use podwatch_core::{BoxType, HandlerInvocation, NotificationEvent};
use podwatch_matcher::match_activity;
use podwatch_provider::{ActorDirectory, Fetcher, HandlerInvoker, ResourceFetcher};

use crate::error::WatcherError;
use crate::metrics::WatcherMetrics;
use crate::registry::HandlerRegistry;

/// What happened to one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum WebhookOutcome {
    /// Not an addition; nothing was fetched.
    Ignored,
    /// The actor or the activity could not be fetched. The event is dropped.
    Unavailable,
    /// The activity was run through the registry.
    Dispatched {
        /// Number of handlers invoked.
        invoked: usize,
    },
}

impl WebhookOutcome {
    /// `false` only when the activity could not be fetched.
    pub fn is_available(self) -> bool {
        !matches!(self, Self::Unavailable)
    }
}

/// Runs notified activities through the [`HandlerRegistry`].
///
/// Every eligible entry is tried in registry order and every match is
/// invoked. Matching and invocation errors are returned to the caller so
/// the delivery layer can redeliver.
pub struct WebhookDispatcher {
    registry: Arc<HandlerRegistry>,
    actors: Arc<dyn ActorDirectory>,
    fetcher: ResourceFetcher,
    invoker: Arc<dyn HandlerInvoker>,
    metrics: Arc<WatcherMetrics>,
}

impl WebhookDispatcher {
    pub fn new(
        registry: Arc<HandlerRegistry>,
        actors: Arc<dyn ActorDirectory>,
        fetcher: ResourceFetcher,
        invoker: Arc<dyn HandlerInvoker>,
        metrics: Arc<WatcherMetrics>,
    ) -> Self {
        Self {
            registry,
            actors,
            fetcher,
            invoker,
            metrics,
        }
    }

    #[instrument(skip_all, fields(event.kind = %event.kind, event.object = %event.object, event.target = %event.target))]
    pub async fn process(&self, event: &NotificationEvent) -> Result<WebhookOutcome, WatcherError> {
        self.metrics.increment_webhooks_received();

        if !event.is_addition() {
            debug!("ignoring non-addition notification");
            self.metrics.increment_ignored();
            return Ok(WebhookOutcome::Ignored);
        }

        let actor_uri = event.actor_uri()?;
        let actor = match self.actors.get(&actor_uri).await {
            Ok(actor) => actor,
            Err(err) if err.is_denial() => {
                warn!(actor_uri = %actor_uri, error = %err, "actor of notified collection not found");
                self.metrics.increment_unavailable();
                return Ok(WebhookOutcome::Unavailable);
            }
            Err(err) => return Err(err.into()),
        };

        let fetcher = self.fetcher.acting_as(actor_uri.clone());
        let activity = match fetcher.fetch(&event.object).await {
            Ok(Some(activity)) => activity,
            Ok(None) => {
                warn!(actor_uri = %actor_uri, "activity could not be fetched, dropping notification");
                self.metrics.increment_unavailable();
                return Ok(WebhookOutcome::Unavailable);
            }
            Err(err) => {
                warn!(actor_uri = %actor_uri, error = %err, "activity fetch failed, dropping notification");
                self.metrics.increment_unavailable();
                return Ok(WebhookOutcome::Unavailable);
            }
        };

        let Some(box_type) = actor.classify(&event.target) else {
            debug!(actor_uri = %actor_uri, "target is neither the inbox nor the outbox of its actor");
            return Ok(WebhookOutcome::Dispatched { invoked: 0 });
        };

        let mut invoked = 0;
        for entry in self.registry.entries_for(box_type) {
            let outcome = match_activity(&entry.matcher, &activity, &fetcher).await?;
            if !outcome.matched {
                continue;
            }

            match box_type {
                BoxType::Inbox => {
                    info!(key = %entry.key, actor_uri = %actor_uri, "Reception of activity");
                }
                BoxType::Outbox => {
                    info!(key = %entry.key, actor_uri = %actor_uri, "Emission of activity");
                }
            }

            let invocation = HandlerInvocation {
                key: entry.key.clone(),
                box_type,
                dereferenced_activity: outcome.resolved,
                actor_uri: actor_uri.clone(),
            };
            self.invoker.invoke(&entry.action_name, &invocation).await?;
            self.metrics.increment_handlers_invoked();
            invoked += 1;
        }

        debug!(invoked, box_type = %box_type, "notification dispatched");
        Ok(WebhookOutcome::Dispatched { invoked })
    }
}
