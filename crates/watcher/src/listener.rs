use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use podwatch_core::ListenerJob;
use podwatch_provider::{ActorDirectory, ListenerReceipt, ListenerRegistrar, ProviderError};
use podwatch_queue::{
    CleanReport, EnqueueOutcome, FailedJob, Job, JobError, JobPolicy, JobProcessor, JobQueue,
    QueueError,
};

use crate::error::WatcherError;
use crate::metrics::WatcherMetrics;

/// Queue of listener registrations, one live job per actor and collection.
pub struct ListenerRegistrationQueue {
    queue: Arc<dyn JobQueue>,
    policy: JobPolicy,
    metrics: Arc<WatcherMetrics>,
}

impl ListenerRegistrationQueue {
    pub fn new(queue: Arc<dyn JobQueue>, policy: JobPolicy, metrics: Arc<WatcherMetrics>) -> Self {
        Self {
            queue,
            policy,
            metrics,
        }
    }

    /// Enqueue a registration unless one for the same key is already live.
    pub async fn enqueue(&self, job: &ListenerJob) -> Result<EnqueueOutcome, WatcherError> {
        let key = job.key();
        let payload =
            serde_json::to_value(job).map_err(|e| QueueError::Serialization(e.to_string()))?;
        let outcome = self.queue.enqueue(&key, payload, self.policy.clone()).await?;
        match outcome {
            EnqueueOutcome::Enqueued => {
                debug!(key = %key, "listener registration enqueued");
                self.metrics.increment_listeners_enqueued();
            }
            EnqueueOutcome::Duplicate => {
                debug!(key = %key, "listener registration already queued");
                self.metrics.increment_listeners_deduplicated();
            }
        }
        Ok(outcome)
    }

    /// Discard waiting, running and failed registrations.
    pub async fn clean(&self) -> Result<CleanReport, WatcherError> {
        Ok(self.queue.clean().await?)
    }

    /// Start processing jobs with `processor`.
    pub fn start(&self, processor: Arc<ListenerJobProcessor>) {
        self.queue.on_process(processor);
    }

    /// Registrations that exhausted their attempts.
    pub async fn failed(&self) -> Result<Vec<FailedJob>, WatcherError> {
        Ok(self.queue.failed().await?)
    }

    pub fn policy(&self) -> &JobPolicy {
        &self.policy
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

/// Registers a notification listener on an actor's inbox or outbox.
pub struct ListenerJobProcessor {
    actors: Arc<dyn ActorDirectory>,
    registrar: Arc<dyn ListenerRegistrar>,
    callback_url: String,
}

impl ListenerJobProcessor {
    pub fn new(
        actors: Arc<dyn ActorDirectory>,
        registrar: Arc<dyn ListenerRegistrar>,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            actors,
            registrar,
            callback_url: callback_url.into(),
        }
    }

    /// Look up the collection and ask the notification service to watch it.
    #[instrument(skip_all, fields(key = %job.key()))]
    pub async fn register(&self, job: &ListenerJob) -> Result<ListenerReceipt, ProviderError> {
        let actor = self.actors.get(&job.actor_uri).await?;
        let collection = actor.collection(job.collection_predicate).ok_or_else(|| {
            ProviderError::ExecutionFailed(format!(
                "actor {} has no {} collection",
                job.actor_uri, job.collection_predicate
            ))
        })?;
        let receipt = self.registrar.register(collection, &self.callback_url).await?;
        info!(collection, callback = %self.callback_url, "listener registered");
        Ok(receipt)
    }
}

#[async_trait]
impl JobProcessor for ListenerJobProcessor {
    async fn process(&self, job: &Job) -> Result<serde_json::Value, JobError> {
        let listener: ListenerJob = serde_json::from_value(job.payload.clone())
            .map_err(|e| JobError::InvalidPayload(e.to_string()))?;
        let receipt = self.register(&listener).await.map_err(|e| {
            if e.is_retryable() {
                JobError::Failed(e.to_string())
            } else {
                JobError::Permanent(e.to_string())
            }
        })?;
        serde_json::to_value(receipt).map_err(|e| JobError::Failed(e.to_string()))
    }
}
