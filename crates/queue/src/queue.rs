use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{JobError, QueueError};
use crate::failed::FailedJob;
use crate::policy::JobPolicy;

/// A unit of work handed to a [`JobProcessor`].
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: Uuid,
    /// Deduplication key. At most one job per key is waiting or running.
    pub key: String,
    pub payload: serde_json::Value,
    /// One-based number of the current attempt.
    pub attempt: u32,
    pub enqueued_at: DateTime<Utc>,
}

impl Job {
    pub fn new(key: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::now_v7(),
            key: key.into(),
            payload,
            attempt: 0,
            enqueued_at: Utc::now(),
        }
    }
}

/// Result of an enqueue call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// A new job was accepted.
    Enqueued,
    /// A job with the same key is already waiting or running; nothing was added.
    Duplicate,
}

/// What a [`JobQueue::clean`] call discarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    /// Waiting or running jobs that were dropped.
    pub jobs: usize,
    /// Failed jobs that were dropped.
    pub failed: usize,
}

/// Handles one attempt of a job.
///
/// Returning a retryable error schedules another attempt if the job's policy
/// allows one. [`JobError::Permanent`] ends the job at once.
#[async_trait]
pub trait JobProcessor: Send + Sync {
    async fn process(&self, job: &Job) -> Result<serde_json::Value, JobError>;
}

/// A keyed job queue with per-job retry policies.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Submit a job under `key` unless one with that key is already live.
    async fn enqueue(
        &self,
        key: &str,
        payload: serde_json::Value,
        policy: JobPolicy,
    ) -> Result<EnqueueOutcome, QueueError>;

    /// Drop every waiting, running and failed job.
    async fn clean(&self) -> Result<CleanReport, QueueError>;

    /// Install the processor. Jobs enqueued before this call start now.
    fn on_process(&self, processor: Arc<dyn JobProcessor>);

    /// Jobs that exhausted their attempts since the last clean.
    async fn failed(&self) -> Result<Vec<FailedJob>, QueueError>;

    /// Number of waiting or running jobs.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
