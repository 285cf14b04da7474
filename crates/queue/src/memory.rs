use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::{Mutex, RwLock};
use tokio::sync::{Semaphore, oneshot};
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{JobError, QueueError};
use crate::failed::FailedJob;
use crate::policy::JobPolicy;
use crate::queue::{CleanReport, EnqueueOutcome, Job, JobProcessor, JobQueue};

/// Settings for [`MemoryJobQueue`].
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Maximum number of attempts running at once across all jobs.
    pub max_concurrent: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { max_concurrent: 10 }
    }
}

struct Slot {
    job: Job,
    policy: JobPolicy,
    started: bool,
    handle: Option<AbortHandle>,
}

struct Inner {
    slots: DashMap<String, Slot>,
    processor: RwLock<Option<Arc<dyn JobProcessor>>>,
    semaphore: Arc<Semaphore>,
    failed: Mutex<Vec<FailedJob>>,
}

/// In-process [`JobQueue`] backed by tokio tasks.
///
/// Each live key owns one slot. A slot is claimed when its job starts and
/// released when the job completes or exhausts its attempts, after which the
/// key can be enqueued again. Backoff sleeps do not hold a concurrency permit.
#[derive(Clone)]
pub struct MemoryJobQueue {
    inner: Arc<Inner>,
}

impl MemoryJobQueue {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                slots: DashMap::new(),
                processor: RwLock::new(None),
                semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
                failed: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Whether a job with `key` is waiting or running.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.slots.contains_key(key)
    }

    fn launch(&self, key: &str) {
        let Some(processor) = self.inner.processor.read().clone() else {
            return;
        };

        let claimed = {
            let Some(mut slot) = self.inner.slots.get_mut(key) else {
                return;
            };
            if slot.started {
                return;
            }
            slot.started = true;
            (slot.job.clone(), slot.policy.clone())
        };
        let (job, policy) = claimed;
        let id = job.id;

        // The task holds off until its abort handle is stored, so a concurrent
        // `clean` can always stop it.
        let (start_tx, start_rx) = oneshot::channel::<()>();
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            if start_rx.await.is_ok() {
                run(inner, processor, job, policy).await;
            }
        })
        .abort_handle();

        if self.attach(key, id, handle) {
            let _ = start_tx.send(());
        }
    }

    /// Store `handle` on the slot still owned by job `id`. A slot that was
    /// removed or replaced in the meantime gets its task aborted instead.
    fn attach(&self, key: &str, id: Uuid, handle: AbortHandle) -> bool {
        match self.inner.slots.get_mut(key) {
            Some(mut slot) if slot.job.id == id => {
                slot.handle = Some(handle);
                true
            }
            _ => {
                debug!(job.key = %key, "slot gone before start, aborting task");
                handle.abort();
                false
            }
        }
    }
}

impl Default for MemoryJobQueue {
    fn default() -> Self {
        Self::new(QueueConfig::default())
    }
}

impl std::fmt::Debug for MemoryJobQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryJobQueue")
            .field("live", &self.inner.slots.len())
            .field("failed", &self.inner.failed.lock().len())
            .finish_non_exhaustive()
    }
}

impl Inner {
    fn release(&self, key: &str, id: Uuid) {
        self.slots.remove_if(key, |_, slot| slot.job.id == id);
    }
}

async fn run(inner: Arc<Inner>, processor: Arc<dyn JobProcessor>, mut job: Job, policy: JobPolicy) {
    let attempts = policy.attempts.max(1);
    let mut last_error: Option<JobError> = None;

    for attempt in 1..=attempts {
        job.attempt = attempt;

        let result = {
            let Ok(_permit) = inner.semaphore.acquire().await else {
                return;
            };
            debug!(job.key = %job.key, attempt, attempts, "processing job");
            tokio::time::timeout(policy.attempt_timeout, processor.process(&job)).await
        };

        let err = match result {
            Ok(Ok(_)) => {
                debug!(job.key = %job.key, attempt, "job completed");
                inner.release(&job.key, job.id);
                return;
            }
            Ok(Err(e)) => e,
            Err(_) => JobError::Timeout(policy.attempt_timeout),
        };

        if !err.is_retryable() {
            last_error = Some(err);
            break;
        }

        if attempt < attempts {
            let delay = policy.backoff.delay_for(attempt - 1);
            warn!(
                job.key = %job.key,
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "job attempt failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
        last_error = Some(err);
    }

    let error = last_error.map_or_else(|| "unknown error".to_owned(), |e| e.to_string());
    error!(job.key = %job.key, attempts = job.attempt, error = %error, "job failed permanently");
    inner.failed.lock().push(FailedJob {
        key: job.key.clone(),
        payload: job.payload.clone(),
        error,
        attempts: job.attempt,
        failed_at: Utc::now(),
    });
    inner.release(&job.key, job.id);
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn enqueue(
        &self,
        key: &str,
        payload: serde_json::Value,
        policy: JobPolicy,
    ) -> Result<EnqueueOutcome, QueueError> {
        match self.inner.slots.entry(key.to_owned()) {
            Entry::Occupied(_) => {
                debug!(job.key = %key, "job already queued");
                return Ok(EnqueueOutcome::Duplicate);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Slot {
                    job: Job::new(key, payload),
                    policy,
                    started: false,
                    handle: None,
                });
            }
        }
        self.launch(key);
        Ok(EnqueueOutcome::Enqueued)
    }

    async fn clean(&self) -> Result<CleanReport, QueueError> {
        let keys: Vec<String> = self.inner.slots.iter().map(|s| s.key().clone()).collect();
        let mut jobs = 0;
        for key in keys {
            if let Some((_, slot)) = self.inner.slots.remove(&key) {
                if let Some(handle) = slot.handle {
                    handle.abort();
                }
                jobs += 1;
            }
        }
        let failed = std::mem::take(&mut *self.inner.failed.lock()).len();
        info!(jobs, failed, "queue cleaned");
        Ok(CleanReport { jobs, failed })
    }

    fn on_process(&self, processor: Arc<dyn JobProcessor>) {
        *self.inner.processor.write() = Some(processor);
        let waiting: Vec<String> = self
            .inner
            .slots
            .iter()
            .filter(|s| !s.started)
            .map(|s| s.key().clone())
            .collect();
        for key in waiting {
            self.launch(&key);
        }
    }

    async fn failed(&self) -> Result<Vec<FailedJob>, QueueError> {
        Ok(self.inner.failed.lock().clone())
    }

    fn len(&self) -> usize {
        self.inner.slots.len()
    }
}
