use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use podwatch_core::{AccessGrant, ActorUri, AppAccessGrant, ListenerJob};
use podwatch_provider::GrantSource;
use podwatch_queue::{CleanReport, EnqueueOutcome};

use crate::error::WatcherError;
use crate::listener::ListenerRegistrationQueue;
use crate::metrics::WatcherMetrics;

/// Summary of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Stale queue state discarded before enqueuing.
    pub cleaned: CleanReport,
    /// Grant rows returned by the grant source.
    pub grants: usize,
    pub enqueued: usize,
    pub duplicates: usize,
    /// Malformed grants, or grants whose job could not be enqueued.
    pub skipped: usize,
    /// Grants carrying no inbox or outbox read right.
    pub unrelated: usize,
}

/// Rebuilds the set of listener registrations from existing access grants.
pub struct StartupReconciler {
    grants: Option<Arc<dyn GrantSource>>,
    listeners: Arc<ListenerRegistrationQueue>,
    metrics: Arc<WatcherMetrics>,
}

impl StartupReconciler {
    pub fn new(
        grants: Option<Arc<dyn GrantSource>>,
        listeners: Arc<ListenerRegistrationQueue>,
        metrics: Arc<WatcherMetrics>,
    ) -> Self {
        Self {
            grants,
            listeners,
            metrics,
        }
    }

    /// Clear the listener queue, then enqueue one registration per granted
    /// inbox or outbox read right.
    ///
    /// A malformed grant is logged and skipped. Failing to query the grant
    /// source at all is returned as an error.
    pub async fn reconcile(&self) -> Result<ReconcileReport, WatcherError> {
        let mut report = ReconcileReport {
            cleaned: self.listeners.clean().await?,
            ..ReconcileReport::default()
        };

        let Some(source) = &self.grants else {
            info!("no grant source configured, skipping listener reconciliation");
            return Ok(report);
        };

        let rows = source.access_grants().await?;
        report.grants = rows.len();

        for raw in &rows {
            let grant = match AccessGrant::from_raw(raw) {
                Ok(Some(grant)) => grant,
                Ok(None) => {
                    report.unrelated += 1;
                    continue;
                }
                Err(err) => {
                    warn!(error = %err, granted_by = ?raw.granted_by, "skipping malformed access grant");
                    self.metrics.increment_grants_skipped();
                    report.skipped += 1;
                    continue;
                }
            };

            match self.listeners.enqueue(&grant.listener_job()).await {
                Ok(EnqueueOutcome::Enqueued) => report.enqueued += 1,
                Ok(EnqueueOutcome::Duplicate) => report.duplicates += 1,
                Err(err) => {
                    warn!(error = %err, granted_by = %grant.granted_by, "could not enqueue listener registration");
                    report.skipped += 1;
                }
            }
        }

        info!(
            grants = report.grants,
            enqueued = report.enqueued,
            duplicates = report.duplicates,
            skipped = report.skipped,
            "listener reconciliation complete"
        );
        Ok(report)
    }

    /// React to an application being granted access by `registered_by`.
    ///
    /// Enqueues an inbox and/or outbox registration depending on the read
    /// rights found in `grants`. Returns the number of jobs enqueued.
    pub async fn app_registered(
        &self,
        registered_by: &ActorUri,
        grants: &[AppAccessGrant],
    ) -> Result<usize, WatcherError> {
        let mut box_types: Vec<_> = grants
            .iter()
            .flat_map(AppAccessGrant::rights)
            .map(|right| right.box_type())
            .collect();
        box_types.sort_unstable();
        box_types.dedup();

        if box_types.is_empty() {
            debug!(registered_by = %registered_by, "app registered without inbox or outbox rights");
        }

        let mut enqueued = 0;
        for box_type in box_types {
            let job = ListenerJob::new(registered_by.clone(), box_type);
            if self.listeners.enqueue(&job).await? == EnqueueOutcome::Enqueued {
                enqueued += 1;
            }
        }
        Ok(enqueued)
    }
}

#[cfg(test)]
mod tests {
    use podwatch_core::{RawGrant, grant::READ_INBOX_IRI, grant::READ_OUTBOX_IRI};
    use podwatch_provider::testing::StaticGrantSource;
    use podwatch_queue::{JobPolicy, JobQueue, MemoryJobQueue};

    use super::*;

    struct Fixture {
        memory: MemoryJobQueue,
        metrics: Arc<WatcherMetrics>,
        reconciler: StartupReconciler,
    }

    fn fixture(grants: Option<StaticGrantSource>) -> Fixture {
        let memory = MemoryJobQueue::default();
        let metrics = Arc::new(WatcherMetrics::default());
        let listeners = Arc::new(ListenerRegistrationQueue::new(
            Arc::new(memory.clone()),
            JobPolicy::immediate(),
            Arc::clone(&metrics),
        ));
        let grants = grants.map(|g| Arc::new(g) as Arc<dyn GrantSource>);
        Fixture {
            memory,
            metrics: Arc::clone(&metrics),
            reconciler: StartupReconciler::new(grants, listeners, metrics),
        }
    }

    #[tokio::test]
    async fn enqueues_one_job_per_grant() {
        let f = fixture(Some(StaticGrantSource::new(vec![
            RawGrant::new("https://a.example/x", READ_INBOX_IRI),
            RawGrant::new("https://a.example/x", READ_OUTBOX_IRI),
            RawGrant::new("https://b.example/y", "apods:ReadInbox"),
        ])));

        let report = f.reconciler.reconcile().await.unwrap();

        assert_eq!(report.grants, 3);
        assert_eq!(report.enqueued, 3);
        assert!(f.memory.contains("https://a.example/x inbox"));
        assert!(f.memory.contains("https://a.example/x outbox"));
        assert!(f.memory.contains("https://b.example/y inbox"));
    }

    #[tokio::test]
    async fn malformed_grant_is_skipped() {
        let f = fixture(Some(StaticGrantSource::new(vec![
            RawGrant::default(),
            RawGrant::new("not-a-uri", READ_INBOX_IRI),
            RawGrant::new("https://a.example/x", READ_INBOX_IRI),
            RawGrant::new("https://a.example/x", "apods:SendNotification"),
        ])));

        let report = f.reconciler.reconcile().await.unwrap();

        assert_eq!(report.skipped, 2);
        assert_eq!(report.unrelated, 1);
        assert_eq!(report.enqueued, 1);
        assert_eq!(f.metrics.snapshot().grants_skipped, 2);
        assert_eq!(f.memory.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_grants_enqueue_once() {
        let f = fixture(Some(StaticGrantSource::new(vec![
            RawGrant::new("https://a.example/x", READ_INBOX_IRI),
            RawGrant::new("https://a.example/x", "apods:ReadInbox"),
        ])));

        let report = f.reconciler.reconcile().await.unwrap();

        assert_eq!(report.enqueued, 1);
        assert_eq!(report.duplicates, 1);
    }

    #[tokio::test]
    async fn stale_jobs_are_cleaned_first() {
        let f = fixture(Some(StaticGrantSource::new(vec![RawGrant::new(
            "https://a.example/x",
            READ_INBOX_IRI,
        )])));
        f.memory
            .enqueue("https://gone.example/z inbox", serde_json::json!({}), JobPolicy::immediate())
            .await
            .unwrap();
        f.memory
            .enqueue("https://a.example/x inbox", serde_json::json!({}), JobPolicy::immediate())
            .await
            .unwrap();

        let report = f.reconciler.reconcile().await.unwrap();

        assert_eq!(report.cleaned.jobs, 2);
        assert_eq!(report.enqueued, 1);
        assert!(!f.memory.contains("https://gone.example/z inbox"));
        assert!(f.memory.contains("https://a.example/x inbox"));
    }

    #[tokio::test]
    async fn grant_source_failure_is_an_error() {
        let f = fixture(Some(StaticGrantSource::unavailable("triplestore down")));
        let result = f.reconciler.reconcile().await;
        assert!(matches!(result, Err(WatcherError::Provider(_))));
    }

    #[tokio::test]
    async fn without_grant_source_only_cleans() {
        let f = fixture(None);
        let report = f.reconciler.reconcile().await.unwrap();
        assert_eq!(report, ReconcileReport::default());
    }

    #[tokio::test]
    async fn app_registered_enqueues_granted_collections() {
        let f = fixture(None);
        let alice = ActorUri::new("https://a.example/alice");
        let grants = vec![
            AppAccessGrant::new(["apods:ReadInbox"]),
            AppAccessGrant::new(["apods:ReadOutbox", "apods:ReadInbox"]),
        ];

        let enqueued = f.reconciler.app_registered(&alice, &grants).await.unwrap();

        assert_eq!(enqueued, 2);
        assert!(f.memory.contains("https://a.example/alice inbox"));
        assert!(f.memory.contains("https://a.example/alice outbox"));
    }

    #[tokio::test]
    async fn app_registered_without_read_rights_enqueues_nothing() {
        let f = fixture(None);
        let alice = ActorUri::new("https://a.example/alice");
        let grants = vec![AppAccessGrant::new(["apods:CreateWacGroup"])];

        let enqueued = f.reconciler.app_registered(&alice, &grants).await.unwrap();

        assert_eq!(enqueued, 0);
        assert!(f.memory.is_empty());
    }
}
