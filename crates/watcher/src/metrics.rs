use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Atomic counters tracking webhook and listener activity.
///
/// All counters use relaxed ordering. For a point-in-time view, call
/// [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct WatcherMetrics {
    /// Notifications received, whatever their type.
    pub webhooks_received: AtomicU64,
    /// Notifications dropped because they were not additions.
    pub ignored: AtomicU64,
    /// Notifications whose activity could not be fetched.
    pub unavailable: AtomicU64,
    /// Handler actions invoked after a match.
    pub handlers_invoked: AtomicU64,
    /// Listener jobs accepted by the queue.
    pub listeners_enqueued: AtomicU64,
    /// Listener jobs rejected because their key was already queued.
    pub listeners_deduplicated: AtomicU64,
    /// Malformed grants skipped during reconciliation.
    pub grants_skipped: AtomicU64,
}

impl WatcherMetrics {
    pub fn increment_webhooks_received(&self) {
        self.webhooks_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_ignored(&self) {
        self.ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_unavailable(&self) {
        self.unavailable.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_handlers_invoked(&self) {
        self.handlers_invoked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_listeners_enqueued(&self) {
        self.listeners_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_listeners_deduplicated(&self) {
        self.listeners_deduplicated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_grants_skipped(&self) {
        self.grants_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            webhooks_received: self.webhooks_received.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            unavailable: self.unavailable.load(Ordering::Relaxed),
            handlers_invoked: self.handlers_invoked.load(Ordering::Relaxed),
            listeners_enqueued: self.listeners_enqueued.load(Ordering::Relaxed),
            listeners_deduplicated: self.listeners_deduplicated.load(Ordering::Relaxed),
            grants_skipped: self.grants_skipped.load(Ordering::Relaxed),
        }
    }
}

/// A plain data snapshot of [`WatcherMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub webhooks_received: u64,
    pub ignored: u64,
    pub unavailable: u64,
    pub handlers_invoked: u64,
    pub listeners_enqueued: u64,
    pub listeners_deduplicated: u64,
    pub grants_skipped: u64,
}
