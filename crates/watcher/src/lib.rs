pub mod builder;
pub mod dispatcher;
pub mod error;
pub mod listener;
pub mod metrics;
pub mod reconciler;
pub mod registry;
pub mod watcher;

pub use builder::WatcherBuilder;
pub use dispatcher::{WebhookDispatcher, WebhookOutcome};
pub use error::WatcherError;
pub use listener::{ListenerJobProcessor, ListenerRegistrationQueue};
pub use metrics::{MetricsSnapshot, WatcherMetrics};
pub use reconciler::{ReconcileReport, StartupReconciler};
pub use registry::{HandlerEntry, HandlerRegistry, HandlerSummary};
pub use watcher::PodActivitiesWatcher;
