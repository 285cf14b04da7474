use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use podwatch_provider::http::{
    HttpActorDirectory, HttpGrantSource, HttpHandlerInvoker, HttpListenerRegistrar,
    HttpLocalResources, HttpPodResources, HttpTransport,
};
use podwatch_queue::MemoryJobQueue;
use podwatch_watcher::{PodActivitiesWatcher, WatcherBuilder};

use crate::config::{HandlerConfig, PodwatchConfig};
use crate::error::ServerError;

/// Build a watcher talking to the configured collaborators over HTTP and
/// register the configured handlers on it.
pub fn create_watcher(config: &PodwatchConfig) -> Result<PodActivitiesWatcher, ServerError> {
    let http = HttpTransport::new(Duration::from_secs(
        config.collaborators.request_timeout_seconds,
    ))
    .map_err(|e| ServerError::Config(e.to_string()))?;

    let base_url = &config.server.base_url;
    let root = base_url.trim_end_matches('/');
    let pod_resources_url = config
        .collaborators
        .pod_resources_url
        .clone()
        .unwrap_or_else(|| format!("{root}/.pod-resources"));
    let listener_endpoint = config
        .collaborators
        .listener_endpoint
        .clone()
        .unwrap_or_else(|| format!("{root}/.notifications/listeners"));

    let mut builder = WatcherBuilder::new()
        .base_url(base_url.as_str())
        .callback_url(config.server.callback_url())
        .actors(Arc::new(HttpActorDirectory::new(http.clone())))
        .local_resources(Arc::new(HttpLocalResources::new(http.clone())))
        .pod_resources(Arc::new(HttpPodResources::new(http.clone(), pod_resources_url)))
        .registrar(Arc::new(HttpListenerRegistrar::new(
            http.clone(),
            listener_endpoint,
        )))
        .invoker(Arc::new(HttpHandlerInvoker::new(
            http.clone(),
            config.actions.clone(),
        )))
        .queue(Arc::new(MemoryJobQueue::new(config.queue.queue_config())))
        .policy(config.queue.policy());

    if let Some(url) = &config.collaborators.grants_url {
        builder = builder.grants(Arc::new(HttpGrantSource::new(http, url.clone())));
    }

    let watcher = builder.build()?;
    register_handlers(&watcher, config)?;
    Ok(watcher)
}

/// Register `[[handlers]]` entries, checking each names a configured action.
pub fn register_handlers(
    watcher: &PodActivitiesWatcher,
    config: &PodwatchConfig,
) -> Result<(), ServerError> {
    for HandlerConfig {
        key,
        action,
        box_types,
        pattern,
    } in &config.handlers
    {
        if !config.actions.contains_key(action) {
            return Err(ServerError::Config(format!(
                "handler {key} refers to unknown action {action}"
            )));
        }
        watcher.watch(pattern.clone(), action.as_str(), box_types, key.as_str());
    }
    info!(count = config.handlers.len(), "handlers loaded from configuration");
    Ok(())
}
