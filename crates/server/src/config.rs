use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use podwatch_core::BoxType;
use podwatch_matcher::Pattern;
use podwatch_queue::{JobPolicy, QueueConfig, RetryStrategy};

/// Top-level configuration for the podwatch server, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct PodwatchConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Listener registration queue configuration.
    #[serde(default)]
    pub queue: QueueSettings,
    /// Endpoints of the services the watcher consumes.
    #[serde(default)]
    pub collaborators: CollaboratorsConfig,
    /// Action name to URL invoked when a handler with that action matches.
    #[serde(default)]
    pub actions: HashMap<String, String>,
    /// Handlers registered at startup.
    #[serde(default)]
    pub handlers: Vec<HandlerConfig>,
}

/// HTTP server bind configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// This server's own authority. Resources under it are fetched locally.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Webhook URL handed to the notification service. Defaults to
    /// `{base_url}/v1/webhook`.
    pub callback_url: Option<String>,
}

impl ServerConfig {
    pub fn callback_url(&self) -> String {
        self.callback_url.clone().unwrap_or_else(|| {
            format!("{}/v1/webhook", self.base_url.trim_end_matches('/'))
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: default_base_url(),
            callback_url: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    8090
}

fn default_base_url() -> String {
    "http://localhost:8090".to_owned()
}

/// Retry and concurrency settings for listener registration jobs.
#[derive(Debug, Deserialize)]
pub struct QueueSettings {
    /// Total attempts per job. `1` disables retries.
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    #[serde(default = "default_backoff_base")]
    pub backoff_base_seconds: u64,
    #[serde(default = "default_backoff_max")]
    pub backoff_max_seconds: u64,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    #[serde(default = "default_attempt_timeout")]
    pub attempt_timeout_seconds: u64,
}

impl QueueSettings {
    pub fn policy(&self) -> JobPolicy {
        JobPolicy {
            attempts: self.attempts.max(1),
            backoff: RetryStrategy::exponential(
                Duration::from_secs(self.backoff_base_seconds),
                Duration::from_secs(self.backoff_max_seconds),
            ),
            attempt_timeout: Duration::from_secs(self.attempt_timeout_seconds),
        }
    }

    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            max_concurrent: self.max_concurrent,
        }
    }
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            backoff_base_seconds: default_backoff_base(),
            backoff_max_seconds: default_backoff_max(),
            max_concurrent: default_max_concurrent(),
            attempt_timeout_seconds: default_attempt_timeout(),
        }
    }
}

fn default_attempts() -> u32 {
    8
}

fn default_backoff_base() -> u64 {
    180
}

fn default_backoff_max() -> u64 {
    12 * 60 * 60
}

fn default_max_concurrent() -> usize {
    4
}

fn default_attempt_timeout() -> u64 {
    60
}

/// Endpoints of the external services.
#[derive(Debug, Deserialize)]
pub struct CollaboratorsConfig {
    /// Remote pod-resource retrieval endpoint.
    pub pod_resources_url: Option<String>,
    /// Listener registration endpoint of the notification service.
    pub listener_endpoint: Option<String>,
    /// Access grant query endpoint. Without it, startup skips reconciliation.
    pub grants_url: Option<String>,
    /// Request timeout applied to every collaborator call.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for CollaboratorsConfig {
    fn default() -> Self {
        Self {
            pod_resources_url: None,
            listener_endpoint: None,
            grants_url: None,
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// A handler registered from configuration.
#[derive(Debug, Deserialize)]
pub struct HandlerConfig {
    pub key: String,
    /// Name of an entry in `[actions]`.
    pub action: String,
    pub box_types: Vec<BoxType>,
    pub pattern: Pattern,
}
