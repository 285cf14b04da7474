//! Traits for the services this watcher consumes but does not own.
//!
//! Every trait is object-safe (via [`macro@async_trait`]) so implementations
//! can be shared as `Arc<dyn Trait>` between the dispatcher, the listener
//! queue and the reconciler.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use podwatch_core::{ActionName, Activity, Actor, HandlerInvocation, RawGrant};

use crate::error::ProviderError;

/// Retrieves actor descriptors.
#[async_trait]
pub trait ActorDirectory: Send + Sync {
    /// Fetch the descriptor of `actor_uri`.
    async fn get(&self, actor_uri: &str) -> Result<Actor, ProviderError>;
}

/// Retrieves resources held under this server's own authority.
#[async_trait]
pub trait LocalResources: Send + Sync {
    /// Fetch `resource_uri` acting as `web_id`.
    ///
    /// Authorization and existence failures are reported as
    /// [`ProviderError::Status`] with 401, 403 or 404.
    async fn get(&self, resource_uri: &str, web_id: &str) -> Result<Activity, ProviderError>;
}

/// Response of the remote pod-resource retrieval service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodResponse {
    /// Whether the remote server returned the resource.
    pub ok: bool,
    /// Status reported by the remote server, when known.
    #[serde(default)]
    pub status: Option<u16>,
    /// The resource body when `ok` is true.
    #[serde(default)]
    pub body: Option<Activity>,
}

impl PodResponse {
    pub fn found(body: Activity) -> Self {
        Self {
            ok: true,
            status: Some(200),
            body: Some(body),
        }
    }

    pub fn refused(status: u16) -> Self {
        Self {
            ok: false,
            status: Some(status),
            body: None,
        }
    }
}

/// Retrieves resources held by remote pods on behalf of a local actor.
#[async_trait]
pub trait PodResources: Send + Sync {
    /// Fetch `resource_uri` with the credentials of `actor_uri`.
    async fn get(&self, resource_uri: &str, actor_uri: &str) -> Result<PodResponse, ProviderError>;
}

/// Opaque acknowledgement returned when a listener has been registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerReceipt {
    /// The watched collection.
    pub resource_uri: String,
    /// Where notifications will be delivered.
    pub callback: String,
    /// Anything else the notification service returned.
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl ListenerReceipt {
    pub fn new(resource_uri: impl Into<String>, callback: impl Into<String>) -> Self {
        Self {
            resource_uri: resource_uri.into(),
            callback: callback.into(),
            details: serde_json::Map::new(),
        }
    }
}

/// Subscribes a webhook to changes of a remote collection.
#[async_trait]
pub trait ListenerRegistrar: Send + Sync {
    /// Ask the notification service to call `callback` whenever
    /// `resource_uri` changes.
    async fn register(
        &self,
        resource_uri: &str,
        callback: &str,
    ) -> Result<ListenerReceipt, ProviderError>;
}

/// Invokes application actions for matched handlers.
#[async_trait]
pub trait HandlerInvoker: Send + Sync {
    /// Call `action` with the match details.
    async fn invoke(
        &self,
        action: &ActionName,
        invocation: &HandlerInvocation,
    ) -> Result<(), ProviderError>;
}

/// Lists the access grants that exist when the process starts.
#[async_trait]
pub trait GrantSource: Send + Sync {
    async fn access_grants(&self) -> Result<Vec<RawGrant>, ProviderError>;
}
