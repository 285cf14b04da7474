//! reqwest-backed collaborators, enabled with the `http` feature.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use tracing::debug;

use podwatch_core::{ActionName, Activity, Actor, HandlerInvocation, RawGrant};

use crate::collaborators::{
    ActorDirectory, GrantSource, HandlerInvoker, ListenerReceipt, ListenerRegistrar,
    LocalResources, PodResources, PodResponse,
};
use crate::error::ProviderError;

/// Media type requested for every linked-data document.
pub const JSON_LD: &str = "application/ld+json";

/// Header carrying the identity a local resource request acts as.
pub const ACTING_AS_HEADER: &str = "x-acting-as";

/// A shared HTTP client together with the request timeout it enforces.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Build a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Configuration(format!("failed to build http client: {e}")))?;
        Ok(Self { client, timeout })
    }

    fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ProviderError> {
        request
            .send()
            .await
            .map_err(|e| map_transport_error(&e, self.timeout))
    }
}

fn map_transport_error(err: &reqwest::Error, timeout: Duration) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(timeout)
    } else if err.is_connect() {
        ProviderError::Connection(err.to_string())
    } else if err.is_decode() {
        ProviderError::Serialization(err.to_string())
    } else {
        ProviderError::ExecutionFailed(err.to_string())
    }
}

/// Turn a non-success response into [`ProviderError::Status`].
async fn check_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| status.to_string());
    Err(ProviderError::status(status.as_u16(), message))
}

async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::Serialization(e.to_string()))
}

/// Dereferences actor URIs over HTTP.
#[derive(Debug, Clone)]
pub struct HttpActorDirectory {
    http: HttpTransport,
}

impl HttpActorDirectory {
    pub fn new(http: HttpTransport) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ActorDirectory for HttpActorDirectory {
    async fn get(&self, actor_uri: &str) -> Result<Actor, ProviderError> {
        let request = self.http.get(actor_uri).header(ACCEPT, JSON_LD);
        let response = self.http.send(request).await?;
        read_json(check_status(response).await?).await
    }
}

/// Reads resources from this server, forwarding the acting identity.
#[derive(Debug, Clone)]
pub struct HttpLocalResources {
    http: HttpTransport,
}

impl HttpLocalResources {
    pub fn new(http: HttpTransport) -> Self {
        Self { http }
    }
}

#[async_trait]
impl LocalResources for HttpLocalResources {
    async fn get(&self, resource_uri: &str, web_id: &str) -> Result<Activity, ProviderError> {
        let request = self
            .http
            .get(resource_uri)
            .header(ACCEPT, JSON_LD)
            .header(ACTING_AS_HEADER, web_id);
        let response = self.http.send(request).await?;
        read_json(check_status(response).await?).await
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PodResourceRequest<'a> {
    resource_uri: &'a str,
    actor_uri: &'a str,
}

/// Asks the pod-resource proxy to fetch a remote resource for an actor.
#[derive(Debug, Clone)]
pub struct HttpPodResources {
    http: HttpTransport,
    endpoint: String,
}

impl HttpPodResources {
    pub fn new(http: HttpTransport, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl PodResources for HttpPodResources {
    async fn get(&self, resource_uri: &str, actor_uri: &str) -> Result<PodResponse, ProviderError> {
        let request = self
            .http
            .post(&self.endpoint)
            .json(&PodResourceRequest {
                resource_uri,
                actor_uri,
            });
        let response = self.http.send(request).await?;
        read_json(check_status(response).await?).await
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListenerRequest<'a> {
    resource_uri: &'a str,
    callback: &'a str,
}

/// Registers webhook listeners with the notification service.
#[derive(Debug, Clone)]
pub struct HttpListenerRegistrar {
    http: HttpTransport,
    endpoint: String,
}

impl HttpListenerRegistrar {
    pub fn new(http: HttpTransport, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ListenerRegistrar for HttpListenerRegistrar {
    async fn register(
        &self,
        resource_uri: &str,
        callback: &str,
    ) -> Result<ListenerReceipt, ProviderError> {
        let request = self
            .http
            .post(&self.endpoint)
            .json(&ListenerRequest {
                resource_uri,
                callback,
            });
        let response = self.http.send(request).await?;
        let response = check_status(response).await?;

        // Some notification services answer 201 with an empty body.
        let details: serde_json::Value = response.json().await.unwrap_or_default();
        let mut receipt = ListenerReceipt::new(resource_uri, callback);
        if let serde_json::Value::Object(map) = details {
            receipt.details = map;
        }
        Ok(receipt)
    }
}

/// Posts handler invocations to per-action URLs.
#[derive(Debug, Clone)]
pub struct HttpHandlerInvoker {
    http: HttpTransport,
    routes: HashMap<String, String>,
}

impl HttpHandlerInvoker {
    pub fn new(http: HttpTransport, routes: HashMap<String, String>) -> Self {
        Self { http, routes }
    }
}

#[async_trait]
impl HandlerInvoker for HttpHandlerInvoker {
    async fn invoke(
        &self,
        action: &ActionName,
        invocation: &HandlerInvocation,
    ) -> Result<(), ProviderError> {
        let url = self.routes.get(action.as_str()).ok_or_else(|| {
            ProviderError::Configuration(format!("no URL configured for action {action}"))
        })?;
        debug!(action = %action, url, key = %invocation.key, "invoking action");
        let request = self.http.post(url).json(invocation);
        let response = self.http.send(request).await?;
        check_status(response).await?;
        Ok(())
    }
}

/// Loads existing access grants from a JSON endpoint returning
/// `[{"grantedBy": ..., "specialRights": ...}]`.
#[derive(Debug, Clone)]
pub struct HttpGrantSource {
    http: HttpTransport,
    url: String,
}

impl HttpGrantSource {
    pub fn new(http: HttpTransport, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl GrantSource for HttpGrantSource {
    async fn access_grants(&self) -> Result<Vec<RawGrant>, ProviderError> {
        let request = self.http.get(&self.url).header(ACCEPT, "application/json");
        let response = self.http.send(request).await?;
        read_json(check_status(response).await?).await
    }
}

#[cfg(test)]
mod tests {
    use tokio::net::TcpListener;

    use super::*;

    fn transport(timeout: Duration) -> HttpTransport {
        HttpTransport::new(timeout).unwrap()
    }

    #[tokio::test]
    async fn timeout_error_carries_configured_duration() {
        // Accepts connections but never answers.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let timeout = Duration::from_millis(200);
        let actors = HttpActorDirectory::new(transport(timeout));
        let err = actors.get(&format!("http://{addr}/alice")).await.unwrap_err();

        assert!(matches!(err, ProviderError::Timeout(d) if d == timeout));
        assert!(err.is_retryable());
        server.abort();
    }

    #[tokio::test]
    async fn invoker_rejects_unknown_action() {
        let invoker = HttpHandlerInvoker::new(transport(Duration::from_secs(1)), HashMap::new());
        let invocation = HandlerInvocation {
            key: "contact-request".into(),
            box_type: podwatch_core::BoxType::Inbox,
            dereferenced_activity: serde_json::json!({}),
            actor_uri: "https://pod.example/alice".into(),
        };
        let err = invoker
            .invoke(&ActionName::new("contacts.handle"), &invocation)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }
}
