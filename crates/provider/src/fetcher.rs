use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use podwatch_core::{Activity, ActorUri};

use crate::authority::LocalAuthority;
use crate::collaborators::{LocalResources, PodResources};
use crate::error::ProviderError;

/// A dereferencing capability bound to one acting identity.
///
/// `Ok(None)` means the resource is absent or not visible to that identity.
/// Any other failure is returned as an error.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// The identity every fetch is authorised as.
    fn acting_as(&self) -> &ActorUri;

    /// Resolve `uri` to its JSON representation.
    async fn fetch(&self, uri: &str) -> Result<Option<Activity>, ProviderError>;
}

/// Resolves resource URIs through the local or the remote retrieval path
/// depending on their authority.
#[derive(Clone)]
pub struct ResourceFetcher {
    authority: LocalAuthority,
    local: Arc<dyn LocalResources>,
    remote: Arc<dyn PodResources>,
}

impl std::fmt::Debug for ResourceFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceFetcher")
            .field("authority", &self.authority.as_str())
            .finish_non_exhaustive()
    }
}

impl ResourceFetcher {
    /// Create a fetcher for a server whose own resources live under
    /// `authority`.
    pub fn new(
        authority: LocalAuthority,
        local: Arc<dyn LocalResources>,
        remote: Arc<dyn PodResources>,
    ) -> Self {
        Self {
            authority,
            local,
            remote,
        }
    }

    /// Fetch `uri` as `actor_uri`.
    ///
    /// Local 401/403/404 and remote `ok = false` yield `Ok(None)`. Other
    /// local errors are returned unchanged.
    pub async fn fetch(
        &self,
        uri: &str,
        actor_uri: &ActorUri,
    ) -> Result<Option<Activity>, ProviderError> {
        if self.authority.contains(uri) {
            match self.local.get(uri, actor_uri).await {
                Ok(resource) => Ok(Some(resource)),
                Err(err) if err.is_denial() => {
                    debug!(uri, actor_uri = %actor_uri, error = %err, "local resource not visible");
                    Ok(None)
                }
                Err(err) => Err(err),
            }
        } else {
            let response = self.remote.get(uri, actor_uri).await?;
            if response.ok {
                Ok(response.body)
            } else {
                debug!(uri, actor_uri = %actor_uri, status = ?response.status, "remote resource not visible");
                Ok(None)
            }
        }
    }

    /// Bind this fetcher to an acting identity.
    #[must_use]
    pub fn acting_as(&self, actor_uri: ActorUri) -> ScopedFetcher {
        ScopedFetcher {
            inner: self.clone(),
            actor_uri,
        }
    }
}

/// A [`ResourceFetcher`] bound to a single actor.
#[derive(Debug, Clone)]
pub struct ScopedFetcher {
    inner: ResourceFetcher,
    actor_uri: ActorUri,
}

#[async_trait]
impl Fetcher for ScopedFetcher {
    fn acting_as(&self) -> &ActorUri {
        &self.actor_uri
    }

    async fn fetch(&self, uri: &str) -> Result<Option<Activity>, ProviderError> {
        self.inner.fetch(uri, &self.actor_uri).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::MemoryResources;

    const BASE: &str = "https://pod.example";

    fn fetcher(resources: &Arc<MemoryResources>) -> ScopedFetcher {
        let local: Arc<dyn LocalResources> = Arc::clone(resources) as _;
        let remote: Arc<dyn PodResources> = Arc::clone(resources) as _;
        ResourceFetcher::new(LocalAuthority::parse(BASE).unwrap(), local, remote)
            .acting_as(ActorUri::new("https://pod.example/alice"))
    }

    #[tokio::test]
    async fn local_resource_is_fetched_as_actor() {
        let resources = Arc::new(MemoryResources::new());
        resources.insert("https://pod.example/alice/notes/1", json!({"type": "Note"}));

        let fetched = fetcher(&resources)
            .fetch("https://pod.example/alice/notes/1")
            .await
            .unwrap();
        assert_eq!(fetched, Some(json!({"type": "Note"})));

        let requests = resources.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].acting_as, "https://pod.example/alice");
        assert!(requests[0].local);
    }

    #[tokio::test]
    async fn local_denials_become_none() {
        let resources = Arc::new(MemoryResources::new());
        resources.deny("https://pod.example/bob/private", 403);
        resources.deny("https://pod.example/bob/secret", 401);

        let f = fetcher(&resources);
        assert_eq!(f.fetch("https://pod.example/bob/private").await.unwrap(), None);
        assert_eq!(f.fetch("https://pod.example/bob/secret").await.unwrap(), None);
        assert_eq!(f.fetch("https://pod.example/bob/missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn local_server_errors_propagate() {
        let resources = Arc::new(MemoryResources::new());
        resources.deny("https://pod.example/bob/broken", 500);

        let err = fetcher(&resources)
            .fetch("https://pod.example/bob/broken")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn remote_resources_use_pod_path() {
        let resources = Arc::new(MemoryResources::new());
        resources.insert("https://remote.example/activities/1", json!({"type": "Offer"}));
        resources.deny("https://remote.example/activities/2", 403);

        let f = fetcher(&resources);
        assert_eq!(
            f.fetch("https://remote.example/activities/1").await.unwrap(),
            Some(json!({"type": "Offer"}))
        );
        assert_eq!(f.fetch("https://remote.example/activities/2").await.unwrap(), None);
        assert!(resources.requests().iter().all(|r| !r.local));
    }

    #[tokio::test]
    async fn lookalike_host_takes_remote_path() {
        let resources = Arc::new(MemoryResources::new());
        resources.insert("https://pod.example.attacker.net/a", json!({"type": "Note"}));

        let fetched = fetcher(&resources)
            .fetch("https://pod.example.attacker.net/a")
            .await
            .unwrap();
        assert_eq!(fetched, Some(json!({"type": "Note"})));

        let requests = resources.requests();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].local);
    }
}
