//! In-memory collaborators for tests.
//!
//! These are used by the unit tests of this workspace and by downstream
//! integration tests; none of them perform I/O.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

use podwatch_core::{ActionName, Activity, Actor, HandlerInvocation, RawGrant};

use crate::collaborators::{
    ActorDirectory, GrantSource, HandlerInvoker, ListenerReceipt, ListenerRegistrar,
    LocalResources, PodResources, PodResponse,
};
use crate::error::ProviderError;

#[derive(Debug, Clone)]
enum Stored {
    Resource(Activity),
    Status(u16),
    Broken(String),
}

/// A single resource request seen by [`MemoryResources`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    pub uri: String,
    pub acting_as: String,
    /// `true` when the request came through the local path.
    pub local: bool,
}

/// A resource store serving both the local and the remote retrieval paths.
///
/// Unknown URIs answer 404 (local) or `ok = false` (remote).
#[derive(Debug, Default)]
pub struct MemoryResources {
    resources: DashMap<String, Stored>,
    requests: Mutex<Vec<ResourceRequest>>,
}

impl MemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` at `uri`.
    pub fn insert(&self, uri: impl Into<String>, body: Activity) {
        self.resources.insert(uri.into(), Stored::Resource(body));
    }

    /// Answer `uri` with an error status.
    pub fn deny(&self, uri: impl Into<String>, status: u16) {
        self.resources.insert(uri.into(), Stored::Status(status));
    }

    /// Make requests for `uri` fail with a connection error.
    pub fn break_uri(&self, uri: impl Into<String>, message: impl Into<String>) {
        self.resources.insert(uri.into(), Stored::Broken(message.into()));
    }

    /// All requests received so far, in order.
    pub fn requests(&self) -> Vec<ResourceRequest> {
        self.requests.lock().clone()
    }

    /// How many times `uri` was requested.
    pub fn fetch_count(&self, uri: &str) -> usize {
        self.requests.lock().iter().filter(|r| r.uri == uri).count()
    }

    /// Total number of requests.
    pub fn total_fetches(&self) -> usize {
        self.requests.lock().len()
    }

    fn record(&self, uri: &str, acting_as: &str, local: bool) -> Option<Stored> {
        self.requests.lock().push(ResourceRequest {
            uri: uri.to_owned(),
            acting_as: acting_as.to_owned(),
            local,
        });
        self.resources.get(uri).map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl LocalResources for MemoryResources {
    async fn get(&self, resource_uri: &str, web_id: &str) -> Result<Activity, ProviderError> {
        match self.record(resource_uri, web_id, true) {
            Some(Stored::Resource(body)) => Ok(body),
            Some(Stored::Status(status)) => {
                Err(ProviderError::status(status, format!("{resource_uri} refused")))
            }
            Some(Stored::Broken(message)) => Err(ProviderError::Connection(message)),
            None => Err(ProviderError::status(404, format!("{resource_uri} not found"))),
        }
    }
}

#[async_trait]
impl PodResources for MemoryResources {
    async fn get(&self, resource_uri: &str, actor_uri: &str) -> Result<PodResponse, ProviderError> {
        match self.record(resource_uri, actor_uri, false) {
            Some(Stored::Resource(body)) => Ok(PodResponse::found(body)),
            Some(Stored::Status(status)) => Ok(PodResponse::refused(status)),
            Some(Stored::Broken(message)) => Err(ProviderError::Connection(message)),
            None => Ok(PodResponse::refused(404)),
        }
    }
}

/// Actor descriptors keyed by actor URI.
#[derive(Debug, Default)]
pub struct MemoryActorDirectory {
    actors: DashMap<String, Actor>,
}

impl MemoryActorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor whose inbox and outbox are `<id>/inbox` and `<id>/outbox`.
    pub fn add(&self, actor_uri: &str) -> Actor {
        let actor = Actor::new(
            actor_uri,
            format!("{actor_uri}/inbox"),
            format!("{actor_uri}/outbox"),
        );
        self.insert(actor.clone());
        actor
    }

    pub fn insert(&self, actor: Actor) {
        self.actors.insert(actor.id.clone(), actor);
    }
}

#[async_trait]
impl ActorDirectory for MemoryActorDirectory {
    async fn get(&self, actor_uri: &str) -> Result<Actor, ProviderError> {
        self.actors
            .get(actor_uri)
            .map(|a| a.value().clone())
            .ok_or_else(|| ProviderError::NotFound(actor_uri.to_owned()))
    }
}

/// Records every handler invocation.
#[derive(Debug, Default)]
pub struct RecordingInvoker {
    calls: Mutex<Vec<(ActionName, HandlerInvocation)>>,
    failing_action: Mutex<Option<String>>,
}

impl RecordingInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every invocation of `action` fail.
    pub fn fail_action(&self, action: impl Into<String>) {
        *self.failing_action.lock() = Some(action.into());
    }

    pub fn calls(&self) -> Vec<(ActionName, HandlerInvocation)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// The handler keys invoked, in invocation order.
    pub fn keys(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(_, i)| i.key.clone()).collect()
    }
}

#[async_trait]
impl HandlerInvoker for RecordingInvoker {
    async fn invoke(
        &self,
        action: &ActionName,
        invocation: &HandlerInvocation,
    ) -> Result<(), ProviderError> {
        self.calls.lock().push((action.clone(), invocation.clone()));
        if self.failing_action.lock().as_deref() == Some(action.as_str()) {
            return Err(ProviderError::ExecutionFailed(format!("{action} failed")));
        }
        Ok(())
    }
}

/// A registrar that fails its first `failures` calls, then succeeds.
#[derive(Debug, Default)]
pub struct ScriptedRegistrar {
    failures_left: AtomicU32,
    calls: AtomicUsize,
    registered: Mutex<Vec<(String, String)>>,
}

impl ScriptedRegistrar {
    /// A registrar that always succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registrar that fails the first `failures` calls.
    pub fn failing(failures: u32) -> Self {
        Self {
            failures_left: AtomicU32::new(failures),
            ..Self::default()
        }
    }

    /// A registrar that never succeeds.
    pub fn always_failing() -> Self {
        Self::failing(u32::MAX)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Successful registrations as `(resource_uri, callback)` pairs.
    pub fn registered(&self) -> Vec<(String, String)> {
        self.registered.lock().clone()
    }
}

#[async_trait]
impl ListenerRegistrar for ScriptedRegistrar {
    async fn register(
        &self,
        resource_uri: &str,
        callback: &str,
    ) -> Result<ListenerReceipt, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ProviderError::Connection(format!(
                "notification service unreachable for {resource_uri}"
            )));
        }
        self.registered
            .lock()
            .push((resource_uri.to_owned(), callback.to_owned()));
        Ok(ListenerReceipt::new(resource_uri, callback))
    }
}

/// A fixed list of grant rows, or a fixed failure.
#[derive(Debug, Default)]
pub struct StaticGrantSource {
    grants: Vec<RawGrant>,
    error: Option<String>,
}

impl StaticGrantSource {
    pub fn new(grants: Vec<RawGrant>) -> Self {
        Self {
            grants,
            error: None,
        }
    }

    /// A source whose query always fails.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            grants: Vec::new(),
            error: Some(message.into()),
        }
    }
}

#[async_trait]
impl GrantSource for StaticGrantSource {
    async fn access_grants(&self) -> Result<Vec<RawGrant>, ProviderError> {
        match &self.error {
            Some(message) => Err(ProviderError::Connection(message.clone())),
            None => Ok(self.grants.clone()),
        }
    }
}
