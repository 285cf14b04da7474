use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::box_type::BoxType;

/// A JSON-LD style node graph as received from a pod.
///
/// Fields may hold literals, embedded objects, or bare URI strings that
/// still need to be dereferenced.
pub type Activity = Value;

/// The parts of an actor descriptor this crate relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    /// The actor URI.
    #[serde(alias = "@id")]
    pub id: String,

    /// URI of the actor's inbox collection.
    #[serde(default)]
    pub inbox: Option<String>,

    /// URI of the actor's outbox collection.
    #[serde(default)]
    pub outbox: Option<String>,

    /// Remaining descriptor fields, kept for callers that need them.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Actor {
    /// Create a descriptor with the given inbox and outbox URIs.
    #[must_use]
    pub fn new(id: impl Into<String>, inbox: impl Into<String>, outbox: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            inbox: Some(inbox.into()),
            outbox: Some(outbox.into()),
            extra: serde_json::Map::new(),
        }
    }

    /// Return the URI of the requested collection, if the descriptor has one.
    pub fn collection(&self, box_type: BoxType) -> Option<&str> {
        match box_type {
            BoxType::Inbox => self.inbox.as_deref(),
            BoxType::Outbox => self.outbox.as_deref(),
        }
    }

    /// Decide which of this actor's collections `target` designates.
    ///
    /// Comparison is exact string equality. A target matching neither
    /// collection yields `None`.
    pub fn classify(&self, target: &str) -> Option<BoxType> {
        if self.inbox.as_deref() == Some(target) {
            Some(BoxType::Inbox)
        } else if self.outbox.as_deref() == Some(target) {
            Some(BoxType::Outbox)
        } else {
            None
        }
    }
}
