use serde::{Deserialize, Serialize};

use crate::box_type::BoxType;
use crate::types::ActorUri;

/// Payload of a listener registration job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerJob {
    pub actor_uri: ActorUri,
    pub collection_predicate: BoxType,
}

impl ListenerJob {
    /// Create a job for the given actor and collection.
    pub fn new(actor_uri: impl Into<ActorUri>, collection_predicate: BoxType) -> Self {
        Self {
            actor_uri: actor_uri.into(),
            collection_predicate,
        }
    }

    /// The queue key: `"<actorUri> <collection>"`. At most one job per key
    /// may be pending or active.
    pub fn key(&self) -> String {
        format!("{} {}", self.actor_uri, self.collection_predicate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_format() {
        let job = ListenerJob::new("https://a.example/x", BoxType::Inbox);
        assert_eq!(job.key(), "https://a.example/x inbox");
    }

    #[test]
    fn serializes_with_collection_predicate() {
        let job = ListenerJob::new("https://a.example/x", BoxType::Outbox);
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["actorUri"], "https://a.example/x");
        assert_eq!(value["collectionPredicate"], "outbox");
        let back: ListenerJob = serde_json::from_value(value).unwrap();
        assert_eq!(back, job);
    }
}
