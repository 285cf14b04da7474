use serde::{Deserialize, Serialize};

use crate::error::PodwatchError;
use crate::types::ActorUri;
use crate::uri::container_of;

/// Notification type that announces a new member of a collection.
pub const ADD: &str = "Add";

/// A collection change notification delivered by the notification transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Notification type (`Add`, `Remove`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// URI of the resource added to or removed from the collection.
    pub object: String,
    /// URI of the collection that changed.
    pub target: String,
}

impl NotificationEvent {
    pub fn new(kind: impl Into<String>, object: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            object: object.into(),
            target: target.into(),
        }
    }

    /// Only additions carry a newly observable activity.
    pub fn is_addition(&self) -> bool {
        self.kind == ADD
    }

    /// The owning actor, taken to be the container of the target collection.
    pub fn actor_uri(&self) -> Result<ActorUri, PodwatchError> {
        container_of(&self.target).map(ActorUri::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_type_field() {
        let event: NotificationEvent = serde_json::from_str(
            r#"{"type":"Add","object":"https://remote/activities/1","target":"https://local/alice/inbox"}"#,
        )
        .unwrap();
        assert!(event.is_addition());
        assert_eq!(event.actor_uri().unwrap().as_str(), "https://local/alice");
    }

    #[test]
    fn remove_is_not_addition() {
        let event = NotificationEvent::new("Remove", "https://x/1", "https://local/alice/inbox");
        assert!(!event.is_addition());
    }
}
