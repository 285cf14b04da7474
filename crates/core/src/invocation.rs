use serde::{Deserialize, Serialize};

use crate::activity::Activity;
use crate::box_type::BoxType;
use crate::types::ActorUri;

/// Parameters passed to an application action when its handler matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerInvocation {
    /// The key the handler was registered with.
    pub key: String,
    /// Which collection the activity was observed in.
    pub box_type: BoxType,
    /// The activity with every constrained reference materialised.
    pub dereferenced_activity: Activity,
    /// The actor whose collection changed.
    pub actor_uri: ActorUri,
}
