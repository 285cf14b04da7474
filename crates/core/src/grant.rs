use serde::{Deserialize, Serialize};

use crate::box_type::BoxType;
use crate::error::PodwatchError;
use crate::listener::ListenerJob;
use crate::types::ActorUri;

/// Full IRI of the right to read an actor's inbox.
pub const READ_INBOX_IRI: &str = "http://activitypods.org/ns/core#ReadInbox";
/// Full IRI of the right to read an actor's outbox.
pub const READ_OUTBOX_IRI: &str = "http://activitypods.org/ns/core#ReadOutbox";

/// A special right an access grant can carry that requires a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialRight {
    ReadInbox,
    ReadOutbox,
}

impl SpecialRight {
    /// Parse a right from its full IRI, its `apods:` compact form, or its
    /// bare local name. Rights unrelated to collection reading yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let local = value
            .strip_prefix("http://activitypods.org/ns/core#")
            .or_else(|| value.strip_prefix("apods:"))
            .unwrap_or(value);
        match local {
            "ReadInbox" => Some(Self::ReadInbox),
            "ReadOutbox" => Some(Self::ReadOutbox),
            _ => None,
        }
    }

    /// The collection this right gives read access to.
    pub fn box_type(self) -> BoxType {
        match self {
            Self::ReadInbox => BoxType::Inbox,
            Self::ReadOutbox => BoxType::Outbox,
        }
    }
}

/// An untyped access grant row as returned by the grant query collaborator.
///
/// Both fields are optional so that a malformed row can be reported and
/// skipped instead of failing the whole result set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGrant {
    pub granted_by: Option<String>,
    pub special_rights: Option<String>,
}

impl RawGrant {
    /// Build a row from its two values.
    pub fn new(granted_by: impl Into<String>, special_rights: impl Into<String>) -> Self {
        Self {
            granted_by: Some(granted_by.into()),
            special_rights: Some(special_rights.into()),
        }
    }
}

/// A validated access grant that calls for a collection listener.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGrant {
    pub granted_by: ActorUri,
    pub special_right: SpecialRight,
}

impl AccessGrant {
    /// Validate a raw row.
    ///
    /// Returns `Ok(None)` for well-formed grants whose right does not
    /// involve reading a collection, and an error for rows with a missing
    /// or non-URI `grantedBy` or a missing right.
    pub fn from_raw(raw: &RawGrant) -> Result<Option<Self>, PodwatchError> {
        let granted_by = raw
            .granted_by
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PodwatchError::InvalidGrant("missing grantedBy".into()))?;
        if !granted_by.contains("://") {
            return Err(PodwatchError::InvalidGrant(format!(
                "grantedBy is not a URI: {granted_by}"
            )));
        }
        let rights = raw
            .special_rights
            .as_deref()
            .ok_or_else(|| PodwatchError::InvalidGrant("missing specialRights".into()))?;

        Ok(SpecialRight::parse(rights).map(|special_right| Self {
            granted_by: ActorUri::new(granted_by),
            special_right,
        }))
    }

    /// The listener job this grant requires.
    pub fn listener_job(&self) -> ListenerJob {
        ListenerJob::new(self.granted_by.clone(), self.special_right.box_type())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl Default for OneOrMany {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

/// An access grant carried by an "app registered" event.
///
/// The rights field may be a single value or a list, as in JSON-LD.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppAccessGrant {
    #[serde(rename = "apods:hasSpecialRights", alias = "specialRights", default)]
    special_rights: OneOrMany,
}

impl AppAccessGrant {
    /// Build a grant carrying the given rights.
    pub fn new<I, S>(rights: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            special_rights: OneOrMany::Many(rights.into_iter().map(Into::into).collect()),
        }
    }

    /// The recognised rights on this grant, in declaration order.
    pub fn rights(&self) -> Vec<SpecialRight> {
        let values: &[String] = match &self.special_rights {
            OneOrMany::One(v) => std::slice::from_ref(v),
            OneOrMany::Many(vs) => vs,
        };
        values.iter().filter_map(|v| SpecialRight::parse(v)).collect()
    }

    /// Whether this grant includes the given right.
    pub fn has_right(&self, right: SpecialRight) -> bool {
        self.rights().contains(&right)
    }
}
