use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PodwatchError;

/// One of the two actor collections this system can watch.
///
/// Also used as the collection predicate of a listener job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoxType {
    Inbox,
    Outbox,
}

impl BoxType {
    /// Both collections, in a fixed order.
    pub const ALL: [Self; 2] = [Self::Inbox, Self::Outbox];

    /// The predicate name used on actor descriptors.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::Outbox => "outbox",
        }
    }
}

impl fmt::Display for BoxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoxType {
    type Err = PodwatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inbox" => Ok(Self::Inbox),
            "outbox" => Ok(Self::Outbox),
            other => Err(PodwatchError::UnknownCollection(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        assert_eq!("inbox".parse::<BoxType>().unwrap(), BoxType::Inbox);
        assert_eq!(BoxType::Outbox.to_string(), "outbox");
        assert_eq!(
            "followers".parse::<BoxType>().unwrap_err(),
            PodwatchError::UnknownCollection("followers".into())
        );
    }

    #[test]
    fn serde_lowercase() {
        let json = serde_json::to_string(&[BoxType::Inbox, BoxType::Outbox]).unwrap();
        assert_eq!(json, r#"["inbox","outbox"]"#);
    }
}
