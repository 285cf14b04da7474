use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A constraint on one field of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternValue {
    /// The field must equal this value, or be an array containing it.
    Literal(Value),
    /// The field must be a node (embedded or referenced) matching this pattern.
    Nested(Pattern),
}

/// A declarative description of the activities a handler is interested in.
///
/// Every field present constrains the candidate; absent fields are
/// wildcards. Patterns deserialize from any JSON object: object values
/// become nested patterns and everything else a literal.
///
/// ```
/// use podwatch_matcher::Pattern;
/// use serde_json::json;
///
/// let pattern = Pattern::try_from(json!({
///     "type": "Offer",
///     "object": { "type": "Add" }
/// }))
/// .unwrap();
/// assert_eq!(pattern.depth(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Pattern {
    fields: BTreeMap<String, PatternValue>,
}

impl Pattern {
    /// An empty pattern, matching any node.
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrain `field` to a literal value.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields
            .insert(field.into(), PatternValue::Literal(value.into()));
        self
    }

    /// Constrain `field` to a node matching `pattern`.
    #[must_use]
    pub fn nested(mut self, field: impl Into<String>, pattern: Pattern) -> Self {
        self.fields.insert(field.into(), PatternValue::Nested(pattern));
        self
    }

    /// Shorthand for `Pattern::new().with("type", type_tag)`.
    pub fn of_type(type_tag: &str) -> Self {
        Self::new().with("type", type_tag)
    }

    /// The constrained fields in key order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &PatternValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of nested constrained levels. An empty pattern has depth 0,
    /// a pattern with only literal fields depth 1.
    pub fn depth(&self) -> usize {
        if self.fields.is_empty() {
            return 0;
        }
        1 + self
            .fields
            .values()
            .map(|v| match v {
                PatternValue::Literal(_) => 0,
                PatternValue::Nested(p) => p.depth(),
            })
            .max()
            .unwrap_or(0)
    }
}

impl TryFrom<Value> for Pattern {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(map) = value else {
            return Err(format!("a pattern must be an object, got {value}"));
        };
        let mut fields = BTreeMap::new();
        for (key, value) in map {
            let constraint = match value {
                Value::Object(_) => PatternValue::Nested(Pattern::try_from(value)?),
                other => PatternValue::Literal(other),
            };
            fields.insert(key, constraint);
        }
        Ok(Self { fields })
    }
}

impl From<Pattern> for Value {
    fn from(pattern: Pattern) -> Self {
        let map = pattern
            .fields
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    PatternValue::Literal(v) => v,
                    PatternValue::Nested(p) => Value::from(p),
                };
                (key, value)
            })
            .collect();
        Value::Object(map)
    }
}
