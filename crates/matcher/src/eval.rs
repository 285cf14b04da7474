use serde_json::Value;
use tracing::trace;

use podwatch_core::Activity;
use podwatch_provider::Fetcher;

use crate::error::MatchError;
use crate::matcher::Matcher;
use crate::pattern::{Pattern, PatternValue};

/// Verdict of a match together with the candidate as far as it was
/// dereferenced.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    pub matched: bool,
    /// On a match, every constrained reference is replaced by the fetched
    /// node. On a miss, whatever was resolved before the miss.
    pub resolved: Activity,
}

impl MatchOutcome {
    fn hit(resolved: Activity) -> Self {
        Self {
            matched: true,
            resolved,
        }
    }

    fn miss(resolved: Activity) -> Self {
        Self {
            matched: false,
            resolved,
        }
    }
}

/// Test `candidate` against `matcher`.
///
/// A structural pattern dereferences a candidate given as a bare URI, then
/// only the fields it constrains; unconstrained subtrees are left untouched.
/// A fetch that yields nothing (denied or absent) is an ordinary miss.
/// A predicate receives the candidate unchanged and its verdict is final.
pub async fn match_activity(
    matcher: &Matcher,
    candidate: &Activity,
    fetcher: &dyn Fetcher,
) -> Result<MatchOutcome, MatchError> {
    match matcher {
        Matcher::Structural(pattern) => match_pattern(pattern, candidate.clone(), fetcher).await,
        Matcher::Predicate(predicate) => {
            let matched = predicate.matches(candidate, fetcher).await?;
            Ok(MatchOutcome {
                matched,
                resolved: candidate.clone(),
            })
        }
    }
}

/// Dereference a bare URI. Embedded nodes are returned as-is.
async fn resolve(candidate: Value, fetcher: &dyn Fetcher) -> Result<Option<Value>, MatchError> {
    match candidate {
        Value::String(uri) => {
            trace!(uri = %uri, acting_as = %fetcher.acting_as(), "dereferencing");
            Ok(fetcher.fetch(&uri).await?)
        }
        other => Ok(Some(other)),
    }
}

async fn match_pattern(
    pattern: &Pattern,
    candidate: Value,
    fetcher: &dyn Fetcher,
) -> Result<MatchOutcome, MatchError> {
    if pattern.is_empty() {
        return Ok(MatchOutcome::hit(candidate));
    }

    let Some(mut node) = resolve(candidate.clone(), fetcher).await? else {
        return Ok(MatchOutcome::miss(candidate));
    };
    if !node.is_object() {
        return Ok(MatchOutcome::miss(node));
    }

    // Literals first: they are free to check and can rule the candidate out
    // before any nested fetch happens.
    for (field, constraint) in pattern.fields() {
        if let PatternValue::Literal(expected) = constraint {
            let satisfied = node
                .get(field)
                .is_some_and(|actual| literal_matches(expected, actual));
            if !satisfied {
                return Ok(MatchOutcome::miss(node));
            }
        }
    }

    for (field, constraint) in pattern.fields() {
        let PatternValue::Nested(sub) = constraint else {
            continue;
        };
        let Some(actual) = node.get(field).cloned() else {
            return Ok(MatchOutcome::miss(node));
        };

        let resolved = match actual {
            Value::Array(items) => match_any(sub, items, fetcher).await?,
            single => {
                let outcome = Box::pin(match_pattern(sub, single, fetcher)).await?;
                outcome.matched.then_some(outcome.resolved)
            }
        };

        match resolved {
            Some(value) => node[field] = value,
            None => return Ok(MatchOutcome::miss(node)),
        }
    }

    Ok(MatchOutcome::hit(node))
}

/// Match a nested pattern against a multi-valued field. The first matching
/// element is materialised in place and the updated array returned.
async fn match_any(
    pattern: &Pattern,
    mut items: Vec<Value>,
    fetcher: &dyn Fetcher,
) -> Result<Option<Value>, MatchError> {
    for idx in 0..items.len() {
        let outcome = Box::pin(match_pattern(pattern, items[idx].clone(), fetcher)).await?;
        if outcome.matched {
            items[idx] = outcome.resolved;
            return Ok(Some(Value::Array(items)));
        }
    }
    Ok(None)
}

/// A literal matches an equal value, an array containing it, or a node
/// whose `id` equals it.
fn literal_matches(expected: &Value, actual: &Value) -> bool {
    if actual == expected {
        return true;
    }
    match actual {
        Value::Array(items) => items.iter().any(|item| literal_matches(expected, item)),
        Value::Object(map) => expected.is_string() && map.get("id") == Some(expected),
        _ => false,
    }
}
