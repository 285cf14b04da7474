use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;

use podwatch_core::Activity;
use podwatch_provider::Fetcher;

use crate::error::MatchError;
use crate::pattern::Pattern;

/// An opaque matcher that decides for itself whether a candidate is of
/// interest. It may dereference further through `fetcher`.
#[async_trait]
pub trait PredicateMatcher: Send + Sync {
    async fn matches(
        &self,
        candidate: &Activity,
        fetcher: &dyn Fetcher,
    ) -> Result<bool, MatchError>;
}

/// Adapts a synchronous closure into a [`PredicateMatcher`].
pub struct FnPredicate<F>(pub F);

#[async_trait]
impl<F> PredicateMatcher for FnPredicate<F>
where
    F: Fn(&Activity) -> bool + Send + Sync,
{
    async fn matches(
        &self,
        candidate: &Activity,
        _fetcher: &dyn Fetcher,
    ) -> Result<bool, MatchError> {
        Ok((self.0)(candidate))
    }
}

/// What a handler matches on: a declarative pattern or a predicate.
#[derive(Clone)]
pub enum Matcher {
    Structural(Pattern),
    Predicate(Arc<dyn PredicateMatcher>),
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Structural(pattern) => f.debug_tuple("Structural").field(pattern).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl Matcher {
    /// Wrap a synchronous closure as a predicate matcher.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Activity) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(FnPredicate(f)))
    }

    /// Pattern depth, or `None` for predicates.
    pub fn depth(&self) -> Option<usize> {
        match self {
            Self::Structural(pattern) => Some(pattern.depth()),
            Self::Predicate(_) => None,
        }
    }

    pub fn is_predicate(&self) -> bool {
        matches!(self, Self::Predicate(_))
    }

    /// Short label for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Structural(_) => "structural",
            Self::Predicate(_) => "predicate",
        }
    }

    /// Registry ordering: structural matchers by ascending depth, then all
    /// predicates. Two predicates compare equal so a stable sort keeps
    /// them in registration order.
    pub fn specificity_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Structural(a), Self::Structural(b)) => a.depth().cmp(&b.depth()),
            (Self::Structural(_), Self::Predicate(_)) => Ordering::Less,
            (Self::Predicate(_), Self::Structural(_)) => Ordering::Greater,
            (Self::Predicate(_), Self::Predicate(_)) => Ordering::Equal,
        }
    }
}

impl From<Pattern> for Matcher {
    fn from(pattern: Pattern) -> Self {
        Self::Structural(pattern)
    }
}
