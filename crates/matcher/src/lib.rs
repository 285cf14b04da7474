pub mod error;
pub mod eval;
pub mod matcher;
pub mod pattern;
pub mod patterns;

pub use error::MatchError;
pub use eval::{MatchOutcome, match_activity};
pub use matcher::{FnPredicate, Matcher, PredicateMatcher};
pub use pattern::{Pattern, PatternValue};
