//! Logical combinators for predicates.
//!
//! Re-exports generic combinators from `pike-core`.

pub use pike::predicate::combinators::{And, Not, Or, PredicateExt};
pub use pike::predicate::neutral::Neutral;
