//! Fatal resolution errors
//!
//! Ordinary search dead-ends (a pattern that does not match, an
//! under-determined goal, a rule that declines) are not errors; the engine
//! handles them by trying the next candidate. Everything in [`ResolveError`]
//! ends the whole resolution.

use crate::term::TypeTerm;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResolveError {
    /// The requested goal is not fully concrete
    #[error("goal '{goal}' contains unbound type variables")]
    UnboundGoal { goal: TypeTerm },

    /// No rule sequence constructs the goal
    #[error("no derivation found for '{goal}'")]
    NoDerivation { goal: TypeTerm },

    /// A top-level provider's type has no registered shape
    #[error("{type_name} is not a registered rule provider")]
    UnknownProvider { type_name: &'static str },

    /// Re-entrant demand for a goal under construction without a placeholder rule
    #[error("'{goal}' is required while it is being constructed and no cyclic-construction rule is available")]
    CyclicDemand { goal: TypeTerm },

    /// A knot was dereferenced before its goal finished construction
    #[error("knot for {type_name} was read before it was tied")]
    UnsetKnot { type_name: &'static str },

    /// A knot was read at a different type than the value it holds
    #[error("knot holds {found}, expected {expected}")]
    KnotType {
        expected: &'static str,
        found: &'static str,
    },

    /// A deferred cell was written a second time
    #[error("deferred cell for '{goal}' was already tied")]
    KnotAlreadyTied { goal: TypeTerm },

    /// The placeholder goal produced something other than a deferred cell
    #[error("placeholder for '{goal}' produced {found} instead of a deferred cell")]
    PlaceholderNotDeferred {
        goal: TypeTerm,
        found: &'static str,
    },

    /// A rule read an argument at the wrong type
    #[error("argument {index} of rule '{rule}' is {found}, expected {expected}")]
    ArgumentType {
        rule: String,
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    /// A rule read an argument past its parameter list
    #[error("rule '{rule}' has no argument {index}")]
    ArgumentIndex { rule: String, index: usize },

    /// A rule asked for its provider at the wrong type
    #[error("provider of rule '{rule}' is not a {expected}")]
    ProviderType { rule: String, expected: String },

    /// The solved value is not of the requested Rust type
    #[error("value for '{goal}' is {found}, expected {expected}")]
    ResultType {
        goal: TypeTerm,
        expected: &'static str,
        found: &'static str,
    },

    /// Rule applications nested deeper than the configured limit
    #[error("search depth limit {limit} exceeded while resolving '{goal}'")]
    DepthLimit { goal: TypeTerm, limit: usize },

    /// Failure raised by a rule body
    #[error("rule '{rule}' failed: {message}")]
    Rule { rule: String, message: String },
}

impl ResolveError {
    /// Failure raised by a rule body
    pub fn rule(rule: impl Into<String>, message: impl Into<String>) -> Self {
        ResolveError::Rule {
            rule: rule.into(),
            message: message.into(),
        }
    }

    /// The goal this error refers to, when it names one
    pub fn goal(&self) -> Option<&TypeTerm> {
        match self {
            ResolveError::UnboundGoal { goal }
            | ResolveError::NoDerivation { goal }
            | ResolveError::CyclicDemand { goal }
            | ResolveError::KnotAlreadyTied { goal }
            | ResolveError::PlaceholderNotDeferred { goal, .. }
            | ResolveError::ResultType { goal, .. }
            | ResolveError::DepthLimit { goal, .. } => Some(goal),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty;

    #[test]
    fn test_messages() {
        let err = ResolveError::CyclicDemand { goal: ty!("Node") };
        assert_eq!(
            err.to_string(),
            "'Node' is required while it is being constructed and no cyclic-construction rule is available"
        );

        let err = ResolveError::rule("parse_port", "port out of range");
        assert_eq!(err.to_string(), "rule 'parse_port' failed: port out of range");
        assert_eq!(err.goal(), None);
    }

    #[test]
    fn test_goal_accessor() {
        let err = ResolveError::NoDerivation {
            goal: ty!("List<Int>"),
        };
        assert_eq!(err.goal(), Some(&ty!("List<Int>")));
    }
}
