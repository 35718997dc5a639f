//! Rule invocation
//!
//! Specializes a rule's generic slots under the search substitution and runs
//! its body. A body either produces a value, declines, or fails; only the
//! failure is fatal.

use crate::error::ResolveError;
use crate::repository::Candidate;
use crate::rule::{Args, Invocation, RuleInstance, Step};
use crate::term::{TypeTerm, TypeVar};
use crate::unify::Substitution;
use crate::value::Value;

/// Concrete bindings for every generic slot of `instance`
///
/// Returns the first slot that is still unbound when specialization is not
/// possible.
pub(crate) fn specialize(
    instance: &RuleInstance,
    subst: &Substitution,
) -> Result<Vec<TypeTerm>, TypeVar> {
    instance
        .generics
        .iter()
        .map(|var| {
            let bound = subst.resolve(&TypeTerm::Var(var.clone()));
            if bound.is_concrete() {
                Ok(bound)
            } else {
                Err(var.clone())
            }
        })
        .collect()
}

/// Run the rule body of `candidate` with concrete bindings and arguments
pub(crate) fn invoke(
    candidate: &Candidate,
    type_args: &[TypeTerm],
    args: &[Value],
) -> Result<Step, ResolveError> {
    let rule = candidate.rule();
    let invocation = Invocation {
        rule,
        provider: candidate.provider_view()?,
        type_args,
        args: Args {
            rule: rule.name(),
            values: args,
        },
    };
    (rule.body())(&invocation)
}
