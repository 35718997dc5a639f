//! Substitutions and type-term matching
//!
//! Implements:
//! - Substitution with full chasing of variable bindings
//! - One-pass structural matching of a rule pattern against a goal
//! - Occurs check so that no variable is ever bound to a term containing it

use crate::term::{TypeTerm, TypeVar};
use std::collections::HashMap;

/// Why two terms failed to match
#[derive(Debug, Clone, PartialEq)]
pub enum UnifyError {
    /// Head constructors or arities differ
    Mismatch { pattern: TypeTerm, goal: TypeTerm },
    /// Binding would make the substitution cyclic
    InfiniteType { var: TypeVar, ty: TypeTerm },
}

impl UnifyError {
    /// Human-readable message for this error
    pub fn message(&self) -> String {
        match self {
            Self::Mismatch { pattern, goal } => {
                format!("'{}' does not match '{}'", pattern, goal)
            }
            Self::InfiniteType { var, ty } => {
                format!("infinite type: '{}' cannot equal '{}'", var, ty)
            }
        }
    }
}

/// Insertion-ordered mapping from type variable to type term
///
/// Later bindings may mention variables bound earlier; [`Substitution::resolve`]
/// chases them all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Substitution {
    order: Vec<TypeVar>,
    bindings: HashMap<TypeVar, TypeTerm>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Direct binding of `var`, without chasing
    pub fn lookup(&self, var: &TypeVar) -> Option<&TypeTerm> {
        self.bindings.get(var)
    }

    /// Bindings in the order they were made
    pub fn iter(&self) -> impl Iterator<Item = (&TypeVar, &TypeTerm)> {
        self.order
            .iter()
            .filter_map(|var| self.bindings.get(var).map(|term| (var, term)))
    }

    /// Fully chase every variable binding in `term`
    ///
    /// Unbound variables are left in place.
    pub fn resolve(&self, term: &TypeTerm) -> TypeTerm {
        match term {
            TypeTerm::Var(var) => match self.bindings.get(var) {
                Some(bound) => self.resolve(bound),
                None => term.clone(),
            },
            TypeTerm::App { head, args } => TypeTerm::App {
                head: head.clone(),
                args: args.iter().map(|a| self.resolve(a)).collect(),
            },
        }
    }

    /// True if `term` still contains a variable after maximal resolution
    pub fn has_unbound(&self, term: &TypeTerm) -> bool {
        match term {
            TypeTerm::Var(var) => match self.bindings.get(var) {
                Some(bound) => self.has_unbound(bound),
                None => true,
            },
            TypeTerm::App { args, .. } => args.iter().any(|a| self.has_unbound(a)),
        }
    }

    /// Bind `var` to `term`
    ///
    /// An existing binding must agree with the new term after chasing.
    pub fn bind(&mut self, var: &TypeVar, term: &TypeTerm) -> Result<(), UnifyError> {
        self.unify(&TypeTerm::Var(var.clone()), term)
    }

    /// Make `pattern` and `goal` structurally equal, extending this substitution
    ///
    /// On error the substitution may hold partial bindings; callers that need
    /// to back out use [`match_terms`], which works on a copy.
    pub fn unify(&mut self, pattern: &TypeTerm, goal: &TypeTerm) -> Result<(), UnifyError> {
        let pattern = self.resolve(pattern);
        let goal = self.resolve(goal);

        match (&pattern, &goal) {
            (TypeTerm::Var(a), TypeTerm::Var(b)) if a == b => Ok(()),

            (TypeTerm::Var(var), other) | (other, TypeTerm::Var(var)) => {
                // Both sides are chased, so `var` is unbound here
                if other.mentions(var) {
                    return Err(UnifyError::InfiniteType {
                        var: var.clone(),
                        ty: other.clone(),
                    });
                }
                self.order.push(var.clone());
                self.bindings.insert(var.clone(), other.clone());
                Ok(())
            }

            (
                TypeTerm::App {
                    head: h1,
                    args: args1,
                },
                TypeTerm::App {
                    head: h2,
                    args: args2,
                },
            ) => {
                if h1 != h2 || args1.len() != args2.len() {
                    return Err(UnifyError::Mismatch {
                        pattern: pattern.clone(),
                        goal: goal.clone(),
                    });
                }

                for (a, b) in args1.iter().zip(args2.iter()) {
                    self.unify(a, b)?;
                }

                Ok(())
            }
        }
    }
}

/// Match `pattern` against `goal` under `subst`
///
/// Returns the extended substitution; `subst` itself is never modified.
pub fn match_terms(
    pattern: &TypeTerm,
    goal: &TypeTerm,
    subst: &Substitution,
) -> Result<Substitution, UnifyError> {
    let mut extended = subst.clone();
    extended.unify(pattern, goal)?;
    Ok(extended)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_match_concrete_terms() {
        let subst = Substitution::new();
        assert!(match_terms(&ty!("Int"), &ty!("Int"), &subst).is_ok());
        assert!(match_terms(&ty!("Int"), &ty!("String"), &subst).is_err());
        assert!(match_terms(&ty!("List<Int>"), &ty!("List<Int, Int>"), &subst).is_err());
    }

    #[test]
    fn test_match_binds_pattern_variables() {
        let subst = match_terms(
            &ty!("Map<k, List<v>>"),
            &ty!("Map<String, List<Int>>"),
            &Substitution::new(),
        )
        .unwrap();

        assert_eq!(subst.resolve(&ty!("Pair<k, v>")), ty!("Pair<String, Int>"));
        let order: Vec<String> = subst.iter().map(|(v, _)| v.name.clone()).collect();
        assert_eq!(order, vec!["k", "v"]);
    }

    #[test]
    fn test_match_binds_goal_variables() {
        let subst = match_terms(&ty!("Box<Int>"), &ty!("Box<x>"), &Substitution::new()).unwrap();
        assert_eq!(subst.resolve(&ty!("x")), ty!("Int"));
    }

    #[test]
    fn test_bound_variable_must_agree() {
        let mut subst = Substitution::new();
        subst.bind(&TypeVar::new("a"), &ty!("Int")).unwrap();

        assert!(match_terms(&ty!("List<a>"), &ty!("List<Int>"), &subst).is_ok());
        assert!(match_terms(&ty!("List<a>"), &ty!("List<Bool>"), &subst).is_err());
    }

    #[test]
    fn test_repeated_variable_must_agree() {
        let subst = Substitution::new();
        assert!(match_terms(&ty!("Pair<a, a>"), &ty!("Pair<Int, Int>"), &subst).is_ok());
        assert!(match_terms(&ty!("Pair<a, a>"), &ty!("Pair<Int, Bool>"), &subst).is_err());
    }

    #[test]
    fn test_chained_bindings_resolve() {
        let mut subst = Substitution::new();
        subst.bind(&TypeVar::new("a"), &ty!("List<b>")).unwrap();
        subst.bind(&TypeVar::new("b"), &ty!("Option<c>")).unwrap();

        assert!(subst.has_unbound(&ty!("a")));
        assert_eq!(subst.lookup(&TypeVar::new("a")), Some(&ty!("List<b>")));
        assert_eq!(subst.lookup(&TypeVar::new("c")), None);
        subst.bind(&TypeVar::new("c"), &ty!("Int")).unwrap();

        assert_eq!(subst.resolve(&ty!("a")), ty!("List<Option<Int>>"));
        assert!(!subst.has_unbound(&ty!("a")));
    }

    #[test]
    fn test_occurs_check() {
        let err = match_terms(&ty!("a"), &ty!("List<a>"), &Substitution::new()).unwrap_err();
        assert!(matches!(err, UnifyError::InfiniteType { .. }));
        assert_eq!(err.message(), "infinite type: 'a' cannot equal 'List<a>'");

        let mut subst = Substitution::new();
        subst.bind(&TypeVar::new("a"), &ty!("Box<b>")).unwrap();
        assert!(subst.bind(&TypeVar::new("b"), &ty!("List<a>")).is_err());
    }

    #[test]
    fn test_failed_match_leaves_input_untouched() {
        let subst = Substitution::new();
        assert!(match_terms(&ty!("Pair<a, Int>"), &ty!("Pair<Bool, Bool>"), &subst).is_err());
        assert!(subst.is_empty());
    }

    #[test]
    fn test_mismatch_message() {
        let err = match_terms(&ty!("List<a>"), &ty!("Set<Int>"), &Substitution::new()).unwrap_err();
        assert_eq!(err.message(), "'List<a>' does not match 'Set<Int>'");
    }
}
