//! Resolution engine
//!
//! Depth-first, commit-based search for a derivation of a goal type:
//! - candidates are tried in repository priority order
//! - parameters are resolved left to right and the first solution of each is
//!   kept; a later failing parameter abandons the whole candidate
//! - every concrete goal is memoized so common sub-structure is shared
//! - a goal is registered before its parameters are resolved, backed by a
//!   deferred cell when a placeholder rule exists, so self-referential
//!   structures can be built without infinite recursion
//!
//! Provider set, memo table and substitution are threaded by value: a failed
//! candidate leaves the caller's state untouched.

use crate::error::ResolveError;
use crate::invoke;
use crate::memo::{MemoEntry, MemoTable};
use crate::repository::{Candidate, ProviderSet, RuleRepository, ShapeRegistry};
use crate::rule::Step;
use crate::term::TypeTerm;
use crate::unify::{match_terms, Substitution};
use crate::value::{Deferred, Described, Value};
use std::cell::Cell;
use std::rc::Rc;
use tracing::{debug, trace};
use tyknot_config::EngineConfig;

/// Search progress events, emitted only when tracing is enabled
macro_rules! search_event {
    ($solver:expr, $level:ident, $($arg:tt)+) => {
        if $solver.config.trace {
            $level!(target: "tyknot::search", $($arg)+);
        }
    };
}

/// Recoverable search outcome: `Ok(None)` means "no derivation here"
pub type Search<T> = Result<Option<T>, ResolveError>;

/// State threaded through one top-level resolution
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub providers: ProviderSet,
    pub memo: MemoTable,
    pub subst: Substitution,
}

/// A goal's value together with the state after producing it
#[derive(Debug, Clone)]
pub struct Resolved {
    pub value: Value,
    pub state: SearchState,
}

/// Resolves goal types against the rules of a [`ShapeRegistry`]
pub struct Solver<'r> {
    repo: RuleRepository<'r>,
    config: EngineConfig,
    stamp: Cell<u64>,
}

impl<'r> Solver<'r> {
    pub fn new(registry: &'r ShapeRegistry) -> Self {
        Self::with_config(registry, EngineConfig::default())
    }

    pub fn with_config(registry: &'r ShapeRegistry, config: EngineConfig) -> Self {
        Self {
            repo: RuleRepository::new(registry),
            config,
            stamp: Cell::new(0),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn repository(&self) -> RuleRepository<'r> {
        self.repo
    }

    /// Construct a value of `T` from the rules of `providers`
    pub fn solve<T: Described>(
        &self,
        providers: impl IntoIterator<Item = Value>,
    ) -> Result<Rc<T>, ResolveError> {
        let goal = T::type_term();
        let value = self.solve_term(&goal, providers)?;
        value.downcast::<T>().ok_or_else(|| ResolveError::ResultType {
            goal,
            expected: std::any::type_name::<T>(),
            found: value.type_name(),
        })
    }

    /// Construct a value for `goal`, which must be fully concrete
    ///
    /// Memo table and substitution are discarded afterwards.
    pub fn solve_term(
        &self,
        goal: &TypeTerm,
        providers: impl IntoIterator<Item = Value>,
    ) -> Result<Value, ResolveError> {
        if !goal.is_concrete() {
            return Err(ResolveError::UnboundGoal { goal: goal.clone() });
        }

        let state = self.initial_state(providers)?;
        search_event!(self, debug, goal = %goal, providers = state.providers.len(), "solving");

        match self.resolve(goal, &state, 0)? {
            Some(resolved) => {
                search_event!(self, debug, goal = %goal, memo = resolved.state.memo.len(), "solved");
                Ok(resolved.value)
            }
            None => Err(ResolveError::NoDerivation { goal: goal.clone() }),
        }
    }

    /// Provider set for the top-level call; every provider must carry rules
    pub fn initial_state(
        &self,
        providers: impl IntoIterator<Item = Value>,
    ) -> Result<SearchState, ResolveError> {
        let mut set = ProviderSet::default();
        for provider in providers {
            if !self.repo.is_provider(&provider) {
                return Err(ResolveError::UnknownProvider {
                    type_name: provider.type_name(),
                });
            }
            set = self.repo.maybe_add(&provider, set);
        }
        Ok(SearchState {
            providers: set,
            ..SearchState::default()
        })
    }

    /// Resolve `goal` under `state`
    ///
    /// `Ok(None)` is an ordinary search failure; `Err` ends the resolution.
    pub fn resolve(&self, goal: &TypeTerm, state: &SearchState, depth: usize) -> Search<Resolved> {
        let goal = state.subst.resolve(goal);

        if let Some(limit) = self.config.max_depth {
            if depth > limit {
                return Err(ResolveError::DepthLimit { goal, limit });
            }
        }

        if goal.is_concrete() {
            if let Some(entry) = state.memo.get(&goal) {
                let value = entry.read(&goal)?;
                search_event!(self, trace, depth, goal = %goal, "known");
                return Ok(Some(Resolved {
                    value,
                    state: state.clone(),
                }));
            }
        }

        search_event!(self, trace, depth, goal = %goal, "attempting");

        let candidates = state.providers.candidates();
        for candidate in candidates.iter() {
            if let Some(resolved) = self.attempt(candidate, &goal, state, depth)? {
                return Ok(Some(resolved));
            }
        }

        search_event!(self, trace, depth, goal = %goal, "no rule applies");
        Ok(None)
    }

    /// Try a single candidate rule for `goal`
    fn attempt(
        &self,
        candidate: &Candidate,
        goal: &TypeTerm,
        state: &SearchState,
        depth: usize,
    ) -> Search<Resolved> {
        let rule = candidate.rule();
        let instance = rule.instantiate(self.next_stamp());

        let subst = match match_terms(&instance.returns, goal, &state.subst) {
            Ok(subst) => subst,
            Err(e) => {
                search_event!(self, trace, depth, rule = %rule, "skipped: {}", e.message());
                return Ok(None);
            }
        };

        let goal = subst.resolve(goal);
        if !goal.is_concrete() {
            search_event!(self, trace, depth, rule = %rule, goal = %goal, "skipped: goal under-determined");
            return Ok(None);
        }

        search_event!(self, trace, depth, rule = %rule, goal = %goal, "trying");

        let mut next = SearchState {
            providers: state.providers.clone(),
            memo: state.memo.clone(),
            subst,
        };

        let cell = if instance.params.is_empty() || self.is_placeholder(&goal) {
            None
        } else {
            self.preregister(&goal, &mut next, depth)?
        };

        let mut args = Vec::with_capacity(instance.params.len());
        for (index, param) in instance.params.iter().enumerate() {
            match self.resolve(param, &next, depth + 1)? {
                Some(resolved) => {
                    next = resolved.state;
                    next.providers = self.repo.maybe_add(&resolved.value, next.providers);
                    args.push(resolved.value);
                }
                None => {
                    search_event!(self, trace, depth, rule = %rule, index, "abandoned: parameter has no derivation");
                    return Ok(None);
                }
            }
        }

        let type_args = match invoke::specialize(&instance, &next.subst) {
            Ok(type_args) => type_args,
            Err(var) => {
                search_event!(self, trace, depth, rule = %rule, var = %var, "abandoned: generic slot unbound");
                return Ok(None);
            }
        };

        match invoke::invoke(candidate, &type_args, &args)? {
            Step::Declined => {
                search_event!(self, trace, depth, rule = %rule, "declined");
                Ok(None)
            }
            Step::Produced(value) => {
                if let Some(cell) = cell {
                    cell.tie(value.clone(), &goal)?;
                }
                next.memo.insert(goal.clone(), MemoEntry::Ready(value.clone()));
                search_event!(self, trace, depth, rule = %rule, goal = %goal, "built");
                Ok(Some(Resolved { value, state: next }))
            }
        }
    }

    /// Enter `goal` in the memo table before its parameters are resolved
    ///
    /// Returns the deferred cell to tie once the value exists, when a
    /// placeholder rule supplied one.
    fn preregister(
        &self,
        goal: &TypeTerm,
        next: &mut SearchState,
        depth: usize,
    ) -> Result<Option<Deferred>, ResolveError> {
        let placeholder = goal.wrapped_in(&self.config.placeholder);

        match self.resolve(&placeholder, next, depth + 1)? {
            Some(resolved) => {
                let cell = resolved.value.as_deferred().cloned().ok_or_else(|| {
                    ResolveError::PlaceholderNotDeferred {
                        goal: goal.clone(),
                        found: resolved.value.type_name(),
                    }
                })?;
                next.memo.insert(goal.clone(), MemoEntry::Pending(cell.clone()));
                Ok(Some(cell))
            }
            None => {
                next.memo.insert(goal.clone(), MemoEntry::Guarded);
                Ok(None)
            }
        }
    }

    fn is_placeholder(&self, goal: &TypeTerm) -> bool {
        goal.head() == Some(self.config.placeholder.as_str())
    }

    fn next_stamp(&self) -> u64 {
        let stamp = self.stamp.get() + 1;
        self.stamp.set(stamp);
        stamp
    }
}
