//! Rule definitions
//!
//! A rule is a typed construction recipe: given values for its parameter
//! patterns it produces a value of its return pattern. Rule bodies are
//! closures over type-erased values; the engine never inspects them.

use crate::error::ResolveError;
use crate::term::{TypeTerm, TypeVar};
use crate::value::{Deferred, Knot, Value};
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// What a rule body did
#[derive(Debug, Clone)]
pub enum Step {
    /// The rule built a value of its return type
    Produced(Value),
    /// The rule matched by type but chose not to apply
    Declined,
}

impl Step {
    pub fn produced<T: Any>(value: T) -> Self {
        Step::Produced(Value::new(value))
    }
}

/// Construction function of a rule
///
/// `Err` is fatal to the whole resolution; use [`Step::Declined`] to let the
/// search move on.
pub type RuleBody = Rc<dyn Fn(&Invocation<'_>) -> Result<Step, ResolveError>>;

/// A rule as declared on a provider shape
#[derive(Clone)]
pub struct RuleDef {
    pub(crate) name: String,
    pub(crate) returns: TypeTerm,
    pub(crate) params: Vec<TypeTerm>,
    pub(crate) body: RuleBody,
}

impl RuleDef {
    pub fn new(
        name: impl Into<String>,
        returns: TypeTerm,
        body: impl Fn(&Invocation<'_>) -> Result<Step, ResolveError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            returns,
            params: Vec::new(),
            body: Rc::new(body),
        }
    }

    /// Append a parameter pattern
    pub fn param(mut self, pattern: TypeTerm) -> Self {
        self.params.push(pattern);
        self
    }

    pub fn params(mut self, patterns: impl IntoIterator<Item = TypeTerm>) -> Self {
        self.params.extend(patterns);
        self
    }

    /// Rule producing a fresh deferred cell for goals matching `pattern`
    ///
    /// Registering it enables cyclic construction of those goals.
    pub fn placeholder(placeholder: &str, pattern: TypeTerm) -> Self {
        RuleDef::new("placeholder", pattern.wrapped_in(placeholder), |_| {
            Ok(Step::produced(Deferred::new()))
        })
    }
}

impl fmt::Debug for RuleDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleDef")
            .field("name", &self.name)
            .field("returns", &self.returns)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A registered, immutable rule
pub struct Rule {
    name: String,
    shape: String,
    returns: TypeTerm,
    params: Vec<TypeTerm>,
    generics: Vec<TypeVar>,
    body: RuleBody,
}

impl Rule {
    pub(crate) fn from_def(def: RuleDef, shape: &str) -> Self {
        let mut generics = Vec::new();
        def.returns.collect_vars(&mut generics);
        for param in &def.params {
            param.collect_vars(&mut generics);
        }

        Self {
            name: def.name,
            shape: shape.to_string(),
            returns: def.returns,
            params: def.params,
            generics,
            body: def.body,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the shape that declares this rule
    pub fn shape(&self) -> &str {
        &self.shape
    }

    pub fn returns(&self) -> &TypeTerm {
        &self.returns
    }

    pub fn params(&self) -> &[TypeTerm] {
        &self.params
    }

    /// Generic slots, in order of first occurrence in the signature
    pub fn generics(&self) -> &[TypeVar] {
        &self.generics
    }

    pub(crate) fn body(&self) -> &RuleBody {
        &self.body
    }

    /// Ordering key within one shape: fewer free variables first, then more
    /// concrete structure first
    pub fn specificity(&self) -> (usize, std::cmp::Reverse<usize>) {
        let free = self.returns.free_vars().len();
        (free, std::cmp::Reverse(self.returns.size()))
    }

    /// Copy of the signature with every generic renamed apart
    pub(crate) fn instantiate(&self, stamp: u64) -> RuleInstance {
        let mut rename = |v: &TypeVar| TypeTerm::var(format!("{}#{}", v.name, stamp));
        RuleInstance {
            returns: self.returns.map_vars(&mut rename),
            params: self.params.iter().map(|p| p.map_vars(&mut rename)).collect(),
            generics: self
                .generics
                .iter()
                .map(|v| TypeVar::new(format!("{}#{}", v.name, stamp)))
                .collect(),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}(", self.shape, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ") -> {}", self.returns)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rule({})", self)
    }
}

/// Signature of one rule application, with variables private to it
#[derive(Debug, Clone)]
pub(crate) struct RuleInstance {
    pub returns: TypeTerm,
    pub params: Vec<TypeTerm>,
    pub generics: Vec<TypeVar>,
}

/// Everything a rule body sees when it runs
pub struct Invocation<'a> {
    pub(crate) rule: &'a Rule,
    pub(crate) provider: &'a dyn Any,
    pub(crate) type_args: &'a [TypeTerm],
    pub(crate) args: Args<'a>,
}

impl<'a> Invocation<'a> {
    pub fn rule_name(&self) -> &str {
        self.rule.name()
    }

    /// The provider instance declaring the rule, viewed at the declaring shape
    pub fn provider<P: Any>(&self) -> Result<&'a P, ResolveError> {
        self.provider
            .downcast_ref::<P>()
            .ok_or_else(|| ResolveError::ProviderType {
                rule: self.rule.name().to_string(),
                expected: std::any::type_name::<P>().to_string(),
            })
    }

    /// Concrete bindings of the rule's generic slots, in slot order
    pub fn type_args(&self) -> &'a [TypeTerm] {
        self.type_args
    }

    /// Concrete binding of the generic slot named `name`
    pub fn type_arg(&self, name: &str) -> Option<&'a TypeTerm> {
        self.rule
            .generics()
            .iter()
            .position(|v| v.name == name)
            .and_then(|i| self.type_args.get(i))
    }

    pub fn args(&self) -> &Args<'a> {
        &self.args
    }

    /// Argument `index`, which must be complete
    pub fn arg<T: Any>(&self, index: usize) -> Result<Rc<T>, ResolveError> {
        self.args.get(index)
    }

    /// Argument `index` as a knot, complete or not
    pub fn knot<T: Any>(&self, index: usize) -> Result<Knot<T>, ResolveError> {
        self.args.knot(index)
    }

    /// Fatal failure attributed to this rule
    pub fn fail(&self, message: impl Into<String>) -> ResolveError {
        ResolveError::rule(self.rule.name(), message)
    }
}

/// Resolved argument values, in declared parameter order
pub struct Args<'a> {
    pub(crate) rule: &'a str,
    pub(crate) values: &'a [Value],
}

impl<'a> Args<'a> {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw argument value; may be a pending deferred cell
    pub fn value(&self, index: usize) -> Result<&'a Value, ResolveError> {
        self.values
            .get(index)
            .ok_or_else(|| ResolveError::ArgumentIndex {
                rule: self.rule.to_string(),
                index,
            })
    }

    pub fn get<T: Any>(&self, index: usize) -> Result<Rc<T>, ResolveError> {
        let raw = self.value(index)?;
        let value = match raw.as_deferred() {
            Some(cell) => cell.get().ok_or(ResolveError::UnsetKnot {
                type_name: std::any::type_name::<T>(),
            })?,
            None => raw.clone(),
        };
        value.downcast::<T>().ok_or_else(|| ResolveError::ArgumentType {
            rule: self.rule.to_string(),
            index,
            expected: std::any::type_name::<T>(),
            found: value.type_name(),
        })
    }

    pub fn knot<T: Any>(&self, index: usize) -> Result<Knot<T>, ResolveError> {
        Ok(Knot::from_value(self.value(index)?.clone()))
    }
}
