//! Rule repository
//!
//! Provider shapes are registered once per Rust type, each with an optional
//! parent shape and a rule-bearing marker. For a provider instance the
//! repository walks its shape chain from most-derived to least-derived and
//! lists the rules of every rule-bearing shape, so a derived shape's rules are
//! always tried before its ancestors'. Within a shape rules are kept in
//! specificity order.

use crate::error::ResolveError;
use crate::rule::{Rule, RuleDef};
use crate::value::Value;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use thiserror::Error;

/// Views a derived provider as its parent shape's Rust type
pub(crate) type Upcast = Rc<dyn Fn(&dyn Any) -> Option<&dyn Any>>;

/// Registration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("shape '{name}' is already registered for {type_name}")]
    DuplicateShape {
        name: String,
        type_name: &'static str,
    },

    #[error("shape '{name}' extends {parent}, which has no registered shape")]
    UnknownParent {
        name: String,
        parent: &'static str,
    },
}

/// Declaration of a provider shape for Rust type `P`
pub struct ShapeDef<P> {
    name: String,
    rule_bearing: bool,
    parent: Option<(TypeId, &'static str, Upcast)>,
    rules: Vec<RuleDef>,
    _marker: PhantomData<fn(&P)>,
}

impl<P: Any> ShapeDef<P> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rule_bearing: false,
            parent: None,
            rules: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Mark the shape as carrying inference rules
    pub fn rule_bearing(mut self) -> Self {
        self.rule_bearing = true;
        self
    }

    /// Declare `B` as the parent shape; `upcast` views a `P` as its `B` part
    pub fn extends<B: Any>(mut self, upcast: impl Fn(&P) -> &B + 'static) -> Self {
        let upcast: Upcast = Rc::new(upcast_fn(move |any| {
            any.downcast_ref::<P>().map(|p| upcast(p) as &dyn Any)
        }));
        self.parent = Some((TypeId::of::<B>(), std::any::type_name::<B>(), upcast));
        self
    }

    pub fn rule(mut self, rule: RuleDef) -> Self {
        self.rules.push(rule);
        self
    }
}

fn upcast_fn<F>(f: F) -> F
where
    F: for<'x> Fn(&'x dyn Any) -> Option<&'x dyn Any>,
{
    f
}

struct Shape {
    name: String,
    rule_bearing: bool,
    parent: Option<(TypeId, Upcast)>,
    rules: Vec<Rc<Rule>>,
}

/// All provider shapes known to a solver
#[derive(Default)]
pub struct ShapeRegistry {
    shapes: HashMap<TypeId, Shape>,
}

impl ShapeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shape; its parent must already be registered
    pub fn register<P: Any>(&mut self, def: ShapeDef<P>) -> Result<(), RegistryError> {
        let type_id = TypeId::of::<P>();
        if self.shapes.contains_key(&type_id) {
            return Err(RegistryError::DuplicateShape {
                name: def.name,
                type_name: std::any::type_name::<P>(),
            });
        }

        let parent = match def.parent {
            Some((parent_id, parent_name, upcast)) => {
                if !self.shapes.contains_key(&parent_id) {
                    return Err(RegistryError::UnknownParent {
                        name: def.name,
                        parent: parent_name,
                    });
                }
                Some((parent_id, upcast))
            }
            None => None,
        };

        let mut rules: Vec<Rc<Rule>> = def
            .rules
            .into_iter()
            .map(|r| Rc::new(Rule::from_def(r, &def.name)))
            .collect();
        // Stable: equally specific rules keep declaration order
        rules.sort_by_key(|r| r.specificity());

        self.shapes.insert(
            type_id,
            Shape {
                name: def.name,
                rule_bearing: def.rule_bearing,
                parent,
                rules,
            },
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn shape_name(&self, type_id: TypeId) -> Option<&str> {
        self.shapes.get(&type_id).map(|s| s.name.as_str())
    }

    /// Shapes from `type_id` up to its root, with the upcasts needed to view
    /// an instance at each of them
    fn chain(&self, type_id: TypeId) -> Vec<(&Shape, Vec<Upcast>)> {
        let mut chain = Vec::new();
        let mut upcasts: Vec<Upcast> = Vec::new();
        let mut current = self.shapes.get(&type_id);

        while let Some(shape) = current {
            chain.push((shape, upcasts.clone()));
            current = match &shape.parent {
                Some((parent_id, upcast)) => {
                    upcasts.push(Rc::clone(upcast));
                    self.shapes.get(parent_id)
                }
                None => None,
            };
        }

        chain
    }
}

/// A rule paired with the provider instance that declares it
#[derive(Clone)]
pub struct Candidate {
    rule: Rc<Rule>,
    provider: Value,
    upcasts: Rc<[Upcast]>,
}

impl Candidate {
    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn provider(&self) -> &Value {
        &self.provider
    }

    /// The provider viewed at the shape that declares the rule
    pub(crate) fn provider_view(&self) -> Result<&dyn Any, ResolveError> {
        let mut view = self.provider.as_any();
        for upcast in self.upcasts.iter() {
            view = upcast(view).ok_or_else(|| ResolveError::ProviderType {
                rule: self.rule.name().to_string(),
                expected: self.rule.shape().to_string(),
            })?;
        }
        Ok(view)
    }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Candidate({} on {})", self.rule, self.provider.type_name())
    }
}

/// Active providers and their rules in priority order
///
/// Cloning is cheap; the flattened rule list is shared until a new provider
/// is admitted.
#[derive(Clone, Default)]
pub struct ProviderSet {
    members: Vec<Value>,
    candidates: Rc<Vec<Candidate>>,
}

impl ProviderSet {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Identity membership
    pub fn contains(&self, value: &Value) -> bool {
        self.members.iter().any(|m| m.ptr_eq(value))
    }

    pub fn members(&self) -> &[Value] {
        &self.members
    }

    /// Candidate rules of every member, in priority order
    pub fn candidates(&self) -> Rc<Vec<Candidate>> {
        Rc::clone(&self.candidates)
    }
}

impl fmt::Debug for ProviderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSet")
            .field("members", &self.members)
            .field("rules", &self.candidates.len())
            .finish()
    }
}

/// Rule discovery over a [`ShapeRegistry`]
#[derive(Clone, Copy)]
pub struct RuleRepository<'r> {
    registry: &'r ShapeRegistry,
}

impl<'r> RuleRepository<'r> {
    pub fn new(registry: &'r ShapeRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r ShapeRegistry {
        self.registry
    }

    /// Whether the value's own shape is marked rule-bearing
    pub fn is_provider(&self, value: &Value) -> bool {
        self.registry
            .shapes
            .get(&value.value_type_id())
            .is_some_and(|shape| shape.rule_bearing)
    }

    /// Rules contributed by one provider, most-derived shape first
    pub fn rules_for(&self, provider: &Value) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        for (shape, upcasts) in self.registry.chain(provider.value_type_id()) {
            if !shape.rule_bearing {
                continue;
            }
            let upcasts: Rc<[Upcast]> = upcasts.into();
            for rule in &shape.rules {
                candidates.push(Candidate {
                    rule: Rc::clone(rule),
                    provider: provider.clone(),
                    upcasts: Rc::clone(&upcasts),
                });
            }
        }
        candidates
    }

    /// Admit `value` as a provider if its shape is rule-bearing
    ///
    /// Idempotent: a value already in the set is not added twice.
    pub fn maybe_add(&self, value: &Value, mut providers: ProviderSet) -> ProviderSet {
        if providers.contains(value) || !self.is_provider(value) {
            return providers;
        }

        let added = self.rules_for(value);
        tracing::trace!(
            provider = value.type_name(),
            rules = added.len(),
            "admitting rule provider"
        );
        Rc::make_mut(&mut providers.candidates).extend(added);
        providers.members.push(value.clone());
        providers
    }
}
