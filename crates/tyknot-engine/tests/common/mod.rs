//! Shared test utilities for resolution tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tyknot_engine::{EngineConfig, ShapeDef, ShapeRegistry, Solver, Value};

// Re-export testing utilities
pub use pretty_assertions::assert_eq;

/// Counts how often each rule body ran
#[derive(Default)]
pub struct Calls {
    counts: RefCell<HashMap<String, usize>>,
}

impl Calls {
    pub fn hit(&self, rule: &str) {
        *self.counts.borrow_mut().entry(rule.to_string()).or_insert(0) += 1;
    }

    pub fn count(&self, rule: &str) -> usize {
        self.counts.borrow().get(rule).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.borrow().values().sum()
    }
}

/// A registry holding exactly one shape
///
/// # Example
/// ```ignore
/// let registry = registry_of(ShapeDef::<Host>::new("Host").rule_bearing());
/// ```
pub fn registry_of<P: 'static>(shape: ShapeDef<P>) -> ShapeRegistry {
    let mut registry = ShapeRegistry::new();
    registry.register(shape).expect("shape registers");
    registry
}

/// Solver with search tracing disabled
pub fn quiet_solver(registry: &ShapeRegistry) -> Solver<'_> {
    Solver::with_config(registry, EngineConfig::quiet())
}

/// Provider value sharing `rc`, so the test keeps a handle on its state
pub fn provider<P: 'static>(rc: &Rc<P>) -> Value {
    Value::from_rc(Rc::clone(rc))
}
