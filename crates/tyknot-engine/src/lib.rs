//! tyknot - goal-directed value construction
//!
//! Given a goal type and a set of rule providers, the engine searches for a
//! sequence of rule applications that constructs a value of that type:
//! - type terms with variables, matched by first-order unification
//! - rule providers organized in shapes with single inheritance
//! - depth-first search with a shared memo table
//! - cyclic ("tie-the-knot") construction through deferred cells
//!
//! # Example
//!
//! ```
//! use tyknot_engine::{ty, RuleDef, ShapeDef, ShapeRegistry, Solver, Step, Value};
//!
//! struct Greeter;
//!
//! let mut registry = ShapeRegistry::new();
//! registry
//!     .register(
//!         ShapeDef::<Greeter>::new("Greeter")
//!             .rule_bearing()
//!             .rule(RuleDef::new("count", ty!("Int"), |_| Ok(Step::produced(3i64))))
//!             .rule(
//!                 RuleDef::new("greet", ty!("String"), |inv| {
//!                     let n = inv.arg::<i64>(0)?;
//!                     Ok(Step::produced("hi ".repeat(*n as usize)))
//!                 })
//!                 .param(ty!("Int")),
//!             ),
//!     )
//!     .unwrap();
//!
//! let solver = Solver::new(&registry);
//! let greeting = solver.solve::<String>([Value::new(Greeter)]).unwrap();
//! assert_eq!(greeting.as_str(), "hi hi hi ");
//! ```

/// tyknot engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod engine;
pub mod error;
mod invoke;
pub mod memo;
pub mod repository;
pub mod rule;
pub mod term;
pub mod unify;
pub mod value;


pub use engine::{Resolved, SearchState, Solver};
pub use error::ResolveError;
pub use memo::{MemoEntry, MemoTable};
pub use repository::{Candidate, ProviderSet, RegistryError, RuleRepository, ShapeDef, ShapeRegistry};
pub use rule::{Args, Invocation, Rule, RuleDef, Step};
pub use term::{ParseTermError, TypeTerm, TypeVar};
pub use tyknot_config::EngineConfig;
pub use unify::{match_terms, Substitution, UnifyError};
pub use value::{Deferred, Described, Knot, Value};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoke() {
        assert_eq!(VERSION, "0.1.0");
    }
}
