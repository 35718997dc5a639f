//! cycles.rs - Cyclic ("tie-the-knot") construction
//!
//! A goal that depends on itself can be built when a placeholder rule for it
//! is available: the engine hands the rule a deferred cell and ties it to the
//! finished value afterwards. Without a placeholder rule, re-entrant demand is
//! a fatal error.

mod common;

use common::{assert_eq, quiet_solver, registry_of};
use rstest::rstest;
use std::fmt;
use std::rc::Rc;
use tyknot_engine::{
    ty, Described, EngineConfig, Knot, ResolveError, RuleDef, ShapeDef, ShapeRegistry, Solver,
    Step, TypeTerm, Value,
};

struct Node {
    name: String,
    next: Knot<Node>,
}

// `next` may point back at this node, so it is never followed
impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("next_tied", &self.next.is_tied())
            .finish()
    }
}

impl Described for Node {
    fn type_term() -> TypeTerm {
        ty!("Node")
    }
}

struct Graph;

fn graph(placeholder: Option<&str>) -> ShapeRegistry {
    let mut shape = ShapeDef::<Graph>::new("Graph").rule_bearing().rule(
        RuleDef::new("node", ty!("Node"), |inv| {
            Ok(Step::produced(Node {
                name: "loop".to_string(),
                next: inv.knot::<Node>(0)?,
            }))
        })
        .param(ty!("Node")),
    );
    if let Some(placeholder) = placeholder {
        shape = shape.rule(RuleDef::placeholder(placeholder, ty!("Node")));
    }
    registry_of(shape)
}

#[test]
fn test_self_referential_node() {
    let registry = graph(Some("Recursive"));

    let node = quiet_solver(&registry)
        .solve::<Node>([Value::new(Graph)])
        .unwrap();

    let next = node.next.get().unwrap();
    assert!(Rc::ptr_eq(&node, &next));
    assert_eq!(format!("{:?}", node), r#"Node { name: "loop", next_tied: true }"#);
    assert_eq!(next.name, "loop");
    assert!(Rc::ptr_eq(&next, &next.next.get().unwrap()));
}

#[test]
fn test_self_reference_without_placeholder() {
    let registry = graph(None);

    let err = quiet_solver(&registry)
        .solve::<Node>([Value::new(Graph)])
        .unwrap_err();

    assert_eq!(err, ResolveError::CyclicDemand { goal: ty!("Node") });
}

#[rstest]
#[case::renamed_placeholder("Cyclic", "Cyclic", true)]
#[case::default_name_ignored("Cyclic", "Recursive", false)]
fn test_placeholder_name_follows_config(
    #[case] configured: &str,
    #[case] declared: &str,
    #[case] builds: bool,
) {
    let registry = graph(Some(declared));
    let config = EngineConfig {
        placeholder: configured.to_string(),
        ..EngineConfig::quiet()
    };

    let result = Solver::with_config(&registry, config).solve::<Node>([Value::new(Graph)]);

    if builds {
        let node = result.unwrap();
        assert!(Rc::ptr_eq(&node, &node.next.get().unwrap()));
    } else {
        assert_eq!(
            result.err(),
            Some(ResolveError::CyclicDemand { goal: ty!("Node") })
        );
    }
}

#[test]
fn test_placeholder_name_from_config_file() {
    let file = tyknot_config::ConfigFile::from_toml_str(
        r#"
[engine]
trace = false
placeholder = "Cyclic"
"#,
    )
    .unwrap();
    let registry = graph(Some("Cyclic"));

    let node = Solver::with_config(&registry, file.engine_config())
        .solve::<Node>([Value::new(Graph)])
        .unwrap();
    assert_eq!(node.name, "loop");
}

// ============================================================================
// Mutual recursion
// ============================================================================

struct Ping {
    pong: Rc<Pong>,
}

struct Pong {
    ping: Knot<Ping>,
}

impl Described for Ping {
    fn type_term() -> TypeTerm {
        ty!("Ping")
    }
}

struct Court;

fn court() -> ShapeRegistry {
    registry_of(
        ShapeDef::<Court>::new("Court")
            .rule_bearing()
            .rule(RuleDef::placeholder("Recursive", ty!("a")))
            .rule(
                RuleDef::new("ping", ty!("Ping"), |inv| {
                    Ok(Step::produced(Ping {
                        pong: inv.arg::<Pong>(0)?,
                    }))
                })
                .param(ty!("Pong")),
            )
            .rule(
                RuleDef::new("pong", ty!("Pong"), |inv| {
                    Ok(Step::produced(Pong {
                        ping: inv.knot::<Ping>(0)?,
                    }))
                })
                .param(ty!("Ping")),
            ),
    )
}

#[test]
fn test_mutual_recursion() {
    let registry = court();

    let ping = quiet_solver(&registry)
        .solve::<Ping>([Value::new(Court)])
        .unwrap();

    let back = ping.pong.ping.get().unwrap();
    assert!(Rc::ptr_eq(&ping, &back));
}

#[test]
fn test_eager_read_of_unfinished_value() {
    struct Eager;
    let registry = registry_of(
        ShapeDef::<Eager>::new("Eager")
            .rule_bearing()
            .rule(RuleDef::placeholder("Recursive", ty!("Node")))
            .rule(
                RuleDef::new("node", ty!("Node"), |inv| {
                    let next = inv.arg::<Node>(0)?;
                    Ok(Step::produced(Node {
                        name: next.name.clone(),
                        next: Knot::from_value(Value::from_rc(next)),
                    }))
                })
                .param(ty!("Node")),
            ),
    );

    let err = quiet_solver(&registry)
        .solve::<Node>([Value::new(Eager)])
        .unwrap_err();

    assert!(matches!(err, ResolveError::UnsetKnot { .. }));
}

#[test]
fn test_knot_read_at_wrong_type() {
    struct Confused;
    let registry = registry_of(
        ShapeDef::<Confused>::new("Confused")
            .rule_bearing()
            .rule(RuleDef::placeholder("Recursive", ty!("Node")))
            .rule(
                RuleDef::new("node", ty!("Node"), |inv| {
                    Ok(Step::produced(Node {
                        name: "confused".to_string(),
                        next: inv.knot::<Node>(0)?,
                    }))
                })
                .param(ty!("Node")),
            )
            .rule(
                RuleDef::new("peek", ty!("String"), |inv| {
                    let node = inv.arg::<Node>(0)?;
                    let as_text: Knot<String> = Knot::from_value(Value::from_rc(node));
                    Ok(Step::produced(as_text.get()?.to_string()))
                })
                .param(ty!("Node")),
            ),
    );

    let err = quiet_solver(&registry)
        .solve::<String>([Value::new(Confused)])
        .unwrap_err();

    assert!(matches!(err, ResolveError::KnotType { .. }));
}

#[test]
fn test_placeholder_must_produce_cell() {
    struct Bogus;
    let registry = registry_of(
        ShapeDef::<Bogus>::new("Bogus")
            .rule_bearing()
            .rule(RuleDef::new("fake", ty!("Recursive<Node>"), |_| {
                Ok(Step::produced(0i64))
            }))
            .rule(
                RuleDef::new("node", ty!("Node"), |inv| {
                    Ok(Step::produced(Node {
                        name: "never".to_string(),
                        next: inv.knot::<Node>(0)?,
                    }))
                })
                .param(ty!("Node")),
            ),
    );

    let err = quiet_solver(&registry)
        .solve::<Node>([Value::new(Bogus)])
        .unwrap_err();

    assert!(matches!(
        err,
        ResolveError::PlaceholderNotDeferred { found: "i64", .. }
    ));
}
