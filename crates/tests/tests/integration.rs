//! Integration tests for end-to-end Trellis compilation.
//!
//! These tests verify the full pipeline:
//! Declare → Build → Resolve → Transform → Validate → Freeze

use trellis::{
    CompileFailure, Diagnostic, DiagnosticKind, FailureMode, ItemPath, RawEntity, RawSection,
    NewEntity, Severity, StageGraphError, StageId, Strictness, Value,
};
use trellis_tests::{command, TestHarness};

/// A catalog with two commands and a singleton config compiles and is
/// queryable through the frozen output. Defaults are filled in.
#[test]
fn test_catalog_compiles_end_to_end() {
    let mut harness = TestHarness::new();
    harness
        .section(
            RawSection::new("commands")
                .with_entity(
                    command("build")
                        .with_attribute("retries", 3)
                        .with_child(RawEntity::new("argument").with_attribute("name", "target")),
                )
                .with_entity(command("test")),
        )
        .section(
            RawSection::new("settings")
                .with_entity(RawEntity::new("config").with_attribute("verbose", true)),
        );

    let spec = harness.compile();

    let commands = spec.entities("commands", "command");
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0].attribute("name"), Some(&Value::from("build")));
    assert_eq!(commands[0].attribute("retries"), Some(&Value::from(3)));
    // default applied
    assert_eq!(commands[1].attribute("retries"), Some(&Value::from(0)));

    // nested argument survives under its parent
    let arg_id = commands[0].children()[0];
    let arg = spec.tree().entity(arg_id).unwrap();
    assert_eq!(arg.kind(), "argument");
    assert_eq!(arg.attribute("name"), Some(&Value::from("target")));

    let config = spec.entity_one("settings", "config").unwrap();
    assert_eq!(config.attribute("verbose"), Some(&Value::from(true)));
    assert!(spec.warnings().is_empty());
}

/// Compiling the same declarations twice yields byte-for-byte identical
/// serialized output, including store contents written by transforms.
#[test]
fn test_compiled_output_is_deterministic() {
    fn build_harness() -> TestHarness {
        let mut harness = TestHarness::new();
        harness.section(
            RawSection::new("commands")
                .with_entity(command("build"))
                .with_entity(command("deploy")),
        );
        harness
            .stages_mut()
            .register_transform("collect-names", vec![], vec![], |tree, mut store| {
                let names: Vec<Value> = tree
                    .entities("commands", "command")
                    .into_iter()
                    .filter_map(|id| tree.entity(id))
                    .filter_map(|e| e.attribute("name").cloned())
                    .collect();
                store.put(&StageId::new("collect-names"), "names", Value::List(names));
                Ok((tree, store))
            })
            .unwrap();
        harness
    }

    let first = serde_json::to_string(&build_harness().compile()).unwrap();
    let second = serde_json::to_string(&build_harness().compile()).unwrap();
    assert_eq!(first, second);
}

/// A `:one` kind declared twice fails with a cardinality diagnostic that
/// names both occurrences.
#[test]
fn test_singleton_declared_twice_is_rejected() {
    let mut harness = TestHarness::new();
    harness.section(
        RawSection::new("settings")
            .with_entity(RawEntity::new("config"))
            .with_entity(RawEntity::new("config").with_attribute("verbose", true)),
    );

    let failure = harness.compile_err();
    let CompileFailure::Diagnostics(diags) = failure else {
        panic!("expected diagnostics, got {failure:?}");
    };

    let diag = diags
        .iter()
        .find(|d| d.kind == DiagnosticKind::CardinalityViolation)
        .expect("cardinality diagnostic");
    assert_eq!(diag.path.to_string(), "settings.config[1]");
    assert_eq!(diag.labels.len(), 1);
    assert_eq!(diag.labels[0].path.to_string(), "settings.config[0]");
    assert!(diag.labels[0].message.contains("first occurrence"));
}

/// Transform execution order follows the dependency declarations, not the
/// registration order: a stage that synthesizes a `help` command from
/// names persisted by another stage works even when registered first,
/// and both registration orders produce identical output.
#[test]
fn test_transform_order_follows_declarations() {
    fn build_harness(collector_first: bool) -> TestHarness {
        let mut harness = TestHarness::new();
        harness.section(
            RawSection::new("commands")
                .with_entity(command("build"))
                .with_entity(command("test")),
        );

        let register_collector = |harness: &mut TestHarness| {
            harness
                .stages_mut()
                .register_transform("collect-names", vec![], vec![], |tree, mut store| {
                    let names: Vec<Value> = tree
                        .entities("commands", "command")
                        .into_iter()
                        .filter_map(|id| tree.entity(id))
                        .filter_map(|e| e.attribute("name").cloned())
                        .collect();
                    store.put(&StageId::new("collect-names"), "names", Value::List(names));
                    Ok((tree, store))
                })
                .unwrap();
        };
        let register_synthesizer = |harness: &mut TestHarness| {
            harness
                .stages_mut()
                .register_transform(
                    "synthesize-help",
                    vec![],
                    vec![StageId::new("collect-names")],
                    |mut tree, store| {
                        let count = store
                            .get(&StageId::new("collect-names"), "names")
                            .and_then(Value::as_list)
                            .map(<[Value]>::len)
                            .unwrap_or_default();
                        tree.add_entity(
                            "commands",
                            None,
                            NewEntity::new("command")
                                .with_attribute("name", "help")
                                .with_attribute("retries", 0)
                                .with_attribute("summary", format!("lists {count} commands")),
                        )
                        .map_err(|err| {
                            Diagnostic::error(
                                DiagnosticKind::TransformFailed,
                                ItemPath::section("commands"),
                                err.to_string(),
                            )
                        })?;
                        Ok((tree, store))
                    },
                )
                .unwrap();
        };

        if collector_first {
            register_collector(&mut harness);
            register_synthesizer(&mut harness);
        } else {
            register_synthesizer(&mut harness);
            register_collector(&mut harness);
        }
        harness
    }

    let spec = build_harness(false).compile();
    let commands = spec.entities("commands", "command");
    assert_eq!(commands.len(), 3);
    let help = commands[2];
    assert_eq!(help.attribute("name"), Some(&Value::from("help")));
    // the collector ran first despite being registered second
    assert_eq!(
        help.attribute("summary"),
        Some(&Value::from("lists 2 commands"))
    );

    let reordered = build_harness(true).compile();
    assert_eq!(
        serde_json::to_string(&spec).unwrap(),
        serde_json::to_string(&reordered).unwrap()
    );
}

/// Contradictory ordering declarations are rejected before any stage runs,
/// and the error spells out the cycle.
#[test]
fn test_stage_cycle_is_reported() {
    let mut harness = TestHarness::new();
    harness.section(RawSection::new("commands").with_entity(command("build")));
    harness
        .stages_mut()
        .register_transform("a", vec![StageId::new("b")], vec![], |tree, store| {
            Ok((tree, store))
        })
        .unwrap();
    harness
        .stages_mut()
        .register_transform("b", vec![StageId::new("a")], vec![], |tree, store| {
            Ok((tree, store))
        })
        .unwrap();

    let failure = harness.compile_err();
    let CompileFailure::Configuration(err) = failure else {
        panic!("expected configuration error, got {failure:?}");
    };
    assert!(matches!(err, StageGraphError::Cycle { .. }));
    let message = err.to_string();
    assert!(message.contains("cyclic stage dependency"));
    assert!(message.contains(" -> "));
}

/// Every validation stage runs even when earlier stages report errors,
/// and each diagnostic carries the identity of the stage that raised it.
#[test]
fn test_every_validator_reports() {
    let mut harness = TestHarness::new();
    harness.section(RawSection::new("commands").with_entity(command("build")));
    for name in ["check-one", "check-two", "check-three"] {
        harness
            .stages_mut()
            .register_validation(name, move |_, _| {
                vec![Diagnostic::error(
                    DiagnosticKind::Validation,
                    ItemPath::section("commands"),
                    format!("{name} rejected the catalog"),
                )]
            })
            .unwrap();
    }

    let failure = harness.compile_err();
    let CompileFailure::Diagnostics(diags) = failure else {
        panic!("expected diagnostics, got {failure:?}");
    };
    assert_eq!(diags.len(), 3);
    let origins: Vec<&str> = diags
        .iter()
        .map(|d| d.origin.as_ref().unwrap().as_str())
        .collect();
    assert_eq!(origins, ["check-one", "check-two", "check-three"]);
}

/// Two commands may share a name as far as the schema is concerned; a
/// uniqueness validator turns that into a compilation failure naming both
/// declarations.
#[test]
fn test_duplicate_command_names_fail_validation() {
    let mut harness = TestHarness::new();
    harness.section(
        RawSection::new("commands")
            .with_entity(command("build"))
            .with_entity(command("build")),
    );

    // without the validator the duplicate is schema-legal
    assert!(harness.try_compile().is_ok());

    harness
        .stages_mut()
        .register_validation("unique-command-names", |tree, _| {
            let mut seen: Vec<(String, usize)> = Vec::new();
            let mut diags = Vec::new();
            for (index, id) in tree.entities("commands", "command").into_iter().enumerate() {
                let Some(name) = tree.entity(id).and_then(|e| e.attribute("name")) else {
                    continue;
                };
                let name = name.to_string();
                if let Some((_, first)) = seen.iter().find(|(n, _)| *n == name) {
                    diags.push(
                        Diagnostic::error(
                            DiagnosticKind::Validation,
                            ItemPath::section("commands").entity("command", index),
                            format!("duplicate command name {name}"),
                        )
                        .with_label(
                            ItemPath::section("commands").entity("command", *first),
                            "first declared here",
                        ),
                    );
                } else {
                    seen.push((name, index));
                }
            }
            diags
        })
        .unwrap();

    let failure = harness.compile_err();
    let CompileFailure::Diagnostics(diags) = failure else {
        panic!("expected diagnostics, got {failure:?}");
    };
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].path.to_string(), "commands.command[1]");
    assert_eq!(diags[0].labels[0].path.to_string(), "commands.command[0]");
}

/// Unknown attributes on a closed schema are an error by default and a
/// surviving warning under the lenient option.
#[test]
fn test_unknown_attribute_strictness() {
    let declare = |harness: &mut TestHarness| {
        harness.section(
            RawSection::new("commands")
                .with_entity(command("build").with_attribute("colour", "green")),
        );
    };

    let mut strict = TestHarness::new();
    declare(&mut strict);
    let failure = strict.compile_err();
    let CompileFailure::Diagnostics(diags) = failure else {
        panic!("expected diagnostics, got {failure:?}");
    };
    assert_eq!(diags[0].kind, DiagnosticKind::UnknownAttribute);
    assert_eq!(diags[0].severity, Severity::Error);

    let mut lenient = TestHarness::new();
    declare(&mut lenient);
    lenient.options_mut().unknown_attributes = Strictness::Warn;
    let spec = lenient.compile();
    assert_eq!(spec.warnings().len(), 1);
    assert_eq!(spec.warnings()[0].kind, DiagnosticKind::UnknownAttribute);
    // the stray attribute is dropped from the compiled entity
    let build = spec.entity_one("commands", "command").unwrap();
    assert_eq!(build.attribute("colour"), None);
}

/// Fail-fast validation stops after the first stage that reports an error.
#[test]
fn test_fail_fast_validation_stops_early() {
    let mut harness = TestHarness::new();
    harness.section(RawSection::new("commands").with_entity(command("build")));
    harness.options_mut().validation = FailureMode::FailFast;
    for name in ["first", "second"] {
        harness
            .stages_mut()
            .register_validation(name, move |_, _| {
                vec![Diagnostic::error(
                    DiagnosticKind::Validation,
                    ItemPath::section("commands"),
                    format!("{name} failed"),
                )]
            })
            .unwrap();
    }

    let failure = harness.compile_err();
    let CompileFailure::Diagnostics(diags) = failure else {
        panic!("expected diagnostics, got {failure:?}");
    };
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].origin.as_ref().unwrap().as_str(), "first");
}
