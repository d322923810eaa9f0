//! Integration test harness for Trellis.
//!
//! This crate provides utilities for end-to-end testing of the full
//! compilation pipeline: Declare → Build → Resolve → Transform →
//! Validate → Freeze.

#![allow(clippy::unwrap_used)]

use trellis::diag::render_all;
use trellis::{
    compile, AttributeSchema, CompileFailure, CompileOptions, CompiledSpec, EntitySchema,
    RawEntity, RawSection, SchemaRegistry, SectionSchema, StageSet, Value, ValueType,
};

/// A command-catalog schema shared by the integration tests.
///
/// Kinds:
/// - `command` (`:many`) — `name: String` (required, non-empty),
///   `retries: Int` (default 0), nested `argument` children
/// - `argument` (`:many`) — `name: String` (required)
/// - `config` (`:one`) — `verbose: Bool` (default false)
///
/// Sections: `commands` permits `command`, `settings` permits `config`.
pub fn command_registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry
        .register_entity(
            EntitySchema::new("argument", "Argument")
                .with_attribute(AttributeSchema::new("name", ValueType::String).required()),
        )
        .unwrap();
    registry
        .register_entity(
            EntitySchema::new("command", "Command")
                .with_attribute(
                    AttributeSchema::new("name", ValueType::String)
                        .required()
                        .with_validator(|v| {
                            if v.as_str().is_some_and(str::is_empty) {
                                Err("command name must not be empty".to_string())
                            } else {
                                Ok(())
                            }
                        }),
                )
                .with_attribute(
                    AttributeSchema::new("retries", ValueType::Int).with_default(Value::from(0)),
                )
                .with_child_kind("argument"),
        )
        .unwrap();
    registry
        .register_entity(
            EntitySchema::new("config", "Config")
                .singleton()
                .with_attribute(
                    AttributeSchema::new("verbose", ValueType::Bool)
                        .with_default(Value::from(false)),
                ),
        )
        .unwrap();
    registry
        .register_section(SectionSchema::new("commands", vec!["command".to_string()]))
        .unwrap();
    registry
        .register_section(SectionSchema::new("settings", vec!["config".to_string()]))
        .unwrap();
    registry
}

/// Shorthand for a `command` declaration with the given name.
pub fn command(name: &str) -> RawEntity {
    RawEntity::new("command").with_attribute("name", name)
}

/// Test harness bundling a registry, stage set, and raw declarations.
pub struct TestHarness {
    registry: SchemaRegistry,
    stages: StageSet,
    raw: Vec<RawSection>,
    options: CompileOptions,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    /// Create a harness over the shared command-catalog schema.
    pub fn new() -> Self {
        Self {
            registry: command_registry(),
            stages: StageSet::new(),
            raw: Vec::new(),
            options: CompileOptions::default(),
        }
    }

    /// Append a raw section declaration.
    pub fn section(&mut self, section: RawSection) -> &mut Self {
        self.raw.push(section);
        self
    }

    /// Mutable access to the stage set for registering stages.
    pub fn stages_mut(&mut self) -> &mut StageSet {
        &mut self.stages
    }

    /// Mutable access to the compile options.
    pub fn options_mut(&mut self) -> &mut CompileOptions {
        &mut self.options
    }

    /// Compile the declarations.
    ///
    /// # Panics
    ///
    /// Panics with the rendered diagnostics if compilation fails.
    pub fn compile(&self) -> CompiledSpec {
        match self.try_compile() {
            Ok(spec) => spec,
            Err(CompileFailure::Configuration(err)) => {
                panic!("stage configuration rejected: {err}");
            }
            Err(CompileFailure::Diagnostics(diags)) => {
                panic!("compilation failed:\n{}", render_all(&diags));
            }
        }
    }

    /// Compile, returning the failure for tests that expect one.
    ///
    /// # Panics
    ///
    /// Panics if compilation unexpectedly succeeds.
    pub fn compile_err(&self) -> CompileFailure {
        match self.try_compile() {
            Ok(_) => panic!("compilation unexpectedly succeeded"),
            Err(failure) => failure,
        }
    }

    /// Compile without unwrapping either way.
    pub fn try_compile(&self) -> Result<CompiledSpec, CompileFailure> {
        compile(&self.raw, &self.registry, &self.stages, &self.options)
    }
}
