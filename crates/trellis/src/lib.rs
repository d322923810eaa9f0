//! # Trellis
//!
//! Build-time compiler for declarative domain schemas. A user declares
//! nested entities grouped into sections; Trellis checks the declarations
//! against a schema registry, rewrites the tree through dependency-ordered
//! transform stages, validates global invariants, and freezes the result
//! into an immutable, queryable [`CompiledSpec`].
//!
//! This crate is a facade that re-exports functionality from:
//! - `trellis-schema` — schema registry, entity tree, values, diagnostics
//! - `trellis-compile` — builder, stage graph, engines, pipeline
//!
//! ## Usage
//!
//! ```rust
//! use trellis::{
//!     compile, AttributeSchema, CompileOptions, EntitySchema, RawEntity, RawSection,
//!     SchemaRegistry, SectionSchema, StageSet, ValueType,
//! };
//!
//! let mut registry = SchemaRegistry::new();
//! registry
//!     .register_entity(
//!         EntitySchema::new("command", "Command")
//!             .with_attribute(AttributeSchema::new("name", ValueType::String).required()),
//!     )
//!     .unwrap();
//! registry
//!     .register_section(SectionSchema::new("commands", vec!["command".to_string()]))
//!     .unwrap();
//!
//! let raw = vec![RawSection::new("commands")
//!     .with_entity(RawEntity::new("command").with_attribute("name", "build"))];
//!
//! let spec = compile(&raw, &registry, &StageSet::new(), &CompileOptions::default()).unwrap();
//! assert_eq!(spec.entities("commands", "command").len(), 1);
//! ```

// Re-export the data model
pub use trellis_schema::*;

// Re-export the pipeline
pub use trellis_compile::*;

/// Compiler version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
