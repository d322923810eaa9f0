// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Data model for the Trellis schema compiler
//!
//! This crate contains the schema registry, the tagged attribute value
//! type, the arena-backed entity tree, raw (pre-validation) declarations,
//! and structured diagnostics. The compilation pipeline itself lives in
//! `trellis-compile`.

pub mod diag;
pub mod foundation;
pub mod raw;
pub mod schema;
pub mod tree;
pub mod value;

// Re-export commonly used types
pub use diag::{Diagnostic, DiagnosticKind, DiagnosticLabel, Severity};
pub use foundation::{ItemPath, PathSegment, StageId};
pub use raw::{RawEntity, RawSection};
pub use schema::{
    AttributeSchema, Cardinality, EntitySchema, RegistryError, SchemaRegistry, SectionSchema,
};
pub use tree::{Entity, EntityId, EntityTree, NewEntity, Section, TreeError};
pub use value::{Value, ValueType};
