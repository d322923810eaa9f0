// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Staged compilation pipeline for Trellis schemas
//!
//! This crate turns raw declarations into an immutable [`CompiledSpec`]:
//!
//! ```text
//! raw declarations
//!     → build      (schema-checked entity tree, collect-all diagnostics)
//!     → resolve    (stage dependency graph → total execution order)
//!     → transform  (ordered stages rewrite the tree, store threaded through)
//!     → validate   (every validator runs, diagnostics aggregated)
//!     → freeze     (CompiledSpec: tree + store + warnings)
//! ```
//!
//! The entry point is [`pipeline::compile`].

pub mod build;
pub mod graph;
pub mod pipeline;
pub mod spec;
pub mod stage;
pub mod store;
pub mod transform;
pub mod validate;

pub use build::{build_tree, check_cardinality, Strictness};
pub use graph::StageGraphError;
pub use pipeline::{compile, CompileFailure, CompileOptions};
pub use spec::CompiledSpec;
pub use stage::{StageSet, TransformFn, TransformStage, ValidateFn, ValidationStage};
pub use store::PersistedStore;
pub use validate::FailureMode;
