//! Unified compilation pipeline.
//!
//! This module orchestrates the full pass from raw declarations to a
//! frozen [`CompiledSpec`]:
//!
//! 1. **Build** — check declarations against the schema registry and
//!    produce the initial entity tree (collect-all diagnostics).
//! 2. **Resolve** — compute the total transform order from the stage
//!    dependency graph (a cycle is a configuration error, not input-
//!    dependent).
//! 3. **Transform** — run the ordered stages, threading tree and store
//!    (fail-fast).
//! 4. **Validate** — run every validation stage and aggregate.
//! 5. **Freeze** — produce the read-only specification; warnings survive
//!    onto it, errors abort.

use tracing::debug;
use trellis_schema::diag::has_errors;
use trellis_schema::{Diagnostic, RawSection, SchemaRegistry};

use crate::build::{build_tree, check_cardinality, Strictness};
use crate::graph::{resolve_order, StageGraphError};
use crate::spec::CompiledSpec;
use crate::stage::StageSet;
use crate::store::PersistedStore;
use crate::transform::run_transforms;
use crate::validate::{run_validations, FailureMode};

/// Knobs for a compilation run.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    /// Policy for attributes the schema does not declare.
    pub unknown_attributes: Strictness,
    /// Whether validation stops at the first failing stage.
    pub validation: FailureMode,
}

/// Why a compilation produced no specification.
#[derive(Debug, thiserror::Error)]
pub enum CompileFailure {
    /// Static mistake in stage registration (cyclic dependency),
    /// independent of this compilation's input.
    #[error("stage configuration error: {0}")]
    Configuration(#[from] StageGraphError),

    /// Problems in the compiled input; inspect the diagnostics.
    #[error("compilation failed with {} diagnostic(s)", .0.len())]
    Diagnostics(Vec<Diagnostic>),
}

impl CompileFailure {
    /// The diagnostics, when this failure carries any.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CompileFailure::Configuration(_) => &[],
            CompileFailure::Diagnostics(diags) => diags,
        }
    }
}

/// Compiles raw declarations into an immutable [`CompiledSpec`].
///
/// This is the main entry point. The registry and stage set are read-only
/// here and may be shared across concurrent compilations; each call owns
/// its tree and store exclusively, so independent compilations never
/// contend.
pub fn compile(
    raw: &[RawSection],
    registry: &SchemaRegistry,
    stages: &StageSet,
    options: &CompileOptions,
) -> Result<CompiledSpec, CompileFailure> {
    // 1. Build
    let (tree, mut warnings) = build_tree(raw, registry, options.unknown_attributes)
        .map_err(CompileFailure::Diagnostics)?;

    // 2. Resolve stage order (independent of the tree)
    let order = resolve_order(stages.transforms())?;

    // 3. Transform
    let (tree, store) =
        match run_transforms(stages.transforms(), &order, tree, PersistedStore::new()) {
            Ok(out) => out,
            Err(diag) => {
                let mut diags = warnings;
                diags.push(diag);
                return Err(CompileFailure::Diagnostics(diags));
            }
        };

    // Tree edits bypass the registry, so cardinality must hold again on
    // the transformed tree.
    let cardinality_diags = check_cardinality(&tree, registry);
    if !cardinality_diags.is_empty() {
        let mut diags = warnings;
        diags.extend(cardinality_diags);
        return Err(CompileFailure::Diagnostics(diags));
    }

    // 4. Validate
    let validation_diags = run_validations(stages.validations(), &tree, &store, options.validation);
    if has_errors(&validation_diags) {
        let mut diags = warnings;
        diags.extend(validation_diags);
        return Err(CompileFailure::Diagnostics(diags));
    }
    warnings.extend(validation_diags);

    debug!(
        sections = tree.sections().len(),
        entities = tree.len(),
        warnings = warnings.len(),
        "compilation succeeded"
    );

    // 5. Freeze
    Ok(CompiledSpec::new(tree, store, warnings))
}
