//! Validation engine.
//!
//! After the last transform stage, every registered validation stage runs
//! against the final tree and store. Validation stages are unordered and
//! mutually independent; by default all of them execute even when earlier
//! ones fail, so a single compilation reports the complete set of
//! violated invariants. [`FailureMode::FailFast`] restores stop-at-first
//! behavior for callers that prefer it.

use tracing::{debug, trace};
use trellis_schema::diag::has_errors;
use trellis_schema::{Diagnostic, EntityTree};

use crate::stage::ValidationStage;
use crate::store::PersistedStore;

/// Whether validation stops at the first failing stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Run every validation stage and aggregate all diagnostics.
    #[default]
    CollectAll,
    /// Stop after the first stage that reports an error.
    FailFast,
}

/// Runs validation stages and returns every diagnostic they produced.
///
/// Diagnostics are tagged with the identity of the stage that produced
/// them unless the stage set an explicit origin.
pub fn run_validations(
    stages: &[ValidationStage],
    tree: &EntityTree,
    store: &PersistedStore,
    mode: FailureMode,
) -> Vec<Diagnostic> {
    debug!(stages = stages.len(), ?mode, "running validation stages");
    let mut diags = Vec::new();

    for stage in stages {
        trace!(stage = %stage.id, "validation stage start");
        let produced = (stage.run)(tree, store);
        let failed = has_errors(&produced);

        diags.extend(produced.into_iter().map(|diag| {
            if diag.origin.is_some() {
                diag
            } else {
                diag.with_origin(stage.id.clone())
            }
        }));

        if failed && mode == FailureMode::FailFast {
            debug!(stage = %stage.id, "validation failed fast");
            break;
        }
    }

    diags
}
