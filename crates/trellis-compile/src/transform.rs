//! Transform engine.
//!
//! Executes transform stages in their resolved total order, threading the
//! entity tree and the persisted store from one stage to the next. Each
//! stage owns its input and produces a fresh output; once a stage returns
//! its output is durable, so a later failure does not roll earlier stages
//! back. Failure is fail-fast: later transforms generally assume earlier
//! ones succeeded.

use tracing::{debug, trace};
use trellis_schema::{Diagnostic, EntityTree};

use crate::stage::TransformStage;
use crate::store::PersistedStore;

/// Runs the given stages, in the order named by `order` (indices into
/// `stages`, as produced by [`crate::graph::resolve_order`]).
///
/// On failure, the returned diagnostic carries the failing stage's
/// identity as its origin and the remaining stages are not run.
pub fn run_transforms(
    stages: &[TransformStage],
    order: &[usize],
    mut tree: EntityTree,
    mut store: PersistedStore,
) -> Result<(EntityTree, PersistedStore), Diagnostic> {
    debug!(stages = order.len(), "running transform stages");

    for &index in order {
        let stage = &stages[index];
        trace!(stage = %stage.id, "transform stage start");

        match (stage.run)(tree, store) {
            Ok((next_tree, next_store)) => {
                tree = next_tree;
                store = next_store;
            }
            Err(diag) => {
                debug!(stage = %stage.id, "transform stage failed");
                let diag = if diag.origin.is_some() {
                    diag
                } else {
                    diag.with_origin(stage.id.clone())
                };
                return Err(diag);
            }
        }
    }

    Ok((tree, store))
}
