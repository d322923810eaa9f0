//! Stage dependency resolution.
//!
//! Transform stages declare `runs_before` / `runs_after` constraints
//! against other stage identities. This module builds the directed graph
//! those constraints imply (an edge A→B means A must run before B) and
//! computes a total execution order with Kahn's algorithm, breaking ties
//! by registration order so the result is deterministic across runs.
//!
//! A cycle is a hard configuration error independent of any particular
//! compilation's input: it reflects a static mistake in stage
//! registration, so it is reported as [`StageGraphError`] rather than as a
//! compilation diagnostic. The error names a concrete cycle path.

use indexmap::IndexSet;
use thiserror::Error;
use trellis_schema::StageId;

use crate::stage::TransformStage;

/// Stage registration / resolution errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StageGraphError {
    #[error("duplicate stage registration: {0}")]
    DuplicateStage(StageId),

    #[error("cyclic stage dependency: {}", format_cycle(.stages))]
    Cycle { stages: Vec<StageId> },
}

fn format_cycle(stages: &[StageId]) -> String {
    stages
        .iter()
        .map(StageId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Computes the total execution order for the given transform stages.
///
/// Returns indices into `stages` in execution order. Edges are derived
/// symmetrically from `runs_before` on the earlier stage and `runs_after`
/// on the later one; declarations referencing identities that were never
/// registered are ignored. Stages with no dependency relationship keep
/// their registration order relative to each other.
pub fn resolve_order(stages: &[TransformStage]) -> Result<Vec<usize>, StageGraphError> {
    let index_of = |id: &StageId| stages.iter().position(|s| s.id() == id);

    // Adjacency and in-degree; IndexSet per node deduplicates declarations
    // that state the same edge twice (e.g. A runs_before B and B runs_after A).
    let mut successors: Vec<IndexSet<usize>> = vec![IndexSet::new(); stages.len()];
    let mut in_degree: Vec<usize> = vec![0; stages.len()];

    for (i, stage) in stages.iter().enumerate() {
        for target in stage.runs_before() {
            if let Some(j) = index_of(target) {
                if successors[i].insert(j) {
                    in_degree[j] += 1;
                }
            }
        }
        for target in stage.runs_after() {
            if let Some(j) = index_of(target) {
                if successors[j].insert(i) {
                    in_degree[i] += 1;
                }
            }
        }
    }

    // Kahn's algorithm. Instead of a queue, each round scans for the
    // first unemitted zero-degree stage in registration order, which makes
    // the tie-break (and therefore the whole order) stable.
    let mut order = Vec::with_capacity(stages.len());
    let mut emitted = vec![false; stages.len()];

    while order.len() < stages.len() {
        let Some(next) = (0..stages.len()).find(|&i| !emitted[i] && in_degree[i] == 0) else {
            break;
        };
        emitted[next] = true;
        order.push(next);
        for &succ in &successors[next] {
            in_degree[succ] -= 1;
        }
    }

    if order.len() != stages.len() {
        let remaining: Vec<usize> = (0..stages.len()).filter(|&i| !emitted[i]).collect();
        let cycle = trace_cycle(&remaining, &successors);
        return Err(StageGraphError::Cycle {
            stages: cycle.into_iter().map(|i| stages[i].id().clone()).collect(),
        });
    }

    Ok(order)
}

/// Traces one concrete dependency path through a cycle.
///
/// The Kahn residue also contains stages that are merely downstream of a
/// cycle, and such a stage may have no successor inside the residue. Every
/// residue stage does keep an unsatisfied in-edge though, so walking
/// predecessors is guaranteed to revisit a stage and close a real cycle.
/// The collected path is reversed so the result reads in run order, like
/// `[a, b, c, a]`.
fn trace_cycle(remaining: &[usize], successors: &[IndexSet<usize>]) -> Vec<usize> {
    let Some(&start) = remaining.first() else {
        return Vec::new();
    };

    let mut path = vec![start];
    let mut current = start;
    loop {
        let Some(&prev) = remaining
            .iter()
            .find(|&&j| successors[j].contains(&current))
        else {
            // every node in the residue has a predecessor in the residue; defend anyway
            break;
        };
        if let Some(pos) = path.iter().position(|&p| p == prev) {
            path.push(prev);
            let mut cycle = path.split_off(pos);
            cycle.reverse();
            return cycle;
        }
        path.push(prev);
        current = prev;
    }
    path
}
