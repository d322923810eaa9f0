//! The frozen output of a successful compilation.
//!
//! A [`CompiledSpec`] owns the final entity tree, the persisted store, and
//! any warnings that survived validation. It exposes a read-only query
//! surface; there are no mutation entry points, and any further change
//! requires rerunning the full pipeline from raw declarations.

use serde::{Deserialize, Serialize};
use trellis_schema::{Diagnostic, Entity, EntityTree, Section, StageId, Value};

use crate::store::PersistedStore;

/// Immutable compiled specification: final sections, side-store, warnings.
///
/// Shareable and read-only for the remainder of the consuming program's
/// execution. Serializable so documentation generators and export tools
/// can consume it without touching the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledSpec {
    tree: EntityTree,
    store: PersistedStore,
    warnings: Vec<Diagnostic>,
}

impl CompiledSpec {
    pub(crate) fn new(tree: EntityTree, store: PersistedStore, warnings: Vec<Diagnostic>) -> Self {
        Self {
            tree,
            store,
            warnings,
        }
    }

    /// Top-level sections, in declaration order.
    pub fn sections(&self) -> &[Section] {
        self.tree.sections()
    }

    /// Entities of one kind in a section, in declaration order. Empty if
    /// the section or kind is absent.
    pub fn entities(&self, section: &str, kind: &str) -> Vec<&Entity> {
        self.tree
            .entities(section, kind)
            .into_iter()
            .filter_map(|id| self.tree.entity(id))
            .collect()
    }

    /// The single entity of a `:one`-cardinality kind, when declared.
    ///
    /// Such entities are optional by default, so absence is an ordinary
    /// `None`, not an error.
    pub fn entity_one(&self, section: &str, kind: &str) -> Option<&Entity> {
        self.tree
            .entities(section, kind)
            .first()
            .and_then(|id| self.tree.entity(*id))
    }

    /// A persisted store value by namespaced key.
    pub fn persisted(&self, stage: &StageId, key: &str) -> Option<&Value> {
        self.store.get(stage, key)
    }

    /// The final entity tree.
    pub fn tree(&self) -> &EntityTree {
        &self.tree
    }

    /// The final persisted store.
    pub fn store(&self) -> &PersistedStore {
        &self.store
    }

    /// Non-fatal diagnostics attached to this result.
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }
}
