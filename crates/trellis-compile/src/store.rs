//! Cross-stage key/value side-store.
//!
//! Transform stages communicate state that is not part of the visible tree
//! (caches, computed indices) through a [`PersistedStore`]. The store is an
//! explicit parameter of every stage call, never ambient state, and keys
//! are namespaced by the owning stage so independent stages cannot collide.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use trellis_schema::{StageId, Value};

/// Append/overwrite key→value map threaded alongside the tree.
///
/// Entries survive to the end of compilation and are queryable on the
/// [`CompiledSpec`](crate::CompiledSpec). Iteration order is insertion
/// order, which keeps serialized output deterministic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersistedStore {
    namespaces: IndexMap<StageId, IndexMap<String, Value>>,
}

impl PersistedStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a value under the given stage's namespace.
    pub fn put(&mut self, namespace: &StageId, key: impl Into<String>, value: Value) {
        self.namespaces
            .entry(namespace.clone())
            .or_default()
            .insert(key.into(), value);
    }

    /// Look up a value by namespaced key.
    pub fn get(&self, namespace: &StageId, key: &str) -> Option<&Value> {
        self.namespaces.get(namespace)?.get(key)
    }

    /// All entries written by one stage, in insertion order.
    pub fn namespace(&self, namespace: &StageId) -> Option<&IndexMap<String, Value>> {
        self.namespaces.get(namespace)
    }

    /// Total number of entries across all namespaces.
    pub fn len(&self) -> usize {
        self.namespaces.values().map(IndexMap::len).sum()
    }

    /// True if no stage has written anything.
    pub fn is_empty(&self) -> bool {
        self.namespaces.values().all(IndexMap::is_empty)
    }
}
