//! Stage descriptors and the registration API.
//!
//! Transform and validation stages are registered once, during library
//! initialization, before any compilation runs. Descriptors are immutable:
//! a stage carries its identity, its executable function, and (for
//! transforms) its `runs_before` / `runs_after` ordering declarations.

use std::fmt;
use std::sync::Arc;

use trellis_schema::{Diagnostic, EntityTree, StageId};

use crate::graph::StageGraphError;
use crate::store::PersistedStore;

/// Executable body of a transform stage.
///
/// Takes ownership of the tree and store and returns the next versions, or
/// a diagnostic when the stage cannot proceed. Stages must not depend on
/// wall-clock time or external I/O; compilation is reproducible given
/// identical input.
pub type TransformFn = Arc<
    dyn Fn(EntityTree, PersistedStore) -> Result<(EntityTree, PersistedStore), Diagnostic>
        + Send
        + Sync,
>;

/// Executable body of a validation stage.
///
/// Reads the final tree and store, returns every violated invariant it
/// finds. Validation stages are mutually independent and must not rely on
/// another validation stage's side effects.
pub type ValidateFn = Arc<dyn Fn(&EntityTree, &PersistedStore) -> Vec<Diagnostic> + Send + Sync>;

/// A registered transform stage.
#[derive(Clone)]
pub struct TransformStage {
    pub(crate) id: StageId,
    pub(crate) runs_before: Vec<StageId>,
    pub(crate) runs_after: Vec<StageId>,
    pub(crate) run: TransformFn,
}

impl TransformStage {
    /// Stage identity.
    pub fn id(&self) -> &StageId {
        &self.id
    }

    /// Stages this one must precede.
    pub fn runs_before(&self) -> &[StageId] {
        &self.runs_before
    }

    /// Stages this one must follow.
    pub fn runs_after(&self) -> &[StageId] {
        &self.runs_after
    }
}

impl fmt::Debug for TransformStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformStage")
            .field("id", &self.id)
            .field("runs_before", &self.runs_before)
            .field("runs_after", &self.runs_after)
            .finish_non_exhaustive()
    }
}

/// A registered validation stage.
#[derive(Clone)]
pub struct ValidationStage {
    pub(crate) id: StageId,
    pub(crate) run: ValidateFn,
}

impl ValidationStage {
    /// Stage identity.
    pub fn id(&self) -> &StageId {
        &self.id
    }
}

impl fmt::Debug for ValidationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationStage")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// The set of stages a compilation runs.
///
/// Registration order is semantic for transforms: stages with no
/// dependency relationship execute in registration order, so the resolved
/// order is total and reproducible.
#[derive(Debug, Clone, Default)]
pub struct StageSet {
    transforms: Vec<TransformStage>,
    validations: Vec<ValidationStage>,
}

impl StageSet {
    /// Create an empty stage set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transform stage with its ordering declarations.
    ///
    /// Fails on duplicate identities. References to identities that are
    /// never registered are ignored when the dependency graph is built.
    pub fn register_transform(
        &mut self,
        id: impl Into<StageId>,
        runs_before: Vec<StageId>,
        runs_after: Vec<StageId>,
        run: impl Fn(EntityTree, PersistedStore) -> Result<(EntityTree, PersistedStore), Diagnostic>
            + Send
            + Sync
            + 'static,
    ) -> Result<(), StageGraphError> {
        let id = id.into();
        if self.contains(&id) {
            return Err(StageGraphError::DuplicateStage(id));
        }
        self.transforms.push(TransformStage {
            id,
            runs_before,
            runs_after,
            run: Arc::new(run),
        });
        Ok(())
    }

    /// Register a validation stage.
    pub fn register_validation(
        &mut self,
        id: impl Into<StageId>,
        run: impl Fn(&EntityTree, &PersistedStore) -> Vec<Diagnostic> + Send + Sync + 'static,
    ) -> Result<(), StageGraphError> {
        let id = id.into();
        if self.contains(&id) {
            return Err(StageGraphError::DuplicateStage(id));
        }
        self.validations.push(ValidationStage {
            id,
            run: Arc::new(run),
        });
        Ok(())
    }

    /// Registered transform stages, in registration order.
    pub fn transforms(&self) -> &[TransformStage] {
        &self.transforms
    }

    /// Registered validation stages, in registration order.
    pub fn validations(&self) -> &[ValidationStage] {
        &self.validations
    }

    fn contains(&self, id: &StageId) -> bool {
        self.transforms.iter().any(|s| &s.id == id)
            || self.validations.iter().any(|s| &s.id == id)
    }
}
