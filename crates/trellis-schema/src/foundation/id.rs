//! Stable stage identifiers.
//!
//! Transform and validation stages are addressed by name. `StageId` is the
//! key used in dependency declarations, the persisted store's namespaces,
//! and diagnostic origins.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a registered transform or validation stage.
///
/// Stage ids are immutable and support efficient comparison and hashing.
/// Registration order of ids is semantic: it breaks ties when the
/// dependency resolver computes a total execution order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StageId(String);

impl StageId {
    /// Create a stage id from a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StageId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for StageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<&str> for StageId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
