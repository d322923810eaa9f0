//! Raw declarations, as handed in by an external front-end.
//!
//! A front-end (parser, macro layer, config loader) produces plain
//! structured data: per-section lists of entity declarations carrying a
//! kind name, an attribute map, and nested child declarations. Nothing
//! here has been checked against the schema registry yet; that is the
//! builder's job.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// A single unvalidated entity declaration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawEntity {
    /// Declared kind name.
    pub kind: String,
    /// Supplied attributes, in declaration order.
    pub attributes: IndexMap<String, Value>,
    /// Nested declarations, in declaration order.
    pub children: Vec<RawEntity>,
}

impl RawEntity {
    /// Create a declaration with no attributes or children.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute (builder style).
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Append a child declaration (builder style).
    pub fn with_child(mut self, child: RawEntity) -> Self {
        self.children.push(child);
        self
    }
}

/// All declarations for one named section.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawSection {
    /// Section name.
    pub name: String,
    /// Top-level declarations, in declaration order.
    pub entities: Vec<RawEntity>,
}

impl RawSection {
    /// Create an empty section.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entities: Vec::new(),
        }
    }

    /// Append a declaration (builder style).
    pub fn with_entity(mut self, entity: RawEntity) -> Self {
        self.entities.push(entity);
        self
    }
}
