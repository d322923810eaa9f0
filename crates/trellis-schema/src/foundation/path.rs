//! Path representation for locations inside a declaration tree
//!
//! Every diagnostic carries an `ItemPath` identifying where the problem
//! occurred, as a breadcrumb trail of structural segments:
//!
//! - `commands` — a section
//! - `commands.command[1]` — the second `command` entity in that section
//! - `commands.command[1].name` — an attribute of that entity
//!
//! Consumers can render "section X → entity kind Y (occurrence 2) →
//! attribute Z" from the segments without parsing any message text.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One breadcrumb in an [`ItemPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathSegment {
    /// A top-level section, by name.
    Section(String),
    /// An entity, by kind and zero-based occurrence among its siblings
    /// of the same kind.
    Entity { kind: String, index: usize },
    /// An attribute of the preceding entity, by name.
    Attribute(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Section(name) => write!(f, "{name}"),
            PathSegment::Entity { kind, index } => write!(f, "{kind}[{index}]"),
            PathSegment::Attribute(name) => write!(f, "{name}"),
        }
    }
}

/// A structural path into a declaration tree.
///
/// Paths are immutable; the `entity` / `attribute` builders return new
/// paths. They are cheap to clone and are used as diagnostic locations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ItemPath {
    segments: Vec<PathSegment>,
}

impl ItemPath {
    /// Create an empty path (no known location).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a path rooted at a section.
    pub fn section(name: impl Into<String>) -> Self {
        Self {
            segments: vec![PathSegment::Section(name.into())],
        }
    }

    /// Append an entity segment, returning a new path.
    pub fn entity(&self, kind: impl Into<String>, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Entity {
            kind: kind.into(),
            index,
        });
        Self { segments }
    }

    /// Append an attribute segment, returning a new path.
    pub fn attribute(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Attribute(name.into()));
        Self { segments }
    }

    /// Get the path segments.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Get the number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if the path is empty.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Get the last segment.
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Get the parent path (all segments except the last).
    ///
    /// Returns None for empty and single-segment paths.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() <= 1 {
            None
        } else {
            Some(Self {
                segments: self.segments[..self.segments.len() - 1].to_vec(),
            })
        }
    }
}

impl fmt::Display for ItemPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "<unknown>");
        }
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}
