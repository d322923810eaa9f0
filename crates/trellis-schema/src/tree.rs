//! Arena-backed entity tree.
//!
//! Entities live in a slot arena and are referenced by stable integer
//! handles ([`EntityId`]), so "producing a new tree" during a transform
//! stage is an ownership hand-off plus in-place slot edits rather than a
//! deep copy. Handles are position-stable: `replace` keeps the handle and
//! the entity's position among its siblings while swapping the subtree
//! beneath it.
//!
//! Mutation happens only through the three edit primitives (`add_entity`,
//! `replace_entity`, `remove_entity`). A stage receives the tree by value
//! and returns it by value; there is no aliasing across stage boundaries.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::Value;

/// Stable handle to an entity in the tree's arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EntityId(u32);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tree edit errors, surfaced by transform stages as diagnostics.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TreeError {
    #[error("unknown section: {0}")]
    UnknownSection(String),

    #[error("stale entity handle: {0}")]
    StaleHandle(EntityId),
}

/// A validated entity: kind, attribute map, and ordered children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    kind: String,
    attributes: IndexMap<String, Value>,
    children: Vec<EntityId>,
    parent: Option<EntityId>,
}

impl Entity {
    /// Kind name, referencing an entity schema.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Validated attributes, in schema order.
    pub fn attributes(&self) -> &IndexMap<String, Value> {
        &self.attributes
    }

    /// Look up a single attribute value.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Ordered child handles.
    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    /// Parent handle; None for section-level entities.
    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }
}

/// A detached entity subtree, used to construct additions and replacements.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewEntity {
    /// Kind name.
    pub kind: String,
    /// Attribute map.
    pub attributes: IndexMap<String, Value>,
    /// Nested subtrees.
    pub children: Vec<NewEntity>,
}

impl NewEntity {
    /// Create a subtree root with no attributes or children.
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

    /// Append a child subtree (builder style).
    pub fn with_child(mut self, child: NewEntity) -> Self {
        self.children.push(child);
        self
    }
}

/// A named, ordered grouping of section-level entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    name: String,
    entities: Vec<EntityId>,
}

impl Section {
    /// Section name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered handles of the section's top-level entities.
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }
}

/// The compilation's entity tree: ordered sections over a slot arena.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityTree {
    arena: Vec<Option<Entity>>,
    sections: Vec<Section>,
}

impl EntityTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an empty section. Section order is declaration order.
    pub fn add_section(&mut self, name: impl Into<String>) {
        self.sections.push(Section {
            name: name.into(),
            entities: Vec::new(),
        });
    }

    /// Add an entity subtree.
    ///
    /// With `parent: None` the subtree is appended at the top level of
    /// `section`; otherwise it is appended under the parent entity.
    /// Returns the handle of the subtree root.
    pub fn add_entity(
        &mut self,
        section: &str,
        parent: Option<EntityId>,
        entity: NewEntity,
    ) -> Result<EntityId, TreeError> {
        if self.section(section).is_none() {
            return Err(TreeError::UnknownSection(section.to_string()));
        }
        match parent {
            Some(parent_id) => {
                if self.entity(parent_id).is_none() {
                    return Err(TreeError::StaleHandle(parent_id));
                }
                let id = self.alloc(entity, Some(parent_id));
                self.node_mut(parent_id).children.push(id);
                Ok(id)
            }
            None => {
                let id = self.alloc(entity, None);
                let sec = self
                    .sections
                    .iter_mut()
                    .find(|s| s.name == section)
                    .expect("section checked above");
                sec.entities.push(id);
                Ok(id)
            }
        }
    }

    /// Replace the entity behind `id` with a structurally-new subtree.
    ///
    /// The handle and the entity's position among its siblings are
    /// preserved; the old child subtrees are discarded.
    pub fn replace_entity(&mut self, id: EntityId, entity: NewEntity) -> Result<(), TreeError> {
        if self.entity(id).is_none() {
            return Err(TreeError::StaleHandle(id));
        }
        let old_children = std::mem::take(&mut self.node_mut(id).children);
        for child in old_children {
            self.free(child);
        }
        let NewEntity {
            kind,
            attributes,
            children,
        } = entity;
        let new_children: Vec<EntityId> = children
            .into_iter()
            .map(|child| self.alloc(child, Some(id)))
            .collect();
        let node = self.node_mut(id);
        node.kind = kind;
        node.attributes = attributes;
        node.children = new_children;
        Ok(())
    }

    /// Remove the entity behind `id`, including its subtree.
    pub fn remove_entity(&mut self, id: EntityId) -> Result<(), TreeError> {
        let Some(entity) = self.entity(id) else {
            return Err(TreeError::StaleHandle(id));
        };
        match entity.parent {
            Some(parent_id) => {
                self.node_mut(parent_id).children.retain(|c| *c != id);
            }
            None => {
                for section in &mut self.sections {
                    section.entities.retain(|c| *c != id);
                }
            }
        }
        self.free(id);
        Ok(())
    }

    /// Look up an entity by handle. Returns None for removed handles.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.arena.get(id.0 as usize).and_then(Option::as_ref)
    }

    /// Sections in declaration order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Look up a section by name.
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Handles of a section's top-level entities of one kind, in order.
    pub fn entities(&self, section: &str, kind: &str) -> Vec<EntityId> {
        let Some(section) = self.section(section) else {
            return Vec::new();
        };
        section
            .entities
            .iter()
            .copied()
            .filter(|id| self.entity(*id).is_some_and(|e| e.kind() == kind))
            .collect()
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.arena.iter().filter(|slot| slot.is_some()).count()
    }

    /// True if the tree holds no live entities.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Depth-first walk of one subtree, root first.
    pub fn walk(&self, id: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(entity) = self.entity(next) {
                out.push(next);
                // preserve child order in the output
                stack.extend(entity.children.iter().rev().copied());
            }
        }
        out
    }

    fn alloc(&mut self, entity: NewEntity, parent: Option<EntityId>) -> EntityId {
        let id = EntityId(self.arena.len() as u32);
        self.arena.push(Some(Entity {
            kind: entity.kind,
            attributes: entity.attributes,
            children: Vec::new(),
            parent,
        }));
        let children: Vec<EntityId> = entity
            .children
            .into_iter()
            .map(|child| self.alloc(child, Some(id)))
            .collect();
        self.node_mut(id).children = children;
        id
    }

    fn free(&mut self, id: EntityId) {
        if let Some(entity) = self.arena[id.0 as usize].take() {
            for child in entity.children {
                self.free(child);
            }
        }
    }

    fn node_mut(&mut self, id: EntityId) -> &mut Entity {
        self.arena[id.0 as usize]
            .as_mut()
            .expect("live handle checked by caller")
    }
}
