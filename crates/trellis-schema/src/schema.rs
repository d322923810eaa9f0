//! Schema registry: the declared shape of every entity kind and section.
//!
//! The registry is pure data with lookup and constraint checking. It is
//! created once at load time, is immutable afterwards, and may be shared
//! across concurrent compilations without locking.
//!
//! # Load-time invariants
//!
//! - Entity kinds and section names are unique.
//! - A declared default value must satisfy its attribute's type and
//!   validator. A violation is a [`RegistryError`], not a compilation
//!   diagnostic: it is a programming mistake in the schema itself.
//! - A section's permitted kinds must already be registered.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;

use crate::value::{Value, ValueType};

/// Validator predicate attached to an attribute schema.
///
/// Returns `Err` with a reason when the (already type-checked) value is
/// unacceptable.
pub type ValidatorFn = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// Schema-load errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("entity kind already registered: {0}")]
    DuplicateKind(String),

    #[error("section already registered: {0}")]
    DuplicateSection(String),

    #[error("section '{section}' permits unregistered entity kind '{kind}'")]
    UnknownSectionKind { section: String, kind: String },

    #[error("default for attribute '{attribute}' of kind '{kind}' is invalid: {reason}")]
    InvalidDefault {
        kind: String,
        attribute: String,
        reason: String,
    },
}

/// Declared shape of a single attribute.
#[derive(Clone)]
pub struct AttributeSchema {
    name: String,
    value_type: ValueType,
    required: bool,
    default: Option<Value>,
    validator: Option<ValidatorFn>,
}

impl AttributeSchema {
    /// Create an optional attribute of the given type.
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            required: false,
            default: None,
            validator: None,
        }
    }

    /// Mark the attribute as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Declare a default, used when the attribute is absent.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Attach a validator predicate, run after the type check.
    pub fn with_validator(
        mut self,
        validator: impl Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared value type.
    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    /// Whether the attribute must be supplied (or defaulted).
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Declared default value, if any.
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Full constraint check: declared type first, then the validator.
    pub fn check(&self, value: &Value) -> Result<(), AttributeViolation> {
        if !value.conforms_to(&self.value_type) {
            return Err(AttributeViolation::WrongType {
                expected: self.value_type.clone(),
                got: value.describe(),
            });
        }
        if let Some(validator) = &self.validator {
            validator(value).map_err(AttributeViolation::Rejected)?;
        }
        Ok(())
    }
}

impl fmt::Debug for AttributeSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeSchema")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("required", &self.required)
            .field("default", &self.default)
            .field("validator", &self.validator.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Why an attribute value was rejected.
#[derive(Debug, Clone)]
pub enum AttributeViolation {
    /// Value does not conform to the declared type.
    WrongType {
        expected: ValueType,
        got: &'static str,
    },
    /// Validator predicate rejected the value, with its reason.
    Rejected(String),
}

impl fmt::Display for AttributeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeViolation::WrongType { expected, got } => {
                write!(f, "expected {expected}, got {got}")
            }
            AttributeViolation::Rejected(reason) => write!(f, "{reason}"),
        }
    }
}

/// How many entities of a kind a section may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Cardinality {
    /// At most one occurrence per section.
    One,
    /// Any number of occurrences.
    Many,
}

/// Declared shape of an entity kind.
#[derive(Debug, Clone)]
pub struct EntitySchema {
    kind: String,
    target: String,
    cardinality: Cardinality,
    attributes: Vec<AttributeSchema>,
    child_kinds: Vec<String>,
}

impl EntitySchema {
    /// Create a `:many` entity kind with the given target shape identifier.
    pub fn new(kind: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            target: target.into(),
            cardinality: Cardinality::Many,
            attributes: Vec::new(),
            child_kinds: Vec::new(),
        }
    }

    /// Restrict the kind to at most one occurrence per section.
    pub fn singleton(mut self) -> Self {
        self.cardinality = Cardinality::One;
        self
    }

    /// Append an attribute schema (ordered).
    pub fn with_attribute(mut self, attribute: AttributeSchema) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Permit a nested entity kind.
    pub fn with_child_kind(mut self, kind: impl Into<String>) -> Self {
        self.child_kinds.push(kind.into());
        self
    }

    /// Kind name.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Target shape identifier (what the compiled entity maps onto).
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Cardinality of this kind within its owning section.
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// Ordered attribute schemas.
    pub fn attributes(&self) -> &[AttributeSchema] {
        &self.attributes
    }

    /// Look up an attribute schema by name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes.iter().find(|a| a.name() == name)
    }

    /// Whether `kind` is allowed as a direct child.
    pub fn allows_child(&self, kind: &str) -> bool {
        self.child_kinds.iter().any(|k| k == kind)
    }

    /// The nested-kind allowlist.
    pub fn child_kinds(&self) -> &[String] {
        &self.child_kinds
    }
}

/// Declared shape of a section.
#[derive(Debug, Clone)]
pub struct SectionSchema {
    name: String,
    kinds: Vec<String>,
}

impl SectionSchema {
    /// Create a section permitting the given top-level kinds.
    pub fn new(name: impl Into<String>, kinds: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kinds,
        }
    }

    /// Section name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `kind` may appear at the top level of this section.
    pub fn permits(&self, kind: &str) -> bool {
        self.kinds.iter().any(|k| k == kind)
    }

    /// Permitted top-level kinds.
    pub fn kinds(&self) -> &[String] {
        &self.kinds
    }
}

/// The full registry: every entity kind and section the compiler knows.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    entities: IndexMap<String, EntitySchema>,
    sections: IndexMap<String, SectionSchema>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity kind.
    ///
    /// Checks the default-value invariant: every declared default must
    /// satisfy its own type and validator.
    pub fn register_entity(&mut self, schema: EntitySchema) -> Result<(), RegistryError> {
        if self.entities.contains_key(schema.kind()) {
            return Err(RegistryError::DuplicateKind(schema.kind().to_string()));
        }
        for attribute in schema.attributes() {
            if let Some(default) = attribute.default() {
                attribute
                    .check(default)
                    .map_err(|violation| RegistryError::InvalidDefault {
                        kind: schema.kind().to_string(),
                        attribute: attribute.name().to_string(),
                        reason: violation.to_string(),
                    })?;
            }
        }
        self.entities.insert(schema.kind().to_string(), schema);
        Ok(())
    }

    /// Register a section. Its permitted kinds must already be registered.
    pub fn register_section(&mut self, schema: SectionSchema) -> Result<(), RegistryError> {
        if self.sections.contains_key(schema.name()) {
            return Err(RegistryError::DuplicateSection(schema.name().to_string()));
        }
        for kind in schema.kinds() {
            if !self.entities.contains_key(kind) {
                return Err(RegistryError::UnknownSectionKind {
                    section: schema.name().to_string(),
                    kind: kind.clone(),
                });
            }
        }
        self.sections.insert(schema.name().to_string(), schema);
        Ok(())
    }

    /// Look up an entity kind.
    pub fn entity(&self, kind: &str) -> Option<&EntitySchema> {
        self.entities.get(kind)
    }

    /// Look up a section.
    pub fn section(&self, name: &str) -> Option<&SectionSchema> {
        self.sections.get(name)
    }

    /// Registered sections, in registration order.
    pub fn sections(&self) -> impl Iterator<Item = &SectionSchema> {
        self.sections.values()
    }

    /// Registered entity kinds, in registration order.
    pub fn entities(&self) -> impl Iterator<Item = &EntitySchema> {
        self.entities.values()
    }
}
