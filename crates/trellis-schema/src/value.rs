//! Tagged attribute values and their declared types.
//!
//! Attribute values whose shape depends on a runtime-loaded schema are
//! modeled as a closed variant type rather than anything reflective. The
//! schema registry performs the type check at build time by matching a
//! [`Value`] against the [`ValueType`] its attribute schema declares.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A validated attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// UTF-8 text.
    String(String),
    /// Signed integer.
    Int(i64),
    /// Boolean.
    Bool(bool),
    /// A bare symbolic name, checked against an enumeration.
    Atom(String),
    /// Homogeneous list.
    List(Vec<Value>),
    /// Nested key/value structure with stable field order.
    Struct(IndexMap<String, Value>),
}

impl Value {
    /// Describes this value's shape for error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Int(_) => "integer",
            Value::Bool(_) => "boolean",
            Value::Atom(_) => "atom",
            Value::List(_) => "list",
            Value::Struct(_) => "struct",
        }
    }

    /// Checks whether this value conforms to a declared type.
    ///
    /// Enum membership and element types of lists are checked; struct
    /// fields are opaque at this level (nested entities are modeled as
    /// tree children, not struct attributes).
    pub fn conforms_to(&self, ty: &ValueType) -> bool {
        match (self, ty) {
            (Value::String(_), ValueType::String) => true,
            (Value::Int(_), ValueType::Int) => true,
            (Value::Bool(_), ValueType::Bool) => true,
            (Value::Atom(atom), ValueType::Enum(allowed)) => {
                allowed.iter().any(|a| a == atom)
            }
            (Value::List(items), ValueType::List(elem)) => {
                items.iter().all(|item| item.conforms_to(elem))
            }
            (Value::Struct(_), ValueType::Struct) => true,
            _ => false,
        }
    }

    /// Borrow as a string, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow as an integer, if this is an integer value.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Borrow as a boolean, if this is a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow as an atom name, if this is an atom value.
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Value::Atom(a) => Some(a),
            _ => None,
        }
    }

    /// Borrow as a list, if this is a list value.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s:?}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Atom(a) => write!(f, ":{a}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Struct(fields) => {
                write!(f, "{{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// The declared type of an attribute, from the schema registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueType {
    /// Any string.
    String,
    /// Any signed integer.
    Int,
    /// Boolean.
    Bool,
    /// An atom drawn from a closed set of names.
    Enum(Vec<String>),
    /// A homogeneous list of the given element type.
    List(Box<ValueType>),
    /// An opaque nested structure.
    Struct,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::String => write!(f, "string"),
            ValueType::Int => write!(f, "integer"),
            ValueType::Bool => write!(f, "boolean"),
            ValueType::Enum(allowed) => {
                write!(f, "one of ")?;
                for (i, a) in allowed.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, ":{a}")?;
                }
                Ok(())
            }
            ValueType::List(elem) => write!(f, "list of {elem}"),
            ValueType::Struct => write!(f, "struct"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_conformance() {
        assert!(Value::from("hello").conforms_to(&ValueType::String));
        assert!(Value::from(42).conforms_to(&ValueType::Int));
        assert!(Value::from(true).conforms_to(&ValueType::Bool));
        assert!(!Value::from(42).conforms_to(&ValueType::String));
    }

    #[test]
    fn test_enum_conformance() {
        let ty = ValueType::Enum(vec!["read".to_string(), "write".to_string()]);
        assert!(Value::Atom("read".to_string()).conforms_to(&ty));
        assert!(!Value::Atom("execute".to_string()).conforms_to(&ty));
        assert!(!Value::from("read").conforms_to(&ty));
    }

    #[test]
    fn test_list_conformance() {
        let ty = ValueType::List(Box::new(ValueType::Int));
        assert!(Value::List(vec![Value::from(1), Value::from(2)]).conforms_to(&ty));
        assert!(Value::List(vec![]).conforms_to(&ty));
        assert!(!Value::List(vec![Value::from(1), Value::from("two")]).conforms_to(&ty));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Atom("fast".to_string()).to_string(), ":fast");
        assert_eq!(
            Value::List(vec![Value::from(1), Value::from(2)]).to_string(),
            "[1, 2]"
        );
        assert_eq!(
            ValueType::List(Box::new(ValueType::String)).to_string(),
            "list of string"
        );
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(Value::from(7).as_int(), Some(7));
        assert_eq!(Value::from(7).as_str(), None);
        assert_eq!(Value::Atom("a".to_string()).as_atom(), Some("a"));
    }
}
