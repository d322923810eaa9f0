//! Foundation types shared across the compiler
//!
//! Small, immutable identifier and path types used as keys throughout
//! the schema registry, tree, and diagnostics.

pub mod id;
pub mod path;

pub use id::StageId;
pub use path::{ItemPath, PathSegment};
