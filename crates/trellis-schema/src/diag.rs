//! Structured compilation diagnostics.
//!
//! Every problem found during compilation is reported as a [`Diagnostic`]:
//! a severity, a category, a breadcrumb [`ItemPath`] locating the problem,
//! a message, and optional secondary labels and notes.
//!
//! # Design
//!
//! - `Diagnostic` — single diagnostic with a primary path and optional
//!   secondary labeled paths
//! - `DiagnosticKind` — categorizes diagnostics by the check that produced
//!   them
//! - `Severity` — error or warning
//! - [`render_all`] — plain-text formatter for a batch of diagnostics
//!
//! Builder and validation engines collect diagnostics rather than failing
//! fast, so a single compilation reports every problem found.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::foundation::{ItemPath, StageId};

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Warning (declaration is accepted but suspicious)
    Warning,
    /// Error (compilation cannot succeed)
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Category of diagnostic, by the check that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Section name not present in the schema registry.
    UnknownSection,
    /// Entity kind not present in the schema registry.
    UnknownKind,
    /// Entity kind not permitted at this position (section or parent
    /// allowlist).
    KindNotPermitted,
    /// Required attribute absent and no default declared.
    MissingAttribute,
    /// Attribute supplied but not declared by the entity's schema.
    UnknownAttribute,
    /// Attribute value does not conform to its declared type.
    TypeMismatch,
    /// Attribute value rejected by its schema validator predicate.
    InvalidValue,
    /// More than one occurrence of a `:one`-cardinality entity kind.
    CardinalityViolation,
    /// A transform stage signalled it cannot proceed.
    TransformFailed,
    /// A validation stage found a violated invariant.
    Validation,
}

impl DiagnosticKind {
    /// Returns a human-readable name for this diagnostic kind.
    pub fn name(self) -> &'static str {
        match self {
            DiagnosticKind::UnknownSection => "unknown section",
            DiagnosticKind::UnknownKind => "unknown entity kind",
            DiagnosticKind::KindNotPermitted => "entity kind not permitted",
            DiagnosticKind::MissingAttribute => "missing required attribute",
            DiagnosticKind::UnknownAttribute => "unknown attribute",
            DiagnosticKind::TypeMismatch => "type mismatch",
            DiagnosticKind::InvalidValue => "invalid value",
            DiagnosticKind::CardinalityViolation => "cardinality violation",
            DiagnosticKind::TransformFailed => "transform failed",
            DiagnosticKind::Validation => "validation failed",
        }
    }
}

/// Secondary labeled path in a diagnostic.
///
/// Used to point at related locations (e.g. "first occurrence here").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticLabel {
    /// Related location.
    pub path: ItemPath,
    /// Label text.
    pub message: String,
}

/// A single compilation diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Category of this diagnostic.
    pub kind: DiagnosticKind,
    /// Severity level.
    pub severity: Severity,
    /// Primary location.
    pub path: ItemPath,
    /// Human-readable message.
    pub message: String,
    /// Stage or validation that produced this diagnostic, when known.
    pub origin: Option<StageId>,
    /// Additional labeled locations.
    pub labels: Vec<DiagnosticLabel>,
    /// Additional notes or hints.
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Creates an error diagnostic.
    pub fn error(kind: DiagnosticKind, path: ItemPath, message: impl Into<String>) -> Self {
        Self::with_severity(kind, Severity::Error, path, message.into())
    }

    /// Creates a warning diagnostic.
    pub fn warning(kind: DiagnosticKind, path: ItemPath, message: impl Into<String>) -> Self {
        Self::with_severity(kind, Severity::Warning, path, message.into())
    }

    fn with_severity(
        kind: DiagnosticKind,
        severity: Severity,
        path: ItemPath,
        message: String,
    ) -> Self {
        Self {
            kind,
            severity,
            path,
            message,
            origin: None,
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Records the stage that produced this diagnostic.
    pub fn with_origin(mut self, origin: StageId) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Adds a secondary labeled path.
    pub fn with_label(mut self, path: ItemPath, message: impl Into<String>) -> Self {
        self.labels.push(DiagnosticLabel {
            path,
            message: message.into(),
        });
        self
    }

    /// Adds a note or hint.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// True if this diagnostic is fatal.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}: {}",
            self.severity,
            self.kind.name(),
            self.message
        )
    }
}

impl std::error::Error for Diagnostic {}

/// True if any diagnostic in the slice has error severity.
pub fn has_errors(diags: &[Diagnostic]) -> bool {
    diags.iter().any(Diagnostic::is_error)
}

/// Formats a diagnostic as plain text with its location, labels, and notes.
pub fn render(diag: &Diagnostic) -> String {
    let mut output = String::new();

    output.push_str(&format!("{diag}\n"));
    output.push_str(&format!("  --> {}\n", diag.path));

    if let Some(origin) = &diag.origin {
        output.push_str(&format!("   = origin: {origin}\n"));
    }
    for label in &diag.labels {
        output.push_str(&format!("   = note: {} (at {})\n", label.message, label.path));
    }
    for note in &diag.notes {
        output.push_str(&format!("   = help: {note}\n"));
    }

    output
}

/// Formats multiple diagnostics separated by blank lines.
pub fn render_all(diags: &[Diagnostic]) -> String {
    diags.iter().map(render).collect::<Vec<_>>().join("\n")
}
