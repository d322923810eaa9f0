//! Entity tree builder.
//!
//! Consumes raw declarations plus the schema registry and produces the
//! initial entity tree. Every structural problem in the input is reported:
//! the builder collects diagnostics across the whole pass instead of
//! stopping at the first, so one compilation surfaces every malformed
//! declaration at once.
//!
//! Checks performed here:
//! - section and entity kind are known to the registry
//! - entity kind is permitted at its position (section list or parent
//!   allowlist)
//! - required attributes are present or defaulted
//! - present attribute values conform to their declared type and pass the
//!   schema's validator predicate
//! - no undeclared attributes are supplied (closed schema; an error or a
//!   warning depending on [`Strictness`])
//! - `:one`-cardinality kinds occur at most once per section, with the
//!   diagnostic naming every occurrence

use indexmap::IndexMap;
use tracing::debug;
use trellis_schema::{
    schema::AttributeViolation, Cardinality, Diagnostic, DiagnosticKind, EntitySchema, EntityTree,
    ItemPath, NewEntity, RawEntity, RawSection, SchemaRegistry,
};

/// Closed-schema policy for attributes the schema does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Undeclared attributes are errors.
    #[default]
    Deny,
    /// Undeclared attributes are warnings and are dropped.
    Warn,
}

/// Builds the initial entity tree from raw declarations.
///
/// On success, returns the tree together with any warnings produced along
/// the way. On failure, returns every diagnostic found in the input,
/// errors and warnings alike.
pub fn build_tree(
    raw: &[RawSection],
    registry: &SchemaRegistry,
    strictness: Strictness,
) -> Result<(EntityTree, Vec<Diagnostic>), Vec<Diagnostic>> {
    let mut diags = Vec::new();
    let mut tree = EntityTree::new();

    for raw_section in raw {
        build_section(raw_section, registry, strictness, &mut tree, &mut diags);
    }

    debug!(
        sections = raw.len(),
        entities = tree.len(),
        diagnostics = diags.len(),
        "entity tree build finished"
    );

    if trellis_schema::diag::has_errors(&diags) {
        Err(diags)
    } else {
        Ok((tree, diags))
    }
}

fn build_section(
    raw_section: &RawSection,
    registry: &SchemaRegistry,
    strictness: Strictness,
    tree: &mut EntityTree,
    diags: &mut Vec<Diagnostic>,
) {
    let section_path = ItemPath::section(&raw_section.name);
    let Some(section_schema) = registry.section(&raw_section.name) else {
        diags.push(Diagnostic::error(
            DiagnosticKind::UnknownSection,
            section_path,
            format!(
                "section '{}' is not declared in the schema registry",
                raw_section.name
            ),
        ));
        return;
    };
    tree.add_section(&raw_section.name);

    // Occurrence paths per kind, for cardinality reporting.
    let mut occurrences: IndexMap<&str, Vec<ItemPath>> = IndexMap::new();

    for raw_entity in &raw_section.entities {
        let seen = occurrences.entry(raw_entity.kind.as_str()).or_default();
        let path = section_path.entity(&raw_entity.kind, seen.len());
        seen.push(path.clone());

        let Some(schema) = registry.entity(&raw_entity.kind) else {
            diags.push(Diagnostic::error(
                DiagnosticKind::UnknownKind,
                path,
                format!("unknown entity kind '{}'", raw_entity.kind),
            ));
            continue;
        };
        if !section_schema.permits(&raw_entity.kind) {
            diags.push(
                Diagnostic::error(
                    DiagnosticKind::KindNotPermitted,
                    path,
                    format!(
                        "entity kind '{}' is not permitted in section '{}'",
                        raw_entity.kind, raw_section.name
                    ),
                )
                .with_note(format!(
                    "permitted kinds: {}",
                    section_schema.kinds().join(", ")
                )),
            );
            continue;
        }

        let entity = build_entity(raw_entity, schema, &path, registry, strictness, diags);
        tree.add_entity(&raw_section.name, None, entity)
            .expect("section was added above");
    }

    // Cardinality: a `:one` kind may occur at most once per section.
    for (kind, paths) in &occurrences {
        let Some(schema) = registry.entity(kind) else {
            continue;
        };
        if schema.cardinality() == Cardinality::One && paths.len() > 1 {
            diags.push(cardinality_violation(kind, &raw_section.name, paths));
        }
    }
}

fn cardinality_violation(kind: &str, section: &str, paths: &[ItemPath]) -> Diagnostic {
    let mut diag = Diagnostic::error(
        DiagnosticKind::CardinalityViolation,
        paths[1].clone(),
        format!(
            "entity kind '{kind}' is declared :one but occurs {} times in section '{section}'",
            paths.len()
        ),
    )
    .with_label(paths[0].clone(), "first occurrence here");
    for extra in &paths[2..] {
        diag = diag.with_label(extra.clone(), "also declared here");
    }
    diag
}

/// Re-checks section cardinality on a transformed tree.
///
/// Transform stages edit the tree through the raw primitives, which do not
/// consult the registry, so a stage can reintroduce a second occurrence of
/// a `:one` kind. The pipeline runs this after the last transform.
pub fn check_cardinality(tree: &EntityTree, registry: &SchemaRegistry) -> Vec<Diagnostic> {
    let mut diags = Vec::new();
    for section in tree.sections() {
        let section_path = ItemPath::section(section.name());
        let mut occurrences: IndexMap<&str, Vec<ItemPath>> = IndexMap::new();
        for &id in section.entities() {
            let Some(entity) = tree.entity(id) else {
                continue;
            };
            let seen = occurrences.entry(entity.kind()).or_default();
            let path = section_path.entity(entity.kind(), seen.len());
            seen.push(path);
        }
        for (kind, paths) in &occurrences {
            let Some(schema) = registry.entity(kind) else {
                continue;
            };
            if schema.cardinality() == Cardinality::One && paths.len() > 1 {
                diags.push(cardinality_violation(kind, section.name(), paths));
            }
        }
    }
    diags
}

/// Resolves one raw declaration (and its children) against its schema.
///
/// Always produces an entity so that later checks in the same pass keep
/// running; when any error diagnostic was recorded the partially-resolved
/// tree is discarded by [`build_tree`] anyway.
fn build_entity(
    raw: &RawEntity,
    schema: &EntitySchema,
    path: &ItemPath,
    registry: &SchemaRegistry,
    strictness: Strictness,
    diags: &mut Vec<Diagnostic>,
) -> NewEntity {
    let mut attributes = IndexMap::new();

    for attr_schema in schema.attributes() {
        let attr_path = path.attribute(attr_schema.name());
        match raw.attributes.get(attr_schema.name()) {
            Some(value) => match attr_schema.check(value) {
                Ok(()) => {
                    attributes.insert(attr_schema.name().to_string(), value.clone());
                }
                Err(AttributeViolation::WrongType { expected, got }) => {
                    diags.push(Diagnostic::error(
                        DiagnosticKind::TypeMismatch,
                        attr_path,
                        format!(
                            "attribute '{}' expects {expected}, got {got}",
                            attr_schema.name()
                        ),
                    ));
                }
                Err(AttributeViolation::Rejected(reason)) => {
                    diags.push(Diagnostic::error(
                        DiagnosticKind::InvalidValue,
                        attr_path,
                        format!("invalid value for attribute '{}': {reason}", attr_schema.name()),
                    ));
                }
            },
            None => {
                if let Some(default) = attr_schema.default() {
                    attributes.insert(attr_schema.name().to_string(), default.clone());
                } else if attr_schema.is_required() {
                    diags.push(Diagnostic::error(
                        DiagnosticKind::MissingAttribute,
                        attr_path,
                        format!(
                            "required attribute '{}' is missing",
                            attr_schema.name()
                        ),
                    ));
                }
            }
        }
    }

    // Closed schema: anything the schema does not declare is flagged.
    for name in raw.attributes.keys() {
        if schema.attribute(name).is_none() {
            let message = format!(
                "attribute '{}' is not declared for entity kind '{}'",
                name,
                schema.kind()
            );
            let attr_path = path.attribute(name);
            match strictness {
                Strictness::Deny => diags.push(Diagnostic::error(
                    DiagnosticKind::UnknownAttribute,
                    attr_path,
                    message,
                )),
                Strictness::Warn => diags.push(
                    Diagnostic::warning(DiagnosticKind::UnknownAttribute, attr_path, message)
                        .with_note("the attribute is ignored"),
                ),
            }
        }
    }

    let mut children = Vec::new();
    let mut child_occurrences: IndexMap<&str, usize> = IndexMap::new();
    for raw_child in &raw.children {
        let index = child_occurrences.entry(raw_child.kind.as_str()).or_insert(0);
        let child_path = path.entity(&raw_child.kind, *index);
        *index += 1;

        if !schema.allows_child(&raw_child.kind) {
            diags.push(
                Diagnostic::error(
                    DiagnosticKind::KindNotPermitted,
                    child_path,
                    format!(
                        "entity kind '{}' is not permitted under '{}'",
                        raw_child.kind,
                        schema.kind()
                    ),
                )
                .with_note(if schema.child_kinds().is_empty() {
                    format!("'{}' does not allow nested entities", schema.kind())
                } else {
                    format!("permitted child kinds: {}", schema.child_kinds().join(", "))
                }),
            );
            continue;
        }
        let Some(child_schema) = registry.entity(&raw_child.kind) else {
            diags.push(Diagnostic::error(
                DiagnosticKind::UnknownKind,
                child_path,
                format!("unknown entity kind '{}'", raw_child.kind),
            ));
            continue;
        };
        children.push(build_entity(
            raw_child,
            child_schema,
            &child_path,
            registry,
            strictness,
            diags,
        ));
    }

    NewEntity {
        kind: raw.kind.clone(),
        attributes,
        children,
    }
}
