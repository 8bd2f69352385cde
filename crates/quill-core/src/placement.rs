//! Field placement
//!
//! Moves the tag held by each field out of its input element and into the
//! surrounding markup, at the level the field asks for:
//!
//! - a hinted field replaces its nearest ancestor of the hinted kind with the
//!   bare tag text (`before::`/`after::` hints keep that ancestor and only drop
//!   the paragraph holding the field);
//! - an un-hinted block tag climbs to the highest ancestor it shares with no
//!   other field and replaces it with the bare tag text;
//! - an un-hinted print tag becomes a `text:span` in place of the field.

use quill_odf::names::{TABLE_CELL, TABLE_ROW, TEXT_P, TEXT_SPAN};
use quill_odf::{NodeId, TreeError, XmlDocument};

use crate::census::Census;
use crate::error::TemplateFault;
use crate::tags::{Field, TagKind};

const BEFORE: &str = "before::";
const AFTER: &str = "after::";

/// Hint names and the element kind each one anchors to
pub const FLOW_REFERENCES: &[(&str, &str)] = &[
    ("text:p", TEXT_P),
    ("paragraph", TEXT_P),
    ("before::paragraph", TEXT_P),
    ("after::paragraph", TEXT_P),
    ("table:table-row", TABLE_ROW),
    ("table-row", TABLE_ROW),
    ("row", TABLE_ROW),
    ("before::table-row", TABLE_ROW),
    ("after::table-row", TABLE_ROW),
    ("before::row", TABLE_ROW),
    ("after::row", TABLE_ROW),
    ("table:table-cell", TABLE_CELL),
    ("table-cell", TABLE_CELL),
    ("cell", TABLE_CELL),
    ("before::table-cell", TABLE_CELL),
    ("after::table-cell", TABLE_CELL),
    ("before::cell", TABLE_CELL),
    ("after::cell", TABLE_CELL),
];

/// Element kind a placement hint refers to, if the hint is known
pub fn resolve_hint(hint: &str) -> Option<&'static str> {
    FLOW_REFERENCES
        .iter()
        .find(|(name, _)| *name == hint)
        .map(|(_, element)| *element)
}

/// Hint actually used for a field
///
/// Markdown fields always take their whole paragraph. Unknown hints count
/// as no hint at all.
pub fn effective_hint(field: &Field) -> Option<&str> {
    if field.is_markdown() {
        return Some("paragraph");
    }
    field
        .hint
        .as_deref()
        .filter(|hint| resolve_hint(hint).is_some())
}

/// Where a field's tag ends up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Node replaced by the tag
    pub target: NodeId,
    /// Whether the tag is wrapped in a `text:span`
    pub wrapped: bool,
    /// Whether the tag goes after the target instead of before it
    pub after: bool,
    /// Whether the target is kept and only the field's paragraph dropped
    pub keep_target: bool,
}

/// Outcome of a placement pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlacementReport {
    /// Fields moved into the markup flow
    pub placed: usize,
    /// Fields already removed along with an earlier field's target
    pub skipped: usize,
}

/// Decide where `field` goes without touching the tree
pub fn locate(doc: &XmlDocument, field: &Field, census: &Census) -> Result<Placement, TemplateFault> {
    let hint = effective_hint(field);

    if let Some(hint) = hint {
        let element = resolve_hint(hint).unwrap_or(TEXT_P);
        let target = doc
            .nearest_ancestor_named(field.node, element)
            .ok_or_else(|| missing_ancestor(field, hint, element))?;
        return Ok(Placement {
            target,
            wrapped: false,
            after: hint.starts_with(AFTER),
            keep_target: hint.starts_with(BEFORE) || hint.starts_with(AFTER),
        });
    }

    let target = match field.kind {
        TagKind::Block => {
            let mut node = field.node;
            loop {
                let parent = doc.parent(node).ok_or_else(|| orphaned(field))?;
                if census.count(parent).total > 1 {
                    break node;
                }
                node = parent;
            }
        }
        TagKind::Print => field.node,
    };

    Ok(Placement {
        target,
        wrapped: field.kind == TagKind::Print,
        after: false,
        keep_target: false,
    })
}

/// Relocate every field, in document order
pub fn place_fields(
    doc: &mut XmlDocument,
    fields: &[Field],
    census: &Census,
) -> Result<PlacementReport, TemplateFault> {
    let mut report = PlacementReport::default();

    for field in fields {
        if !doc.is_attached(field.node) {
            tracing::debug!(content = %field.content, "field removed by an earlier placement");
            report.skipped += 1;
            continue;
        }
        place_field(doc, field, census)?;
        report.placed += 1;
    }

    tracing::debug!(placed = report.placed, skipped = report.skipped, "fields placed");
    Ok(report)
}

fn place_field(doc: &mut XmlDocument, field: &Field, census: &Census) -> Result<(), TemplateFault> {
    let placement = locate(doc, field, census)?;
    let detached = |_: TreeError| orphaned(field);

    let replacement = if placement.wrapped {
        let span = doc.create_element(TEXT_SPAN);
        let text = doc.create_text(field.content.as_str());
        doc.append_child(span, text);
        span
    } else {
        doc.create_text(field.content.as_str())
    };

    if placement.after {
        doc.insert_after(placement.target, replacement)
            .map_err(detached)?;
    } else {
        doc.insert_before(placement.target, replacement)
            .map_err(detached)?;
    }

    let discard = if placement.keep_target {
        doc.nearest_ancestor_named(field.node, TEXT_P)
            .ok_or_else(|| missing_ancestor(field, effective_hint(field).unwrap_or_default(), TEXT_P))?
    } else {
        placement.target
    };
    doc.remove_child(discard).map_err(detached)?;

    tracing::trace!(content = %field.content, ?placement, "field placed");
    Ok(())
}

fn missing_ancestor(field: &Field, hint: &str, element: &str) -> TemplateFault {
    TemplateFault::MissingAncestor {
        content: field.content.clone(),
        hint: hint.to_string(),
        element: element.to_string(),
    }
}

fn orphaned(field: &Field) -> TemplateFault {
    TemplateFault::Orphaned {
        content: field.content.clone(),
    }
}
