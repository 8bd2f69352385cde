//! Per-node field counts
//!
//! The census walks from every field's parent up to the document node and
//! counts, for each ancestor, how many fields sit below it. Counts live in a
//! side table indexed by [`NodeId::index`] and are only valid for the tree
//! they were taken on.

use quill_odf::{NodeId, XmlDocument};

use crate::tags::{Field, TagKind};

/// Number of field descendants of a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagCount {
    pub total: usize,
    pub blocks: usize,
    pub prints: usize,
}

/// Field counts for one pass over one part
#[derive(Debug, Clone)]
pub struct Census {
    counts: Vec<TagCount>,
}

impl Census {
    /// Count the fields below every ancestor of `fields`
    pub fn take(doc: &XmlDocument, fields: &[Field]) -> Self {
        let mut counts = vec![TagCount::default(); doc.len()];

        for field in fields {
            for ancestor in doc.ancestors(field.node) {
                let count = &mut counts[ancestor.index()];
                count.total += 1;
                match field.kind {
                    TagKind::Block => count.blocks += 1,
                    TagKind::Print => count.prints += 1,
                }
            }
        }

        tracing::trace!(fields = fields.len(), "census taken");
        Self { counts }
    }

    /// Counts for `id`; nodes created after the census count as empty
    pub fn count(&self, id: NodeId) -> TagCount {
        self.counts.get(id.index()).copied().unwrap_or_default()
    }
}
