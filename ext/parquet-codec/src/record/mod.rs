//! Record shredding and assembly (the Dremel algorithm).
//!
//! Nested rows are striped into one [`ColumnValues`](crate::column::ColumnValues)
//! per leaf and reassembled from them. Both directions walk a [`FieldPlan`]
//! tree that caches, per schema node, its leaf range and levels.

mod assemble;
mod shred;

use std::ops::Range;

pub use assemble::RecordAssembler;
pub use shred::{shred_rows, Shredder};

use crate::descriptor::SchemaDescriptor;
use crate::schema::SchemaNode;

/// A schema node annotated with the levels needed to shred and assemble it.
#[derive(Debug)]
pub(crate) struct FieldPlan<'a> {
    pub node: &'a SchemaNode,
    /// Leaf columns below this node.
    pub leaves: Range<usize>,
    /// Definition level of the node when it is present.
    pub def: i16,
    /// Repetition level of the innermost repeated ancestor.
    pub rep: i16,
    /// Item for lists, key then value for maps, fields for structs.
    pub children: Vec<FieldPlan<'a>>,
}

impl<'a> FieldPlan<'a> {
    /// Plans for the top-level fields of `descr`.
    pub fn for_schema(descr: &'a SchemaDescriptor) -> Vec<FieldPlan<'a>> {
        let mut next_leaf = 0;
        descr
            .schema()
            .fields()
            .iter()
            .map(|field| Self::build(field, 0, 0, &mut next_leaf))
            .collect()
    }

    fn build(node: &'a SchemaNode, parent_def: i16, rep: i16, next_leaf: &mut usize) -> Self {
        let def = parent_def + node.is_nullable() as i16;
        let start = *next_leaf;
        let children = match node {
            SchemaNode::Primitive { .. } => {
                *next_leaf += 1;
                Vec::new()
            }
            SchemaNode::Struct { fields, .. } => fields
                .iter()
                .map(|f| Self::build(f, def, rep, next_leaf))
                .collect(),
            // The repeated group adds one definition and one repetition level.
            SchemaNode::List { item, .. } => vec![Self::build(item, def + 1, rep + 1, next_leaf)],
            SchemaNode::Map { key, value, .. } => vec![
                Self::build(key, def + 1, rep + 1, next_leaf),
                Self::build(value, def + 1, rep + 1, next_leaf),
            ],
        };
        FieldPlan {
            node,
            leaves: start..*next_leaf,
            def,
            rep,
            children,
        }
    }

    /// Repetition level of entries after the first in this repeated node.
    pub fn repeated_level(&self) -> i16 {
        self.rep + 1
    }
}
