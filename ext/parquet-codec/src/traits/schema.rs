use crate::descriptor::SchemaDescriptor;
use crate::{Result, SchemaNode};

/// Trait for schema introspection
///
/// Logical paths join node names with `.`; list items and map keys/values
/// are addressed by their own node names (`scores.element`, `tags.key`).
pub trait SchemaInspector {
    /// Get the total number of nodes, including the root
    fn field_count(&self) -> usize;

    /// Get field by path (e.g., "address.city")
    fn get_field_by_path(&self, path: &str) -> Option<&SchemaNode>;

    /// Check if schema contains a specific field
    fn has_field(&self, name: &str) -> bool;

    /// Get all logical field paths, root excluded, in pre-order
    fn all_field_paths(&self) -> Vec<String>;

    /// Physical column paths as stored in the file, one per leaf
    fn leaf_paths(&self) -> Result<Vec<String>>;
}

impl SchemaInspector for crate::Schema {
    fn field_count(&self) -> usize {
        count_fields(&self.root)
    }

    fn get_field_by_path(&self, path: &str) -> Option<&SchemaNode> {
        let mut node = &self.root;
        for part in path.split('.') {
            node = children(node).into_iter().find(|child| child.name() == part)?;
        }
        Some(node)
    }

    fn has_field(&self, name: &str) -> bool {
        self.get_field_by_path(name).is_some()
    }

    fn all_field_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        for field in self.fields() {
            collect_field_paths(field, "", &mut paths);
        }
        paths
    }

    fn leaf_paths(&self) -> Result<Vec<String>> {
        let descr = SchemaDescriptor::flatten(self)?;
        Ok(descr.leaves().iter().map(|leaf| leaf.path_string()).collect())
    }
}

fn children(node: &SchemaNode) -> Vec<&SchemaNode> {
    match node {
        SchemaNode::Struct { fields, .. } => fields.iter().collect(),
        SchemaNode::List { item, .. } => vec![item.as_ref()],
        SchemaNode::Map { key, value, .. } => vec![key.as_ref(), value.as_ref()],
        SchemaNode::Primitive { .. } => Vec::new(),
    }
}

fn count_fields(node: &SchemaNode) -> usize {
    1 + children(node).into_iter().map(count_fields).sum::<usize>()
}

fn collect_field_paths(node: &SchemaNode, prefix: &str, paths: &mut Vec<String>) {
    let current_path = if prefix.is_empty() {
        node.name().to_string()
    } else {
        format!("{}.{}", prefix, node.name())
    };
    paths.push(current_path.clone());
    for child in children(node) {
        collect_field_paths(child, &current_path, paths);
    }
}
