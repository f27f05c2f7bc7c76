use std::sync::Arc;

use crate::error::{ParquetError, Result};

/// Core schema representation for Parquet files
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub root: SchemaNode,
}

/// Represents a node in the Parquet schema tree
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// A struct with named fields
    Struct {
        name: String,
        nullable: bool,
        fields: Vec<SchemaNode>,
    },
    /// A list containing items of a single type
    List {
        name: String,
        nullable: bool,
        item: Box<SchemaNode>,
    },
    /// A map with key-value pairs
    Map {
        name: String,
        nullable: bool,
        key: Box<SchemaNode>,
        value: Box<SchemaNode>,
    },
    /// A primitive/leaf type
    Primitive {
        name: String,
        primitive_type: PrimitiveType,
        nullable: bool,
        /// Free-form formatting hint; not stored in files
        format: Option<String>,
    },
}

/// Primitive data types supported by Parquet
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    // Integer types
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,

    // Floating point types
    Float32,
    Float64,

    // Decimal types (precision, scale)
    Decimal128(u8, i8),
    Decimal256(u8, i8),

    // Other basic types
    Boolean,
    String,
    Binary,

    // Date/Time types
    Date32,
    TimestampMillis(Option<Arc<str>>),
    TimestampMicros(Option<Arc<str>>),
    TimestampNanos(Option<Arc<str>>),
    TimeMillis,
    TimeMicros,
    TimeNanos,

    // Fixed-length byte array
    FixedLenByteArray(i32),
}

/// Represents how values are repeated in Parquet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repetition {
    /// Field must have exactly one value
    Required,
    /// Field can have 0 or 1 value
    Optional,
    /// Field can have 0 or more values
    Repeated,
}

impl Repetition {
    pub fn from_thrift(code: i32) -> Result<Self> {
        match code {
            0 => Ok(Repetition::Required),
            1 => Ok(Repetition::Optional),
            2 => Ok(Repetition::Repeated),
            other => Err(ParquetError::schema(format!(
                "Unknown repetition type {}",
                other
            ))),
        }
    }

    pub fn to_thrift(self) -> i32 {
        match self {
            Repetition::Required => 0,
            Repetition::Optional => 1,
            Repetition::Repeated => 2,
        }
    }
}

impl SchemaNode {
    /// Get the name of this schema node
    pub fn name(&self) -> &str {
        match self {
            SchemaNode::Struct { name, .. } => name,
            SchemaNode::List { name, .. } => name,
            SchemaNode::Map { name, .. } => name,
            SchemaNode::Primitive { name, .. } => name,
        }
    }

    /// Check if this node is nullable
    pub fn is_nullable(&self) -> bool {
        match self {
            SchemaNode::Struct { nullable, .. } => *nullable,
            SchemaNode::List { nullable, .. } => *nullable,
            SchemaNode::Map { nullable, .. } => *nullable,
            SchemaNode::Primitive { nullable, .. } => *nullable,
        }
    }

    /// Get the repetition level based on nullability
    pub fn repetition(&self) -> Repetition {
        if self.is_nullable() {
            Repetition::Optional
        } else {
            Repetition::Required
        }
    }

    /// Number of leaf columns below (and including) this node
    pub fn leaf_count(&self) -> usize {
        match self {
            SchemaNode::Struct { fields, .. } => fields.iter().map(SchemaNode::leaf_count).sum(),
            SchemaNode::List { item, .. } => item.leaf_count(),
            SchemaNode::Map { key, value, .. } => key.leaf_count() + value.leaf_count(),
            SchemaNode::Primitive { .. } => 1,
        }
    }

    fn validate(&self, path: &str) -> Result<()> {
        match self {
            SchemaNode::Struct { fields, .. } => {
                if fields.is_empty() {
                    return Err(ParquetError::schema(format!(
                        "Struct '{}' must have at least one field",
                        path
                    )));
                }
                let mut seen = std::collections::HashSet::new();
                for field in fields {
                    if !seen.insert(field.name()) {
                        return Err(ParquetError::schema(format!(
                            "Duplicate field '{}' in '{}'",
                            field.name(),
                            path
                        )));
                    }
                    field.validate(&child_path(path, field.name()))?;
                }
                Ok(())
            }
            SchemaNode::List { item, .. } => item.validate(&child_path(path, item.name())),
            SchemaNode::Map { key, value, .. } => {
                if key.is_nullable() {
                    return Err(ParquetError::schema(format!(
                        "Map '{}' has a nullable key; map keys must be required",
                        path
                    )));
                }
                key.validate(&child_path(path, key.name()))?;
                value.validate(&child_path(path, value.name()))
            }
            SchemaNode::Primitive { primitive_type, .. } => primitive_type
                .validate()
                .map_err(|msg| ParquetError::schema(format!("Field '{}': {}", path, msg))),
        }
    }
}

fn child_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

impl PrimitiveType {
    /// Get the logical type name for display
    pub fn type_name(&self) -> &'static str {
        match self {
            PrimitiveType::Int8 => "Int8",
            PrimitiveType::Int16 => "Int16",
            PrimitiveType::Int32 => "Int32",
            PrimitiveType::Int64 => "Int64",
            PrimitiveType::UInt8 => "UInt8",
            PrimitiveType::UInt16 => "UInt16",
            PrimitiveType::UInt32 => "UInt32",
            PrimitiveType::UInt64 => "UInt64",
            PrimitiveType::Float32 => "Float32",
            PrimitiveType::Float64 => "Float64",
            PrimitiveType::Decimal128(_, _) => "Decimal128",
            PrimitiveType::Decimal256(_, _) => "Decimal256",
            PrimitiveType::Boolean => "Boolean",
            PrimitiveType::String => "String",
            PrimitiveType::Binary => "Binary",
            PrimitiveType::Date32 => "Date32",
            PrimitiveType::TimestampMillis(_) => "TimestampMillis",
            PrimitiveType::TimestampMicros(_) => "TimestampMicros",
            PrimitiveType::TimestampNanos(_) => "TimestampNanos",
            PrimitiveType::TimeMillis => "TimeMillis",
            PrimitiveType::TimeMicros => "TimeMicros",
            PrimitiveType::TimeNanos => "TimeNanos",
            PrimitiveType::FixedLenByteArray(_) => "FixedLenByteArray",
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        match self {
            PrimitiveType::Decimal128(precision, scale) => {
                check_decimal(*precision, *scale, 38, "Decimal128")
            }
            PrimitiveType::Decimal256(precision, scale) => {
                check_decimal(*precision, *scale, 76, "Decimal256")
            }
            PrimitiveType::FixedLenByteArray(len) if *len <= 0 => Err(format!(
                "fixed length byte array length must be positive, got {}",
                len
            )),
            _ => Ok(()),
        }
    }
}

fn check_decimal(precision: u8, scale: i8, max: u8, name: &str) -> std::result::Result<(), String> {
    if precision == 0 || precision > max {
        return Err(format!(
            "{} precision must be between 1 and {}, got {}",
            name, max, precision
        ));
    }
    if scale < 0 || scale as u8 > precision {
        return Err(format!(
            "{} scale {} must be between 0 and the precision {}",
            name, scale, precision
        ));
    }
    Ok(())
}

impl Schema {
    /// Top-level fields, in column order.
    pub fn fields(&self) -> &[SchemaNode] {
        match &self.root {
            SchemaNode::Struct { fields, .. } => fields,
            _ => &[],
        }
    }

    /// Check the structural rules every writable schema must satisfy.
    pub fn validate(&self) -> Result<()> {
        match &self.root {
            SchemaNode::Struct { .. } => self.root.validate(""),
            other => Err(ParquetError::schema(format!(
                "Schema root must be a struct, got {} '{}'",
                node_kind(other),
                other.name()
            ))),
        }
    }
}

pub(crate) fn node_kind(node: &SchemaNode) -> &'static str {
    match node {
        SchemaNode::Struct { .. } => "struct",
        SchemaNode::List { .. } => "list",
        SchemaNode::Map { .. } => "map",
        SchemaNode::Primitive { .. } => "primitive",
    }
}

/// Builder for creating schemas
pub struct SchemaBuilder {
    root: Option<SchemaNode>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self { root: None }
    }

    pub fn with_root(mut self, root: SchemaNode) -> Self {
        self.root = Some(root);
        self
    }

    pub fn build(self) -> Result<Schema> {
        let root = self
            .root
            .ok_or_else(|| ParquetError::schema("Schema must have a root node"))?;
        let schema = Schema { root };
        schema.validate()?;
        Ok(schema)
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primitive(name: &str, primitive_type: PrimitiveType, nullable: bool) -> SchemaNode {
        SchemaNode::Primitive {
            name: name.to_string(),
            primitive_type,
            nullable,
            format: None,
        }
    }

    #[test]
    fn test_schema_creation() {
        let schema = SchemaBuilder::new()
            .with_root(SchemaNode::Struct {
                name: "root".to_string(),
                nullable: false,
                fields: vec![
                    primitive("id", PrimitiveType::Int64, false),
                    primitive("name", PrimitiveType::String, true),
                ],
            })
            .build()
            .unwrap();

        assert_eq!(schema.root.name(), "root");
        assert!(!schema.root.is_nullable());
        assert_eq!(schema.fields().len(), 2);
        assert_eq!(schema.root.leaf_count(), 2);
    }

    #[test]
    fn test_root_must_be_struct() {
        let err = SchemaBuilder::new()
            .with_root(primitive("id", PrimitiveType::Int64, false))
            .build()
            .unwrap_err();
        assert!(matches!(err, ParquetError::Schema(_)));

        assert!(SchemaBuilder::new().build().is_err());
    }

    #[test]
    fn test_empty_struct_rejected() {
        let err = SchemaBuilder::new()
            .with_root(SchemaNode::Struct {
                name: "root".to_string(),
                nullable: false,
                fields: vec![SchemaNode::Struct {
                    name: "empty".to_string(),
                    nullable: true,
                    fields: vec![],
                }],
            })
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_nullable_map_key_rejected() {
        let err = SchemaBuilder::new()
            .with_root(SchemaNode::Struct {
                name: "root".to_string(),
                nullable: false,
                fields: vec![SchemaNode::Map {
                    name: "tags".to_string(),
                    nullable: true,
                    key: Box::new(primitive("key", PrimitiveType::String, true)),
                    value: Box::new(primitive("value", PrimitiveType::String, true)),
                }],
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, ParquetError::Schema(_)));
        assert!(err.to_string().contains("tags"));
    }

    #[test]
    fn test_decimal_precision_checked() {
        for bad in [
            PrimitiveType::Decimal128(0, 0),
            PrimitiveType::Decimal128(39, 2),
            PrimitiveType::Decimal128(5, 6),
            PrimitiveType::Decimal256(77, 0),
        ] {
            let result = SchemaBuilder::new()
                .with_root(SchemaNode::Struct {
                    name: "root".to_string(),
                    nullable: false,
                    fields: vec![primitive("amount", bad.clone(), true)],
                })
                .build();
            assert!(result.is_err(), "{:?} should be rejected", bad);
        }
    }

    #[test]
    fn test_duplicate_field_names_rejected() {
        let result = SchemaBuilder::new()
            .with_root(SchemaNode::Struct {
                name: "root".to_string(),
                nullable: false,
                fields: vec![
                    primitive("a", PrimitiveType::Int32, true),
                    primitive("a", PrimitiveType::Int64, true),
                ],
            })
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_nested_schema() {
        let list_node = SchemaNode::List {
            name: "items".to_string(),
            nullable: true,
            item: Box::new(primitive("item", PrimitiveType::String, false)),
        };

        assert_eq!(list_node.name(), "items");
        assert!(list_node.is_nullable());
        assert_eq!(list_node.repetition(), Repetition::Optional);
    }

    #[test]
    fn test_map_schema() {
        let map_node = SchemaNode::Map {
            name: "metadata".to_string(),
            nullable: false,
            key: Box::new(primitive("key", PrimitiveType::String, false)),
            value: Box::new(primitive("value", PrimitiveType::String, true)),
        };

        assert_eq!(map_node.name(), "metadata");
        assert!(!map_node.is_nullable());
        assert_eq!(map_node.repetition(), Repetition::Required);
        assert_eq!(map_node.leaf_count(), 2);
    }

    #[test]
    fn test_repetition_codes() {
        for rep in [Repetition::Required, Repetition::Optional, Repetition::Repeated] {
            assert_eq!(Repetition::from_thrift(rep.to_thrift()).unwrap(), rep);
        }
        assert!(Repetition::from_thrift(3).is_err());
    }
}
