//! Mapping between the nested logical schema and the flat physical schema.
//!
//! [`SchemaDescriptor::flatten`] walks a [`Schema`] depth first and produces
//! the physical schema element list plus one [`ColumnDescriptor`] per leaf.
//! [`SchemaDescriptor::from_elements`] goes the other way for files being
//! read, accepting the legacy list layouts older writers produced.

use std::ops::Range;
use std::sync::Arc;

use crate::error::{ParquetError, Result};
use crate::format::{LogicalType, SchemaElement, TimeUnit};
use crate::schema::{PrimitiveType, Repetition, Schema, SchemaNode};
use crate::types::{ConvertedType, PhysicalType};

/// Name of the repeated group inside a LIST-annotated group.
const LIST_GROUP_NAME: &str = "list";
/// Name of the repeated group inside a MAP-annotated group.
const MAP_GROUP_NAME: &str = "key_value";

/// A leaf column of the flattened schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    /// Physical path from the first top-level field down to the leaf
    pub path: Vec<String>,
    pub primitive_type: PrimitiveType,
    pub physical_type: PhysicalType,
    pub max_def_level: i16,
    pub max_rep_level: i16,
}

impl ColumnDescriptor {
    pub fn path_string(&self) -> String {
        self.path.join(".")
    }

    pub fn type_length(&self) -> Option<i32> {
        self.physical_type.type_length()
    }
}

/// The logical schema together with its physical flattening.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDescriptor {
    schema: Schema,
    elements: Vec<SchemaElement>,
    leaves: Vec<Arc<ColumnDescriptor>>,
    /// Leaf index range of each top-level field
    field_leaves: Vec<Range<usize>>,
}

impl SchemaDescriptor {
    /// Flatten a logical schema for writing.
    pub fn flatten(schema: &Schema) -> Result<Self> {
        schema.validate()?;
        let fields = schema.fields();

        let mut elements = vec![SchemaElement {
            name: schema.root.name().to_string(),
            num_children: Some(fields.len() as i32),
            ..Default::default()
        }];
        let mut leaves = Vec::new();
        let mut path = Vec::new();
        for field in fields {
            flatten_node(field, 0, 0, &mut path, &mut elements, &mut leaves)?;
        }

        Ok(Self::assemble(schema.clone(), elements, leaves))
    }

    /// Rebuild the logical schema from a physical element list.
    pub fn from_elements(elements: Vec<SchemaElement>) -> Result<Self> {
        let tree = parse_tree(&elements)?;
        let root_name = tree.element.name.clone();
        if tree.element.physical_type.is_some() {
            return Err(ParquetError::schema(format!(
                "Schema root '{}' must be a group",
                root_name
            )));
        }

        let fields = tree
            .children
            .iter()
            .map(convert_field)
            .collect::<Result<Vec<_>>>()?;
        let schema = Schema {
            root: SchemaNode::Struct {
                name: root_name,
                nullable: false,
                fields,
            },
        };
        if schema.fields().is_empty() {
            return Err(ParquetError::schema("Schema root has no fields"));
        }

        let mut physical = Vec::new();
        let mut path = Vec::new();
        for child in &tree.children {
            collect_physical_leaves(child, 0, 0, &mut path, &mut physical)?;
        }

        let mut logical = Vec::new();
        for field in schema.fields() {
            collect_logical_leaves(field, &mut logical);
        }
        if logical.len() != physical.len() {
            return Err(ParquetError::internal(format!(
                "Schema has {} logical leaves but {} physical columns",
                logical.len(),
                physical.len()
            )));
        }

        let leaves = physical
            .into_iter()
            .zip(logical)
            .map(|((path, physical_type, max_def_level, max_rep_level), primitive_type)| {
                ColumnDescriptor {
                    path,
                    primitive_type,
                    physical_type,
                    max_def_level,
                    max_rep_level,
                }
            })
            .collect();

        Ok(Self::assemble(schema, elements, leaves))
    }

    fn assemble(schema: Schema, elements: Vec<SchemaElement>, leaves: Vec<ColumnDescriptor>) -> Self {
        let mut field_leaves = Vec::new();
        let mut start = 0;
        for field in schema.fields() {
            let end = start + field.leaf_count();
            field_leaves.push(start..end);
            start = end;
        }
        Self {
            schema,
            elements,
            leaves: leaves.into_iter().map(Arc::new).collect(),
            field_leaves,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn elements(&self) -> &[SchemaElement] {
        &self.elements
    }

    pub fn leaves(&self) -> &[Arc<ColumnDescriptor>] {
        &self.leaves
    }

    pub fn num_columns(&self) -> usize {
        self.leaves.len()
    }

    pub fn column(&self, idx: usize) -> &Arc<ColumnDescriptor> {
        &self.leaves[idx]
    }

    /// Leaf index range covered by the top-level field at `field_idx`.
    pub fn field_leaf_range(&self, field_idx: usize) -> Range<usize> {
        self.field_leaves[field_idx].clone()
    }

    /// Index of the top-level field with the given name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.schema.fields().iter().position(|f| f.name() == name)
    }
}

fn flatten_node(
    node: &SchemaNode,
    def: i16,
    rep: i16,
    path: &mut Vec<String>,
    elements: &mut Vec<SchemaElement>,
    leaves: &mut Vec<ColumnDescriptor>,
) -> Result<()> {
    let def = def + node.is_nullable() as i16;
    let repetition = Some(node.repetition().to_thrift());
    path.push(node.name().to_string());

    match node {
        SchemaNode::Primitive {
            name,
            primitive_type,
            ..
        } => {
            let mut element = primitive_element(name, primitive_type);
            element.repetition_type = repetition;
            elements.push(element);
            leaves.push(ColumnDescriptor {
                path: path.clone(),
                primitive_type: primitive_type.clone(),
                physical_type: physical_type_of(primitive_type),
                max_def_level: def,
                max_rep_level: rep,
            });
        }
        SchemaNode::Struct { name, fields, .. } => {
            elements.push(SchemaElement {
                name: name.clone(),
                repetition_type: repetition,
                num_children: Some(fields.len() as i32),
                ..Default::default()
            });
            for field in fields {
                flatten_node(field, def, rep, path, elements, leaves)?;
            }
        }
        SchemaNode::List { name, item, .. } => {
            elements.push(SchemaElement {
                name: name.clone(),
                repetition_type: repetition,
                num_children: Some(1),
                converted_type: Some(ConvertedType::List.to_thrift()),
                logical_type: Some(LogicalType::List),
                ..Default::default()
            });
            elements.push(repeated_group(LIST_GROUP_NAME, 1));
            path.push(LIST_GROUP_NAME.to_string());
            flatten_node(item, def + 1, rep + 1, path, elements, leaves)?;
            path.pop();
        }
        SchemaNode::Map {
            name, key, value, ..
        } => {
            elements.push(SchemaElement {
                name: name.clone(),
                repetition_type: repetition,
                num_children: Some(1),
                converted_type: Some(ConvertedType::Map.to_thrift()),
                logical_type: Some(LogicalType::Map),
                ..Default::default()
            });
            elements.push(repeated_group(MAP_GROUP_NAME, 2));
            path.push(MAP_GROUP_NAME.to_string());
            flatten_node(key, def + 1, rep + 1, path, elements, leaves)?;
            flatten_node(value, def + 1, rep + 1, path, elements, leaves)?;
            path.pop();
        }
    }

    path.pop();
    Ok(())
}

fn repeated_group(name: &str, num_children: i32) -> SchemaElement {
    SchemaElement {
        name: name.to_string(),
        repetition_type: Some(Repetition::Repeated.to_thrift()),
        num_children: Some(num_children),
        ..Default::default()
    }
}

/// Physical storage type used when writing a primitive.
pub fn physical_type_of(primitive_type: &PrimitiveType) -> PhysicalType {
    match primitive_type {
        PrimitiveType::Boolean => PhysicalType::Boolean,
        PrimitiveType::Int8
        | PrimitiveType::Int16
        | PrimitiveType::Int32
        | PrimitiveType::UInt8
        | PrimitiveType::UInt16
        | PrimitiveType::UInt32
        | PrimitiveType::Date32
        | PrimitiveType::TimeMillis => PhysicalType::Int32,
        PrimitiveType::Int64
        | PrimitiveType::UInt64
        | PrimitiveType::TimeMicros
        | PrimitiveType::TimeNanos
        | PrimitiveType::TimestampMillis(_)
        | PrimitiveType::TimestampMicros(_)
        | PrimitiveType::TimestampNanos(_) => PhysicalType::Int64,
        PrimitiveType::Float32 => PhysicalType::Float,
        PrimitiveType::Float64 => PhysicalType::Double,
        PrimitiveType::Decimal128(precision, _) if *precision <= 9 => PhysicalType::Int32,
        PrimitiveType::Decimal128(precision, _) if *precision <= 18 => PhysicalType::Int64,
        PrimitiveType::Decimal128(_, _) => PhysicalType::FixedLenByteArray(16),
        PrimitiveType::Decimal256(_, _) => PhysicalType::FixedLenByteArray(32),
        PrimitiveType::String | PrimitiveType::Binary => PhysicalType::ByteArray,
        PrimitiveType::FixedLenByteArray(len) => PhysicalType::FixedLenByteArray(*len as usize),
    }
}

fn integer(bit_width: i8, is_signed: bool) -> Option<LogicalType> {
    Some(LogicalType::Integer {
        bit_width,
        is_signed,
    })
}

fn primitive_element(name: &str, primitive_type: &PrimitiveType) -> SchemaElement {
    let physical = physical_type_of(primitive_type);
    let mut element = SchemaElement {
        name: name.to_string(),
        physical_type: Some(physical.to_thrift()),
        type_length: physical.type_length(),
        ..Default::default()
    };

    let (converted, logical) = match primitive_type {
        PrimitiveType::Int8 => (Some(ConvertedType::Int8), integer(8, true)),
        PrimitiveType::Int16 => (Some(ConvertedType::Int16), integer(16, true)),
        PrimitiveType::UInt8 => (Some(ConvertedType::Uint8), integer(8, false)),
        PrimitiveType::UInt16 => (Some(ConvertedType::Uint16), integer(16, false)),
        PrimitiveType::UInt32 => (Some(ConvertedType::Uint32), integer(32, false)),
        PrimitiveType::UInt64 => (Some(ConvertedType::Uint64), integer(64, false)),
        PrimitiveType::String => (Some(ConvertedType::Utf8), Some(LogicalType::String)),
        PrimitiveType::Date32 => (Some(ConvertedType::Date), Some(LogicalType::Date)),
        PrimitiveType::Decimal128(precision, scale) | PrimitiveType::Decimal256(precision, scale) => {
            element.precision = Some(*precision as i32);
            element.scale = Some(*scale as i32);
            (
                Some(ConvertedType::Decimal),
                Some(LogicalType::Decimal {
                    scale: *scale as i32,
                    precision: *precision as i32,
                }),
            )
        }
        PrimitiveType::TimeMillis => (Some(ConvertedType::TimeMillis), time(TimeUnit::Millis)),
        PrimitiveType::TimeMicros => (Some(ConvertedType::TimeMicros), time(TimeUnit::Micros)),
        PrimitiveType::TimeNanos => (None, time(TimeUnit::Nanos)),
        PrimitiveType::TimestampMillis(tz) => timestamp(TimeUnit::Millis, tz.is_some()),
        PrimitiveType::TimestampMicros(tz) => timestamp(TimeUnit::Micros, tz.is_some()),
        PrimitiveType::TimestampNanos(tz) => timestamp(TimeUnit::Nanos, tz.is_some()),
        PrimitiveType::Boolean
        | PrimitiveType::Int32
        | PrimitiveType::Int64
        | PrimitiveType::Float32
        | PrimitiveType::Float64
        | PrimitiveType::Binary
        | PrimitiveType::FixedLenByteArray(_) => (None, None),
    };

    element.converted_type = converted.map(ConvertedType::to_thrift);
    element.logical_type = logical;
    element
}

fn time(unit: TimeUnit) -> Option<LogicalType> {
    Some(LogicalType::Time {
        is_adjusted_to_utc: true,
        unit,
    })
}

fn timestamp(unit: TimeUnit, is_adjusted_to_utc: bool) -> (Option<ConvertedType>, Option<LogicalType>) {
    // Converted timestamp types imply UTC adjustment, so only adjusted columns get one.
    let converted = match (unit, is_adjusted_to_utc) {
        (TimeUnit::Millis, true) => Some(ConvertedType::TimestampMillis),
        (TimeUnit::Micros, true) => Some(ConvertedType::TimestampMicros),
        _ => None,
    };
    (
        converted,
        Some(LogicalType::Timestamp {
            is_adjusted_to_utc,
            unit,
        }),
    )
}

/// Physical schema element with its parsed children.
struct ElementTree<'a> {
    element: &'a SchemaElement,
    children: Vec<ElementTree<'a>>,
}

impl ElementTree<'_> {
    fn is_group(&self) -> bool {
        self.element.physical_type.is_none()
    }

    fn repetition(&self) -> Result<Repetition> {
        self.element
            .repetition_type
            .map(Repetition::from_thrift)
            .unwrap_or(Ok(Repetition::Required))
    }

    fn name(&self) -> &str {
        &self.element.name
    }
}

fn parse_tree(elements: &[SchemaElement]) -> Result<ElementTree<'_>> {
    if elements.is_empty() {
        return Err(ParquetError::schema("Schema has no elements"));
    }
    let mut pos = 0;
    let tree = parse_subtree(elements, &mut pos)?;
    if pos != elements.len() {
        return Err(ParquetError::schema(format!(
            "Schema declares {} elements but the tree only uses {}",
            elements.len(),
            pos
        )));
    }
    Ok(tree)
}

fn parse_subtree<'a>(elements: &'a [SchemaElement], pos: &mut usize) -> Result<ElementTree<'a>> {
    let element = elements.get(*pos).ok_or_else(|| {
        ParquetError::schema(format!(
            "Schema element list ended early; expected element {} of {}",
            *pos + 1,
            elements.len()
        ))
    })?;
    *pos += 1;

    let mut children = Vec::new();
    match (element.physical_type, element.num_children) {
        (Some(_), _) => {}
        (None, Some(n)) if n >= 0 => {
            for _ in 0..n {
                children.push(parse_subtree(elements, pos)?);
            }
        }
        (None, _) => {
            return Err(ParquetError::schema(format!(
                "Element '{}' has neither a physical type nor children",
                element.name
            )))
        }
    }

    Ok(ElementTree { element, children })
}

fn has_list_annotation(element: &SchemaElement) -> bool {
    matches!(element.logical_type, Some(LogicalType::List))
        || element.converted_type.and_then(ConvertedType::from_thrift) == Some(ConvertedType::List)
}

fn has_map_annotation(element: &SchemaElement) -> bool {
    matches!(element.logical_type, Some(LogicalType::Map))
        || matches!(
            element.converted_type.and_then(ConvertedType::from_thrift),
            Some(ConvertedType::Map) | Some(ConvertedType::MapKeyValue)
        )
}

fn convert_field(tree: &ElementTree<'_>) -> Result<SchemaNode> {
    let repetition = tree.repetition()?;
    if repetition == Repetition::Repeated {
        // A bare repeated field is a required list of required elements.
        return Ok(SchemaNode::List {
            name: tree.name().to_string(),
            nullable: false,
            item: Box::new(convert_required(tree)?),
        });
    }
    convert_with_nullability(tree, repetition == Repetition::Optional)
}

/// Convert a node as if it were declared required, keeping its name.
fn convert_required(tree: &ElementTree<'_>) -> Result<SchemaNode> {
    convert_with_nullability(tree, false)
}

fn convert_with_nullability(tree: &ElementTree<'_>, nullable: bool) -> Result<SchemaNode> {
    let name = tree.name().to_string();
    if !tree.is_group() {
        return Ok(SchemaNode::Primitive {
            name,
            primitive_type: primitive_type_of(tree.element)?,
            nullable,
            format: None,
        });
    }

    if has_list_annotation(tree.element) {
        let repeated = match tree.children.as_slice() {
            [child] if child.repetition()? == Repetition::Repeated => child,
            _ => {
                return Err(ParquetError::schema(format!(
                    "LIST group '{}' must have exactly one repeated child",
                    name
                )))
            }
        };
        let item = list_element(&name, repeated)?;
        return Ok(SchemaNode::List {
            name,
            nullable,
            item: Box::new(item),
        });
    }

    if has_map_annotation(tree.element) {
        let entries = match tree.children.as_slice() {
            [child] if child.repetition()? == Repetition::Repeated && child.is_group() => child,
            _ => {
                return Err(ParquetError::schema(format!(
                    "MAP group '{}' must have exactly one repeated group child",
                    name
                )))
            }
        };
        let (key, value) = match entries.children.as_slice() {
            [key, value] => (key, value),
            _ => {
                return Err(ParquetError::schema(format!(
                    "MAP group '{}' must have exactly one key and one value, found {} fields",
                    name,
                    entries.children.len()
                )))
            }
        };
        let key = convert_field(key)?;
        if key.is_nullable() {
            return Err(ParquetError::schema(format!(
                "MAP group '{}' has a nullable key",
                name
            )));
        }
        return Ok(SchemaNode::Map {
            name,
            nullable,
            key: Box::new(key),
            value: Box::new(convert_field(value)?),
        });
    }

    if tree.children.is_empty() {
        return Err(ParquetError::schema(format!("Group '{}' has no fields", name)));
    }
    Ok(SchemaNode::Struct {
        name,
        nullable,
        fields: tree
            .children
            .iter()
            .map(convert_field)
            .collect::<Result<Vec<_>>>()?,
    })
}

/// Resolve the element node of a LIST group given its repeated child.
fn list_element(list_name: &str, repeated: &ElementTree<'_>) -> Result<SchemaNode> {
    if !repeated.is_group() {
        // Two-level list: the repeated primitive is the element.
        return convert_required(repeated);
    }
    let legacy_name = repeated.name() == "array" || repeated.name() == format!("{}_tuple", list_name);
    if repeated.children.len() > 1 || legacy_name {
        // The repeated group itself is the element struct.
        return convert_required(repeated);
    }
    match repeated.children.as_slice() {
        [element] => convert_field(element),
        _ => Err(ParquetError::schema(format!(
            "LIST group '{}' has an empty repeated group",
            list_name
        ))),
    }
}

fn primitive_type_of(element: &SchemaElement) -> Result<PrimitiveType> {
    let code = element.physical_type.ok_or_else(|| {
        ParquetError::schema(format!("Element '{}' has no physical type", element.name))
    })?;
    let physical = PhysicalType::from_thrift(code, element.type_length)?;

    let primitive = match element.logical_type {
        Some(logical) if logical != LogicalType::Unknown => from_logical(element, physical, logical)?,
        _ => match element.converted_type.and_then(ConvertedType::from_thrift) {
            Some(converted) => from_converted(element, physical, converted)?,
            None => from_physical(physical),
        },
    };

    if !is_compatible(&primitive, physical) {
        return Err(ParquetError::schema(format!(
            "Element '{}' annotated as {} cannot be stored as {:?}",
            element.name,
            primitive.type_name(),
            physical
        )));
    }
    Ok(primitive)
}

fn from_physical(physical: PhysicalType) -> PrimitiveType {
    match physical {
        PhysicalType::Boolean => PrimitiveType::Boolean,
        PhysicalType::Int32 => PrimitiveType::Int32,
        PhysicalType::Int64 => PrimitiveType::Int64,
        PhysicalType::Int96 => PrimitiveType::TimestampNanos(None),
        PhysicalType::Float => PrimitiveType::Float32,
        PhysicalType::Double => PrimitiveType::Float64,
        PhysicalType::ByteArray => PrimitiveType::Binary,
        PhysicalType::FixedLenByteArray(len) => PrimitiveType::FixedLenByteArray(len as i32),
    }
}

fn utc(adjusted: bool) -> Option<Arc<str>> {
    adjusted.then(|| Arc::from("UTC"))
}

fn from_logical(element: &SchemaElement, physical: PhysicalType, logical: LogicalType) -> Result<PrimitiveType> {
    Ok(match logical {
        LogicalType::String | LogicalType::Enum | LogicalType::Json => PrimitiveType::String,
        LogicalType::Bson => PrimitiveType::Binary,
        LogicalType::Decimal { scale, precision } => decimal_type(element, physical, precision, scale)?,
        LogicalType::Date => PrimitiveType::Date32,
        LogicalType::Time { unit, .. } => match unit {
            TimeUnit::Millis => PrimitiveType::TimeMillis,
            TimeUnit::Micros => PrimitiveType::TimeMicros,
            TimeUnit::Nanos => PrimitiveType::TimeNanos,
        },
        LogicalType::Timestamp {
            is_adjusted_to_utc,
            unit,
        } => match unit {
            TimeUnit::Millis => PrimitiveType::TimestampMillis(utc(is_adjusted_to_utc)),
            TimeUnit::Micros => PrimitiveType::TimestampMicros(utc(is_adjusted_to_utc)),
            TimeUnit::Nanos => PrimitiveType::TimestampNanos(utc(is_adjusted_to_utc)),
        },
        LogicalType::Integer {
            bit_width,
            is_signed,
        } => match (bit_width, is_signed) {
            (8, true) => PrimitiveType::Int8,
            (16, true) => PrimitiveType::Int16,
            (32, true) => PrimitiveType::Int32,
            (64, true) => PrimitiveType::Int64,
            (8, false) => PrimitiveType::UInt8,
            (16, false) => PrimitiveType::UInt16,
            (32, false) => PrimitiveType::UInt32,
            (64, false) => PrimitiveType::UInt64,
            _ => {
                return Err(ParquetError::schema(format!(
                    "Element '{}' has unsupported integer width {}",
                    element.name, bit_width
                )))
            }
        },
        // Annotations without a dedicated logical type fall back to the storage type.
        LogicalType::Uuid
        | LogicalType::Float16
        | LogicalType::Unknown
        | LogicalType::Map
        | LogicalType::List => from_physical(physical),
    })
}

fn from_converted(element: &SchemaElement, physical: PhysicalType, converted: ConvertedType) -> Result<PrimitiveType> {
    Ok(match converted {
        ConvertedType::Utf8 | ConvertedType::Enum | ConvertedType::Json => PrimitiveType::String,
        ConvertedType::Bson => PrimitiveType::Binary,
        ConvertedType::Decimal => {
            let precision = element.precision.ok_or_else(|| {
                ParquetError::schema(format!("Decimal '{}' is missing its precision", element.name))
            })?;
            decimal_type(element, physical, precision, element.scale.unwrap_or(0))?
        }
        ConvertedType::Date => PrimitiveType::Date32,
        ConvertedType::TimeMillis => PrimitiveType::TimeMillis,
        ConvertedType::TimeMicros => PrimitiveType::TimeMicros,
        ConvertedType::TimestampMillis => PrimitiveType::TimestampMillis(utc(true)),
        ConvertedType::TimestampMicros => PrimitiveType::TimestampMicros(utc(true)),
        ConvertedType::Uint8 => PrimitiveType::UInt8,
        ConvertedType::Uint16 => PrimitiveType::UInt16,
        ConvertedType::Uint32 => PrimitiveType::UInt32,
        ConvertedType::Uint64 => PrimitiveType::UInt64,
        ConvertedType::Int8 => PrimitiveType::Int8,
        ConvertedType::Int16 => PrimitiveType::Int16,
        ConvertedType::Int32 => PrimitiveType::Int32,
        ConvertedType::Int64 => PrimitiveType::Int64,
        ConvertedType::Interval
        | ConvertedType::Map
        | ConvertedType::MapKeyValue
        | ConvertedType::List => from_physical(physical),
    })
}

/// Largest decimal precision a fixed length byte array of `len` bytes can hold.
fn max_precision_for_bytes(len: usize) -> i32 {
    if len == 0 {
        return 0;
    }
    ((8 * len - 1) as f64 * 2f64.log10()).floor() as i32
}

fn decimal_type(element: &SchemaElement, physical: PhysicalType, precision: i32, scale: i32) -> Result<PrimitiveType> {
    let max = match physical {
        PhysicalType::Int32 => 9,
        PhysicalType::Int64 => 18,
        PhysicalType::FixedLenByteArray(len) => max_precision_for_bytes(len).min(76),
        PhysicalType::ByteArray => 76,
        other => {
            return Err(ParquetError::schema(format!(
                "Decimal '{}' cannot be stored as {:?}",
                element.name, other
            )))
        }
    };
    if precision < 1 || precision > max {
        return Err(ParquetError::schema(format!(
            "Decimal '{}' precision {} does not fit {:?} (max {})",
            element.name, precision, physical, max
        )));
    }
    if scale < 0 || scale > precision {
        return Err(ParquetError::schema(format!(
            "Decimal '{}' scale {} is outside 0..={}",
            element.name, scale, precision
        )));
    }

    let (precision, scale) = (precision as u8, scale as i8);
    Ok(match physical {
        PhysicalType::FixedLenByteArray(32) => PrimitiveType::Decimal256(precision, scale),
        _ if precision > 38 => PrimitiveType::Decimal256(precision, scale),
        _ => PrimitiveType::Decimal128(precision, scale),
    })
}

fn is_compatible(primitive: &PrimitiveType, physical: PhysicalType) -> bool {
    match primitive {
        PrimitiveType::Decimal128(_, _) | PrimitiveType::Decimal256(_, _) => matches!(
            physical,
            PhysicalType::Int32
                | PhysicalType::Int64
                | PhysicalType::FixedLenByteArray(_)
                | PhysicalType::ByteArray
        ),
        PrimitiveType::TimestampNanos(None) if physical == PhysicalType::Int96 => true,
        // Legacy writers annotate strings on fixed length arrays too.
        PrimitiveType::String | PrimitiveType::Binary => {
            matches!(physical, PhysicalType::ByteArray | PhysicalType::FixedLenByteArray(_))
        }
        other => physical_type_of(other) == physical,
    }
}

/// (path, physical type, max def, max rep) for each physical leaf, in order.
type PhysicalLeaf = (Vec<String>, PhysicalType, i16, i16);

fn collect_physical_leaves(
    tree: &ElementTree<'_>,
    def: i16,
    rep: i16,
    path: &mut Vec<String>,
    out: &mut Vec<PhysicalLeaf>,
) -> Result<()> {
    let (def, rep) = match tree.repetition()? {
        Repetition::Required => (def, rep),
        Repetition::Optional => (def + 1, rep),
        Repetition::Repeated => (def + 1, rep + 1),
    };
    path.push(tree.name().to_string());
    if tree.is_group() {
        for child in &tree.children {
            collect_physical_leaves(child, def, rep, path, out)?;
        }
    } else {
        let code = tree.element.physical_type.unwrap_or_default();
        let physical = PhysicalType::from_thrift(code, tree.element.type_length)?;
        out.push((path.clone(), physical, def, rep));
    }
    path.pop();
    Ok(())
}

fn collect_logical_leaves(node: &SchemaNode, out: &mut Vec<PrimitiveType>) {
    match node {
        SchemaNode::Primitive { primitive_type, .. } => out.push(primitive_type.clone()),
        SchemaNode::Struct { fields, .. } => {
            for field in fields {
                collect_logical_leaves(field, out);
            }
        }
        SchemaNode::List { item, .. } => collect_logical_leaves(item, out),
        SchemaNode::Map { key, value, .. } => {
            collect_logical_leaves(key, out);
            collect_logical_leaves(value, out);
        }
    }
}
