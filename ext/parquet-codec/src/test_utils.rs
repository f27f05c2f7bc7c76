//! Test utilities for parquet-codec

#[cfg(test)]
pub mod test {
    use crate::{ParquetValue, PrimitiveType, Reader, Schema, SchemaBuilder, SchemaNode, Writer};
    use bytes::Bytes;
    use indexmap::IndexMap;
    use ordered_float::OrderedFloat;
    use std::sync::Arc;

    pub fn primitive(name: &str, primitive_type: PrimitiveType, nullable: bool) -> SchemaNode {
        SchemaNode::Primitive {
            name: name.to_string(),
            primitive_type,
            nullable,
            format: None,
        }
    }

    pub fn list(name: &str, nullable: bool, item: SchemaNode) -> SchemaNode {
        SchemaNode::List {
            name: name.to_string(),
            nullable,
            item: Box::new(item),
        }
    }

    pub fn map(name: &str, nullable: bool, key: SchemaNode, value: SchemaNode) -> SchemaNode {
        SchemaNode::Map {
            name: name.to_string(),
            nullable,
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn struct_node(name: &str, nullable: bool, fields: Vec<SchemaNode>) -> SchemaNode {
        SchemaNode::Struct {
            name: name.to_string(),
            nullable,
            fields,
        }
    }

    /// Schema with the given top-level fields under a required root.
    pub fn schema(fields: Vec<SchemaNode>) -> Schema {
        SchemaBuilder::new()
            .with_root(struct_node("root", false, fields))
            .build()
            .unwrap()
    }

    pub fn string(s: &str) -> ParquetValue {
        ParquetValue::String(Arc::from(s))
    }

    pub fn record(fields: &[(&str, ParquetValue)]) -> ParquetValue {
        ParquetValue::Record(
            fields
                .iter()
                .map(|(k, v)| (Arc::from(*k), v.clone()))
                .collect::<IndexMap<_, _>>(),
        )
    }

    /// Create a simple schema for testing
    pub fn sample_schema() -> Schema {
        schema(vec![
            primitive("id", PrimitiveType::Int64, false),
            primitive("name", PrimitiveType::String, true),
            primitive("age", PrimitiveType::Int32, true),
            primitive("salary", PrimitiveType::Float64, true),
        ])
    }

    /// Create multiple sample rows
    pub fn sample_rows(count: usize) -> Vec<Vec<ParquetValue>> {
        (0..count)
            .map(|i| {
                vec![
                    ParquetValue::Int64(i as i64),
                    if i % 7 == 3 {
                        ParquetValue::Null
                    } else {
                        ParquetValue::String(Arc::from(format!("Person{}", i)))
                    },
                    ParquetValue::Int32((20 + i % 50) as i32),
                    ParquetValue::Float64(OrderedFloat(50000.0 + (i as f64 * 1000.0))),
                ]
            })
            .collect()
    }

    /// Schema mixing structs, lists and maps
    pub fn complex_schema() -> Schema {
        schema(vec![
            primitive("id", PrimitiveType::Int64, false),
            struct_node(
                "person",
                true,
                vec![
                    primitive("name", PrimitiveType::String, false),
                    primitive("age", PrimitiveType::Int32, true),
                ],
            ),
            list("scores", true, primitive("element", PrimitiveType::Float32, false)),
            map(
                "tags",
                true,
                primitive("key", PrimitiveType::String, false),
                primitive("value", PrimitiveType::String, true),
            ),
        ])
    }

    pub fn complex_rows(count: usize) -> Vec<Vec<ParquetValue>> {
        (0..count)
            .map(|i| {
                let person = match i % 3 {
                    0 => ParquetValue::Null,
                    1 => record(&[("name", string(&format!("p{}", i))), ("age", ParquetValue::Null)]),
                    _ => record(&[
                        ("name", string(&format!("p{}", i))),
                        ("age", ParquetValue::Int32(i as i32)),
                    ]),
                };
                let scores = match i % 4 {
                    0 => ParquetValue::Null,
                    1 => ParquetValue::List(vec![]),
                    _ => ParquetValue::List(
                        (0..i % 5)
                            .map(|j| ParquetValue::Float32(OrderedFloat(j as f32 + 0.5)))
                            .collect(),
                    ),
                };
                let tags = match i % 5 {
                    0 => ParquetValue::Null,
                    1 => ParquetValue::Map(vec![]),
                    _ => ParquetValue::Map(vec![
                        (string("k1"), string(&format!("v{}", i))),
                        (string("k2"), ParquetValue::Null),
                    ]),
                };
                vec![ParquetValue::Int64(i as i64), person, scores, tags]
            })
            .collect()
    }

    /// Write `rows` with default settings and return the file bytes.
    pub fn write_to_bytes(schema: Schema, rows: Vec<Vec<ParquetValue>>) -> Bytes {
        let mut buf = Vec::new();
        let mut writer = Writer::new(&mut buf, schema).unwrap();
        writer.write_rows(rows).unwrap();
        writer.close().unwrap();
        Bytes::from(buf)
    }

    /// Write then read back every row.
    pub fn roundtrip(schema: Schema, rows: Vec<Vec<ParquetValue>>) -> Vec<Vec<ParquetValue>> {
        let bytes = write_to_bytes(schema, rows);
        Reader::try_new(bytes)
            .unwrap()
            .read_rows()
            .unwrap()
            .map(|row| row.map(|r| r.into_values()))
            .collect::<crate::Result<Vec<_>>>()
            .unwrap()
    }
}

#[cfg(test)]
mod test_utils_tests {
    use super::test::*;

    #[test]
    fn test_sample_schema() {
        let schema = sample_schema();
        assert_eq!(schema.root.name(), "root");
        let names: Vec<_> = schema.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["id", "name", "age", "salary"]);
    }

    #[test]
    fn test_complex_rows_shape() {
        let rows = complex_rows(10);
        assert_eq!(rows.len(), 10);
        assert!(rows.iter().all(|r| r.len() == complex_schema().fields().len()));
    }
}
