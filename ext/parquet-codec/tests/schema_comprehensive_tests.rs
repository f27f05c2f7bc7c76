use parquet_codec::traits::SchemaInspector;
use parquet_codec::*;
use std::sync::Arc;

use test_helpers::*;

// ====== Schema Builder Tests ======

#[test]
fn test_schema_builder_error_cases() {
    // Building without a root node
    let result = SchemaBuilder::new().build();
    let err = result.unwrap_err();
    assert!(matches!(err, ParquetError::Schema(_)));
    assert!(err.to_string().contains("Schema must have a root node"));

    // The root has to be a struct
    let result = SchemaBuilder::new()
        .with_root(primitive("id", PrimitiveType::Int32, false))
        .build();
    assert!(matches!(result, Err(ParquetError::Schema(_))));
}

#[test]
fn test_schema_builder_default() {
    let result1 = SchemaBuilder::new().build();
    let result2 = SchemaBuilder::default().build();
    assert_eq!(
        result1.unwrap_err().to_string(),
        result2.unwrap_err().to_string()
    );
}

#[test]
fn test_schema_equality() {
    let schema1 = schema_with(vec![
        primitive("id", PrimitiveType::Int64, false),
        primitive("name", PrimitiveType::String, true),
    ]);
    let schema2 = schema_with(vec![
        primitive("id", PrimitiveType::Int64, false),
        primitive("name", PrimitiveType::String, true),
    ]);
    assert_eq!(schema1, schema2);

    // Nullability, type and order all matter
    let variants = vec![
        schema_with(vec![
            primitive("id", PrimitiveType::Int64, true),
            primitive("name", PrimitiveType::String, true),
        ]),
        schema_with(vec![
            primitive("id", PrimitiveType::Int32, false),
            primitive("name", PrimitiveType::String, true),
        ]),
        schema_with(vec![
            primitive("name", PrimitiveType::String, true),
            primitive("id", PrimitiveType::Int64, false),
        ]),
    ];
    for variant in variants {
        assert_ne!(schema1, variant);
    }
}

#[test]
fn test_repetition_from_nullability() {
    assert_eq!(primitive("a", PrimitiveType::Int32, false).repetition(), Repetition::Required);
    assert_eq!(primitive("a", PrimitiveType::Int32, true).repetition(), Repetition::Optional);
    assert_eq!(
        list("l", true, primitive("element", PrimitiveType::Int32, false)).repetition(),
        Repetition::Optional
    );
    for repetition in [Repetition::Required, Repetition::Optional, Repetition::Repeated] {
        assert_eq!(Repetition::from_thrift(repetition.to_thrift()).unwrap(), repetition);
    }
    assert!(Repetition::from_thrift(7).is_err());
}

#[test]
fn test_primitive_type_names() {
    let names: Vec<&str> = [
        PrimitiveType::Int8,
        PrimitiveType::UInt64,
        PrimitiveType::Decimal128(10, 2),
        PrimitiveType::Decimal256(50, 2),
        PrimitiveType::TimestampNanos(None),
        PrimitiveType::FixedLenByteArray(4),
    ]
    .iter()
    .map(|t| t.type_name())
    .collect();
    assert_eq!(
        names,
        vec!["Int8", "UInt64", "Decimal128", "Decimal256", "TimestampNanos", "FixedLenByteArray"]
    );
}

#[test]
fn test_deeply_nested_schema_roundtrip() {
    // list<struct<map<string, list<int>>>>
    let schema = schema_with(vec![list(
        "outer",
        true,
        struct_node(
            "element",
            true,
            vec![
                primitive("label", PrimitiveType::String, true),
                map(
                    "groups",
                    true,
                    primitive("key", PrimitiveType::String, false),
                    list("value", true, primitive("element", PrimitiveType::Int32, true)),
                ),
            ],
        ),
    )]);

    let descr = SchemaDescriptor::flatten(&schema).unwrap();
    let rebuilt = SchemaDescriptor::from_elements(descr.elements().to_vec()).unwrap();
    assert_eq!(rebuilt.schema(), &schema);
    assert_eq!(rebuilt.leaves(), descr.leaves());

    let levels: Vec<(String, i16, i16)> = descr
        .leaves()
        .iter()
        .map(|c| (c.path_string(), c.max_def_level, c.max_rep_level))
        .collect();
    assert_eq!(
        levels,
        vec![
            ("outer.list.element.label".to_string(), 4, 1),
            ("outer.list.element.groups.key_value.key".to_string(), 5, 2),
            (
                "outer.list.element.groups.key_value.value.list.element".to_string(),
                8,
                3
            ),
        ]
    );

    let rows = vec![
        vec![ParquetValue::List(vec![
            record(&[
                ("label", string("first")),
                (
                    "groups",
                    ParquetValue::Map(vec![
                        (
                            string("a"),
                            ParquetValue::List(vec![ParquetValue::Int32(1), ParquetValue::Null]),
                        ),
                        (string("b"), ParquetValue::Null),
                        (string("c"), ParquetValue::List(vec![])),
                    ]),
                ),
            ]),
            ParquetValue::Null,
            record(&[("label", ParquetValue::Null), ("groups", ParquetValue::Map(vec![]))]),
        ])],
        vec![ParquetValue::List(vec![])],
        vec![ParquetValue::Null],
    ];
    test_roundtrip(rows, schema).unwrap();
}

#[test]
fn test_inspector_on_file_schema() {
    let schema = schema_with(vec![
        primitive("id", PrimitiveType::Int64, false),
        struct_node(
            "address",
            true,
            vec![
                primitive("city", PrimitiveType::String, true),
                primitive("zip", PrimitiveType::Int32, true),
            ],
        ),
        list("tags", true, primitive("element", PrimitiveType::String, false)),
    ]);
    let reader = Reader::try_new(write_bytes(schema, &[])).unwrap();
    let file_schema = reader.schema();

    assert_eq!(file_schema.field_count(), 7);
    assert!(file_schema.has_field("address.zip"));
    assert!(file_schema.has_field("tags.element"));
    assert!(!file_schema.has_field("tags.list"));
    assert_eq!(
        file_schema.all_field_paths(),
        vec!["id", "address", "address.city", "address.zip", "tags", "tags.element"]
    );
    assert_eq!(
        file_schema.leaf_paths().unwrap(),
        vec!["id", "address.city", "address.zip", "tags.list.element"]
    );
    assert!(matches!(
        file_schema.get_field_by_path("address.city"),
        Some(SchemaNode::Primitive { nullable: true, .. })
    ));
}

#[test]
fn test_empty_file_keeps_schema() {
    let schema = schema_with(vec![
        primitive("a", PrimitiveType::TimestampMillis(Some(Arc::from("UTC"))), true),
        map(
            "m",
            false,
            primitive("key", PrimitiveType::Int32, false),
            primitive("value", PrimitiveType::Decimal128(20, 4), true),
        ),
    ]);
    let reader = Reader::try_new(write_bytes(schema.clone(), &[])).unwrap();
    assert_eq!(reader.schema(), &schema);
    assert_eq!(reader.num_rows(), 0);
    assert_eq!(reader.read_rows().unwrap().count(), 0);
}

#[test]
fn test_all_primitive_types_in_schema() {
    let types = vec![
        PrimitiveType::Boolean,
        PrimitiveType::Int8,
        PrimitiveType::Int16,
        PrimitiveType::Int32,
        PrimitiveType::Int64,
        PrimitiveType::UInt8,
        PrimitiveType::UInt16,
        PrimitiveType::UInt32,
        PrimitiveType::UInt64,
        PrimitiveType::Float32,
        PrimitiveType::Float64,
        PrimitiveType::Decimal128(9, 2),
        PrimitiveType::Decimal128(18, 2),
        PrimitiveType::Decimal128(38, 2),
        PrimitiveType::Decimal256(76, 2),
        PrimitiveType::String,
        PrimitiveType::Binary,
        PrimitiveType::Date32,
        PrimitiveType::TimestampMillis(None),
        PrimitiveType::TimestampMicros(Some(Arc::from("UTC"))),
        PrimitiveType::TimestampNanos(None),
        PrimitiveType::TimeMillis,
        PrimitiveType::TimeMicros,
        PrimitiveType::TimeNanos,
        PrimitiveType::FixedLenByteArray(3),
    ];
    let fields: Vec<SchemaNode> = types
        .iter()
        .enumerate()
        .map(|(i, t)| primitive(&format!("field_{}", i), t.clone(), i % 2 == 0))
        .collect();
    let schema = schema_with(fields);

    // Every logical type survives the trip through the file footer
    let reader = Reader::try_new(write_bytes(schema.clone(), &[])).unwrap();
    assert_eq!(reader.schema(), &schema);
}
