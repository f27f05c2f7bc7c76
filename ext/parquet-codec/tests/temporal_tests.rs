use parquet_codec::*;
use std::sync::Arc;

use test_helpers::*;

fn utc() -> Option<Arc<str>> {
    Some(Arc::from("UTC"))
}

#[test]
fn test_dates() {
    let schema = schema_with(vec![primitive("date", PrimitiveType::Date32, true)]);
    let rows = vec![
        vec![ParquetValue::Date32(0)],
        vec![ParquetValue::Date32(-719_162)], // 0001-01-01
        vec![ParquetValue::Date32(2_932_896)], // 9999-12-31
        vec![ParquetValue::Date32(19_723)],
        vec![ParquetValue::Null],
    ];
    test_roundtrip(rows, schema).unwrap();
}

#[test]
fn test_times() {
    let schema = schema_with(vec![
        primitive("ms", PrimitiveType::TimeMillis, false),
        primitive("us", PrimitiveType::TimeMicros, false),
        primitive("ns", PrimitiveType::TimeNanos, false),
    ]);
    let day_ms = 86_400_000i64;
    let rows: Vec<Vec<ParquetValue>> = [0i64, 1, 43_200_000, day_ms - 1]
        .iter()
        .map(|&ms| {
            vec![
                ParquetValue::TimeMillis(ms as i32),
                ParquetValue::TimeMicros(ms * 1_000 + 999),
                ParquetValue::TimeNanos(ms * 1_000_000 + 999_999),
            ]
        })
        .collect();
    test_roundtrip(rows, schema).unwrap();
}

#[test]
fn test_timestamps_without_timezone() {
    let schema = schema_with(vec![
        primitive("ms", PrimitiveType::TimestampMillis(None), true),
        primitive("us", PrimitiveType::TimestampMicros(None), true),
        primitive("ns", PrimitiveType::TimestampNanos(None), true),
    ]);
    let rows: Vec<Vec<ParquetValue>> = [-86_400_000i64, 0, 1_700_000_000_123]
        .iter()
        .map(|&ms| {
            vec![
                ParquetValue::TimestampMillis(ms, None),
                ParquetValue::TimestampMicros(ms * 1_000, None),
                ParquetValue::TimestampNanos(ms * 1_000_000, None),
            ]
        })
        .chain(std::iter::once(vec![ParquetValue::Null; 3]))
        .collect();
    test_roundtrip(rows, schema).unwrap();
}

#[test]
fn test_timestamps_in_utc() {
    let schema = schema_with(vec![
        primitive("ms", PrimitiveType::TimestampMillis(utc()), false),
        primitive("us", PrimitiveType::TimestampMicros(utc()), false),
        primitive("ns", PrimitiveType::TimestampNanos(utc()), false),
    ]);
    let rows: Vec<Vec<ParquetValue>> = (0..500i64)
        .map(|i| {
            let ms = 1_600_000_000_000 + i * 3_600_000;
            vec![
                ParquetValue::TimestampMillis(ms, utc()),
                ParquetValue::TimestampMicros(ms * 1_000 + i, utc()),
                ParquetValue::TimestampNanos(ms * 1_000_000 + i, utc()),
            ]
        })
        .collect();
    test_roundtrip_with_options(rows, schema, Compression::Zstd, Some(128)).unwrap();
}

#[test]
fn test_named_timezone_reads_back_as_utc() {
    // Only UTC adjustment is stored in the file
    let schema = schema_with(vec![primitive(
        "ts",
        PrimitiveType::TimestampMicros(Some(Arc::from("America/New_York"))),
        false,
    )]);
    let rows = vec![vec![ParquetValue::TimestampMicros(
        1_700_000_000_000_000,
        Some(Arc::from("America/New_York")),
    )]];
    let reader = Reader::try_new(write_bytes(schema, &rows)).unwrap();

    assert_eq!(
        reader.schema().fields()[0],
        primitive("ts", PrimitiveType::TimestampMicros(utc()), false)
    );
    assert_eq!(
        read_all(&reader),
        vec![vec![ParquetValue::TimestampMicros(1_700_000_000_000_000, utc())]]
    );
}

#[test]
fn test_value_timezone_follows_column() {
    // The column decides the timezone of values read back
    let schema = schema_with(vec![
        primitive("local", PrimitiveType::TimestampMillis(None), false),
        primitive("utc", PrimitiveType::TimestampMillis(utc()), false),
    ]);
    let rows = vec![vec![
        ParquetValue::TimestampMillis(1_000, utc()),
        ParquetValue::TimestampMillis(2_000, None),
    ]];
    let reader = Reader::try_new(write_bytes(schema, &rows)).unwrap();
    assert_eq!(
        read_all(&reader),
        vec![vec![
            ParquetValue::TimestampMillis(1_000, None),
            ParquetValue::TimestampMillis(2_000, utc()),
        ]]
    );
}

#[test]
fn test_temporal_statistics() {
    let schema = schema_with(vec![
        primitive("date", PrimitiveType::Date32, false),
        primitive("ts", PrimitiveType::TimestampNanos(None), false),
    ]);
    let rows: Vec<Vec<ParquetValue>> = [(18_000, 5i64), (-3, -7), (20_000, 0)]
        .iter()
        .map(|&(d, t)| vec![ParquetValue::Date32(d), ParquetValue::TimestampNanos(t, None)])
        .collect();
    let reader = Reader::try_new(write_bytes(schema, &rows)).unwrap();
    let row_group = reader.metadata().row_group(0);

    let date = row_group.column(0).statistics().unwrap().unwrap();
    assert_eq!(date.min, Some(ParquetValue::Date32(-3)));
    assert_eq!(date.max, Some(ParquetValue::Date32(20_000)));

    let ts = row_group.column(1).statistics().unwrap().unwrap();
    assert_eq!(ts.min, Some(ParquetValue::TimestampNanos(-7, None)));
    assert_eq!(ts.max, Some(ParquetValue::TimestampNanos(5, None)));
}

#[test]
fn test_temporal_display() {
    let cases = vec![
        (ParquetValue::Date32(0), "1970-01-01"),
        (ParquetValue::Date32(19_723), "2024-01-01"),
        (ParquetValue::TimeMillis(3_723_004), "01:02:03.004"),
        (ParquetValue::TimestampMillis(0, None), "1970-01-01T00:00:00Z"),
        (ParquetValue::TimestampMicros(1_500_000, utc()), "1970-01-01T00:00:01.5Z"),
    ];
    for (value, expected) in cases {
        assert_eq!(value.to_string(), expected);
    }
}

#[test]
fn test_temporal_values_in_nested_types() {
    let schema = schema_with(vec![
        list("events", true, primitive("element", PrimitiveType::TimestampMillis(utc()), true)),
        map(
            "deadlines",
            true,
            primitive("key", PrimitiveType::String, false),
            primitive("value", PrimitiveType::Date32, true),
        ),
    ]);
    let rows = vec![
        vec![
            ParquetValue::List(vec![
                ParquetValue::TimestampMillis(1_000, utc()),
                ParquetValue::Null,
                ParquetValue::TimestampMillis(-1_000, utc()),
            ]),
            ParquetValue::Map(vec![
                (string("q1"), ParquetValue::Date32(19_813)),
                (string("q2"), ParquetValue::Null),
            ]),
        ],
        vec![ParquetValue::Null, ParquetValue::Map(vec![])],
    ];
    test_roundtrip(rows, schema).unwrap();
}
