use bytes::Bytes;
use parquet_codec::*;
use std::sync::{Arc, Mutex};
use std::thread;

use test_helpers::*;

fn thread_schema() -> Schema {
    schema_with(vec![
        primitive("thread_id", PrimitiveType::Int32, false),
        primitive("value", PrimitiveType::String, false),
    ])
}

fn thread_rows(count: i32) -> Vec<Vec<ParquetValue>> {
    (0..count)
        .map(|i| vec![ParquetValue::Int32(i), string(&format!("Value {}", i))])
        .collect()
}

#[test]
fn test_concurrent_readers() {
    // Multiple threads reading the same bytes through their own readers
    let bytes = write_with(
        WriterBuilder::new().with_row_group_size(100),
        thread_schema(),
        &thread_rows(1000),
    );
    let num_threads = 10;
    let mut handles = vec![];

    for thread_id in 0..num_threads {
        let bytes_clone = bytes.clone();

        let handle = thread::spawn(move || {
            let reader = Reader::try_new(bytes_clone).unwrap();

            let mut row_count = 0;
            let mut sum = 0i32;

            for row_result in reader.read_rows().unwrap() {
                let row = row_result.unwrap();
                row_count += 1;

                if let ParquetValue::Int32(val) = &row[0] {
                    sum += val;
                }
            }

            println!("Thread {} read {} rows, sum: {}", thread_id, row_count, sum);
            (row_count, sum)
        });

        handles.push(handle);
    }

    let mut results = vec![];
    for handle in handles {
        results.push(handle.join().unwrap());
    }

    let expected_sum: i32 = (0..1000).sum();
    for (count, sum) in results {
        assert_eq!(count, 1000);
        assert_eq!(sum, expected_sum);
    }
}

#[test]
fn test_cloned_reader_shared_across_threads() {
    // One parsed footer, many iterators
    let bytes = write_with(
        WriterBuilder::new().with_row_group_size(64),
        thread_schema(),
        &thread_rows(500),
    );
    let reader = Reader::try_new(bytes).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let reader = reader.clone();
            thread::spawn(move || {
                let offset = t * 100;
                reader
                    .read_window(offset, Some(150))
                    .unwrap()
                    .map(|row| row.unwrap().get::<i32>(0).unwrap().unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for (t, handle) in handles.into_iter().enumerate() {
        let ids = handle.join().unwrap();
        let start = t as i32 * 100;
        let expected: Vec<i32> = (start..(start + 150).min(500)).collect();
        assert_eq!(ids, expected);
    }
    assert!(Arc::ptr_eq(reader.metadata(), reader.clone().metadata()));
}

#[test]
fn test_reader_independence() {
    // Iterators from two readers don't interfere with each other
    let schema = schema_with(vec![primitive("value", PrimitiveType::Int64, false)]);
    let rows: Vec<Vec<ParquetValue>> = (0..100).map(|i| vec![ParquetValue::Int64(i)]).collect();
    let bytes = write_with(WriterBuilder::new().with_row_group_size(30), schema, &rows);

    let reader1 = Reader::try_new(bytes.clone()).unwrap();
    let reader2 = Reader::try_new(bytes).unwrap();

    let mut iter1 = reader1.read_rows().unwrap();
    let mut iter2 = reader2.read_rows().unwrap();

    let mut values1 = vec![];
    let mut values2 = vec![];

    // Read 10 from reader1
    for _ in 0..10 {
        if let Some(Ok(row)) = iter1.next() {
            values1.push(row.get::<i64>(0).unwrap().unwrap());
        }
    }

    // Read 20 from reader2
    for _ in 0..20 {
        if let Some(Ok(row)) = iter2.next() {
            values2.push(row.get::<i64>(0).unwrap().unwrap());
        }
    }

    for row_result in iter1 {
        values1.push(row_result.unwrap().get::<i64>(0).unwrap().unwrap());
    }
    for row_result in iter2 {
        values2.push(row_result.unwrap().get::<i64>(0).unwrap().unwrap());
    }

    let expected: Vec<i64> = (0..100).collect();
    assert_eq!(values1, expected);
    assert_eq!(values2, expected);
}

#[test]
fn test_concurrent_column_readers() {
    // Each thread projects a different column
    let schema = schema_with(vec![
        primitive("col1", PrimitiveType::Int32, false),
        primitive("col2", PrimitiveType::String, false),
        primitive("col3", PrimitiveType::Float64, false),
    ]);
    let rows: Vec<Vec<ParquetValue>> = (0..500)
        .map(|i| {
            vec![
                ParquetValue::Int32(i),
                string(&format!("String {}", i)),
                ParquetValue::Float64(ordered_float::OrderedFloat(i as f64 * 1.5)),
            ]
        })
        .collect();
    let reader = Reader::try_new(write_with(
        WriterBuilder::new().with_row_group_size(200),
        schema,
        &rows,
    ))
    .unwrap();

    let mut handles = vec![];
    for column in ["col1", "col2", "col3"] {
        let reader = reader.clone();
        let handle = thread::spawn(move || {
            let mut batch_count = 0;
            let mut value_count = 0;

            for batch_result in reader
                .read_columns_with_projection(&[column.to_string()])
                .unwrap()
            {
                let batch = batch_result.unwrap();
                batch_count += 1;
                assert_eq!(batch.columns.len(), 1);
                assert_eq!(batch.columns[0].0, column);
                value_count += batch.columns[0].1.len();
            }

            (batch_count, value_count)
        });
        handles.push(handle);
    }

    for handle in handles {
        assert_eq!(handle.join().unwrap(), (3, 500));
    }
}

#[test]
fn test_shared_writer_behind_mutex() {
    // A writer borrowing a shared buffer must hold the lock for its lifetime
    let schema = schema_with(vec![primitive("value", PrimitiveType::Int32, false)]);
    let buffer = Arc::new(Mutex::new(Vec::new()));

    {
        let buffer_clone = Arc::clone(&buffer);
        let mut buf = buffer_clone.lock().unwrap();

        let mut writer = Writer::new(&mut *buf, schema).unwrap();
        writer.write_row(vec![ParquetValue::Int32(42)]).unwrap();
        writer.close().unwrap();
    }

    let final_buffer = buffer.lock().unwrap().clone();
    let reader = Reader::try_new(Bytes::from(final_buffer)).unwrap();
    assert_eq!(read_all(&reader), vec![vec![ParquetValue::Int32(42)]]);
}

#[test]
fn test_metadata_concurrent_access() {
    let bytes = write_bytes(thread_schema(), &thread_rows(100));
    let reader = Reader::try_new(bytes).unwrap();
    let mut handles = vec![];

    for _ in 0..5 {
        let reader = reader.clone();
        let handle = thread::spawn(move || {
            for _ in 0..10 {
                let metadata = reader.metadata();
                assert_eq!(metadata.num_rows(), 100);
                assert_eq!(metadata.schema_descr().num_columns(), 2);
                thread::yield_now();
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_concurrent_reads_from_file() {
    let bytes = write_with(
        WriterBuilder::new().with_row_group_size(250),
        thread_schema(),
        &thread_rows(1000),
    );
    let temp_file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(temp_file.path(), &bytes).unwrap();
    let reader = Reader::try_new(std::fs::File::open(temp_file.path()).unwrap()).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let reader = reader.clone();
            thread::spawn(move || read_all(&reader))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), thread_rows(1000));
    }
}
