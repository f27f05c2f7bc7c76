use bytes::Bytes;
use tracing::trace;

use super::ColumnValues;
use crate::conversion;
use crate::encoding::{dictionary, hybrid_rle, plain, Encoding};
use crate::error::{ErrorContext, ParquetError, Result};
use crate::metadata::ColumnChunkMetadata;
use crate::page::{Page, PageReader};
use crate::types::{PhysicalType, PhysicalValue};

/// Decode all pages of a column chunk.
///
/// `data` must hold exactly the chunk's bytes, starting at its first page.
pub fn decode_chunk(data: Bytes, meta: &ColumnChunkMetadata) -> Result<ColumnValues> {
    let descr = meta.column_descr();
    decode_pages(data, meta)
        .and_then(|(physical, def_levels, rep_levels)| {
            let values = physical
                .into_iter()
                .map(|v| conversion::from_physical(v, &descr.primitive_type))
                .collect::<Result<Vec<_>>>()?;
            Ok(ColumnValues {
                values,
                def_levels,
                rep_levels,
            })
        })
        .with_context(|| format!("Failed to read column '{}'", descr.path_string()))
}

type Decoded = (Vec<PhysicalValue>, Vec<i16>, Vec<i16>);

fn decode_pages(data: Bytes, meta: &ColumnChunkMetadata) -> Result<Decoded> {
    let descr = meta.column_descr();
    let (max_def, max_rep) = (descr.max_def_level, descr.max_rep_level);
    let physical_type = descr.physical_type;
    let expected = meta.num_values() as usize;

    let mut dict: Option<Vec<PhysicalValue>> = None;
    let mut values = Vec::new();
    let mut def_levels = Vec::with_capacity(expected);
    let mut rep_levels = Vec::with_capacity(expected);
    let mut pages = 0usize;

    for page in PageReader::new(data, meta.compression()) {
        match page? {
            Page::Dictionary {
                buf,
                num_values,
                encoding,
            } => {
                if dict.is_some() || pages > 0 {
                    return Err(ParquetError::corrupt_data(
                        "Dictionary page must be the first page of a chunk",
                    ));
                }
                if !matches!(encoding, Encoding::Plain | Encoding::PlainDictionary) {
                    return Err(ParquetError::unsupported_encoding(format!(
                        "{:?} dictionary page",
                        encoding
                    )));
                }
                dict = Some(dictionary::decode_page(&buf, physical_type, num_values)?);
            }
            Page::DataV1 {
                buf,
                num_values,
                encoding,
                def_level_encoding,
                rep_level_encoding,
            } => {
                let mut pos = 0;
                let reps = if max_rep > 0 {
                    check_level_encoding(rep_level_encoding)?;
                    let (levels, used) = hybrid_rle::decode_levels_prefixed(&buf[pos..], max_rep, num_values)?;
                    pos += used;
                    levels
                } else {
                    vec![0; num_values]
                };
                let defs = if max_def > 0 {
                    check_level_encoding(def_level_encoding)?;
                    let (levels, used) = hybrid_rle::decode_levels_prefixed(&buf[pos..], max_def, num_values)?;
                    pos += used;
                    levels
                } else {
                    vec![0; num_values]
                };
                let present = defs.iter().filter(|d| **d == max_def).count();
                decode_values(buf.slice(pos..), encoding, physical_type, present, dict.as_deref(), &mut values)?;
                def_levels.extend(defs);
                rep_levels.extend(reps);
            }
            Page::DataV2 {
                rep_levels: rep_buf,
                def_levels: def_buf,
                values: value_buf,
                num_values,
                num_nulls,
                encoding,
                ..
            } => {
                let reps = if max_rep > 0 {
                    hybrid_rle::decode_levels(&rep_buf, max_rep, num_values)?
                } else {
                    vec![0; num_values]
                };
                let defs = if max_def > 0 {
                    hybrid_rle::decode_levels(&def_buf, max_def, num_values)?
                } else {
                    vec![0; num_values]
                };
                let present = defs.iter().filter(|d| **d == max_def).count();
                if present + num_nulls != num_values {
                    return Err(ParquetError::corrupt_data(format!(
                        "Data page v2 declares {} nulls but its levels define {} of {} values",
                        num_nulls, present, num_values
                    )));
                }
                decode_values(value_buf, encoding, physical_type, present, dict.as_deref(), &mut values)?;
                def_levels.extend(defs);
                rep_levels.extend(reps);
            }
        }
        pages += 1;
    }

    if def_levels.len() != expected {
        return Err(ParquetError::corrupt_data(format!(
            "Chunk metadata declares {} values but its pages hold {}",
            expected,
            def_levels.len()
        )));
    }

    trace!(
        column = %descr.path_string(),
        pages,
        entries = def_levels.len(),
        "decoded column chunk"
    );
    Ok((values, def_levels, rep_levels))
}

fn check_level_encoding(encoding: Encoding) -> Result<()> {
    match encoding {
        Encoding::Rle => Ok(()),
        other => Err(ParquetError::unsupported_encoding(format!(
            "{:?} level encoding",
            other
        ))),
    }
}

fn decode_values(
    buf: Bytes,
    encoding: Encoding,
    physical_type: PhysicalType,
    count: usize,
    dict: Option<&[PhysicalValue]>,
    out: &mut Vec<PhysicalValue>,
) -> Result<()> {
    match encoding {
        Encoding::Plain => {
            let (values, _) = plain::decode(&buf, physical_type, count)?;
            out.extend(values);
        }
        Encoding::PlainDictionary | Encoding::RleDictionary => {
            let dict = dict.ok_or_else(|| {
                ParquetError::corrupt_data("Dictionary-encoded page without a dictionary page")
            })?;
            out.extend(dictionary::decode_indices(&buf, count, dict)?);
        }
        other => {
            return Err(ParquetError::unsupported_encoding(format!(
                "{:?} value encoding",
                other
            )))
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::column::writer::{encode_chunk, ColumnWriterOptions};
    use crate::compression::Compression;
    use crate::descriptor::{physical_type_of, ColumnDescriptor};
    use crate::schema::PrimitiveType;
    use crate::value::ParquetValue;

    fn descr(primitive_type: PrimitiveType, max_def_level: i16, max_rep_level: i16) -> Arc<ColumnDescriptor> {
        Arc::new(ColumnDescriptor {
            path: vec!["c".to_string()],
            physical_type: physical_type_of(&primitive_type),
            primitive_type,
            max_def_level,
            max_rep_level,
        })
    }

    fn strings(n: usize, distinct: usize) -> ColumnValues {
        let mut col = ColumnValues::new();
        for i in 0..n {
            if i % 5 == 4 {
                col.push_null(0, 0);
            } else {
                col.push_value(ParquetValue::String(Arc::from(format!("v{}", i % distinct))), 1, 0);
            }
        }
        col
    }

    fn roundtrip(descr: &Arc<ColumnDescriptor>, col: &ColumnValues, options: ColumnWriterOptions) -> ColumnValues {
        let chunk = encode_chunk(descr, col, &options).unwrap();
        assert_eq!(chunk.metadata.compressed_size() as usize, chunk.data.len());
        decode_chunk(Bytes::from(chunk.data), &chunk.metadata).unwrap()
    }

    #[test]
    fn dictionary_and_plain_chunks() {
        let d = descr(PrimitiveType::String, 1, 0);
        let col = strings(200, 7);
        for dictionary_enabled in [true, false] {
            let options = ColumnWriterOptions {
                dictionary_enabled,
                ..Default::default()
            };
            let chunk = encode_chunk(&d, &col, &options).unwrap();
            assert_eq!(
                chunk.metadata.encodings().contains(&Encoding::RleDictionary),
                dictionary_enabled
            );
            assert_eq!(chunk.metadata.dictionary_page_offset().is_some(), dictionary_enabled);
            assert_eq!(roundtrip(&d, &col, options), col);
        }
    }

    #[test]
    fn high_cardinality_falls_back_to_plain() {
        let d = descr(PrimitiveType::String, 1, 0);
        let col = strings(100, 100);
        let chunk = encode_chunk(&d, &col, &ColumnWriterOptions::default()).unwrap();
        assert!(chunk.metadata.dictionary_page_offset().is_none());
    }

    #[test]
    fn multiple_pages_and_codecs() {
        let d = descr(PrimitiveType::Int64, 2, 1);
        let mut col = ColumnValues::new();
        for row in 0..500i64 {
            match row % 4 {
                0 => col.push_null(0, 0),
                1 => col.push_null(1, 0),
                _ => {
                    for item in 0..(row % 5) {
                        col.push_value(ParquetValue::Int64(row * 10 + item), 2, if item == 0 { 0 } else { 1 });
                    }
                    if row % 5 == 0 {
                        col.push_null(1, 0);
                    }
                }
            }
        }
        for compression in [Compression::Uncompressed, Compression::Snappy, Compression::Gzip, Compression::Lz4Raw] {
            let options = ColumnWriterOptions {
                compression,
                dictionary_enabled: false,
                data_page_values: 64,
            };
            assert_eq!(roundtrip(&d, &col, options), col, "{:?}", compression);
        }
    }

    #[test]
    fn statistics_are_recorded() {
        let d = descr(PrimitiveType::String, 1, 0);
        let col = strings(10, 10);
        let chunk = encode_chunk(&d, &col, &ColumnWriterOptions::default()).unwrap();
        let stats = chunk.metadata.statistics().unwrap().unwrap();
        assert_eq!(stats.null_count, Some(2));
        assert_eq!(stats.min, Some(ParquetValue::String(Arc::from("v0"))));
        assert_eq!(stats.max, Some(ParquetValue::String(Arc::from("v8"))));
    }

    #[test]
    fn value_count_mismatch_is_corrupt() {
        let d = descr(PrimitiveType::Int32, 0, 0);
        let mut col = ColumnValues::new();
        for i in 0..10 {
            col.push_value(ParquetValue::Int32(i), 0, 0);
        }
        let mut chunk = encode_chunk(&d, &col, &ColumnWriterOptions::default()).unwrap();
        chunk.metadata.num_values = 11;
        let err = decode_chunk(Bytes::from(chunk.data), &chunk.metadata).unwrap_err();
        assert!(matches!(err, ParquetError::CorruptData(_)));
    }

    #[test]
    fn dictionary_page_required_for_indices() {
        let d = descr(PrimitiveType::Int32, 0, 0);
        let mut col = ColumnValues::new();
        for i in 0..100 {
            col.push_value(ParquetValue::Int32(i % 3), 0, 0);
        }
        let chunk = encode_chunk(&d, &col, &ColumnWriterOptions::default()).unwrap();
        let data_start = chunk.metadata.data_page_offset() as usize;
        let mut meta = chunk.metadata.clone();
        meta.dictionary_page_offset = None;
        let err = decode_chunk(Bytes::from(chunk.data[data_start..].to_vec()), &meta).unwrap_err();
        assert!(matches!(err, ParquetError::CorruptData(_)));
    }
}
