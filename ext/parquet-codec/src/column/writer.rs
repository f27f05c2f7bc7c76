use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::ColumnValues;
use crate::compression::Compression;
use crate::conversion;
use crate::descriptor::ColumnDescriptor;
use crate::encoding::dictionary::{self, Dictionary};
use crate::encoding::{hybrid_rle, plain, Encoding};
use crate::error::{ErrorContext, ParquetError, Result};
use crate::metadata::ColumnChunkMetadata;
use crate::page::{self, PageSizes};
use crate::statistics::{sort_order, StatisticsAccumulator};

/// Default upper bound on level entries per data page.
pub const DEFAULT_DATA_PAGE_VALUES: usize = 20_000;

/// Settings applied to every column chunk of a file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnWriterOptions {
    pub compression: Compression,
    pub dictionary_enabled: bool,
    /// Pages are cut at the first row boundary after this many level entries.
    pub data_page_values: usize,
}

impl Default for ColumnWriterOptions {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            dictionary_enabled: true,
            data_page_values: DEFAULT_DATA_PAGE_VALUES,
        }
    }
}

/// An encoded column chunk with offsets relative to the start of `data`.
#[derive(Debug)]
pub struct EncodedChunk {
    pub data: Vec<u8>,
    pub metadata: ColumnChunkMetadata,
}

/// Split level entries into page ranges, cutting only where a new row starts.
fn page_ranges(rep_levels: &[i16], limit: usize) -> Vec<Range<usize>> {
    let limit = limit.max(1);
    let mut ranges = Vec::new();
    let mut start = 0;
    for (idx, rep) in rep_levels.iter().enumerate().skip(1) {
        if *rep == 0 && idx - start >= limit {
            ranges.push(start..idx);
            start = idx;
        }
    }
    ranges.push(start..rep_levels.len());
    ranges
}

/// Encode one leaf column of a row group into pages.
pub fn encode_chunk(
    descr: &Arc<ColumnDescriptor>,
    column: &ColumnValues,
    options: &ColumnWriterOptions,
) -> Result<EncodedChunk> {
    let max_def = descr.max_def_level;
    let max_rep = descr.max_rep_level;
    let physical_type = descr.physical_type;

    if column.def_levels.len() != column.rep_levels.len() {
        return Err(ParquetError::internal(format!(
            "Column '{}' has {} definition levels but {} repetition levels",
            descr.path_string(),
            column.def_levels.len(),
            column.rep_levels.len()
        )));
    }
    let present = column.def_levels.iter().filter(|d| **d == max_def).count();
    if present != column.values.len() {
        return Err(ParquetError::internal(format!(
            "Column '{}' has {} values but its levels define {}",
            descr.path_string(),
            column.values.len(),
            present
        )));
    }

    let values = column
        .values
        .iter()
        .map(|v| conversion::to_physical(v, &descr.primitive_type))
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("Failed to encode column '{}'", descr.path_string()))?;

    let mut stats = StatisticsAccumulator::new(sort_order(&descr.primitive_type, physical_type));
    for value in &values {
        stats.update(value);
    }
    stats.add_nulls((column.len() - values.len()) as u64);

    let dictionary = if options.dictionary_enabled {
        Dictionary::try_build(&values, physical_type)?
    } else {
        None
    };

    let mut data = Vec::new();
    let mut total = PageSizes::default();
    let mut add = |sizes: PageSizes| {
        total.compressed += sizes.compressed;
        total.uncompressed += sizes.uncompressed;
    };

    let mut encodings = BTreeSet::from([Encoding::Plain]);
    if max_def > 0 || max_rep > 0 {
        encodings.insert(Encoding::Rle);
    }

    let dictionary_page_offset = match &dictionary {
        Some(dict) => {
            encodings.insert(Encoding::RleDictionary);
            add(page::write_dictionary_page(
                &dict.page_bytes(),
                dict.len(),
                options.compression,
                &mut data,
            )?);
            Some(0)
        }
        None => None,
    };
    let data_page_offset = data.len() as i64;

    let ranges = page_ranges(&column.rep_levels, options.data_page_values);
    let num_pages = ranges.len();
    let mut value_start = 0;
    for range in ranges {
        let defs = &column.def_levels[range.clone()];
        let page_present = defs.iter().filter(|d| **d == max_def).count();
        let value_range = value_start..value_start + page_present;
        value_start += page_present;

        let mut payload = Vec::new();
        if max_rep > 0 {
            hybrid_rle::encode_levels_prefixed(&column.rep_levels[range.clone()], max_rep, &mut payload);
        }
        if max_def > 0 {
            hybrid_rle::encode_levels_prefixed(defs, max_def, &mut payload);
        }
        let encoding = match &dictionary {
            Some(dict) => {
                dictionary::encode_indices(&dict.indices()[value_range], dict.index_bit_width(), &mut payload);
                Encoding::RleDictionary
            }
            None => {
                plain::encode(&values[value_range], physical_type, &mut payload)?;
                Encoding::Plain
            }
        };
        add(page::write_data_page(
            &payload,
            range.len(),
            encoding,
            options.compression,
            &mut data,
        )?);
    }

    trace!(
        column = %descr.path_string(),
        entries = column.len(),
        pages = num_pages,
        dictionary = dictionary.as_ref().map(Dictionary::len),
        bytes = data.len(),
        "encoded column chunk"
    );

    let metadata = ColumnChunkMetadata {
        descr: descr.clone(),
        encodings: encodings.into_iter().collect(),
        compression: options.compression,
        num_values: column.len() as i64,
        total_compressed_size: total.compressed as i64,
        total_uncompressed_size: total.uncompressed as i64,
        data_page_offset,
        dictionary_page_offset,
        statistics: Some(stats.encode()?),
    };
    Ok(EncodedChunk { data, metadata })
}
