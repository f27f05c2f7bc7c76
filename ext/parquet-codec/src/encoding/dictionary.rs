//! Dictionary encoding.
//!
//! Distinct values are collected in first-seen order. The dictionary page is
//! the plain encoding of the distinct values; data pages carry indices as a
//! bit-width byte followed by hybrid runs.

use bytes::Bytes;
use indexmap::IndexSet;

use super::{bitpacked, hybrid_rle, plain};
use crate::error::{ParquetError, Result};
use crate::types::{PhysicalType, PhysicalValue};

/// Dictionary encoding is used only if distinct values are at most this
/// fraction of the non-null values.
pub const DEFAULT_DICTIONARY_RATIO: f64 = 0.5;

/// Upper bound on dictionary entries.
pub const MAX_DICTIONARY_ENTRIES: usize = 65_536;

/// A dictionary built from the values of one column chunk.
#[derive(Debug)]
pub struct Dictionary {
    physical_type: PhysicalType,
    /// Plain-encoded distinct values, in first-seen order.
    entries: IndexSet<Vec<u8>>,
    /// Index of each input value.
    indices: Vec<u32>,
}

impl Dictionary {
    /// Try to build a dictionary for `values`.
    ///
    /// Returns `None` when the column should be plain encoded instead.
    pub fn try_build(values: &[PhysicalValue], physical_type: PhysicalType) -> Result<Option<Self>> {
        if physical_type == PhysicalType::Boolean || values.is_empty() {
            return Ok(None);
        }
        let max_entries = max_distinct(values.len());

        let mut entries = IndexSet::new();
        let mut indices = Vec::with_capacity(values.len());
        let mut encoded = Vec::new();
        for value in values {
            encoded.clear();
            plain::encode_one(value, physical_type, &mut encoded)?;
            let (idx, inserted) = match entries.get_index_of(encoded.as_slice()) {
                Some(idx) => (idx, false),
                None => entries.insert_full(encoded.clone()),
            };
            if inserted && entries.len() > max_entries {
                return Ok(None);
            }
            indices.push(idx as u32);
        }

        Ok(Some(Dictionary {
            physical_type,
            entries,
            indices,
        }))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn physical_type(&self) -> PhysicalType {
        self.physical_type
    }

    /// Plain-encoded dictionary page payload.
    pub fn page_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.entries.iter().map(Vec::len).sum());
        for entry in &self.entries {
            out.extend_from_slice(entry);
        }
        out
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Bit width used for indices.
    pub fn index_bit_width(&self) -> u8 {
        // Some readers reject zero-width index streams, so a single entry still uses one bit.
        bitpacked::bit_width(self.entries.len().saturating_sub(1) as u64).max(1)
    }
}

/// Maximum distinct count for which a dictionary is worthwhile.
fn max_distinct(non_null: usize) -> usize {
    ((non_null as f64 * DEFAULT_DICTIONARY_RATIO) as usize).min(MAX_DICTIONARY_ENTRIES)
}

/// Encode dictionary indices for a data page: bit width byte plus hybrid runs.
pub fn encode_indices(indices: &[u32], bit_width: u8, out: &mut Vec<u8>) {
    out.push(bit_width);
    hybrid_rle::encode(indices, bit_width, out);
}

/// Decode `count` dictionary indices and resolve them against `dictionary`.
pub fn decode_indices(buf: &[u8], count: usize, dictionary: &[PhysicalValue]) -> Result<Vec<PhysicalValue>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let (&bit_width, rest) = buf
        .split_first()
        .ok_or_else(|| ParquetError::corrupt_data("Dictionary index stream is empty"))?;
    let mut indices = Vec::with_capacity(count);
    hybrid_rle::decode(rest, bit_width, count, &mut indices)?;
    indices
        .into_iter()
        .map(|idx| {
            dictionary.get(idx as usize).cloned().ok_or_else(|| {
                ParquetError::corrupt_data(format!(
                    "Dictionary index {} out of range for {} entries",
                    idx,
                    dictionary.len()
                ))
            })
        })
        .collect()
}

/// Decode a dictionary page payload.
pub fn decode_page(buf: &Bytes, physical_type: PhysicalType, num_values: usize) -> Result<Vec<PhysicalValue>> {
    let (values, _) = plain::decode(buf, physical_type, num_values)?;
    Ok(values)
}
