//! Column chunk statistics.

use std::cmp::Ordering;

use bytes::Bytes;

use crate::conversion;
use crate::descriptor::ColumnDescriptor;
use crate::encoding::plain;
use crate::error::{ParquetError, Result};
use crate::format::EncodedStatistics;
use crate::schema::PrimitiveType;
use crate::types::{PhysicalType, PhysicalValue, SortOrder};
use crate::value::ParquetValue;

/// Decoded statistics of a column chunk.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statistics {
    pub min: Option<ParquetValue>,
    pub max: Option<ParquetValue>,
    pub null_count: Option<u64>,
    pub distinct_count: Option<u64>,
}

/// Order in which min/max statistics of a column are computed.
pub fn sort_order(primitive_type: &PrimitiveType, physical_type: PhysicalType) -> SortOrder {
    match (primitive_type, physical_type) {
        (_, PhysicalType::Int96) => SortOrder::Undefined,
        (
            PrimitiveType::UInt8 | PrimitiveType::UInt16 | PrimitiveType::UInt32 | PrimitiveType::UInt64,
            _,
        ) => SortOrder::Unsigned,
        (PrimitiveType::Decimal128(_, _) | PrimitiveType::Decimal256(_, _), _) => SortOrder::Signed,
        (_, PhysicalType::ByteArray | PhysicalType::FixedLenByteArray(_)) => SortOrder::Unsigned,
        _ => SortOrder::Signed,
    }
}

/// Running min/max/null count over the values written to a chunk.
#[derive(Debug)]
pub struct StatisticsAccumulator {
    order: SortOrder,
    min: Option<PhysicalValue>,
    max: Option<PhysicalValue>,
    null_count: u64,
}

impl StatisticsAccumulator {
    pub fn new(order: SortOrder) -> Self {
        Self {
            order,
            min: None,
            max: None,
            null_count: 0,
        }
    }

    pub fn add_nulls(&mut self, count: u64) {
        self.null_count += count;
    }

    pub fn update(&mut self, value: &PhysicalValue) {
        if self.order == SortOrder::Undefined || is_nan(value) {
            return;
        }
        match &self.min {
            Some(min) if self.order.compare(value, min) != Some(Ordering::Less) => {}
            _ => self.min = Some(value.clone()),
        }
        match &self.max {
            Some(max) if self.order.compare(value, max) != Some(Ordering::Greater) => {}
            _ => self.max = Some(value.clone()),
        }
    }

    /// Encode for the column metadata. Min/max are only written under a
    /// defined order.
    pub fn encode(&self) -> Result<EncodedStatistics> {
        Ok(EncodedStatistics {
            null_count: Some(self.null_count as i64),
            min_value: self.min.as_ref().map(encode_value).transpose()?,
            max_value: self.max.as_ref().map(encode_value).transpose()?,
            ..Default::default()
        })
    }
}

fn is_nan(value: &PhysicalValue) -> bool {
    match value {
        PhysicalValue::Float(v) => v.is_nan(),
        PhysicalValue::Double(v) => v.is_nan(),
        _ => false,
    }
}

/// Statistics bytes are plain encoded, except byte arrays which omit the length prefix.
fn encode_value(value: &PhysicalValue) -> Result<Vec<u8>> {
    Ok(match value {
        PhysicalValue::ByteArray(b) | PhysicalValue::FixedLenByteArray(b) => b.to_vec(),
        PhysicalValue::Boolean(b) => vec![*b as u8],
        PhysicalValue::Int32(v) => v.to_le_bytes().to_vec(),
        PhysicalValue::Int64(v) => v.to_le_bytes().to_vec(),
        PhysicalValue::Float(v) => v.to_le_bytes().to_vec(),
        PhysicalValue::Double(v) => v.to_le_bytes().to_vec(),
        PhysicalValue::Int96(v) => v.to_vec(),
    })
}

fn decode_value(bytes: &[u8], physical_type: PhysicalType) -> Result<PhysicalValue> {
    let bytes = Bytes::copy_from_slice(bytes);
    match physical_type {
        PhysicalType::ByteArray => Ok(PhysicalValue::ByteArray(bytes)),
        PhysicalType::FixedLenByteArray(_) => Ok(PhysicalValue::FixedLenByteArray(bytes)),
        other => {
            let (mut values, _) = plain::decode(&bytes, other, 1)?;
            values
                .pop()
                .ok_or_else(|| ParquetError::corrupt_data("Empty statistics value"))
        }
    }
}

impl Statistics {
    /// Decode stored statistics into typed values for `column`.
    ///
    /// Legacy `min`/`max` fields are only trusted for signed columns, since
    /// older writers compared byte arrays and unsigned integers as signed.
    pub fn decode(encoded: &EncodedStatistics, column: &ColumnDescriptor) -> Result<Self> {
        let order = sort_order(&column.primitive_type, column.physical_type);
        let legacy_ok = order == SortOrder::Signed
            && !matches!(
                column.physical_type,
                PhysicalType::ByteArray | PhysicalType::FixedLenByteArray(_)
            );

        let pick = |current: &Option<Vec<u8>>, legacy: &Option<Vec<u8>>| -> Result<Option<ParquetValue>> {
            let bytes = match (current, legacy) {
                (Some(bytes), _) => bytes,
                (None, Some(bytes)) if legacy_ok => bytes,
                _ => return Ok(None),
            };
            if order == SortOrder::Undefined {
                return Ok(None);
            }
            let physical = decode_value(bytes, column.physical_type)?;
            conversion::from_physical(physical, &column.primitive_type).map(Some)
        };

        Ok(Statistics {
            min: pick(&encoded.min_value, &encoded.min)?,
            max: pick(&encoded.max_value, &encoded.max)?,
            null_count: encoded.null_count.and_then(|n| u64::try_from(n).ok()),
            distinct_count: encoded.distinct_count.and_then(|n| u64::try_from(n).ok()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordered_float::OrderedFloat;
    use std::sync::Arc;

    fn column(primitive_type: PrimitiveType) -> ColumnDescriptor {
        let physical_type = crate::descriptor::physical_type_of(&primitive_type);
        ColumnDescriptor {
            path: vec!["c".to_string()],
            primitive_type,
            physical_type,
            max_def_level: 1,
            max_rep_level: 0,
        }
    }

    fn accumulate(column: &ColumnDescriptor, values: &[PhysicalValue], nulls: u64) -> Statistics {
        let mut acc = StatisticsAccumulator::new(sort_order(&column.primitive_type, column.physical_type));
        for value in values {
            acc.update(value);
        }
        acc.add_nulls(nulls);
        Statistics::decode(&acc.encode().unwrap(), column).unwrap()
    }

    #[test]
    fn signed_integers() {
        let col = column(PrimitiveType::Int32);
        let stats = accumulate(
            &col,
            &[PhysicalValue::Int32(5), PhysicalValue::Int32(-7), PhysicalValue::Int32(3)],
            2,
        );
        assert_eq!(stats.min, Some(ParquetValue::Int32(-7)));
        assert_eq!(stats.max, Some(ParquetValue::Int32(5)));
        assert_eq!(stats.null_count, Some(2));
    }

    #[test]
    fn unsigned_integers_use_unsigned_order() {
        let col = column(PrimitiveType::UInt32);
        let stats = accumulate(&col, &[PhysicalValue::Int32(-1), PhysicalValue::Int32(1)], 0);
        assert_eq!(stats.min, Some(ParquetValue::UInt32(1)));
        assert_eq!(stats.max, Some(ParquetValue::UInt32(u32::MAX)));
    }

    #[test]
    fn strings_compare_bytewise() {
        let col = column(PrimitiveType::String);
        let values: Vec<_> = ["pear", "apple", "zebra", "Zulu"]
            .iter()
            .map(|s| PhysicalValue::ByteArray(Bytes::from(s.to_string())))
            .collect();
        let stats = accumulate(&col, &values, 0);
        assert_eq!(stats.min, Some(ParquetValue::String(Arc::from("Zulu"))));
        assert_eq!(stats.max, Some(ParquetValue::String(Arc::from("zebra"))));
    }

    #[test]
    fn nan_is_skipped() {
        let col = column(PrimitiveType::Float64);
        let stats = accumulate(
            &col,
            &[PhysicalValue::Double(f64::NAN), PhysicalValue::Double(2.5), PhysicalValue::Double(-1.0)],
            0,
        );
        assert_eq!(stats.min, Some(ParquetValue::Float64(OrderedFloat(-1.0))));
        assert_eq!(stats.max, Some(ParquetValue::Float64(OrderedFloat(2.5))));
    }

    #[test]
    fn all_null_chunk_has_no_bounds() {
        let col = column(PrimitiveType::Int64);
        let stats = accumulate(&col, &[], 4);
        assert_eq!(stats.min, None);
        assert_eq!(stats.max, None);
        assert_eq!(stats.null_count, Some(4));
    }

    #[test]
    fn legacy_fields_only_for_signed_columns() {
        let encoded = EncodedStatistics {
            min: Some(1i32.to_le_bytes().to_vec()),
            max: Some(9i32.to_le_bytes().to_vec()),
            ..Default::default()
        };
        let stats = Statistics::decode(&encoded, &column(PrimitiveType::Int32)).unwrap();
        assert_eq!(stats.min, Some(ParquetValue::Int32(1)));
        assert_eq!(stats.max, Some(ParquetValue::Int32(9)));

        let stats = Statistics::decode(&encoded, &column(PrimitiveType::UInt32)).unwrap();
        assert_eq!(stats.min, None);
    }
}
