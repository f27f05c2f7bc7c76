//! Physical storage types and values.

use std::cmp::Ordering;

use bytes::Bytes;

use crate::error::{ParquetError, Result};

/// Physical types representable in parquet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalType {
    Boolean,
    Int32,
    Int64,
    Int96,
    Float,
    Double,
    ByteArray,
    FixedLenByteArray(usize),
}

impl PhysicalType {
    /// Build from the thrift `Type` code and the element's `type_length`.
    pub fn from_thrift(code: i32, type_length: Option<i32>) -> Result<Self> {
        Ok(match code {
            0 => PhysicalType::Boolean,
            1 => PhysicalType::Int32,
            2 => PhysicalType::Int64,
            3 => PhysicalType::Int96,
            4 => PhysicalType::Float,
            5 => PhysicalType::Double,
            6 => PhysicalType::ByteArray,
            7 => match type_length {
                Some(len) if len > 0 => PhysicalType::FixedLenByteArray(len as usize),
                other => {
                    return Err(ParquetError::schema(format!(
                        "FIXED_LEN_BYTE_ARRAY requires a positive type_length, got {:?}",
                        other
                    )))
                }
            },
            other => {
                return Err(ParquetError::schema(format!(
                    "Unknown physical type code {}",
                    other
                )))
            }
        })
    }

    pub fn to_thrift(self) -> i32 {
        match self {
            PhysicalType::Boolean => 0,
            PhysicalType::Int32 => 1,
            PhysicalType::Int64 => 2,
            PhysicalType::Int96 => 3,
            PhysicalType::Float => 4,
            PhysicalType::Double => 5,
            PhysicalType::ByteArray => 6,
            PhysicalType::FixedLenByteArray(_) => 7,
        }
    }

    pub fn type_length(self) -> Option<i32> {
        match self {
            PhysicalType::FixedLenByteArray(len) => Some(len as i32),
            _ => None,
        }
    }
}

/// Parquet converted type, deprecated but still written for older readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertedType {
    Utf8,
    Map,
    MapKeyValue,
    List,
    Enum,
    Decimal,
    Date,
    TimeMillis,
    TimeMicros,
    TimestampMillis,
    TimestampMicros,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Int8,
    Int16,
    Int32,
    Int64,
    Json,
    Bson,
    Interval,
}

impl ConvertedType {
    /// Unknown codes yield `None` and are ignored by readers.
    pub fn from_thrift(code: i32) -> Option<Self> {
        use ConvertedType::*;
        const ALL: [ConvertedType; 22] = [
            Utf8,
            Map,
            MapKeyValue,
            List,
            Enum,
            Decimal,
            Date,
            TimeMillis,
            TimeMicros,
            TimestampMillis,
            TimestampMicros,
            Uint8,
            Uint16,
            Uint32,
            Uint64,
            Int8,
            Int16,
            Int32,
            Int64,
            Json,
            Bson,
            Interval,
        ];
        usize::try_from(code).ok().and_then(|idx| ALL.get(idx).copied())
    }

    pub fn to_thrift(self) -> i32 {
        self as i32
    }
}

/// A single non-null value in its physical representation.
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicalValue {
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Int96([u8; 12]),
    Float(f32),
    Double(f64),
    ByteArray(Bytes),
    FixedLenByteArray(Bytes),
}

impl PhysicalValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            PhysicalValue::Boolean(_) => "BOOLEAN",
            PhysicalValue::Int32(_) => "INT32",
            PhysicalValue::Int64(_) => "INT64",
            PhysicalValue::Int96(_) => "INT96",
            PhysicalValue::Float(_) => "FLOAT",
            PhysicalValue::Double(_) => "DOUBLE",
            PhysicalValue::ByteArray(_) => "BYTE_ARRAY",
            PhysicalValue::FixedLenByteArray(_) => "FIXED_LEN_BYTE_ARRAY",
        }
    }
}

/// How min/max statistics compare values of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Signed,
    Unsigned,
    /// No defined order; statistics are not written.
    Undefined,
}

impl SortOrder {
    /// Compare two values of the same physical type.
    ///
    /// Returns `None` when the values are not comparable (mismatched types,
    /// NaN, or an undefined order).
    pub fn compare(self, a: &PhysicalValue, b: &PhysicalValue) -> Option<Ordering> {
        use PhysicalValue as P;
        match (self, a, b) {
            (SortOrder::Undefined, _, _) => None,
            (_, P::Boolean(x), P::Boolean(y)) => Some(x.cmp(y)),
            (SortOrder::Signed, P::Int32(x), P::Int32(y)) => Some(x.cmp(y)),
            (SortOrder::Unsigned, P::Int32(x), P::Int32(y)) => Some((*x as u32).cmp(&(*y as u32))),
            (SortOrder::Signed, P::Int64(x), P::Int64(y)) => Some(x.cmp(y)),
            (SortOrder::Unsigned, P::Int64(x), P::Int64(y)) => Some((*x as u64).cmp(&(*y as u64))),
            (_, P::Float(x), P::Float(y)) => x.partial_cmp(y),
            (_, P::Double(x), P::Double(y)) => x.partial_cmp(y),
            (SortOrder::Unsigned, P::ByteArray(x), P::ByteArray(y))
            | (SortOrder::Unsigned, P::FixedLenByteArray(x), P::FixedLenByteArray(y)) => {
                Some(x.as_ref().cmp(y.as_ref()))
            }
            // Big-endian two's complement, as used by decimals.
            (SortOrder::Signed, P::ByteArray(x), P::ByteArray(y))
            | (SortOrder::Signed, P::FixedLenByteArray(x), P::FixedLenByteArray(y)) => {
                Some(compare_signed_be(x, y))
            }
            _ => None,
        }
    }
}

fn compare_signed_be(a: &[u8], b: &[u8]) -> Ordering {
    let a_neg = a.first().is_some_and(|byte| byte & 0x80 != 0);
    let b_neg = b.first().is_some_and(|byte| byte & 0x80 != 0);
    match (a_neg, b_neg) {
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }
    let width = a.len().max(b.len());
    let pad = if a_neg { 0xFF } else { 0x00 };
    let extend = |bytes: &[u8]| {
        let mut out = vec![pad; width - bytes.len()];
        out.extend_from_slice(bytes);
        out
    };
    extend(a).cmp(&extend(b))
}
