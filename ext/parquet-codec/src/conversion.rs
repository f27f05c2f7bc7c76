//! Conversion between [`ParquetValue`] and physical storage values.
//!
//! Writing goes through [`check_value`] (done while shredding, so errors can
//! name the row) and then [`to_physical`]. Reading maps decoded physical
//! values back with [`from_physical`].

use std::sync::Arc;

use bytes::Bytes;
use num::BigInt;
use ordered_float::OrderedFloat;

use crate::error::{ParquetError, Result};
use crate::schema::PrimitiveType;
use crate::types::PhysicalValue;
use crate::value::ParquetValue;

/// Julian day number of 1970-01-01.
const JULIAN_DAY_OF_EPOCH: i64 = 2_440_588;
const NANOS_PER_DAY: i64 = 86_400_000_000_000;

fn mismatch(expected: &PrimitiveType, value: &ParquetValue) -> ParquetError {
    ParquetError::schema(format!(
        "expected {}, got {}",
        expected.type_name(),
        value.type_name()
    ))
}

/// Check that a non-null value can be stored in a column of `primitive_type`.
pub fn check_value(value: &ParquetValue, primitive_type: &PrimitiveType) -> Result<()> {
    use ParquetValue as V;
    use PrimitiveType as T;

    match (primitive_type, value) {
        (T::Boolean, V::Boolean(_))
        | (T::Int8, V::Int8(_))
        | (T::Int16, V::Int8(_) | V::Int16(_))
        | (T::Int32, V::Int8(_) | V::Int16(_) | V::Int32(_))
        | (T::Int64, V::Int8(_) | V::Int16(_) | V::Int32(_) | V::Int64(_))
        | (T::UInt8, V::UInt8(_))
        | (T::UInt16, V::UInt8(_) | V::UInt16(_))
        | (T::UInt32, V::UInt8(_) | V::UInt16(_) | V::UInt32(_))
        | (T::UInt64, V::UInt8(_) | V::UInt16(_) | V::UInt32(_) | V::UInt64(_))
        | (T::Float32, V::Float32(_))
        | (T::Float64, V::Float32(_) | V::Float64(_))
        | (T::String, V::String(_))
        | (T::Binary, V::Bytes(_))
        | (T::Date32, V::Date32(_))
        | (T::TimeMillis, V::TimeMillis(_))
        | (T::TimeMicros, V::TimeMicros(_))
        | (T::TimeNanos, V::TimeNanos(_))
        | (T::TimestampMillis(_), V::TimestampMillis(_, _))
        | (T::TimestampMicros(_), V::TimestampMicros(_, _))
        | (T::TimestampNanos(_), V::TimestampNanos(_, _)) => Ok(()),
        (T::FixedLenByteArray(len), V::Bytes(b)) => {
            if b.len() == *len as usize {
                Ok(())
            } else {
                Err(ParquetError::schema(format!(
                    "expected {} bytes for FixedLenByteArray, got {}",
                    len,
                    b.len()
                )))
            }
        }
        (T::Decimal128(precision, scale), V::Decimal128(v, value_scale)) => {
            check_scale(*scale, *value_scale)?;
            if v.unsigned_abs() >= 10u128.pow(*precision as u32) {
                return Err(ParquetError::schema(format!(
                    "decimal {} does not fit precision {}",
                    value, precision
                )));
            }
            Ok(())
        }
        (T::Decimal256(precision, scale), V::Decimal256(v, value_scale)) => {
            check_scale(*scale, *value_scale)?;
            if num::Signed::abs(v) >= num::pow(BigInt::from(10), *precision as usize) {
                return Err(ParquetError::schema(format!(
                    "decimal {} does not fit precision {}",
                    value, precision
                )));
            }
            Ok(())
        }
        (expected, value) => Err(mismatch(expected, value)),
    }
}

fn check_scale(expected: i8, actual: i8) -> Result<()> {
    if expected != actual {
        return Err(ParquetError::schema(format!(
            "decimal scale {} does not match column scale {}",
            actual, expected
        )));
    }
    Ok(())
}

/// Convert a checked, non-null value to its physical representation.
pub fn to_physical(value: &ParquetValue, primitive_type: &PrimitiveType) -> Result<PhysicalValue> {
    use ParquetValue as V;
    use PhysicalValue as P;
    use PrimitiveType as T;

    Ok(match (primitive_type, value) {
        (T::Boolean, V::Boolean(b)) => P::Boolean(*b),

        (T::Int8 | T::Int16 | T::Int32, V::Int8(v)) => P::Int32(*v as i32),
        (T::Int16 | T::Int32, V::Int16(v)) => P::Int32(*v as i32),
        (T::Int32, V::Int32(v)) => P::Int32(*v),
        (T::Int64, V::Int8(v)) => P::Int64(*v as i64),
        (T::Int64, V::Int16(v)) => P::Int64(*v as i64),
        (T::Int64, V::Int32(v)) => P::Int64(*v as i64),
        (T::Int64, V::Int64(v)) => P::Int64(*v),

        // Unsigned values are stored in the same bits as their signed counterparts.
        (T::UInt8 | T::UInt16 | T::UInt32, V::UInt8(v)) => P::Int32(*v as i32),
        (T::UInt16 | T::UInt32, V::UInt16(v)) => P::Int32(*v as i32),
        (T::UInt32, V::UInt32(v)) => P::Int32(*v as i32),
        (T::UInt64, V::UInt8(v)) => P::Int64(*v as i64),
        (T::UInt64, V::UInt16(v)) => P::Int64(*v as i64),
        (T::UInt64, V::UInt32(v)) => P::Int64(*v as i64),
        (T::UInt64, V::UInt64(v)) => P::Int64(*v as i64),

        (T::Float32, V::Float32(v)) => P::Float(v.0),
        (T::Float64, V::Float32(v)) => P::Double(v.0 as f64),
        (T::Float64, V::Float64(v)) => P::Double(v.0),

        (T::String, V::String(s)) => P::ByteArray(Bytes::copy_from_slice(s.as_bytes())),
        (T::Binary, V::Bytes(b)) => P::ByteArray(b.clone()),
        (T::FixedLenByteArray(_), V::Bytes(b)) => P::FixedLenByteArray(b.clone()),

        (T::Date32, V::Date32(v)) => P::Int32(*v),
        (T::TimeMillis, V::TimeMillis(v)) => P::Int32(*v),
        (T::TimeMicros, V::TimeMicros(v)) | (T::TimeNanos, V::TimeNanos(v)) => P::Int64(*v),
        (T::TimestampMillis(_), V::TimestampMillis(v, _))
        | (T::TimestampMicros(_), V::TimestampMicros(v, _))
        | (T::TimestampNanos(_), V::TimestampNanos(v, _)) => P::Int64(*v),

        (T::Decimal128(precision, _), V::Decimal128(v, _)) => match precision {
            0..=9 => P::Int32(*v as i32),
            10..=18 => P::Int64(*v as i64),
            _ => P::FixedLenByteArray(Bytes::copy_from_slice(&v.to_be_bytes())),
        },
        (T::Decimal256(_, _), V::Decimal256(v, _)) => {
            P::FixedLenByteArray(Bytes::from(sign_extend_be(&v.to_signed_bytes_be(), 32)?))
        }

        (expected, value) => return Err(mismatch(expected, value)),
    })
}

/// Sign-extend big-endian two's complement bytes to `width`.
fn sign_extend_be(bytes: &[u8], width: usize) -> Result<Vec<u8>> {
    if bytes.len() > width {
        return Err(ParquetError::conversion(format!(
            "decimal needs {} bytes but the column stores {}",
            bytes.len(),
            width
        )));
    }
    let negative = bytes.first().is_some_and(|b| b & 0x80 != 0);
    let mut out = vec![if negative { 0xFF } else { 0x00 }; width - bytes.len()];
    out.extend_from_slice(bytes);
    Ok(out)
}

fn decimal_bytes_to_i128(bytes: &[u8]) -> Result<i128> {
    let extended = sign_extend_be(bytes, 16)?;
    let mut buf = [0u8; 16];
    buf.copy_from_slice(&extended);
    Ok(i128::from_be_bytes(buf))
}

/// Nanoseconds since the epoch from a legacy INT96 timestamp.
pub fn int96_to_nanos(raw: &[u8; 12]) -> i64 {
    let mut nanos = [0u8; 8];
    nanos.copy_from_slice(&raw[..8]);
    let nanos_of_day = i64::from_le_bytes(nanos);
    let julian_day = u32::from_le_bytes([raw[8], raw[9], raw[10], raw[11]]) as i64;
    (julian_day - JULIAN_DAY_OF_EPOCH)
        .wrapping_mul(NANOS_PER_DAY)
        .wrapping_add(nanos_of_day)
}

fn narrow<S, D: TryFrom<S>>(v: S, expected: &PrimitiveType) -> Result<D>
where
    S: Copy + std::fmt::Display,
{
    D::try_from(v).map_err(|_| {
        ParquetError::conversion(format!(
            "stored value {} is out of range for {}",
            v,
            expected.type_name()
        ))
    })
}

/// Convert a decoded physical value back to its logical value.
pub fn from_physical(value: PhysicalValue, primitive_type: &PrimitiveType) -> Result<ParquetValue> {
    use ParquetValue as V;
    use PhysicalValue as P;
    use PrimitiveType as T;

    Ok(match (primitive_type, value) {
        (T::Boolean, P::Boolean(b)) => V::Boolean(b),
        (T::Int8, P::Int32(v)) => V::Int8(narrow(v, primitive_type)?),
        (T::Int16, P::Int32(v)) => V::Int16(narrow(v, primitive_type)?),
        (T::Int32, P::Int32(v)) => V::Int32(v),
        (T::Int64, P::Int64(v)) => V::Int64(v),
        (T::UInt8, P::Int32(v)) => V::UInt8(narrow(v as u32, primitive_type)?),
        (T::UInt16, P::Int32(v)) => V::UInt16(narrow(v as u32, primitive_type)?),
        (T::UInt32, P::Int32(v)) => V::UInt32(v as u32),
        (T::UInt64, P::Int64(v)) => V::UInt64(v as u64),
        (T::Float32, P::Float(v)) => V::Float32(OrderedFloat(v)),
        (T::Float64, P::Double(v)) => V::Float64(OrderedFloat(v)),

        (T::String, P::ByteArray(b) | P::FixedLenByteArray(b)) => {
            V::String(Arc::from(std::str::from_utf8(&b)?))
        }
        (T::Binary | T::FixedLenByteArray(_), P::ByteArray(b) | P::FixedLenByteArray(b)) => V::Bytes(b),

        (T::Date32, P::Int32(v)) => V::Date32(v),
        (T::TimeMillis, P::Int32(v)) => V::TimeMillis(v),
        (T::TimeMicros, P::Int64(v)) => V::TimeMicros(v),
        (T::TimeNanos, P::Int64(v)) => V::TimeNanos(v),
        (T::TimestampMillis(tz), P::Int64(v)) => V::TimestampMillis(v, tz.clone()),
        (T::TimestampMicros(tz), P::Int64(v)) => V::TimestampMicros(v, tz.clone()),
        (T::TimestampNanos(tz), P::Int64(v)) => V::TimestampNanos(v, tz.clone()),
        (T::TimestampNanos(tz), P::Int96(raw)) => V::TimestampNanos(int96_to_nanos(&raw), tz.clone()),

        (T::Decimal128(_, scale), P::Int32(v)) => V::Decimal128(v as i128, *scale),
        (T::Decimal128(_, scale), P::Int64(v)) => V::Decimal128(v as i128, *scale),
        (T::Decimal128(_, scale), P::FixedLenByteArray(b) | P::ByteArray(b)) => {
            V::Decimal128(decimal_bytes_to_i128(&b)?, *scale)
        }
        (T::Decimal256(_, scale), P::Int32(v)) => V::Decimal256(BigInt::from(v), *scale),
        (T::Decimal256(_, scale), P::Int64(v)) => V::Decimal256(BigInt::from(v), *scale),
        (T::Decimal256(_, scale), P::FixedLenByteArray(b) | P::ByteArray(b)) => {
            V::Decimal256(BigInt::from_signed_bytes_be(&b), *scale)
        }

        (expected, value) => {
            return Err(ParquetError::corrupt_data(format!(
                "cannot read {} as {}",
                value.type_name(),
                expected.type_name()
            )))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: ParquetValue, primitive_type: PrimitiveType) -> ParquetValue {
        check_value(&value, &primitive_type).unwrap();
        let physical = to_physical(&value, &primitive_type).unwrap();
        from_physical(physical, &primitive_type).unwrap()
    }

    #[test]
    fn unsigned_values_keep_their_bits() {
        let v = roundtrip(ParquetValue::UInt32(u32::MAX), PrimitiveType::UInt32);
        assert_eq!(v, ParquetValue::UInt32(u32::MAX));
        assert_eq!(
            to_physical(&ParquetValue::UInt32(u32::MAX), &PrimitiveType::UInt32).unwrap(),
            PhysicalValue::Int32(-1)
        );
        let v = roundtrip(ParquetValue::UInt64(u64::MAX), PrimitiveType::UInt64);
        assert_eq!(v, ParquetValue::UInt64(u64::MAX));
    }

    #[test]
    fn narrower_integers_are_widened() {
        let v = roundtrip(ParquetValue::Int16(-300), PrimitiveType::Int64);
        assert_eq!(v, ParquetValue::Int64(-300));
        assert!(check_value(&ParquetValue::Int64(1), &PrimitiveType::Int32).is_err());
    }

    #[test]
    fn decimals_by_precision() {
        for (precision, unscaled) in [(5u8, -12345i128), (15, 123_456_789_012_345), (30, -(10i128.pow(29)))] {
            let ty = PrimitiveType::Decimal128(precision, 2);
            let v = roundtrip(ParquetValue::Decimal128(unscaled, 2), ty);
            assert_eq!(v, ParquetValue::Decimal128(unscaled, 2));
        }

        let big = BigInt::parse_bytes(b"-123456789012345678901234567890123456789012345", 10).unwrap();
        let v = roundtrip(
            ParquetValue::Decimal256(big.clone(), 5),
            PrimitiveType::Decimal256(50, 5),
        );
        assert_eq!(v, ParquetValue::Decimal256(big, 5));
    }

    #[test]
    fn decimal_checks() {
        let ty = PrimitiveType::Decimal128(4, 2);
        assert!(check_value(&ParquetValue::Decimal128(9999, 2), &ty).is_ok());
        assert!(check_value(&ParquetValue::Decimal128(10000, 2), &ty).is_err());
        assert!(check_value(&ParquetValue::Decimal128(1, 3), &ty).is_err());
    }

    #[test]
    fn fixed_len_bytes_length_checked() {
        let ty = PrimitiveType::FixedLenByteArray(3);
        assert!(check_value(&ParquetValue::Bytes(Bytes::from_static(b"abc")), &ty).is_ok());
        assert!(check_value(&ParquetValue::Bytes(Bytes::from_static(b"ab")), &ty).is_err());
    }

    #[test]
    fn int96_timestamps() {
        // 2000-01-01T00:00:00.000000001Z: Julian day 2451545, one nanosecond into the day.
        let mut raw = [0u8; 12];
        raw[..8].copy_from_slice(&1i64.to_le_bytes());
        raw[8..].copy_from_slice(&2_451_545u32.to_le_bytes());
        let v = from_physical(PhysicalValue::Int96(raw), &PrimitiveType::TimestampNanos(None)).unwrap();
        assert_eq!(v, ParquetValue::TimestampNanos(946_684_800_000_000_001, None));
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let err = from_physical(
            PhysicalValue::ByteArray(Bytes::from_static(&[0xFF, 0xFE])),
            &PrimitiveType::String,
        )
        .unwrap_err();
        assert!(matches!(err, ParquetError::Utf8(_)));
    }

    #[test]
    fn type_mismatch_is_schema_error() {
        let err = check_value(&ParquetValue::String(Arc::from("x")), &PrimitiveType::Int32).unwrap_err();
        assert!(matches!(err, ParquetError::Schema(_)));
        assert!(err.to_string().contains("expected Int32, got String"));
    }
}
