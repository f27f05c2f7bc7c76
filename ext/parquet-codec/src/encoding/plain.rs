//! PLAIN encoding of physical values.
//!
//! Fixed-width types are little-endian, booleans are bit-packed LSB first,
//! byte arrays carry a 4-byte little-endian length prefix and fixed length
//! byte arrays are stored raw.

use bytes::Bytes;

use crate::error::{ParquetError, Result};
use crate::types::{PhysicalType, PhysicalValue};

/// Append the plain encoding of `values` to `out`.
pub fn encode(values: &[PhysicalValue], physical_type: PhysicalType, out: &mut Vec<u8>) -> Result<()> {
    if physical_type == PhysicalType::Boolean {
        let start = out.len();
        out.resize(start + values.len().div_ceil(8), 0);
        for (idx, value) in values.iter().enumerate() {
            match value {
                PhysicalValue::Boolean(true) => out[start + idx / 8] |= 1 << (idx % 8),
                PhysicalValue::Boolean(false) => {}
                other => return Err(mismatch(physical_type, other)),
            }
        }
        return Ok(());
    }

    for value in values {
        encode_one(value, physical_type, out)?;
    }
    Ok(())
}

/// Append the plain encoding of a single non-boolean value.
pub fn encode_one(value: &PhysicalValue, physical_type: PhysicalType, out: &mut Vec<u8>) -> Result<()> {
    match (physical_type, value) {
        (PhysicalType::Int32, PhysicalValue::Int32(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (PhysicalType::Int64, PhysicalValue::Int64(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (PhysicalType::Int96, PhysicalValue::Int96(v)) => out.extend_from_slice(v),
        (PhysicalType::Float, PhysicalValue::Float(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (PhysicalType::Double, PhysicalValue::Double(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (PhysicalType::ByteArray, PhysicalValue::ByteArray(v)) => {
            let len = u32::try_from(v.len()).map_err(|_| {
                ParquetError::invalid_argument(format!("Byte array of {} bytes is too large", v.len()))
            })?;
            out.extend_from_slice(&len.to_le_bytes());
            out.extend_from_slice(v);
        }
        (PhysicalType::FixedLenByteArray(len), PhysicalValue::FixedLenByteArray(v)) => {
            if v.len() != len {
                return Err(ParquetError::schema(format!(
                    "Fixed length byte array expected {} bytes, got {}",
                    len,
                    v.len()
                )));
            }
            out.extend_from_slice(v);
        }
        (_, other) => return Err(mismatch(physical_type, other)),
    }
    Ok(())
}

fn mismatch(physical_type: PhysicalType, value: &PhysicalValue) -> ParquetError {
    ParquetError::internal(format!(
        "Cannot plain-encode {} value into a {:?} column",
        value.type_name(),
        physical_type
    ))
}

/// Decode exactly `count` values from the start of `buf`.
///
/// Returns the values and the number of bytes consumed.
pub fn decode(buf: &Bytes, physical_type: PhysicalType, count: usize) -> Result<(Vec<PhysicalValue>, usize)> {
    let truncated = |needed: usize| {
        ParquetError::corrupt_data(format!(
            "Plain {:?} data truncated: {} values need {} bytes, have {}",
            physical_type,
            count,
            needed,
            buf.len()
        ))
    };

    let fixed = |width: usize| -> Result<usize> {
        let needed = width * count;
        if buf.len() < needed {
            Err(truncated(needed))
        } else {
            Ok(needed)
        }
    };

    let mut values = Vec::with_capacity(count);
    let consumed = match physical_type {
        PhysicalType::Boolean => {
            let needed = count.div_ceil(8);
            if buf.len() < needed {
                return Err(truncated(needed));
            }
            values.extend((0..count).map(|i| PhysicalValue::Boolean((buf[i / 8] >> (i % 8)) & 1 == 1)));
            needed
        }
        PhysicalType::Int32 => {
            let needed = fixed(4)?;
            values.extend(buf[..needed].chunks_exact(4).map(|c| {
                PhysicalValue::Int32(i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            }));
            needed
        }
        PhysicalType::Int64 => {
            let needed = fixed(8)?;
            values.extend(buf[..needed].chunks_exact(8).map(|c| {
                let mut le = [0u8; 8];
                le.copy_from_slice(c);
                PhysicalValue::Int64(i64::from_le_bytes(le))
            }));
            needed
        }
        PhysicalType::Int96 => {
            let needed = fixed(12)?;
            values.extend(buf[..needed].chunks_exact(12).map(|c| {
                let mut raw = [0u8; 12];
                raw.copy_from_slice(c);
                PhysicalValue::Int96(raw)
            }));
            needed
        }
        PhysicalType::Float => {
            let needed = fixed(4)?;
            values.extend(buf[..needed].chunks_exact(4).map(|c| {
                PhysicalValue::Float(f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            }));
            needed
        }
        PhysicalType::Double => {
            let needed = fixed(8)?;
            values.extend(buf[..needed].chunks_exact(8).map(|c| {
                let mut le = [0u8; 8];
                le.copy_from_slice(c);
                PhysicalValue::Double(f64::from_le_bytes(le))
            }));
            needed
        }
        PhysicalType::FixedLenByteArray(len) => {
            let needed = fixed(len)?;
            values.extend(
                (0..count).map(|i| PhysicalValue::FixedLenByteArray(buf.slice(i * len..(i + 1) * len))),
            );
            needed
        }
        PhysicalType::ByteArray => {
            let mut pos = 0;
            for _ in 0..count {
                if buf.len() - pos < 4 {
                    return Err(ParquetError::corrupt_data("Byte array length prefix truncated"));
                }
                let len =
                    u32::from_le_bytes([buf[pos], buf[pos + 1], buf[pos + 2], buf[pos + 3]]) as usize;
                pos += 4;
                if buf.len() - pos < len {
                    return Err(ParquetError::corrupt_data(format!(
                        "Byte array of {} bytes extends past the end of the page",
                        len
                    )));
                }
                values.push(PhysicalValue::ByteArray(buf.slice(pos..pos + len)));
                pos += len;
            }
            pos
        }
    };

    Ok((values, consumed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_are_bit_packed() {
        let values: Vec<PhysicalValue> = [true, false, true, true, false, false, false, false, true]
            .into_iter()
            .map(PhysicalValue::Boolean)
            .collect();
        let mut out = Vec::new();
        encode(&values, PhysicalType::Boolean, &mut out).unwrap();
        assert_eq!(out, vec![0b0000_1101, 0b0000_0001]);

        let (decoded, consumed) = decode(&Bytes::from(out), PhysicalType::Boolean, 9).unwrap();
        assert_eq!(consumed, 2);
        assert_eq!(decoded, values);
    }

    #[test]
    fn byte_arrays_are_length_prefixed() {
        let values = vec![
            PhysicalValue::ByteArray(Bytes::from_static(b"ab")),
            PhysicalValue::ByteArray(Bytes::new()),
        ];
        let mut out = Vec::new();
        encode(&values, PhysicalType::ByteArray, &mut out).unwrap();
        assert_eq!(out, vec![2, 0, 0, 0, b'a', b'b', 0, 0, 0, 0]);

        let (decoded, consumed) = decode(&Bytes::from(out), PhysicalType::ByteArray, 2).unwrap();
        assert_eq!(consumed, 10);
        assert_eq!(decoded, values);
    }

    #[test]
    fn fixed_width_little_endian() {
        let mut out = Vec::new();
        encode(&[PhysicalValue::Int32(1), PhysicalValue::Int32(-2)], PhysicalType::Int32, &mut out).unwrap();
        assert_eq!(out, vec![1, 0, 0, 0, 0xFE, 0xFF, 0xFF, 0xFF]);

        let mut out = Vec::new();
        encode(&[PhysicalValue::Double(1.5)], PhysicalType::Double, &mut out).unwrap();
        let (decoded, _) = decode(&Bytes::from(out), PhysicalType::Double, 1).unwrap();
        assert_eq!(decoded, vec![PhysicalValue::Double(1.5)]);
    }

    #[test]
    fn fixed_len_byte_array_checks_length() {
        let mut out = Vec::new();
        let err = encode(
            &[PhysicalValue::FixedLenByteArray(Bytes::from_static(b"abc"))],
            PhysicalType::FixedLenByteArray(4),
            &mut out,
        )
        .unwrap_err();
        assert!(matches!(err, ParquetError::Schema(_)));
    }

    #[test]
    fn truncated_input_is_corrupt() {
        let err = decode(&Bytes::from_static(&[1, 0, 0]), PhysicalType::Int32, 1).unwrap_err();
        assert!(matches!(err, ParquetError::CorruptData(_)));

        let err = decode(&Bytes::from_static(&[5, 0, 0, 0, b'a']), PhysicalType::ByteArray, 1).unwrap_err();
        assert!(matches!(err, ParquetError::CorruptData(_)));
    }
}
