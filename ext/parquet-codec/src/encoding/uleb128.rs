//! ULEB128 and zigzag varints.
//!
//! <https://en.wikipedia.org/wiki/LEB128#Unsigned_LEB128>
use crate::error::{ParquetError, Result};

/// ULEB128 encode a u64, appending to `out`.
///
/// Returns number of bytes written.
pub fn encode(mut value: u64, out: &mut Vec<u8>) -> usize {
    let start = out.len();
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if value == 0 {
            break;
        }
    }
    out.len() - start
}

/// Decodes a u64 from the start of `buf`.
///
/// Returns (value, consumed) pair.
pub fn decode(buf: &[u8]) -> Result<(u64, usize)> {
    let mut value = 0u64;
    let mut shift = 0;

    for (idx, &byte) in buf.iter().enumerate() {
        if shift >= 64 {
            return Err(ParquetError::corrupt_data("ULEB128 value is too large"));
        }
        value |= ((byte & 0x7F) as u64) << shift;
        shift += 7;

        if byte & 0x80 == 0 {
            return Ok((value, idx + 1));
        }
    }

    Err(ParquetError::corrupt_data("Truncated ULEB128 sequence"))
}

/// Zigzag then ULEB128 encode a signed integer.
pub fn encode_zigzag(value: i64, out: &mut Vec<u8>) -> usize {
    encode(((value << 1) ^ (value >> 63)) as u64, out)
}

pub fn decode_zigzag(buf: &[u8]) -> Result<(i64, usize)> {
    let (v, consumed) = decode(buf)?;
    Ok(((v >> 1) as i64 ^ -((v & 1) as i64), consumed))
}
