//! LSB-first bit packing of small unsigned integers.

use crate::error::{ParquetError, Result};

/// Number of bits needed to represent `max`.
pub fn bit_width(max: u64) -> u8 {
    (64 - max.leading_zeros()) as u8
}

/// Pack `values` using `num_bits` bits each, appending to `out`.
///
/// Output is `ceil(values.len() * num_bits / 8)` bytes; the final byte is zero padded.
pub fn pack(values: &[u32], num_bits: u8, out: &mut Vec<u8>) {
    if num_bits == 0 {
        return;
    }
    let num_bits = num_bits as usize;
    let start = out.len();
    out.resize(start + (values.len() * num_bits).div_ceil(8), 0);
    let packed = &mut out[start..];

    let mut bit_pos = 0usize;
    for &value in values {
        let mut remaining = num_bits;
        let mut v = value as u64;
        while remaining > 0 {
            let byte = bit_pos / 8;
            let offset = bit_pos % 8;
            let take = remaining.min(8 - offset);
            packed[byte] |= ((v & ((1 << take) - 1)) as u8) << offset;
            v >>= take;
            remaining -= take;
            bit_pos += take;
        }
    }
}

/// Unpack `count` values of `num_bits` bits from the start of `buf`.
pub fn unpack(buf: &[u8], num_bits: u8, count: usize, out: &mut Vec<u32>) -> Result<()> {
    if num_bits > 32 {
        return Err(ParquetError::corrupt_data(format!(
            "Bit width {} exceeds 32",
            num_bits
        )));
    }
    if num_bits == 0 {
        out.extend(std::iter::repeat(0).take(count));
        return Ok(());
    }
    let num_bits = num_bits as usize;
    let needed = (count * num_bits).div_ceil(8);
    if buf.len() < needed {
        return Err(ParquetError::corrupt_data(format!(
            "Bit-packed data truncated: need {} bytes, have {}",
            needed,
            buf.len()
        )));
    }

    out.reserve(count);
    let mut bit_pos = 0usize;
    for _ in 0..count {
        let mut value = 0u64;
        let mut filled = 0usize;
        while filled < num_bits {
            let byte = buf[bit_pos / 8] as u64;
            let offset = bit_pos % 8;
            let take = (num_bits - filled).min(8 - offset);
            value |= ((byte >> offset) & ((1 << take) - 1)) << filled;
            filled += take;
            bit_pos += take;
        }
        out.push(value as u32);
    }
    Ok(())
}
