//! RLE / bit-packed hybrid encoding used for levels and dictionary indices.
//!
//! Each run starts with a ULEB128 header. An odd header is a bit-packed run
//! of `header >> 1` groups of eight values; an even header is an RLE run of
//! `header >> 1` repetitions of a single value stored in `ceil(width / 8)`
//! little-endian bytes.

use super::{bitpacked, uleb128};
use crate::error::{ParquetError, Result};

/// Minimum number of equal values worth an RLE run.
const MIN_RLE_RUN: usize = 8;

/// Encode `values` with the given bit width, appending to `out`.
///
/// A run of at least eight equal values that starts on a group boundary is
/// written as an RLE run. Everything else is bit-packed in groups of eight,
/// with the final group zero padded.
pub fn encode(values: &[u32], bit_width: u8, out: &mut Vec<u8>) {
    let mut pending: Vec<u32> = Vec::new();
    let mut idx = 0;

    while idx < values.len() {
        if pending.len() % 8 == 0 {
            let value = values[idx];
            let run = values[idx..].iter().take_while(|v| **v == value).count();
            if run >= MIN_RLE_RUN {
                flush_bit_packed(&mut pending, bit_width, out);
                write_rle_run(value, run, bit_width, out);
                idx += run;
                continue;
            }
        }
        pending.push(values[idx]);
        idx += 1;
    }

    flush_bit_packed(&mut pending, bit_width, out);
}

fn write_rle_run(value: u32, run: usize, bit_width: u8, out: &mut Vec<u8>) {
    uleb128::encode((run as u64) << 1, out);
    let value_bytes = (bit_width as usize).div_ceil(8);
    out.extend_from_slice(&value.to_le_bytes()[..value_bytes]);
}

fn flush_bit_packed(pending: &mut Vec<u32>, bit_width: u8, out: &mut Vec<u8>) {
    if pending.is_empty() {
        return;
    }
    let groups = pending.len().div_ceil(8);
    pending.resize(groups * 8, 0);
    uleb128::encode(((groups as u64) << 1) | 1, out);
    bitpacked::pack(pending, bit_width, out);
    pending.clear();
}

/// Decode exactly `count` values from `buf`.
///
/// Returns the number of bytes consumed. Padding values of the last bit-packed
/// group are discarded.
pub fn decode(buf: &[u8], bit_width: u8, count: usize, out: &mut Vec<u32>) -> Result<usize> {
    if bit_width > 32 {
        return Err(ParquetError::corrupt_data(format!(
            "Invalid bit width {} for hybrid encoding",
            bit_width
        )));
    }
    let value_bytes = (bit_width as usize).div_ceil(8);
    let target = out.len() + count;
    let mut pos = 0;

    while out.len() < target {
        if pos >= buf.len() {
            return Err(ParquetError::corrupt_data(format!(
                "Hybrid stream ended after {} of {} values",
                count - (target - out.len()),
                count
            )));
        }
        let (header, used) = uleb128::decode(&buf[pos..])?;
        pos += used;
        let remaining = target - out.len();

        if header & 1 == 1 {
            let groups = (header >> 1) as usize;
            let (values_in_run, run_bytes) = groups
                .checked_mul(8)
                .zip(groups.checked_mul(bit_width as usize))
                .ok_or_else(|| {
                    ParquetError::corrupt_data(format!("Bit-packed run of {} groups is too long", groups))
                })?;
            // The final run may be cut short by writers that drop unused padding bytes.
            let available = buf.len() - pos;
            let take = values_in_run.min(remaining);
            let needed = (take * bit_width as usize).div_ceil(8);
            if available < needed {
                return Err(ParquetError::corrupt_data(
                    "Bit-packed run extends past the end of the stream",
                ));
            }
            bitpacked::unpack(&buf[pos..], bit_width, take, out)?;
            pos += run_bytes.min(available);
        } else {
            let run = (header >> 1) as usize;
            if buf.len() - pos < value_bytes {
                return Err(ParquetError::corrupt_data(
                    "RLE run value extends past the end of the stream",
                ));
            }
            let mut le = [0u8; 4];
            le[..value_bytes].copy_from_slice(&buf[pos..pos + value_bytes]);
            pos += value_bytes;
            if run == 0 {
                return Err(ParquetError::corrupt_data("Empty RLE run"));
            }
            let value = u32::from_le_bytes(le);
            out.extend(std::iter::repeat(value).take(run.min(remaining)));
        }
    }

    Ok(pos)
}

/// Encode a level stream prefixed with its 4-byte little-endian length, as used in v1 data pages.
pub fn encode_levels_prefixed(levels: &[i16], max_level: i16, out: &mut Vec<u8>) {
    let width = bitpacked::bit_width(max_level as u64);
    let len_pos = out.len();
    out.extend_from_slice(&[0u8; 4]);
    let values: Vec<u32> = levels.iter().map(|l| *l as u32).collect();
    encode(&values, width, out);
    let len = (out.len() - len_pos - 4) as u32;
    out[len_pos..len_pos + 4].copy_from_slice(&len.to_le_bytes());
}

/// Decode a length-prefixed level stream.
///
/// Returns the levels and the number of bytes consumed including the prefix.
pub fn decode_levels_prefixed(buf: &[u8], max_level: i16, count: usize) -> Result<(Vec<i16>, usize)> {
    if buf.len() < 4 {
        return Err(ParquetError::corrupt_data("Level stream length prefix truncated"));
    }
    let len = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    if buf.len() - 4 < len {
        return Err(ParquetError::corrupt_data(format!(
            "Level stream declares {} bytes but only {} remain",
            len,
            buf.len() - 4
        )));
    }
    let levels = decode_levels(&buf[4..4 + len], max_level, count)?;
    Ok((levels, 4 + len))
}

/// Decode `count` levels with the bit width implied by `max_level`.
pub fn decode_levels(buf: &[u8], max_level: i16, count: usize) -> Result<Vec<i16>> {
    let width = bitpacked::bit_width(max_level as u64);
    let mut raw = Vec::with_capacity(count);
    decode(buf, width, count, &mut raw)?;
    raw.into_iter()
        .map(|v| {
            if v > max_level as u32 {
                Err(ParquetError::corrupt_data(format!(
                    "Level {} exceeds maximum {}",
                    v, max_level
                )))
            } else {
                Ok(v as i16)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn roundtrip(values: &[u32], width: u8) -> Vec<u8> {
        let mut buf = Vec::new();
        encode(values, width, &mut buf);
        let mut decoded = Vec::new();
        let consumed = decode(&buf, width, values.len(), &mut decoded).unwrap();
        assert_eq!(consumed, buf.len());
        assert_eq!(decoded, values);
        buf
    }

    #[test]
    fn long_run_is_rle() {
        let buf = roundtrip(&[1; 20], 1);
        assert_eq!(buf, vec![20 << 1, 1]);
    }

    #[test]
    fn short_mixed_is_bit_packed() {
        let buf = roundtrip(&[0, 1, 2, 1, 2, 1, 1, 0, 3], 2);
        assert_eq!(
            buf,
            vec![(2 << 1) | 1, 0b01_10_01_00, 0b00_01_01_10, 0b00_00_00_11]
        );
    }

    #[test]
    fn run_after_unaligned_prefix_is_padded_from_the_run() {
        // Three distinct values then twelve 5s: five 5s fill the first group,
        // the remaining seven are too short for RLE and stay bit-packed.
        let mut values = vec![1, 2, 3];
        values.extend(std::iter::repeat(5).take(12));
        let buf = roundtrip(&values, 3);
        assert_eq!(buf[0], (2 << 1) | 1);
        assert_eq!(buf.len(), 1 + 6);

        // With 13 trailing 5s an RLE run of eight starts on the next group boundary.
        let mut values = vec![1, 2, 3];
        values.extend(std::iter::repeat(5).take(13));
        let buf = roundtrip(&values, 3);
        assert_eq!(buf[0], (1 << 1) | 1);
        assert_eq!(&buf[4..], &[8 << 1, 5]);
    }

    #[test]
    fn wide_rle_values_use_multiple_bytes() {
        let buf = roundtrip(&[300; 9], 9);
        assert_eq!(buf, vec![9 << 1, 0x2C, 0x01]);
    }

    #[test]
    fn decode_consumes_only_requested_count() {
        let mut buf = Vec::new();
        encode(&[1, 0, 1], 1, &mut buf);
        let mut decoded = Vec::new();
        decode(&buf, 1, 2, &mut decoded).unwrap();
        assert_eq!(decoded, vec![1, 0]);
    }

    #[test]
    fn truncated_stream_is_corrupt() {
        let mut buf = Vec::new();
        encode(&[1; 10], 1, &mut buf);
        let mut decoded = Vec::new();
        let err = decode(&buf, 1, 11, &mut decoded).unwrap_err();
        assert!(matches!(err, ParquetError::CorruptData(_)));

        let mut decoded = Vec::new();
        let err = decode(&[(4 << 1) | 1, 0xFF], 4, 32, &mut decoded).unwrap_err();
        assert!(matches!(err, ParquetError::CorruptData(_)));
    }

    #[test]
    fn oversized_bit_packed_header_is_corrupt() {
        // ULEB128 header whose group count overflows when scaled to values
        let buf = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0, 0];
        let mut decoded = Vec::new();
        let err = decode(&buf, 1, 4, &mut decoded).unwrap_err();
        assert!(matches!(err, ParquetError::CorruptData(_)), "{}", err);
    }

    #[test]
    fn randomized_level_roundtrips() {
        let mut rng = StdRng::seed_from_u64(42);
        for max_level in [0i16, 1, 7, 255] {
            for len in [0usize, 1, 7, 8, 9, 63, 64, 1000] {
                let levels: Vec<i16> = (0..len)
                    .map(|_| {
                        if rng.random_bool(0.7) {
                            max_level
                        } else {
                            rng.random_range(0..=max_level)
                        }
                    })
                    .collect();
                let mut buf = Vec::new();
                encode_levels_prefixed(&levels, max_level, &mut buf);
                let (decoded, consumed) = decode_levels_prefixed(&buf, max_level, len).unwrap();
                assert_eq!(consumed, buf.len());
                assert_eq!(decoded, levels, "max_level {} len {}", max_level, len);
            }
        }
    }

    #[test]
    fn level_exceeding_max_is_corrupt() {
        let mut buf = Vec::new();
        encode(&[3; 8], 2, &mut buf);
        assert!(decode_levels(&buf, 2, 8).is_err());
    }
}
