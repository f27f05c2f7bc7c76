//! Page compression codecs.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::{ParquetError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    #[default]
    Uncompressed,
    Snappy,
    Gzip,
    Lzo,
    Brotli,
    /// Hadoop-framed LZ4, deprecated in favour of `Lz4Raw`
    Lz4,
    Zstd,
    Lz4Raw,
}

impl Compression {
    pub fn from_thrift(code: i32) -> Result<Self> {
        Ok(match code {
            0 => Compression::Uncompressed,
            1 => Compression::Snappy,
            2 => Compression::Gzip,
            3 => Compression::Lzo,
            4 => Compression::Brotli,
            5 => Compression::Lz4,
            6 => Compression::Zstd,
            7 => Compression::Lz4Raw,
            other => {
                return Err(ParquetError::unsupported_compression(format!(
                    "Unknown compression codec {}",
                    other
                )))
            }
        })
    }

    pub fn to_thrift(self) -> i32 {
        match self {
            Compression::Uncompressed => 0,
            Compression::Snappy => 1,
            Compression::Gzip => 2,
            Compression::Lzo => 3,
            Compression::Brotli => 4,
            Compression::Lz4 => 5,
            Compression::Zstd => 6,
            Compression::Lz4Raw => 7,
        }
    }

    /// Whether this crate can compress and decompress with the codec.
    pub fn is_supported(self) -> bool {
        !matches!(self, Compression::Lzo | Compression::Brotli | Compression::Lz4)
    }

    fn unsupported(self) -> ParquetError {
        ParquetError::unsupported_compression(format!("{:?} is not supported", self))
    }

    /// Compress a whole page payload.
    pub fn compress(self, input: &[u8]) -> Result<Vec<u8>> {
        match self {
            Compression::Uncompressed => Ok(input.to_vec()),
            Compression::Snappy => snap::raw::Encoder::new()
                .compress_vec(input)
                .map_err(|e| ParquetError::internal(format!("Snappy compression failed: {}", e))),
            Compression::Gzip => {
                let mut encoder =
                    flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(input)?;
                Ok(encoder.finish()?)
            }
            Compression::Zstd => Ok(zstd::bulk::compress(input, zstd::DEFAULT_COMPRESSION_LEVEL)?),
            Compression::Lz4Raw => Ok(lz4_flex::block::compress(input)),
            Compression::Lzo | Compression::Brotli | Compression::Lz4 => Err(self.unsupported()),
        }
    }

    /// Decompress a page payload that must expand to exactly `uncompressed_size` bytes.
    pub fn decompress(self, input: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
        let output = match self {
            Compression::Uncompressed => input.to_vec(),
            Compression::Snappy => {
                let len = snap::raw::decompress_len(input).map_err(corrupt("snappy"))?;
                if len != uncompressed_size {
                    return Err(size_mismatch(self, uncompressed_size, len));
                }
                snap::raw::Decoder::new()
                    .decompress_vec(input)
                    .map_err(corrupt("snappy"))?
            }
            Compression::Gzip => {
                let mut output = Vec::with_capacity(uncompressed_size);
                flate2::read::GzDecoder::new(input)
                    .read_to_end(&mut output)
                    .map_err(corrupt("gzip"))?;
                output
            }
            Compression::Zstd => {
                // One spare byte so oversized frames surface as a size mismatch.
                zstd::bulk::decompress(input, uncompressed_size + 1).map_err(corrupt("zstd"))?
            }
            Compression::Lz4Raw => {
                lz4_flex::block::decompress(input, uncompressed_size).map_err(corrupt("lz4"))?
            }
            Compression::Lzo | Compression::Brotli | Compression::Lz4 => {
                return Err(self.unsupported())
            }
        };

        if output.len() != uncompressed_size {
            return Err(size_mismatch(self, uncompressed_size, output.len()));
        }
        Ok(output)
    }
}

fn corrupt<E: std::fmt::Display>(codec: &'static str) -> impl Fn(E) -> ParquetError {
    move |e| ParquetError::corrupt_data(format!("Failed to decompress {} page: {}", codec, e))
}

fn size_mismatch(codec: Compression, expected: usize, actual: usize) -> ParquetError {
    ParquetError::corrupt_data(format!(
        "{:?} page decompressed to {} bytes, header says {}",
        codec, actual, expected
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<u8> {
        (0..4096u32).flat_map(|i| ((i % 97) as u16).to_le_bytes()).collect()
    }

    #[test]
    fn supported_codecs_roundtrip() {
        let input = sample();
        for codec in [
            Compression::Uncompressed,
            Compression::Snappy,
            Compression::Gzip,
            Compression::Zstd,
            Compression::Lz4Raw,
        ] {
            let compressed = codec.compress(&input).unwrap();
            let output = codec.decompress(&compressed, input.len()).unwrap();
            assert_eq!(output, input, "{:?}", codec);
        }
    }

    #[test]
    fn size_mismatch_is_corrupt() {
        let input = sample();
        for codec in [Compression::Uncompressed, Compression::Snappy, Compression::Gzip, Compression::Zstd] {
            let compressed = codec.compress(&input).unwrap();
            let err = codec.decompress(&compressed, input.len() - 1).unwrap_err();
            assert!(matches!(err, ParquetError::CorruptData(_)), "{:?}: {:?}", codec, err);
        }
    }

    #[test]
    fn unsupported_codecs() {
        for codec in [Compression::Lzo, Compression::Brotli, Compression::Lz4] {
            assert!(!codec.is_supported());
            assert!(matches!(
                codec.compress(b"abc"),
                Err(ParquetError::UnsupportedCompression(_))
            ));
            assert!(matches!(
                codec.decompress(b"abc", 3),
                Err(ParquetError::UnsupportedCompression(_))
            ));
        }
        assert!(matches!(
            Compression::from_thrift(99),
            Err(ParquetError::UnsupportedCompression(_))
        ));
    }

    #[test]
    fn thrift_codes() {
        for code in 0..8 {
            assert_eq!(Compression::from_thrift(code).unwrap().to_thrift(), code);
        }
    }

    #[test]
    fn serde_names() {
        let json = serde_json::to_string(&Compression::Lz4Raw).unwrap();
        assert_eq!(json, "\"lz4_raw\"");
        let parsed: Compression = serde_json::from_str("\"zstd\"").unwrap();
        assert_eq!(parsed, Compression::Zstd);
    }
}
