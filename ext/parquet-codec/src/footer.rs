//! File framing: `PAR1`, row groups, thrift footer, footer length, `PAR1`.

use std::io::Write;

use tracing::debug;

use crate::error::{ParquetError, Result};
use crate::format::{self, read_thrift, write_thrift};
use crate::io::ChunkReader;
use crate::metadata::FileMetadata;

pub const MAGIC: &[u8; 4] = b"PAR1";

/// Footer length plus trailing magic.
pub const FOOTER_SIZE: usize = 8;

/// Smallest possible file: both magics and a footer length.
pub const MIN_FILE_SIZE: u64 = (MAGIC.len() + FOOTER_SIZE) as u64;

/// Validate the trailing eight bytes and return the metadata length.
pub fn decode_footer(tail: &[u8]) -> Result<usize> {
    if tail.len() != FOOTER_SIZE {
        return Err(ParquetError::invalid_format(format!(
            "Footer must be {} bytes, got {}",
            FOOTER_SIZE,
            tail.len()
        )));
    }
    if &tail[4..] != MAGIC {
        return Err(ParquetError::invalid_format(
            "Missing PAR1 magic at the end of the file",
        ));
    }
    let len = u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]);
    Ok(len as usize)
}

/// Validate the framing of `reader` and parse its metadata.
pub fn parse_metadata<R: ChunkReader + ?Sized>(reader: &R) -> Result<FileMetadata> {
    let file_len = reader.len();
    if file_len < MIN_FILE_SIZE {
        return Err(ParquetError::invalid_format(format!(
            "File of {} bytes is too small to be a Parquet file",
            file_len
        )));
    }
    if reader.get_bytes(0, MAGIC.len())?.as_ref() != MAGIC {
        return Err(ParquetError::invalid_format(
            "Missing PAR1 magic at the start of the file",
        ));
    }

    let tail = reader.get_bytes(file_len - FOOTER_SIZE as u64, FOOTER_SIZE)?;
    let metadata_len = decode_footer(&tail)?;
    if metadata_len as u64 > file_len - MIN_FILE_SIZE {
        return Err(ParquetError::invalid_format(format!(
            "Footer length {} exceeds the {} byte file",
            metadata_len, file_len
        )));
    }

    let start = file_len - FOOTER_SIZE as u64 - metadata_len as u64;
    let buf = reader.get_bytes(start, metadata_len)?;
    let (meta, _) = read_thrift::<format::FileMetaData>(&buf)
        .map_err(|e| ParquetError::invalid_format(format!("Unreadable file metadata: {}", e)))?;
    debug!(
        metadata_len,
        num_rows = meta.num_rows,
        row_groups = meta.row_groups.len(),
        "parsed parquet footer"
    );
    FileMetadata::from_thrift(meta)
}

/// Write the metadata, its length and the closing magic. Returns bytes written.
pub fn write_metadata<W: Write + ?Sized>(sink: &mut W, metadata: &FileMetadata) -> Result<usize> {
    let mut buf = Vec::new();
    let len = write_thrift(&metadata.to_thrift(), &mut buf)?;
    let len32 = u32::try_from(len).map_err(|_| {
        ParquetError::internal(format!("File metadata of {} bytes is too large", len))
    })?;
    buf.extend_from_slice(&len32.to_le_bytes());
    buf.extend_from_slice(MAGIC);
    sink.write_all(&buf)?;
    Ok(buf.len())
}
