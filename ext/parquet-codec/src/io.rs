//! Byte sources and sinks.
//!
//! Reading goes through [`ChunkReader`], which serves positional range reads
//! so that a file can be decoded from several threads at once. Streams whose
//! abilities are only known at runtime implement [`ByteStream`] and are gated
//! by [`StreamReader`] / [`StreamWriter`] before any byte is touched.

use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::sync::Mutex;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ParquetError, Result};

/// Total length in bytes of a source.
pub trait Length {
    fn len(&self) -> u64;
}

/// A source that can hand out arbitrary byte ranges.
pub trait ChunkReader: Length + Send + Sync {
    /// Read exactly `length` bytes starting at `start`.
    fn get_bytes(&self, start: u64, length: usize) -> Result<Bytes>;
}

fn check_range(start: u64, length: usize, total: u64) -> Result<()> {
    match start.checked_add(length as u64) {
        Some(end) if end <= total => Ok(()),
        _ => Err(ParquetError::corrupt_data(format!(
            "Range {}+{} is beyond the end of a {} byte source",
            start, length, total
        ))),
    }
}

impl Length for Bytes {
    fn len(&self) -> u64 {
        Bytes::len(self) as u64
    }
}

impl ChunkReader for Bytes {
    fn get_bytes(&self, start: u64, length: usize) -> Result<Bytes> {
        check_range(start, length, Length::len(self))?;
        let start = start as usize;
        Ok(self.slice(start..start + length))
    }
}

impl Length for File {
    /// Reports 0 when the size cannot be read, which fails the framing checks.
    fn len(&self) -> u64 {
        match self.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                warn!("Failed to read file size: {}", e);
                0
            }
        }
    }
}

impl ChunkReader for File {
    #[cfg(unix)]
    fn get_bytes(&self, start: u64, length: usize) -> Result<Bytes> {
        use std::os::unix::fs::FileExt;

        check_range(start, length, Length::len(self))?;
        let mut buf = vec![0; length];
        self.read_exact_at(&mut buf, start)?;
        Ok(buf.into())
    }

    #[cfg(not(unix))]
    fn get_bytes(&self, start: u64, length: usize) -> Result<Bytes> {
        check_range(start, length, Length::len(self))?;
        // A cloned handle shares the cursor, so reads must not interleave.
        let mut file = self.try_clone()?;
        file.seek(SeekFrom::Start(start))?;
        let mut buf = vec![0; length];
        file.read_exact(&mut buf)?;
        Ok(buf.into())
    }
}

/// Abilities a stream reports at runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamCapabilities {
    pub readable: bool,
    pub writable: bool,
    pub seekable: bool,
}

impl StreamCapabilities {
    pub fn read_only() -> Self {
        Self {
            readable: true,
            writable: false,
            seekable: true,
        }
    }

    pub fn all() -> Self {
        Self {
            readable: true,
            writable: true,
            seekable: true,
        }
    }
}

/// A stream that knows what it can do.
pub trait ByteStream {
    fn capabilities(&self) -> StreamCapabilities;
}

impl ByteStream for Cursor<Vec<u8>> {
    fn capabilities(&self) -> StreamCapabilities {
        StreamCapabilities::all()
    }
}

impl ByteStream for Cursor<Bytes> {
    fn capabilities(&self) -> StreamCapabilities {
        StreamCapabilities::read_only()
    }
}

impl ByteStream for Cursor<&[u8]> {
    fn capabilities(&self) -> StreamCapabilities {
        StreamCapabilities::read_only()
    }
}

/// Random-access reads over a readable, seekable stream.
pub struct StreamReader<S> {
    inner: Mutex<S>,
    len: u64,
}

impl<S> std::fmt::Debug for StreamReader<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamReader").field("len", &self.len).finish()
    }
}

impl<S: ByteStream + Read + Seek> StreamReader<S> {
    /// Fails with [`ParquetError::Capability`] when the stream is absent or
    /// cannot both read and seek.
    pub fn try_new(stream: Option<S>) -> Result<Self> {
        let mut stream =
            stream.ok_or_else(|| ParquetError::capability("No input stream was provided"))?;
        let caps = stream.capabilities();
        if !caps.readable {
            return Err(ParquetError::capability("Input stream is not readable"));
        }
        if !caps.seekable {
            return Err(ParquetError::capability("Input stream is not seekable"));
        }
        let len = stream.seek(SeekFrom::End(0))?;
        Ok(Self {
            inner: Mutex::new(stream),
            len,
        })
    }

    pub fn into_inner(self) -> Result<S> {
        self.inner
            .into_inner()
            .map_err(|_| ParquetError::internal("Stream lock was poisoned"))
    }
}

impl<S> Length for StreamReader<S> {
    fn len(&self) -> u64 {
        self.len
    }
}

impl<S: ByteStream + Read + Seek + Send> ChunkReader for StreamReader<S> {
    fn get_bytes(&self, start: u64, length: usize) -> Result<Bytes> {
        check_range(start, length, self.len)?;
        let mut stream = self
            .inner
            .lock()
            .map_err(|_| ParquetError::internal("Stream lock was poisoned"))?;
        stream.seek(SeekFrom::Start(start))?;
        let mut buf = vec![0; length];
        stream.read_exact(&mut buf)?;
        Ok(buf.into())
    }
}

/// Sequential writes into a writable stream.
#[derive(Debug)]
pub struct StreamWriter<S> {
    inner: S,
}

impl<S: ByteStream + Write> StreamWriter<S> {
    /// Fails with [`ParquetError::Capability`] when the stream is absent or
    /// not writable.
    pub fn try_new(stream: Option<S>) -> Result<Self> {
        let stream =
            stream.ok_or_else(|| ParquetError::capability("No output stream was provided"))?;
        if !stream.capabilities().writable {
            return Err(ParquetError::capability("Output stream is not writable"));
        }
        Ok(Self { inner: stream })
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Write> Write for StreamWriter<S> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
