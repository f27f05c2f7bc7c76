use thiserror::Error;

/// Core error type for Parquet operations
#[derive(Error, Debug)]
pub enum ParquetError {
    /// IO errors from the underlying byte source or sink
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors raised by the thrift compact protocol while (de)serializing metadata
    #[error("Thrift error: {0}")]
    Thrift(#[from] thrift::Error),

    /// The bytes are not a Parquet file (bad magic, truncated framing)
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// The source or sink lacks a capability required for the operation
    #[error("Capability error: {0}")]
    Capability(String),

    /// Schema-related errors, including values that do not match their declared type
    #[error("Schema error: {0}")]
    Schema(String),

    /// Page or level data that is internally inconsistent
    #[error("Corrupt data: {0}")]
    CorruptData(String),

    /// Page or value encodings that are unknown or not implemented
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// Compression codecs that are unknown or not implemented
    #[error("Unsupported compression: {0}")]
    UnsupportedCompression(String),

    /// Requested row ranges that cannot be served
    #[error("Range error: {0}")]
    Range(String),

    /// Invalid argument errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Type conversion errors
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Internal errors that shouldn't happen
    #[error("Internal error: {0}")]
    Internal(String),

    /// UTF-8 decoding errors
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Result type alias for Parquet operations
pub type Result<T> = std::result::Result<T, ParquetError>;

impl ParquetError {
    /// Create a new invalid format error
    pub fn invalid_format<S: Into<String>>(msg: S) -> Self {
        ParquetError::InvalidFormat(msg.into())
    }

    /// Create a new capability error
    pub fn capability<S: Into<String>>(msg: S) -> Self {
        ParquetError::Capability(msg.into())
    }

    /// Create a new schema error
    pub fn schema<S: Into<String>>(msg: S) -> Self {
        ParquetError::Schema(msg.into())
    }

    /// Create a new corrupt data error
    pub fn corrupt_data<S: Into<String>>(msg: S) -> Self {
        ParquetError::CorruptData(msg.into())
    }

    /// Create a new unsupported encoding error
    pub fn unsupported_encoding<S: Into<String>>(msg: S) -> Self {
        ParquetError::UnsupportedEncoding(msg.into())
    }

    /// Create a new unsupported compression error
    pub fn unsupported_compression<S: Into<String>>(msg: S) -> Self {
        ParquetError::UnsupportedCompression(msg.into())
    }

    /// Create a new range error
    pub fn range<S: Into<String>>(msg: S) -> Self {
        ParquetError::Range(msg.into())
    }

    /// Create a new invalid argument error
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        ParquetError::InvalidArgument(msg.into())
    }

    /// Create a new conversion error
    pub fn conversion<S: Into<String>>(msg: S) -> Self {
        ParquetError::Conversion(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        ParquetError::Internal(msg.into())
    }
}

/// Extension trait to add context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn context<S: Into<String>>(self, ctx: S) -> Result<T>;

    /// Add context with a closure that's only called on error
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, f: F) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<ParquetError>,
{
    fn context<S: Into<String>>(self, ctx: S) -> Result<T> {
        self.map_err(|e| e.into().prefixed(ctx.into()))
    }

    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, f: F) -> Result<T> {
        self.map_err(|e| e.into().prefixed(f().into()))
    }
}

impl ParquetError {
    /// Prefix the message while keeping the error category, so callers can
    /// still match on the variant after context has been attached.
    fn prefixed(self, ctx: String) -> Self {
        use ParquetError::*;
        match self {
            InvalidFormat(m) => InvalidFormat(format!("{}: {}", ctx, m)),
            Capability(m) => Capability(format!("{}: {}", ctx, m)),
            Schema(m) => Schema(format!("{}: {}", ctx, m)),
            CorruptData(m) => CorruptData(format!("{}: {}", ctx, m)),
            UnsupportedEncoding(m) => UnsupportedEncoding(format!("{}: {}", ctx, m)),
            UnsupportedCompression(m) => UnsupportedCompression(format!("{}: {}", ctx, m)),
            Range(m) => Range(format!("{}: {}", ctx, m)),
            InvalidArgument(m) => InvalidArgument(format!("{}: {}", ctx, m)),
            Conversion(m) => Conversion(format!("{}: {}", ctx, m)),
            Internal(m) => Internal(format!("{}: {}", ctx, m)),
            Io(e) => Io(std::io::Error::new(e.kind(), format!("{}: {}", ctx, e))),
            Thrift(e) => CorruptData(format!("{}: {}", ctx, e)),
            Utf8(e) => CorruptData(format!("{}: {}", ctx, e)),
        }
    }
}
