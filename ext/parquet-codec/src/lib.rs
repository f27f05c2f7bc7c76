//! Self-contained reader and writer for Apache Parquet files
//!
//! `parquet-codec` converts between nested rows of [`ParquetValue`]s and
//! Parquet's flat column chunks without going through Arrow.
//!
//! # Key Components
//!
//! - **Writer**: rows in, file out
//!   - Rows are shredded into per-leaf columns ([`record::Shredder`])
//!   - Row groups are bounded by row count and estimated memory
//!   - Column chunks are encoded in parallel; dictionary, RLE/bit-packed
//!     levels, per-page compression and statistics are handled per chunk
//!   - Uses `std::io::Write` for output flexibility
//!
//! - **Reader**: file in, rows out
//!   - Row-wise iteration through [`reader::Reader`], optionally projected
//!     or restricted to a window of rows
//!   - Column-wise batches, one per row group
//!   - Uses [`io::ChunkReader`] for positional reads from bytes, files and
//!     capability-checked streams
//!
//! - **Schema**: Type-safe schema representation
//!   - Builder API for constructing schemas
//!   - Support for nested types (structs, lists, maps)
//!   - Flattening to leaf columns with repetition/definition levels in
//!     [`descriptor`]
//!   - Schema introspection through the [`traits::SchemaInspector`] trait
//!
//! - **Values**: [`ParquetValue`] covers every supported logical type,
//!   including 128/256-bit decimals and temporal types
//!
//! # Example Usage
//!
//! ```
//! use parquet_codec::{ParquetValue, PrimitiveType, Reader, SchemaBuilder, SchemaNode, Writer};
//!
//! let schema = SchemaBuilder::new()
//!     .with_root(SchemaNode::Struct {
//!         name: "root".to_string(),
//!         nullable: false,
//!         fields: vec![SchemaNode::Primitive {
//!             name: "id".to_string(),
//!             primitive_type: PrimitiveType::Int64,
//!             nullable: false,
//!             format: None,
//!         }],
//!     })
//!     .build()?;
//!
//! let mut buf = Vec::new();
//! let mut writer = Writer::new(&mut buf, schema)?;
//! writer.write_row(vec![ParquetValue::Int64(42)])?;
//! writer.close()?;
//!
//! let reader = Reader::try_new(bytes::Bytes::from(buf))?;
//! let rows = reader.read_rows()?.collect::<parquet_codec::Result<Vec<_>>>()?;
//! assert_eq!(rows[0].get::<i64>(0)?, Some(42));
//! # Ok::<(), parquet_codec::ParquetError>(())
//! ```

pub mod column;
pub mod compression;
pub mod conversion;
pub mod descriptor;
pub mod encoding;
pub mod error;
pub mod footer;
pub mod format;
pub mod io;
pub mod metadata;
pub mod page;
pub mod reader;
pub mod record;
pub mod row;
pub mod row_group;
pub mod schema;
pub mod statistics;
pub mod traits;
pub mod types;
pub mod value;
pub mod writer;

#[cfg(test)]
pub mod test_utils;

pub use compression::Compression;
pub use descriptor::{ColumnDescriptor, SchemaDescriptor};
pub use error::{ErrorContext, ParquetError, Result};
pub use io::{ByteStream, ChunkReader, Length, StreamCapabilities, StreamReader, StreamWriter};
pub use metadata::{ColumnChunkMetadata, FileMetadata, RowGroupMetadata};
pub use reader::{ColumnBatch, Reader, ReaderOptions};
pub use row::{DataSet, FromParquetValue, Row};
pub use schema::{PrimitiveType, Repetition, Schema, SchemaBuilder, SchemaNode};
pub use statistics::Statistics;
pub use value::ParquetValue;
pub use writer::{write_dataset, Writer, WriterBuilder, WriterOptions};
