//! Core Parquet writing functionality

use crate::column::writer::{encode_chunk, ColumnWriterOptions, DEFAULT_DATA_PAGE_VALUES};
use crate::column::ColumnValues;
use crate::compression::Compression;
use crate::descriptor::SchemaDescriptor;
use crate::footer::{self, MAGIC};
use crate::metadata::{FileMetadata, FileMetadataBuilder, RowGroupMetadata};
use crate::record::Shredder;
use crate::row::DataSet;
use crate::row_group::DEFAULT_ROW_GROUP_SIZE;
use crate::{ParquetError, ParquetValue, Result, Schema};
use indexmap::IndexMap;
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Arc;
use tracing::debug;

// Default configuration constants
pub const DEFAULT_MEMORY_THRESHOLD: usize = 100 * 1024 * 1024; // 100MB
pub const DEFAULT_SAMPLE_SIZE: usize = 100;
const MIN_ROW_GROUP_ROWS: usize = 10;
const MIN_SAMPLES_FOR_ESTIMATE: usize = 10;

/// Value written to the footer's `created_by` unless overridden.
pub fn default_created_by() -> String {
    format!("parquet-codec version {}", env!("CARGO_PKG_VERSION"))
}

/// Plain writer settings, for callers that load them from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterOptions {
    pub compression: Compression,
    /// Maximum rows per row group
    pub row_group_size: usize,
    pub dictionary_enabled: bool,
    /// Level entries per data page before a new page is started
    pub data_page_values: usize,
    /// Estimated buffered bytes that force an early row group flush
    pub memory_threshold: usize,
    /// Number of row sizes kept for the memory estimate
    pub sample_size: usize,
    pub created_by: Option<String>,
    pub key_value_metadata: IndexMap<String, Option<String>>,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            compression: Compression::Snappy,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
            dictionary_enabled: true,
            data_page_values: DEFAULT_DATA_PAGE_VALUES,
            memory_threshold: DEFAULT_MEMORY_THRESHOLD,
            sample_size: DEFAULT_SAMPLE_SIZE,
            created_by: None,
            key_value_metadata: IndexMap::new(),
        }
    }
}

impl WriterOptions {
    fn column_options(&self) -> ColumnWriterOptions {
        ColumnWriterOptions {
            compression: self.compression,
            dictionary_enabled: self.dictionary_enabled,
            data_page_values: self.data_page_values,
        }
    }
}

/// Builder for creating a configured Writer
#[derive(Debug, Clone, Default)]
pub struct WriterBuilder {
    options: WriterOptions,
}

impl WriterBuilder {
    /// Create a new WriterBuilder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_options(options: WriterOptions) -> Self {
        Self { options }
    }

    /// Set the compression algorithm
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.options.compression = compression;
        self
    }

    /// Set the maximum number of rows per row group
    pub fn with_row_group_size(mut self, rows: usize) -> Self {
        self.options.row_group_size = rows;
        self
    }

    pub fn with_dictionary_enabled(mut self, enabled: bool) -> Self {
        self.options.dictionary_enabled = enabled;
        self
    }

    /// Set the number of level entries after which a data page is closed
    pub fn with_data_page_values(mut self, values: usize) -> Self {
        self.options.data_page_values = values;
        self
    }

    /// Set the memory threshold for flushing
    pub fn with_memory_threshold(mut self, threshold: usize) -> Self {
        self.options.memory_threshold = threshold;
        self
    }

    /// Set the sample size for row size estimation
    pub fn with_sample_size(mut self, size: usize) -> Self {
        self.options.sample_size = size;
        self
    }

    pub fn with_created_by(mut self, created_by: impl Into<String>) -> Self {
        self.options.created_by = Some(created_by.into());
        self
    }

    /// Add one custom key/value pair to the footer
    pub fn with_key_value_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options
            .key_value_metadata
            .insert(key.into(), Some(value.into()));
        self
    }

    /// Build a Writer with the configured settings
    pub fn build<W: Write>(self, mut writer: W, schema: Schema) -> Result<Writer<W>> {
        let options = self.options;
        if options.row_group_size == 0 {
            return Err(ParquetError::invalid_argument("Row group size must be positive"));
        }
        if !options.compression.is_supported() {
            return Err(ParquetError::unsupported_compression(format!(
                "Cannot write {:?} compressed files",
                options.compression
            )));
        }

        let descr = Arc::new(SchemaDescriptor::flatten(&schema)?);
        let metadata = FileMetadataBuilder::new(descr.clone())
            .with_created_by(options.created_by.clone().unwrap_or_else(default_created_by))
            .with_key_value_metadata(options.key_value_metadata.clone());

        writer.write_all(MAGIC)?;

        Ok(Writer {
            sink: writer,
            columns: vec![ColumnValues::new(); descr.num_columns()],
            descr,
            metadata,
            buffered_rows: 0,
            current_row_group_size: options.row_group_size,
            size_samples: Vec::with_capacity(options.sample_size),
            total_rows_written: 0,
            bytes_written: MAGIC.len() as u64,
            poisoned: false,
            options,
        })
    }
}

/// Core Parquet writer that works with any type implementing Write
///
/// Rows are shredded as they arrive and buffered as per-leaf columns until a
/// row group is full. The file is only valid once [`Writer::close`] has
/// written the footer.
pub struct Writer<W: Write> {
    sink: W,
    descr: Arc<SchemaDescriptor>,
    options: WriterOptions,
    metadata: FileMetadataBuilder,
    columns: Vec<ColumnValues>,
    buffered_rows: usize,
    current_row_group_size: usize,
    size_samples: Vec<usize>,
    total_rows_written: usize,
    bytes_written: u64,
    /// Set once a row group write fails part way.
    poisoned: bool,
}

impl<W: Write> Writer<W> {
    /// Create a new writer with default settings
    pub fn new(writer: W, schema: Schema) -> Result<Self> {
        WriterBuilder::new().build(writer, schema)
    }

    pub fn schema(&self) -> &Schema {
        self.descr.schema()
    }

    /// Rows accepted so far, flushed or not.
    pub fn num_rows(&self) -> usize {
        self.total_rows_written + self.buffered_rows
    }

    /// Write a batch of rows to the Parquet file
    ///
    /// Rows before a failing row stay written; the failing row and the rows
    /// after it are not.
    pub fn write_rows<I, R>(&mut self, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[ParquetValue]>,
    {
        self.check_usable()?;

        let descr = Arc::clone(&self.descr);
        let columns = std::mem::take(&mut self.columns);
        let mut shredder = Shredder::resume(&descr, columns, self.num_rows())?;
        let mut result = Ok(());
        for row in rows {
            result = self.push_row(&mut shredder, row.as_ref());
            if result.is_err() {
                break;
            }
        }
        self.columns = shredder.finish();
        result
    }

    /// Write a single row to the Parquet file
    ///
    /// A row that does not match the schema is rejected without affecting
    /// rows written before it.
    pub fn write_row<R: AsRef<[ParquetValue]>>(&mut self, row: R) -> Result<()> {
        self.write_rows(std::iter::once(row))
    }

    fn push_row(&mut self, shredder: &mut Shredder<'_>, row: &[ParquetValue]) -> Result<()> {
        shredder.shred_row(row)?;

        // Sample row size for dynamic row group sizing
        self.sample_row_size(row);
        self.buffered_rows += 1;

        if self.buffered_rows >= self.current_row_group_size {
            let columns = shredder.take_columns();
            self.write_row_group(columns)?;
        }
        Ok(())
    }

    fn check_usable(&self) -> Result<()> {
        if self.poisoned {
            return Err(ParquetError::internal(
                "Writer is unusable after a failed row group write",
            ));
        }
        Ok(())
    }

    /// Sample row size for dynamic row group sizing using reservoir sampling
    fn sample_row_size(&mut self, row: &[ParquetValue]) {
        if self.options.sample_size == 0 {
            return;
        }
        let row_size: usize = row.iter().map(estimate_value_size).sum();

        if self.size_samples.len() < self.options.sample_size {
            self.size_samples.push(row_size);
        } else {
            // Reservoir sampling
            let mut rng = rand::rng();
            let idx = rng.random_range(0..=self.num_rows());
            if idx < self.options.sample_size {
                self.size_samples[idx] = row_size;
            }
        }

        if self.size_samples.len() >= MIN_SAMPLES_FOR_ESTIMATE {
            self.update_row_group_size();
        }
    }

    /// Cap the row group so its estimated size stays under the memory threshold
    fn update_row_group_size(&mut self) {
        let total_size: usize = self.size_samples.iter().sum();
        let avg_row_size = (total_size as f64 / self.size_samples.len() as f64).max(1.0);
        let by_memory = (self.options.memory_threshold as f64 / avg_row_size).floor() as usize;
        self.current_row_group_size = by_memory
            .max(MIN_ROW_GROUP_ROWS)
            .min(self.options.row_group_size);
    }

    /// Encode the buffered rows as one row group and append it to the sink
    fn flush_row_group(&mut self) -> Result<()> {
        if self.buffered_rows == 0 {
            return Ok(());
        }
        let columns = std::mem::replace(
            &mut self.columns,
            vec![ColumnValues::new(); self.descr.num_columns()],
        );
        self.write_row_group(columns)
    }

    /// Encode `columns`, holding the buffered rows, as one row group.
    ///
    /// A failure leaves part of a row group in the sink, so the writer
    /// refuses any further work.
    fn write_row_group(&mut self, columns: Vec<ColumnValues>) -> Result<()> {
        let result = self.append_row_group(&columns);
        if result.is_err() {
            self.poisoned = true;
        }
        result
    }

    fn append_row_group(&mut self, columns: &[ColumnValues]) -> Result<()> {
        let num_rows = self.buffered_rows;

        // Chunks share nothing, so they are encoded in parallel
        let column_options = self.options.column_options();
        let encoded = self
            .descr
            .leaves()
            .par_iter()
            .zip(columns.par_iter())
            .map(|(descr, values)| encode_chunk(descr, values, &column_options))
            .collect::<Result<Vec<_>>>()?;

        let start = self.bytes_written;
        let mut chunks = Vec::with_capacity(encoded.len());
        for chunk in encoded {
            let base = self.bytes_written as i64;
            self.sink.write_all(&chunk.data)?;
            self.bytes_written += chunk.data.len() as u64;
            chunks.push(chunk.metadata.with_base_offset(base));
        }

        self.metadata
            .add_row_group(RowGroupMetadata::new(chunks, num_rows as i64));
        self.total_rows_written += num_rows;
        self.buffered_rows = 0;

        debug!(
            row_group = self.metadata.num_row_groups() - 1,
            rows = num_rows,
            bytes = self.bytes_written - start,
            "flushed row group"
        );
        Ok(())
    }

    /// Write columns to the Parquet file
    ///
    /// Each element is a tuple of (column_name, values); every top-level field
    /// must appear exactly once and all columns must have the same length.
    pub fn write_columns(&mut self, columns: Vec<(String, Vec<ParquetValue>)>) -> Result<()> {
        if columns.is_empty() {
            return Ok(());
        }

        let fields = self.descr.schema().fields();
        if columns.len() != fields.len() {
            return Err(ParquetError::schema(format!(
                "Provided {} columns but schema has {} fields",
                columns.len(),
                fields.len()
            )));
        }

        let num_rows = columns[0].1.len();
        if let Some((name, values)) = columns.iter().find(|(_, v)| v.len() != num_rows) {
            return Err(ParquetError::schema(format!(
                "Column '{}' has {} values but '{}' has {}",
                name,
                values.len(),
                columns[0].0,
                num_rows
            )));
        }

        // Sort columns to match schema order
        let mut ordered = Vec::with_capacity(fields.len());
        let mut remaining = columns;
        for field in fields {
            let pos = remaining
                .iter()
                .position(|(name, _)| name == field.name())
                .ok_or_else(|| ParquetError::schema(format!("Missing column: {}", field.name())))?;
            ordered.push(remaining.swap_remove(pos).1.into_iter());
        }

        let rows = (0..num_rows).map(|_| {
            ordered
                .iter_mut()
                .map(|values| values.next().unwrap_or(ParquetValue::Null))
                .collect::<Vec<_>>()
        });
        self.write_rows(rows)
    }

    /// Flush buffered rows as a row group and flush the sink
    pub fn flush(&mut self) -> Result<()> {
        self.check_usable()?;
        self.flush_row_group()?;
        self.sink.flush()?;
        Ok(())
    }

    /// Close the writer and write the file footer
    ///
    /// This must be called to finalize the Parquet file
    pub fn close(mut self) -> Result<FileMetadata> {
        self.check_usable()?;
        self.flush_row_group()?;

        let metadata = self.metadata.build();
        footer::write_metadata(&mut self.sink, &metadata)?;
        self.sink.flush()?;

        debug!(
            rows = metadata.num_rows(),
            row_groups = metadata.num_row_groups(),
            "closed parquet writer"
        );
        Ok(metadata)
    }
}

/// Write a whole dataset in one call.
///
/// The dataset's `created_by` and key/value metadata take precedence over
/// those in `options`.
pub fn write_dataset<W: Write>(
    writer: W,
    dataset: &DataSet,
    options: &WriterOptions,
) -> Result<FileMetadata> {
    let mut options = options.clone();
    if dataset.created_by.is_some() {
        options.created_by = dataset.created_by.clone();
    }
    options
        .key_value_metadata
        .extend(dataset.metadata.iter().map(|(k, v)| (k.clone(), v.clone())));

    let mut writer = WriterBuilder::from_options(options).build(writer, dataset.schema.clone())?;
    writer.write_rows(&dataset.rows)?;
    writer.close()
}

/// Estimate the memory footprint of a single value
fn estimate_value_size(value: &ParquetValue) -> usize {
    use ParquetValue::*;

    match value {
        Null => 0,

        // Fixed size types
        Boolean(_) | Int8(_) | UInt8(_) => 1,
        Int16(_) | UInt16(_) => 2,
        Int32(_) | UInt32(_) | Float32(_) | Date32(_) | TimeMillis(_) => 4,
        Int64(_) | UInt64(_) | Float64(_) | TimeMicros(_) | TimeNanos(_) => 8,
        TimestampMillis(_, _) | TimestampMicros(_, _) | TimestampNanos(_, _) => 8,
        Decimal128(_, _) => 16,
        Decimal256(v, _) => 32 + v.to_signed_bytes_le().len(),

        // Variable size types
        String(s) => s.len() + std::mem::size_of::<usize>() * 3,
        Bytes(b) => b.len() + std::mem::size_of::<usize>() * 3,

        // Complex types
        List(items) => {
            let base_size = std::mem::size_of::<usize>() * 3;
            if items.is_empty() {
                base_size
            } else {
                // Sample up to 5 elements
                let sample_count = items.len().min(5);
                let sample_size: usize = items.iter().take(sample_count).map(estimate_value_size).sum();
                base_size + (sample_size / sample_count) * items.len()
            }
        }
        Map(entries) => {
            let base_size = std::mem::size_of::<usize>() * 4;
            if entries.is_empty() {
                base_size
            } else {
                let sample_count = entries.len().min(5);
                let sample_size: usize = entries
                    .iter()
                    .take(sample_count)
                    .map(|(k, v)| estimate_value_size(k) + estimate_value_size(v))
                    .sum();
                base_size + (sample_size / sample_count) * entries.len()
            }
        }
        Record(fields) => {
            std::mem::size_of::<usize>() * 3 + fields.values().map(estimate_value_size).sum::<usize>()
        }
    }
}
