//! Core Parquet reading functionality

use crate::column::reader::decode_chunk;
use crate::column::ColumnValues;
use crate::footer::parse_metadata;
use crate::io::{ByteStream, ChunkReader, StreamReader};
use crate::metadata::FileMetadata;
use crate::record::RecordAssembler;
use crate::row::{DataSet, Row};
use crate::row_group::{resolve_window, RowGroupSlice};
use crate::{ErrorContext, ParquetError, ParquetValue, Result, Schema, SchemaNode};
use bytes::Bytes;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::{Read, Seek};
use std::sync::Arc;
use tracing::{debug, trace};

/// Plain read settings, for callers that load them from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    /// First row to return; negative offsets are rejected
    pub offset: i64,
    /// Maximum number of rows, `None` for all remaining rows
    pub count: Option<usize>,
    /// Top-level fields to read, `None` for all of them
    pub columns: Option<Vec<String>>,
}

/// Core Parquet reader over any [`ChunkReader`]
///
/// The footer is parsed once on open and shared by every iterator the reader
/// hands out. Cloning a reader is cheap.
pub struct Reader<R> {
    source: Arc<R>,
    metadata: Arc<FileMetadata>,
}

impl<R> Clone for Reader<R> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

impl<S> Reader<StreamReader<S>>
where
    S: ByteStream + Read + Seek + Send,
{
    /// Open a runtime-capability stream; it must be present, readable and seekable.
    pub fn from_stream(stream: Option<S>) -> Result<Self> {
        Self::try_new(StreamReader::try_new(stream)?)
    }
}

impl<R: ChunkReader> Reader<R> {
    /// Validate the framing and parse the footer
    pub fn try_new(source: R) -> Result<Self> {
        let metadata = parse_metadata(&source)?;
        debug!(
            bytes = source.len(),
            rows = metadata.num_rows(),
            row_groups = metadata.num_row_groups(),
            columns = metadata.schema_descr().num_columns(),
            created_by = metadata.created_by().unwrap_or(""),
            "opened parquet file"
        );
        Ok(Self {
            source: Arc::new(source),
            metadata: Arc::new(metadata),
        })
    }

    /// Get the Parquet file metadata
    pub fn metadata(&self) -> &Arc<FileMetadata> {
        &self.metadata
    }

    pub fn schema(&self) -> &Schema {
        self.metadata.schema_descr().schema()
    }

    /// Rows in the whole file
    pub fn num_rows(&self) -> usize {
        self.metadata.num_rows() as usize
    }

    /// Read rows from the Parquet file
    ///
    /// Rows are decoded one row group at a time as the iterator advances.
    pub fn read_rows(&self) -> Result<RowIterator<R>> {
        self.rows(self.all_fields(), 0, None)
    }

    /// Read rows with column projection
    ///
    /// Only the named top-level fields are decoded; rows hold them in schema
    /// order. An empty projection yields empty rows.
    pub fn read_rows_with_projection(&self, columns: &[String]) -> Result<RowIterator<R>> {
        let fields = self.projection(columns)?;
        self.rows(fields, 0, None)
    }

    /// Read the rows `[offset, offset + count)`
    ///
    /// A negative offset is a [`ParquetError::Range`]. Windows running past
    /// the end are clamped; row groups outside the window are never read.
    pub fn read_window(&self, offset: i64, count: Option<usize>) -> Result<RowIterator<R>> {
        self.rows(self.all_fields(), offset, count)
    }

    /// Read a window of rows together with the file-level metadata
    pub fn read_dataset(&self, options: &ReaderOptions) -> Result<DataSet> {
        let fields = match &options.columns {
            Some(columns) => self.projection(columns)?,
            None => self.all_fields(),
        };
        let schema = self.projected_schema(&fields);
        let rows = self
            .rows(fields, options.offset, options.count)?
            .collect::<Result<Vec<_>>>()?;

        Ok(DataSet {
            schema,
            rows,
            created_by: self.metadata.created_by().map(str::to_string),
            metadata: self.metadata.key_value_metadata().clone(),
            total_row_count: self.num_rows(),
        })
    }

    /// Read columns from the Parquet file
    ///
    /// Returns one batch per row group, each holding the values of every
    /// top-level field. A file without rows yields a single empty batch.
    pub fn read_columns(&self) -> Result<ColumnIterator<R>> {
        self.columns(self.all_fields())
    }

    /// Read columns with projection
    pub fn read_columns_with_projection(&self, columns: &[String]) -> Result<ColumnIterator<R>> {
        let fields = self.projection(columns)?;
        self.columns(fields)
    }

    fn all_fields(&self) -> Vec<usize> {
        (0..self.schema().fields().len()).collect()
    }

    /// Field indices for `columns`, in schema order
    fn projection(&self, columns: &[String]) -> Result<Vec<usize>> {
        let descr = self.metadata.schema_descr();
        if let Some(unknown) = columns.iter().find(|c| descr.field_index(c).is_none()) {
            return Err(ParquetError::schema(format!(
                "Unknown column '{}' in projection",
                unknown
            )));
        }
        Ok(self
            .schema()
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, field)| columns.iter().any(|c| c == field.name()))
            .map(|(idx, _)| idx)
            .collect())
    }

    fn projected_schema(&self, fields: &[usize]) -> Schema {
        let schema = self.schema();
        Schema {
            root: SchemaNode::Struct {
                name: schema.root.name().to_string(),
                nullable: false,
                fields: fields.iter().map(|&idx| schema.fields()[idx].clone()).collect(),
            },
        }
    }

    fn row_counts(&self) -> Vec<usize> {
        self.metadata
            .row_groups()
            .iter()
            .map(|rg| rg.num_rows() as usize)
            .collect()
    }

    fn rows(&self, fields: Vec<usize>, offset: i64, count: Option<usize>) -> Result<RowIterator<R>> {
        let slices = resolve_window(&self.row_counts(), offset, count)?;

        Ok(RowIterator {
            loader: self.loader(fields),
            slices: slices.into_iter(),
            current: Vec::new().into_iter(),
            failed: false,
        })
    }

    fn columns(&self, fields: Vec<usize>) -> Result<ColumnIterator<R>> {
        let slices = resolve_window(&self.row_counts(), 0, None)?;
        Ok(ColumnIterator {
            names: fields
                .iter()
                .map(|&idx| self.schema().fields()[idx].name().to_string())
                .collect(),
            loader: self.loader(fields),
            returned_empty_batch: false,
            is_empty_file: slices.is_empty(),
            slices: slices.into_iter(),
        })
    }

    fn loader(&self, fields: Vec<usize>) -> RowGroupLoader<R> {
        RowGroupLoader {
            source: self.source.clone(),
            metadata: self.metadata.clone(),
            fields,
        }
    }
}

/// Decodes the projected part of one row group at a time.
struct RowGroupLoader<R> {
    source: Arc<R>,
    metadata: Arc<FileMetadata>,
    fields: Vec<usize>,
}

impl<R: ChunkReader> RowGroupLoader<R> {
    fn load(&self, slice: RowGroupSlice) -> Result<Vec<Row>> {
        let descr = self.metadata.schema_descr();
        let row_group = self.metadata.row_group(slice.row_group);

        // Fetch sequentially, then decode chunks in parallel
        let leaves: Vec<usize> = self
            .fields
            .iter()
            .flat_map(|&field| descr.field_leaf_range(field))
            .collect();
        let chunks = leaves
            .iter()
            .map(|&leaf| {
                let (start, len) = row_group.column(leaf).byte_range();
                Ok((leaf, self.source.get_bytes(start, len as usize)?))
            })
            .collect::<Result<Vec<(usize, Bytes)>>>()?;
        let decoded = chunks
            .into_par_iter()
            .map(|(leaf, data)| Ok((leaf, decode_chunk(data, row_group.column(leaf))?)))
            .collect::<Result<Vec<(usize, ColumnValues)>>>()?;

        let mut columns = vec![None; descr.num_columns()];
        for (leaf, values) in decoded {
            columns[leaf] = Some(values);
        }

        let mut assembler =
            RecordAssembler::new(descr, &self.fields, columns, row_group.num_rows() as usize)?;
        assembler.skip_rows(slice.skip)?;
        let mut rows = Vec::with_capacity(slice.take);
        for _ in 0..slice.take {
            match assembler.next_row()? {
                Some(values) => rows.push(Row::new(values)),
                None => {
                    return Err(ParquetError::corrupt_data(
                        "Row group ended before its declared row count",
                    ))
                }
            }
        }
        if assembler.remaining_rows() == 0 {
            assembler.finish()?;
        }

        trace!(
            row_group = slice.row_group,
            skip = slice.skip,
            rows = rows.len(),
            columns = leaves.len(),
            "decoded row group"
        );
        Ok(rows)
    }
}

/// Iterator over rows in a Parquet file
pub struct RowIterator<R> {
    loader: RowGroupLoader<R>,
    slices: std::vec::IntoIter<RowGroupSlice>,
    current: std::vec::IntoIter<Row>,
    failed: bool,
}

impl<R: ChunkReader> Iterator for RowIterator<R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.current.next() {
                return Some(Ok(row));
            }
            if self.failed {
                return None;
            }

            // Need to load the next row group
            let slice = self.slices.next()?;
            match self
                .loader
                .load(slice)
                .with_context(|| format!("row group {}", slice.row_group))
            {
                Ok(rows) => self.current = rows.into_iter(),
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// A batch of columns with their names
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnBatch {
    pub columns: Vec<(String, Vec<ParquetValue>)>,
}

impl ColumnBatch {
    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|(_, values)| values.len()).unwrap_or(0)
    }
}

/// Iterator over column batches in a Parquet file, one per row group
pub struct ColumnIterator<R> {
    loader: RowGroupLoader<R>,
    names: Vec<String>,
    slices: std::vec::IntoIter<RowGroupSlice>,
    returned_empty_batch: bool,
    is_empty_file: bool,
}

impl<R: ChunkReader> Iterator for ColumnIterator<R> {
    type Item = Result<ColumnBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        // Return one batch with empty columns to show schema
        if self.is_empty_file && !self.returned_empty_batch {
            self.returned_empty_batch = true;
            let columns = self.names.iter().map(|name| (name.clone(), Vec::new())).collect();
            return Some(Ok(ColumnBatch { columns }));
        }

        let slice = self.slices.next()?;
        let rows = match self
            .loader
            .load(slice)
            .with_context(|| format!("row group {}", slice.row_group))
        {
            Ok(rows) => rows,
            Err(e) => {
                self.slices = Vec::new().into_iter();
                return Some(Err(e));
            }
        };

        let mut columns: Vec<(String, Vec<ParquetValue>)> = self
            .names
            .iter()
            .map(|name| (name.clone(), Vec::with_capacity(rows.len())))
            .collect();
        for row in rows {
            for (column, value) in columns.iter_mut().zip(row) {
                column.1.push(value);
            }
        }
        Some(Ok(ColumnBatch { columns }))
    }
}
