//! Typed file, row group and column chunk metadata.
//!
//! These wrap the thrift structs from [`crate::format`] with validated enums
//! and a reference to the column they describe. Metadata is built once by the
//! writer through [`FileMetadataBuilder`] and parsed once by the reader; both
//! sides then share it read-only.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::compression::Compression;
use crate::descriptor::{ColumnDescriptor, SchemaDescriptor};
use crate::encoding::Encoding;
use crate::error::{ErrorContext, ParquetError, Result};
use crate::format::{self, ColumnChunk, ColumnMetaData, EncodedStatistics, KeyValue, RowGroup};
use crate::statistics::Statistics;
use crate::types::PhysicalType;

/// Format version written to the footer.
pub const FORMAT_VERSION: i32 = 1;

/// Metadata of one column chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnChunkMetadata {
    pub(crate) descr: Arc<ColumnDescriptor>,
    pub(crate) encodings: Vec<Encoding>,
    pub(crate) compression: Compression,
    pub(crate) num_values: i64,
    pub(crate) total_compressed_size: i64,
    pub(crate) total_uncompressed_size: i64,
    pub(crate) data_page_offset: i64,
    pub(crate) dictionary_page_offset: Option<i64>,
    pub(crate) statistics: Option<EncodedStatistics>,
}

impl ColumnChunkMetadata {
    pub fn column_descr(&self) -> &Arc<ColumnDescriptor> {
        &self.descr
    }

    pub fn column_path(&self) -> &[String] {
        &self.descr.path
    }

    pub fn physical_type(&self) -> PhysicalType {
        self.descr.physical_type
    }

    pub fn encodings(&self) -> &[Encoding] {
        &self.encodings
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Number of level entries (values plus nulls) in the chunk.
    pub fn num_values(&self) -> i64 {
        self.num_values
    }

    pub fn compressed_size(&self) -> i64 {
        self.total_compressed_size
    }

    pub fn uncompressed_size(&self) -> i64 {
        self.total_uncompressed_size
    }

    pub fn data_page_offset(&self) -> i64 {
        self.data_page_offset
    }

    pub fn dictionary_page_offset(&self) -> Option<i64> {
        self.dictionary_page_offset
    }

    /// Byte range `(start, length)` of the chunk within the file.
    pub fn byte_range(&self) -> (u64, u64) {
        let start = match self.dictionary_page_offset {
            Some(offset) if offset > 0 && offset < self.data_page_offset => offset,
            _ => self.data_page_offset,
        };
        (start as u64, self.total_compressed_size as u64)
    }

    /// Statistics decoded into typed values, if the writer stored any.
    pub fn statistics(&self) -> Result<Option<Statistics>> {
        self.statistics
            .as_ref()
            .map(|encoded| Statistics::decode(encoded, &self.descr))
            .transpose()
    }

    /// Shift chunk-relative offsets to absolute file offsets.
    pub(crate) fn with_base_offset(mut self, base: i64) -> Self {
        self.data_page_offset += base;
        self.dictionary_page_offset = self.dictionary_page_offset.map(|o| o + base);
        self
    }

    fn to_thrift(&self) -> ColumnChunk {
        let (start, _) = self.byte_range();
        ColumnChunk {
            file_path: None,
            file_offset: start as i64,
            meta_data: Some(ColumnMetaData {
                physical_type: self.descr.physical_type.to_thrift(),
                encodings: self.encodings.iter().map(|e| e.to_thrift()).collect(),
                path_in_schema: self.descr.path.clone(),
                codec: self.compression.to_thrift(),
                num_values: self.num_values,
                total_uncompressed_size: self.total_uncompressed_size,
                total_compressed_size: self.total_compressed_size,
                key_value_metadata: None,
                data_page_offset: self.data_page_offset,
                index_page_offset: None,
                dictionary_page_offset: self.dictionary_page_offset,
                statistics: self.statistics.clone(),
            }),
        }
    }

    fn from_thrift(chunk: ColumnChunk, descr: &Arc<ColumnDescriptor>) -> Result<Self> {
        if let Some(path) = &chunk.file_path {
            return Err(ParquetError::invalid_format(format!(
                "Column '{}' is stored in external file '{}'",
                descr.path_string(),
                path
            )));
        }
        let meta = chunk.meta_data.ok_or_else(|| {
            ParquetError::invalid_format(format!(
                "Column chunk for '{}' has no metadata",
                descr.path_string()
            ))
        })?;
        if meta.path_in_schema != descr.path {
            return Err(ParquetError::invalid_format(format!(
                "Column chunk path '{}' does not match schema column '{}'",
                meta.path_in_schema.join("."),
                descr.path_string()
            )));
        }
        if meta.physical_type != descr.physical_type.to_thrift() {
            return Err(ParquetError::invalid_format(format!(
                "Column '{}' chunk has physical type code {} but the schema says {:?}",
                descr.path_string(),
                meta.physical_type,
                descr.physical_type
            )));
        }
        if meta.total_compressed_size < 0 || meta.data_page_offset < 0 || meta.num_values < 0 {
            return Err(ParquetError::invalid_format(format!(
                "Column '{}' has negative offsets or sizes",
                descr.path_string()
            )));
        }

        let encodings = meta
            .encodings
            .iter()
            .map(|code| Encoding::from_thrift(*code))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            descr: descr.clone(),
            encodings,
            compression: Compression::from_thrift(meta.codec)?,
            num_values: meta.num_values,
            total_compressed_size: meta.total_compressed_size,
            total_uncompressed_size: meta.total_uncompressed_size,
            data_page_offset: meta.data_page_offset,
            dictionary_page_offset: meta.dictionary_page_offset,
            statistics: meta.statistics,
        })
    }
}

/// Metadata of one row group.
#[derive(Debug, Clone, PartialEq)]
pub struct RowGroupMetadata {
    columns: Vec<ColumnChunkMetadata>,
    num_rows: i64,
    total_byte_size: i64,
    file_offset: i64,
}

impl RowGroupMetadata {
    pub(crate) fn new(columns: Vec<ColumnChunkMetadata>, num_rows: i64) -> Self {
        let total_byte_size = columns.iter().map(|c| c.total_uncompressed_size).sum();
        let file_offset = columns.first().map(|c| c.byte_range().0 as i64).unwrap_or(0);
        Self {
            columns,
            num_rows,
            total_byte_size,
            file_offset,
        }
    }

    pub fn num_rows(&self) -> i64 {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[ColumnChunkMetadata] {
        &self.columns
    }

    pub fn column(&self, idx: usize) -> &ColumnChunkMetadata {
        &self.columns[idx]
    }

    /// Sum of uncompressed chunk sizes.
    pub fn total_byte_size(&self) -> i64 {
        self.total_byte_size
    }

    pub fn compressed_size(&self) -> i64 {
        self.columns.iter().map(|c| c.total_compressed_size).sum()
    }

    pub fn file_offset(&self) -> i64 {
        self.file_offset
    }

    fn to_thrift(&self, ordinal: usize) -> RowGroup {
        RowGroup {
            columns: self.columns.iter().map(ColumnChunkMetadata::to_thrift).collect(),
            total_byte_size: self.total_byte_size,
            num_rows: self.num_rows,
            file_offset: Some(self.file_offset),
            total_compressed_size: Some(self.compressed_size()),
            ordinal: i16::try_from(ordinal).ok(),
        }
    }

    fn from_thrift(row_group: RowGroup, schema: &SchemaDescriptor) -> Result<Self> {
        if row_group.columns.len() != schema.num_columns() {
            return Err(ParquetError::invalid_format(format!(
                "Row group has {} column chunks but the schema has {} columns",
                row_group.columns.len(),
                schema.num_columns()
            )));
        }
        if row_group.num_rows < 0 {
            return Err(ParquetError::invalid_format(format!(
                "Row group has a negative row count {}",
                row_group.num_rows
            )));
        }
        let columns = row_group
            .columns
            .into_iter()
            .zip(schema.leaves())
            .map(|(chunk, descr)| ColumnChunkMetadata::from_thrift(chunk, descr))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            file_offset: row_group
                .file_offset
                .unwrap_or_else(|| columns.first().map(|c| c.byte_range().0 as i64).unwrap_or(0)),
            columns,
            num_rows: row_group.num_rows,
            total_byte_size: row_group.total_byte_size,
        })
    }
}

/// Metadata of a whole file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileMetadata {
    version: i32,
    schema_descr: Arc<SchemaDescriptor>,
    num_rows: i64,
    row_groups: Vec<RowGroupMetadata>,
    key_value_metadata: IndexMap<String, Option<String>>,
    created_by: Option<String>,
}

impl FileMetadata {
    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn schema_descr(&self) -> &Arc<SchemaDescriptor> {
        &self.schema_descr
    }

    pub fn num_rows(&self) -> i64 {
        self.num_rows
    }

    pub fn num_row_groups(&self) -> usize {
        self.row_groups.len()
    }

    pub fn row_groups(&self) -> &[RowGroupMetadata] {
        &self.row_groups
    }

    pub fn row_group(&self, idx: usize) -> &RowGroupMetadata {
        &self.row_groups[idx]
    }

    pub fn key_value_metadata(&self) -> &IndexMap<String, Option<String>> {
        &self.key_value_metadata
    }

    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    pub(crate) fn to_thrift(&self) -> format::FileMetaData {
        let key_value_metadata = (!self.key_value_metadata.is_empty()).then(|| {
            self.key_value_metadata
                .iter()
                .map(|(key, value)| KeyValue {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect()
        });
        format::FileMetaData {
            version: self.version,
            schema: self.schema_descr.elements().to_vec(),
            num_rows: self.num_rows,
            row_groups: self
                .row_groups
                .iter()
                .enumerate()
                .map(|(idx, rg)| rg.to_thrift(idx))
                .collect(),
            key_value_metadata,
            created_by: self.created_by.clone(),
        }
    }

    pub(crate) fn from_thrift(meta: format::FileMetaData) -> Result<Self> {
        let schema_descr = Arc::new(
            SchemaDescriptor::from_elements(meta.schema).context("Failed to read file schema")?,
        );
        let row_groups = meta
            .row_groups
            .into_iter()
            .enumerate()
            .map(|(idx, rg)| {
                RowGroupMetadata::from_thrift(rg, &schema_descr)
                    .with_context(|| format!("Invalid metadata for row group {}", idx))
            })
            .collect::<Result<Vec<_>>>()?;

        let total = row_groups
            .iter()
            .try_fold(0i64, |acc, rg| acc.checked_add(rg.num_rows))
            .ok_or_else(|| ParquetError::invalid_format("Row group row counts overflow"))?;
        if total != meta.num_rows {
            return Err(ParquetError::invalid_format(format!(
                "File declares {} rows but its row groups hold {}",
                meta.num_rows, total
            )));
        }

        let key_value_metadata = meta
            .key_value_metadata
            .unwrap_or_default()
            .into_iter()
            .map(|kv| (kv.key, kv.value))
            .collect();

        Ok(Self {
            version: meta.version,
            schema_descr,
            num_rows: meta.num_rows,
            row_groups,
            key_value_metadata,
            created_by: meta.created_by,
        })
    }
}

/// Accumulates row groups during a write and produces the final [`FileMetadata`].
#[derive(Debug)]
pub struct FileMetadataBuilder {
    schema_descr: Arc<SchemaDescriptor>,
    row_groups: Vec<RowGroupMetadata>,
    key_value_metadata: IndexMap<String, Option<String>>,
    created_by: Option<String>,
}

impl FileMetadataBuilder {
    pub fn new(schema_descr: Arc<SchemaDescriptor>) -> Self {
        Self {
            schema_descr,
            row_groups: Vec::new(),
            key_value_metadata: IndexMap::new(),
            created_by: None,
        }
    }

    pub fn with_created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = Some(created_by.into());
        self
    }

    pub fn with_key_value_metadata(mut self, metadata: IndexMap<String, Option<String>>) -> Self {
        self.key_value_metadata = metadata;
        self
    }

    pub fn add_row_group(&mut self, row_group: RowGroupMetadata) {
        self.row_groups.push(row_group);
    }

    pub fn num_row_groups(&self) -> usize {
        self.row_groups.len()
    }

    pub fn build(self) -> FileMetadata {
        FileMetadata {
            version: FORMAT_VERSION,
            num_rows: self.row_groups.iter().map(|rg| rg.num_rows).sum(),
            schema_descr: self.schema_descr,
            row_groups: self.row_groups,
            key_value_metadata: self.key_value_metadata,
            created_by: self.created_by,
        }
    }
}
