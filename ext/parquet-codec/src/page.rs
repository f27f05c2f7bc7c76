//! Page framing: a thrift `PageHeader` followed by the (possibly compressed)
//! page payload.

use bytes::Bytes;
use tracing::warn;

use crate::compression::Compression;
use crate::encoding::Encoding;
use crate::error::{ErrorContext, ParquetError, Result};
use crate::format::{
    self, DataPageHeader, DictionaryPageHeader, PageHeader, PAGE_TYPE_DATA, PAGE_TYPE_DATA_V2,
    PAGE_TYPE_DICTIONARY, PAGE_TYPE_INDEX,
};

/// A decoded page with its payload decompressed.
#[derive(Debug, Clone)]
pub enum Page {
    Dictionary {
        buf: Bytes,
        num_values: usize,
        encoding: Encoding,
    },
    DataV1 {
        buf: Bytes,
        num_values: usize,
        encoding: Encoding,
        def_level_encoding: Encoding,
        rep_level_encoding: Encoding,
    },
    /// Levels are stored uncompressed and without length prefixes.
    DataV2 {
        rep_levels: Bytes,
        def_levels: Bytes,
        values: Bytes,
        num_values: usize,
        num_nulls: usize,
        num_rows: usize,
        encoding: Encoding,
    },
}

/// Sizes of a page as written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageSizes {
    pub compressed: usize,
    pub uncompressed: usize,
}

/// Compress `payload` and append header plus compressed payload to `out`.
fn write_page(mut header: PageHeader, payload: &[u8], codec: Compression, out: &mut Vec<u8>) -> Result<PageSizes> {
    let compressed = codec.compress(payload)?;
    header.uncompressed_page_size = to_i32(payload.len(), "uncompressed page size")?;
    header.compressed_page_size = to_i32(compressed.len(), "compressed page size")?;

    let header_len = format::write_thrift(&header, out)?;
    out.extend_from_slice(&compressed);
    Ok(PageSizes {
        compressed: header_len + compressed.len(),
        uncompressed: header_len + payload.len(),
    })
}

fn to_i32(value: usize, what: &str) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| ParquetError::invalid_argument(format!("{} {} exceeds the format limit", what, value)))
}

/// Append a dictionary page.
pub fn write_dictionary_page(payload: &[u8], num_values: usize, codec: Compression, out: &mut Vec<u8>) -> Result<PageSizes> {
    let header = PageHeader {
        page_type: PAGE_TYPE_DICTIONARY,
        dictionary_page_header: Some(DictionaryPageHeader {
            num_values: to_i32(num_values, "dictionary size")?,
            encoding: Encoding::Plain.to_thrift(),
            is_sorted: Some(false),
        }),
        ..Default::default()
    };
    write_page(header, payload, codec, out)
}

/// Append a v1 data page. `payload` already holds the level streams and values.
pub fn write_data_page(
    payload: &[u8],
    num_values: usize,
    encoding: Encoding,
    codec: Compression,
    out: &mut Vec<u8>,
) -> Result<PageSizes> {
    let header = PageHeader {
        page_type: PAGE_TYPE_DATA,
        data_page_header: Some(DataPageHeader {
            num_values: to_i32(num_values, "page value count")?,
            encoding: encoding.to_thrift(),
            definition_level_encoding: Encoding::Rle.to_thrift(),
            repetition_level_encoding: Encoding::Rle.to_thrift(),
            statistics: None,
        }),
        ..Default::default()
    };
    write_page(header, payload, codec, out)
}

/// Iterates over the pages of one column chunk.
pub struct PageReader {
    data: Bytes,
    pos: usize,
    codec: Compression,
}

impl PageReader {
    pub fn new(data: Bytes, codec: Compression) -> Self {
        Self { data, pos: 0, codec }
    }

    fn read_next(&mut self) -> Result<Option<Page>> {
        loop {
            if self.pos >= self.data.len() {
                return Ok(None);
            }
            let (header, header_len) = format::read_thrift::<PageHeader>(&self.data[self.pos..])
                .with_context(|| format!("Failed to read page header at chunk offset {}", self.pos))?;
            let body_start = self.pos + header_len;
            let compressed_size = non_negative(header.compressed_page_size, "compressed page size")?;
            let uncompressed_size = non_negative(header.uncompressed_page_size, "uncompressed page size")?;
            let body_end = body_start + compressed_size;
            if body_end > self.data.len() {
                return Err(ParquetError::corrupt_data(format!(
                    "Page body of {} bytes at chunk offset {} runs past the chunk end ({} bytes)",
                    compressed_size,
                    body_start,
                    self.data.len()
                )));
            }
            let body = self.data.slice(body_start..body_end);
            self.pos = body_end;

            match header.page_type {
                PAGE_TYPE_DICTIONARY => {
                    let dict = header.dictionary_page_header.ok_or_else(|| {
                        ParquetError::corrupt_data("Dictionary page without a dictionary page header")
                    })?;
                    let buf = self.decompress(&body, uncompressed_size)?;
                    return Ok(Some(Page::Dictionary {
                        buf,
                        num_values: non_negative(dict.num_values, "dictionary size")?,
                        encoding: Encoding::from_thrift(dict.encoding)?,
                    }));
                }
                PAGE_TYPE_DATA => {
                    let data = header.data_page_header.ok_or_else(|| {
                        ParquetError::corrupt_data("Data page without a data page header")
                    })?;
                    let buf = self.decompress(&body, uncompressed_size)?;
                    return Ok(Some(Page::DataV1 {
                        buf,
                        num_values: non_negative(data.num_values, "page value count")?,
                        encoding: Encoding::from_thrift(data.encoding)?,
                        def_level_encoding: Encoding::from_thrift(data.definition_level_encoding)?,
                        rep_level_encoding: Encoding::from_thrift(data.repetition_level_encoding)?,
                    }));
                }
                PAGE_TYPE_DATA_V2 => {
                    let data = header.data_page_header_v2.ok_or_else(|| {
                        ParquetError::corrupt_data("Data page v2 without a data page v2 header")
                    })?;
                    let rep_len = non_negative(data.repetition_levels_byte_length, "repetition level length")?;
                    let def_len = non_negative(data.definition_levels_byte_length, "definition level length")?;
                    let levels_len = rep_len + def_len;
                    if levels_len > body.len() || levels_len > uncompressed_size {
                        return Err(ParquetError::corrupt_data(format!(
                            "Data page v2 level streams ({} bytes) exceed the page body",
                            levels_len
                        )));
                    }
                    let raw_values = body.slice(levels_len..);
                    let values = if data.is_compressed.unwrap_or(true) {
                        self.decompress(&raw_values, uncompressed_size - levels_len)?
                    } else {
                        raw_values
                    };
                    return Ok(Some(Page::DataV2 {
                        rep_levels: body.slice(..rep_len),
                        def_levels: body.slice(rep_len..levels_len),
                        values,
                        num_values: non_negative(data.num_values, "page value count")?,
                        num_nulls: non_negative(data.num_nulls, "page null count")?,
                        num_rows: non_negative(data.num_rows, "page row count")?,
                        encoding: Encoding::from_thrift(data.encoding)?,
                    }));
                }
                PAGE_TYPE_INDEX => {
                    warn!("Skipping index page at chunk offset {}", body_start);
                }
                other => {
                    return Err(ParquetError::corrupt_data(format!("Unknown page type {}", other)));
                }
            }
        }
    }

    fn decompress(&self, body: &Bytes, uncompressed_size: usize) -> Result<Bytes> {
        if self.codec == Compression::Uncompressed {
            if body.len() != uncompressed_size {
                return Err(ParquetError::corrupt_data(format!(
                    "Uncompressed page is {} bytes, header says {}",
                    body.len(),
                    uncompressed_size
                )));
            }
            return Ok(body.clone());
        }
        Ok(Bytes::from(self.codec.decompress(body, uncompressed_size)?))
    }
}

fn non_negative(value: i32, what: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| ParquetError::corrupt_data(format!("Negative {}: {}", what, value)))
}

impl Iterator for PageReader {
    type Item = Result<Page>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_next() {
            Ok(Some(page)) => Some(Ok(page)),
            Ok(None) => None,
            Err(e) => {
                // Stop after the first error.
                self.pos = self.data.len();
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::DataPageHeaderV2;

    #[test]
    fn pages_roundtrip_through_reader() {
        for codec in [Compression::Uncompressed, Compression::Snappy, Compression::Zstd] {
            let mut out = Vec::new();
            write_dictionary_page(b"dictionary-bytes", 3, codec, &mut out).unwrap();
            let sizes = write_data_page(&[7u8; 300], 42, Encoding::RleDictionary, codec, &mut out).unwrap();
            assert!(sizes.uncompressed >= 300);

            let pages: Vec<_> = PageReader::new(Bytes::from(out), codec)
                .collect::<Result<_>>()
                .unwrap();
            assert_eq!(pages.len(), 2);
            match &pages[0] {
                Page::Dictionary { buf, num_values, encoding } => {
                    assert_eq!(buf.as_ref(), b"dictionary-bytes");
                    assert_eq!(*num_values, 3);
                    assert_eq!(*encoding, Encoding::Plain);
                }
                other => panic!("expected dictionary page, got {:?}", other),
            }
            match &pages[1] {
                Page::DataV1 { buf, num_values, encoding, .. } => {
                    assert_eq!(buf.as_ref(), &[7u8; 300][..]);
                    assert_eq!(*num_values, 42);
                    assert_eq!(*encoding, Encoding::RleDictionary);
                }
                other => panic!("expected data page, got {:?}", other),
            }
        }
    }

    #[test]
    fn v2_levels_stay_uncompressed() {
        let levels = [1u8, 2, 3, 4, 5];
        let values = b"some value bytes".to_vec();
        let compressed = Compression::Snappy.compress(&values).unwrap();
        let header = PageHeader {
            page_type: PAGE_TYPE_DATA_V2,
            uncompressed_page_size: (levels.len() + values.len()) as i32,
            compressed_page_size: (levels.len() + compressed.len()) as i32,
            data_page_header_v2: Some(DataPageHeaderV2 {
                num_values: 4,
                num_nulls: 1,
                num_rows: 2,
                encoding: Encoding::Plain.to_thrift(),
                definition_levels_byte_length: 3,
                repetition_levels_byte_length: 2,
                is_compressed: Some(true),
                statistics: None,
            }),
            ..Default::default()
        };
        let mut out = Vec::new();
        format::write_thrift(&header, &mut out).unwrap();
        out.extend_from_slice(&levels);
        out.extend_from_slice(&compressed);

        let page = PageReader::new(Bytes::from(out), Compression::Snappy)
            .next()
            .unwrap()
            .unwrap();
        match page {
            Page::DataV2 { rep_levels, def_levels, values: v, num_rows, .. } => {
                assert_eq!(rep_levels.as_ref(), &[1, 2]);
                assert_eq!(def_levels.as_ref(), &[3, 4, 5]);
                assert_eq!(v.as_ref(), values.as_slice());
                assert_eq!(num_rows, 2);
            }
            other => panic!("expected v2 page, got {:?}", other),
        }
    }

    #[test]
    fn truncated_body_is_corrupt() {
        let mut out = Vec::new();
        write_data_page(&[1u8; 64], 8, Encoding::Plain, Compression::Uncompressed, &mut out).unwrap();
        out.truncate(out.len() - 10);
        let err = PageReader::new(Bytes::from(out), Compression::Uncompressed)
            .next()
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, ParquetError::CorruptData(_)));
    }

    #[test]
    fn unknown_page_encoding_is_unsupported() {
        let header = PageHeader {
            page_type: PAGE_TYPE_DATA,
            uncompressed_page_size: 0,
            compressed_page_size: 0,
            data_page_header: Some(DataPageHeader {
                num_values: 0,
                encoding: 42,
                definition_level_encoding: 3,
                repetition_level_encoding: 3,
                statistics: None,
            }),
            ..Default::default()
        };
        let mut out = Vec::new();
        format::write_thrift(&header, &mut out).unwrap();
        let err = PageReader::new(Bytes::from(out), Compression::Uncompressed)
            .next()
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, ParquetError::UnsupportedEncoding(_)));
    }
}
