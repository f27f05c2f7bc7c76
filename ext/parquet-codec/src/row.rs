//! Rows and whole-file datasets.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use indexmap::IndexMap;

use crate::error::{ParquetError, Result};
use crate::schema::Schema;
use crate::value::ParquetValue;

/// One value per top-level field, in schema order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row(Vec<ParquetValue>);

impl Row {
    pub fn new(values: Vec<ParquetValue>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[ParquetValue] {
        &self.0
    }

    pub fn into_values(self) -> Vec<ParquetValue> {
        self.0
    }

    /// The raw value at `idx`.
    pub fn value(&self, idx: usize) -> Result<&ParquetValue> {
        self.0.get(idx).ok_or_else(|| {
            ParquetError::invalid_argument(format!(
                "Field index {} is out of range for a row of {} values",
                idx,
                self.0.len()
            ))
        })
    }

    pub fn is_null_at(&self, idx: usize) -> Result<bool> {
        Ok(self.value(idx)?.is_null())
    }

    /// Typed access: `Ok(None)` for null, a schema error when the value
    /// has another type.
    ///
    /// ```
    /// use parquet_codec::{ParquetValue, Row};
    ///
    /// let row = Row::new(vec![ParquetValue::Int32(7), ParquetValue::Null]);
    /// assert_eq!(row.get::<i32>(0).unwrap(), Some(7));
    /// assert_eq!(row.get::<i32>(1).unwrap(), None);
    /// assert!(row.get::<String>(0).is_err());
    /// ```
    pub fn get<T: FromParquetValue>(&self, idx: usize) -> Result<Option<T>> {
        match self.value(idx)? {
            ParquetValue::Null => Ok(None),
            value => T::from_parquet_value(value).map(Some).ok_or_else(|| {
                ParquetError::schema(format!(
                    "Field {} holds {}, not {}",
                    idx,
                    value.type_name(),
                    T::TYPE_NAME
                ))
            }),
        }
    }
}

impl From<Vec<ParquetValue>> for Row {
    fn from(values: Vec<ParquetValue>) -> Self {
        Self(values)
    }
}

impl From<Row> for Vec<ParquetValue> {
    fn from(row: Row) -> Self {
        row.0
    }
}

impl AsRef<[ParquetValue]> for Row {
    fn as_ref(&self) -> &[ParquetValue] {
        &self.0
    }
}

/// Panics on an out of range index; [`Row::value`] reports it instead.
impl std::ops::Index<usize> for Row {
    type Output = ParquetValue;

    fn index(&self, idx: usize) -> &ParquetValue {
        &self.0[idx]
    }
}

impl IntoIterator for Row {
    type Item = ParquetValue;
    type IntoIter = std::vec::IntoIter<ParquetValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// `{a;b;[x;y];[k=>v]}`
impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (idx, value) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(";")?;
            }
            write!(f, "{}", value)?;
        }
        f.write_str("}")
    }
}

/// Types that can be pulled out of a non-null [`ParquetValue`].
pub trait FromParquetValue: Sized {
    const TYPE_NAME: &'static str;

    fn from_parquet_value(value: &ParquetValue) -> Option<Self>;
}

macro_rules! impl_from_parquet_value {
    ($ty:ty, $name:literal, $($variant:ident),+) => {
        impl FromParquetValue for $ty {
            const TYPE_NAME: &'static str = $name;

            fn from_parquet_value(value: &ParquetValue) -> Option<Self> {
                match value {
                    $(ParquetValue::$variant(v) => Some((*v).into()),)+
                    _ => None,
                }
            }
        }
    };
}

impl_from_parquet_value!(bool, "bool", Boolean);
impl_from_parquet_value!(i8, "i8", Int8);
impl_from_parquet_value!(i16, "i16", Int16, Int8);
impl_from_parquet_value!(i32, "i32", Int32, Int16, Int8, Date32, TimeMillis);
impl_from_parquet_value!(i64, "i64", Int64, Int32, Int16, Int8, TimeMicros, TimeNanos);
impl_from_parquet_value!(u8, "u8", UInt8);
impl_from_parquet_value!(u16, "u16", UInt16, UInt8);
impl_from_parquet_value!(u32, "u32", UInt32, UInt16, UInt8);
impl_from_parquet_value!(u64, "u64", UInt64, UInt32, UInt16, UInt8);

impl FromParquetValue for f32 {
    const TYPE_NAME: &'static str = "f32";

    fn from_parquet_value(value: &ParquetValue) -> Option<Self> {
        match value {
            ParquetValue::Float32(v) => Some(v.into_inner()),
            _ => None,
        }
    }
}

impl FromParquetValue for f64 {
    const TYPE_NAME: &'static str = "f64";

    fn from_parquet_value(value: &ParquetValue) -> Option<Self> {
        match value {
            ParquetValue::Float64(v) => Some(v.into_inner()),
            ParquetValue::Float32(v) => Some(f64::from(v.into_inner())),
            _ => None,
        }
    }
}

impl FromParquetValue for String {
    const TYPE_NAME: &'static str = "String";

    fn from_parquet_value(value: &ParquetValue) -> Option<Self> {
        match value {
            ParquetValue::String(s) => Some(s.to_string()),
            _ => None,
        }
    }
}

impl FromParquetValue for Arc<str> {
    const TYPE_NAME: &'static str = "String";

    fn from_parquet_value(value: &ParquetValue) -> Option<Self> {
        match value {
            ParquetValue::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromParquetValue for Bytes {
    const TYPE_NAME: &'static str = "Bytes";

    fn from_parquet_value(value: &ParquetValue) -> Option<Self> {
        match value {
            ParquetValue::Bytes(b) => Some(b.clone()),
            _ => None,
        }
    }
}

impl FromParquetValue for Vec<ParquetValue> {
    const TYPE_NAME: &'static str = "List";

    fn from_parquet_value(value: &ParquetValue) -> Option<Self> {
        match value {
            ParquetValue::List(items) => Some(items.clone()),
            _ => None,
        }
    }
}

impl FromParquetValue for Vec<(ParquetValue, ParquetValue)> {
    const TYPE_NAME: &'static str = "Map";

    fn from_parquet_value(value: &ParquetValue) -> Option<Self> {
        match value {
            ParquetValue::Map(entries) => Some(entries.clone()),
            _ => None,
        }
    }
}

impl FromParquetValue for IndexMap<Arc<str>, ParquetValue> {
    const TYPE_NAME: &'static str = "Record";

    fn from_parquet_value(value: &ParquetValue) -> Option<Self> {
        match value {
            ParquetValue::Record(fields) => Some(fields.clone()),
            _ => None,
        }
    }
}

/// A schema, its rows and the file-level metadata around them.
///
/// For windowed reads `rows` holds only the window while
/// `total_row_count` is the number of rows in the whole file.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    pub schema: Schema,
    pub rows: Vec<Row>,
    pub created_by: Option<String>,
    pub metadata: IndexMap<String, Option<String>>,
    pub total_row_count: usize,
}

impl DataSet {
    /// A dataset whose rows are all of the file.
    pub fn new(schema: Schema, rows: Vec<Row>) -> Self {
        let total_row_count = rows.len();
        Self {
            schema,
            rows,
            created_by: None,
            metadata: IndexMap::new(),
            total_row_count,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), Some(value.into()));
        self
    }
}
