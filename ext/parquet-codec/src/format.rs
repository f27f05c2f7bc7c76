//! Wire-level Parquet metadata structures and their thrift compact encoding.
//!
//! Enumerated fields are kept as the raw `i32` codes found on the wire. The
//! typed views live in [`crate::metadata`], which is where unknown codes are
//! turned into proper errors.

use std::io::Cursor;

use thrift::protocol::{
    TCompactInputProtocol, TCompactOutputProtocol, TFieldIdentifier, TInputProtocol,
    TListIdentifier, TOutputProtocol, TStructIdentifier, TType,
};

use crate::error::{ErrorContext, Result};

/// Reads and writes the struct to Thrift protocols.
///
/// Unlike [`thrift::protocol::TSerializable`] this uses generics instead of trait objects
pub trait TSerializable: Sized {
    fn read_from_in_protocol<T: TInputProtocol>(i_prot: &mut T) -> thrift::Result<Self>;
    fn write_to_out_protocol<T: TOutputProtocol>(&self, o_prot: &mut T) -> thrift::Result<()>;
}

/// Decode a thrift struct from the start of `buf`.
///
/// Returns the struct and the number of bytes it occupied.
pub fn read_thrift<S: TSerializable>(buf: &[u8]) -> Result<(S, usize)> {
    let mut cursor = Cursor::new(buf);
    let value = {
        let mut i_prot = TCompactInputProtocol::new(&mut cursor);
        S::read_from_in_protocol(&mut i_prot).context("Failed to decode thrift struct")?
    };
    Ok((value, cursor.position() as usize))
}

/// Append the compact encoding of `value` to `out`, returning the encoded length.
pub fn write_thrift<S: TSerializable>(value: &S, out: &mut Vec<u8>) -> Result<usize> {
    let start = out.len();
    {
        let mut o_prot = TCompactOutputProtocol::new(&mut *out);
        value.write_to_out_protocol(&mut o_prot)?;
        o_prot.flush()?;
    }
    Ok(out.len() - start)
}

fn missing(field: &str, strukt: &str) -> thrift::Error {
    thrift::Error::Protocol(thrift::ProtocolError::new(
        thrift::ProtocolErrorKind::InvalidData,
        format!("required field '{}' missing from {}", field, strukt),
    ))
}

fn required<V>(value: Option<V>, field: &str, strukt: &str) -> thrift::Result<V> {
    value.ok_or_else(|| missing(field, strukt))
}

fn field_begin<T: TOutputProtocol>(
    o_prot: &mut T,
    name: &str,
    field_type: TType,
    id: i16,
) -> thrift::Result<()> {
    o_prot.write_field_begin(&TFieldIdentifier::new(name, field_type, id))
}

fn write_i32_field<T: TOutputProtocol>(o_prot: &mut T, name: &str, id: i16, v: i32) -> thrift::Result<()> {
    field_begin(o_prot, name, TType::I32, id)?;
    o_prot.write_i32(v)?;
    o_prot.write_field_end()
}

fn write_i64_field<T: TOutputProtocol>(o_prot: &mut T, name: &str, id: i16, v: i64) -> thrift::Result<()> {
    field_begin(o_prot, name, TType::I64, id)?;
    o_prot.write_i64(v)?;
    o_prot.write_field_end()
}

fn write_bool_field<T: TOutputProtocol>(o_prot: &mut T, name: &str, id: i16, v: bool) -> thrift::Result<()> {
    field_begin(o_prot, name, TType::Bool, id)?;
    o_prot.write_bool(v)?;
    o_prot.write_field_end()
}

fn write_string_field<T: TOutputProtocol>(o_prot: &mut T, name: &str, id: i16, v: &str) -> thrift::Result<()> {
    field_begin(o_prot, name, TType::String, id)?;
    o_prot.write_string(v)?;
    o_prot.write_field_end()
}

fn write_binary_field<T: TOutputProtocol>(o_prot: &mut T, name: &str, id: i16, v: &[u8]) -> thrift::Result<()> {
    field_begin(o_prot, name, TType::String, id)?;
    o_prot.write_bytes(v)?;
    o_prot.write_field_end()
}

fn write_struct_field<T: TOutputProtocol, S: TSerializable>(
    o_prot: &mut T,
    name: &str,
    id: i16,
    v: &S,
) -> thrift::Result<()> {
    field_begin(o_prot, name, TType::Struct, id)?;
    v.write_to_out_protocol(o_prot)?;
    o_prot.write_field_end()
}

fn write_struct_list_field<T: TOutputProtocol, S: TSerializable>(
    o_prot: &mut T,
    name: &str,
    id: i16,
    items: &[S],
) -> thrift::Result<()> {
    field_begin(o_prot, name, TType::List, id)?;
    o_prot.write_list_begin(&TListIdentifier::new(TType::Struct, items.len() as i32))?;
    for item in items {
        item.write_to_out_protocol(o_prot)?;
    }
    o_prot.write_list_end()?;
    o_prot.write_field_end()
}

fn read_struct_list<T: TInputProtocol, S: TSerializable>(i_prot: &mut T) -> thrift::Result<Vec<S>> {
    let list = i_prot.read_list_begin()?;
    let mut items = Vec::with_capacity(list.size.max(0) as usize);
    for _ in 0..list.size {
        items.push(S::read_from_in_protocol(i_prot)?);
    }
    i_prot.read_list_end()?;
    Ok(items)
}

/// Writes an empty struct, used for the unit members of thrift unions.
fn write_empty_struct_field<T: TOutputProtocol>(o_prot: &mut T, name: &str, id: i16) -> thrift::Result<()> {
    field_begin(o_prot, name, TType::Struct, id)?;
    o_prot.write_struct_begin(&TStructIdentifier::new(name))?;
    o_prot.write_field_stop()?;
    o_prot.write_struct_end()?;
    o_prot.write_field_end()
}

/// Reads a struct and ignores all of its fields.
fn read_empty_struct<T: TInputProtocol>(i_prot: &mut T) -> thrift::Result<()> {
    i_prot.skip(TType::Struct)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Millis,
    Micros,
    Nanos,
}

impl TSerializable for TimeUnit {
    fn read_from_in_protocol<T: TInputProtocol>(i_prot: &mut T) -> thrift::Result<Self> {
        i_prot.read_struct_begin()?;
        let mut unit = None;
        loop {
            let field = i_prot.read_field_begin()?;
            if field.field_type == TType::Stop {
                break;
            }
            match field.id {
                Some(1) => {
                    read_empty_struct(i_prot)?;
                    unit = Some(TimeUnit::Millis);
                }
                Some(2) => {
                    read_empty_struct(i_prot)?;
                    unit = Some(TimeUnit::Micros);
                }
                Some(3) => {
                    read_empty_struct(i_prot)?;
                    unit = Some(TimeUnit::Nanos);
                }
                _ => i_prot.skip(field.field_type)?,
            }
            i_prot.read_field_end()?;
        }
        i_prot.read_struct_end()?;
        required(unit, "unit", "TimeUnit")
    }

    fn write_to_out_protocol<T: TOutputProtocol>(&self, o_prot: &mut T) -> thrift::Result<()> {
        o_prot.write_struct_begin(&TStructIdentifier::new("TimeUnit"))?;
        match self {
            TimeUnit::Millis => write_empty_struct_field(o_prot, "MILLIS", 1)?,
            TimeUnit::Micros => write_empty_struct_field(o_prot, "MICROS", 2)?,
            TimeUnit::Nanos => write_empty_struct_field(o_prot, "NANOS", 3)?,
        }
        o_prot.write_field_stop()?;
        o_prot.write_struct_end()
    }
}

/// The `LogicalType` union. Unknown members decode as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalType {
    String,
    Map,
    List,
    Enum,
    Decimal { scale: i32, precision: i32 },
    Date,
    Time { is_adjusted_to_utc: bool, unit: TimeUnit },
    Timestamp { is_adjusted_to_utc: bool, unit: TimeUnit },
    Integer { bit_width: i8, is_signed: bool },
    Unknown,
    Json,
    Bson,
    Uuid,
    Float16,
}

fn read_decimal_type<T: TInputProtocol>(i_prot: &mut T) -> thrift::Result<LogicalType> {
    i_prot.read_struct_begin()?;
    let (mut scale, mut precision) = (None, None);
    loop {
        let field = i_prot.read_field_begin()?;
        if field.field_type == TType::Stop {
            break;
        }
        match field.id {
            Some(1) => scale = Some(i_prot.read_i32()?),
            Some(2) => precision = Some(i_prot.read_i32()?),
            _ => i_prot.skip(field.field_type)?,
        }
        i_prot.read_field_end()?;
    }
    i_prot.read_struct_end()?;
    Ok(LogicalType::Decimal {
        scale: required(scale, "scale", "DecimalType")?,
        precision: required(precision, "precision", "DecimalType")?,
    })
}

/// Reads the body shared by `TimeType` and `TimestampType`.
fn read_temporal_type<T: TInputProtocol>(i_prot: &mut T) -> thrift::Result<(bool, TimeUnit)> {
    i_prot.read_struct_begin()?;
    let (mut adjusted, mut unit) = (None, None);
    loop {
        let field = i_prot.read_field_begin()?;
        if field.field_type == TType::Stop {
            break;
        }
        match field.id {
            Some(1) => adjusted = Some(i_prot.read_bool()?),
            Some(2) => unit = Some(TimeUnit::read_from_in_protocol(i_prot)?),
            _ => i_prot.skip(field.field_type)?,
        }
        i_prot.read_field_end()?;
    }
    i_prot.read_struct_end()?;
    Ok((
        required(adjusted, "isAdjustedToUTC", "TimeType")?,
        required(unit, "unit", "TimeType")?,
    ))
}

fn read_integer_type<T: TInputProtocol>(i_prot: &mut T) -> thrift::Result<LogicalType> {
    i_prot.read_struct_begin()?;
    let (mut bit_width, mut is_signed) = (None, None);
    loop {
        let field = i_prot.read_field_begin()?;
        if field.field_type == TType::Stop {
            break;
        }
        match field.id {
            Some(1) => bit_width = Some(i_prot.read_i8()?),
            Some(2) => is_signed = Some(i_prot.read_bool()?),
            _ => i_prot.skip(field.field_type)?,
        }
        i_prot.read_field_end()?;
    }
    i_prot.read_struct_end()?;
    Ok(LogicalType::Integer {
        bit_width: required(bit_width, "bitWidth", "IntType")?,
        is_signed: required(is_signed, "isSigned", "IntType")?,
    })
}

fn write_temporal_field<T: TOutputProtocol>(
    o_prot: &mut T,
    name: &str,
    id: i16,
    is_adjusted_to_utc: bool,
    unit: &TimeUnit,
) -> thrift::Result<()> {
    field_begin(o_prot, name, TType::Struct, id)?;
    o_prot.write_struct_begin(&TStructIdentifier::new(name))?;
    write_bool_field(o_prot, "isAdjustedToUTC", 1, is_adjusted_to_utc)?;
    write_struct_field(o_prot, "unit", 2, unit)?;
    o_prot.write_field_stop()?;
    o_prot.write_struct_end()?;
    o_prot.write_field_end()
}

impl TSerializable for LogicalType {
    fn read_from_in_protocol<T: TInputProtocol>(i_prot: &mut T) -> thrift::Result<Self> {
        i_prot.read_struct_begin()?;
        let mut logical = None;
        loop {
            let field = i_prot.read_field_begin()?;
            if field.field_type == TType::Stop {
                break;
            }
            let parsed = match field.id {
                Some(1) => read_empty_struct(i_prot).map(|_| LogicalType::String)?,
                Some(2) => read_empty_struct(i_prot).map(|_| LogicalType::Map)?,
                Some(3) => read_empty_struct(i_prot).map(|_| LogicalType::List)?,
                Some(4) => read_empty_struct(i_prot).map(|_| LogicalType::Enum)?,
                Some(5) => read_decimal_type(i_prot)?,
                Some(6) => read_empty_struct(i_prot).map(|_| LogicalType::Date)?,
                Some(7) => {
                    let (is_adjusted_to_utc, unit) = read_temporal_type(i_prot)?;
                    LogicalType::Time {
                        is_adjusted_to_utc,
                        unit,
                    }
                }
                Some(8) => {
                    let (is_adjusted_to_utc, unit) = read_temporal_type(i_prot)?;
                    LogicalType::Timestamp {
                        is_adjusted_to_utc,
                        unit,
                    }
                }
                Some(10) => read_integer_type(i_prot)?,
                Some(12) => read_empty_struct(i_prot).map(|_| LogicalType::Json)?,
                Some(13) => read_empty_struct(i_prot).map(|_| LogicalType::Bson)?,
                Some(14) => read_empty_struct(i_prot).map(|_| LogicalType::Uuid)?,
                Some(15) => read_empty_struct(i_prot).map(|_| LogicalType::Float16)?,
                _ => {
                    i_prot.skip(field.field_type)?;
                    LogicalType::Unknown
                }
            };
            logical = Some(parsed);
            i_prot.read_field_end()?;
        }
        i_prot.read_struct_end()?;
        Ok(logical.unwrap_or(LogicalType::Unknown))
    }

    fn write_to_out_protocol<T: TOutputProtocol>(&self, o_prot: &mut T) -> thrift::Result<()> {
        o_prot.write_struct_begin(&TStructIdentifier::new("LogicalType"))?;
        match self {
            LogicalType::String => write_empty_struct_field(o_prot, "STRING", 1)?,
            LogicalType::Map => write_empty_struct_field(o_prot, "MAP", 2)?,
            LogicalType::List => write_empty_struct_field(o_prot, "LIST", 3)?,
            LogicalType::Enum => write_empty_struct_field(o_prot, "ENUM", 4)?,
            LogicalType::Decimal { scale, precision } => {
                field_begin(o_prot, "DECIMAL", TType::Struct, 5)?;
                o_prot.write_struct_begin(&TStructIdentifier::new("DecimalType"))?;
                write_i32_field(o_prot, "scale", 1, *scale)?;
                write_i32_field(o_prot, "precision", 2, *precision)?;
                o_prot.write_field_stop()?;
                o_prot.write_struct_end()?;
                o_prot.write_field_end()?;
            }
            LogicalType::Date => write_empty_struct_field(o_prot, "DATE", 6)?,
            LogicalType::Time {
                is_adjusted_to_utc,
                unit,
            } => write_temporal_field(o_prot, "TIME", 7, *is_adjusted_to_utc, unit)?,
            LogicalType::Timestamp {
                is_adjusted_to_utc,
                unit,
            } => write_temporal_field(o_prot, "TIMESTAMP", 8, *is_adjusted_to_utc, unit)?,
            LogicalType::Integer {
                bit_width,
                is_signed,
            } => {
                field_begin(o_prot, "INTEGER", TType::Struct, 10)?;
                o_prot.write_struct_begin(&TStructIdentifier::new("IntType"))?;
                field_begin(o_prot, "bitWidth", TType::I08, 1)?;
                o_prot.write_i8(*bit_width)?;
                o_prot.write_field_end()?;
                write_bool_field(o_prot, "isSigned", 2, *is_signed)?;
                o_prot.write_field_stop()?;
                o_prot.write_struct_end()?;
                o_prot.write_field_end()?;
            }
            LogicalType::Unknown => write_empty_struct_field(o_prot, "UNKNOWN", 11)?,
            LogicalType::Json => write_empty_struct_field(o_prot, "JSON", 12)?,
            LogicalType::Bson => write_empty_struct_field(o_prot, "BSON", 13)?,
            LogicalType::Uuid => write_empty_struct_field(o_prot, "UUID", 14)?,
            LogicalType::Float16 => write_empty_struct_field(o_prot, "FLOAT16", 15)?,
        }
        o_prot.write_field_stop()?;
        o_prot.write_struct_end()
    }
}

/// One node of the flattened physical schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaElement {
    pub physical_type: Option<i32>,
    pub type_length: Option<i32>,
    pub repetition_type: Option<i32>,
    pub name: String,
    pub num_children: Option<i32>,
    pub converted_type: Option<i32>,
    pub scale: Option<i32>,
    pub precision: Option<i32>,
    pub field_id: Option<i32>,
    pub logical_type: Option<LogicalType>,
}

impl TSerializable for SchemaElement {
    fn read_from_in_protocol<T: TInputProtocol>(i_prot: &mut T) -> thrift::Result<Self> {
        i_prot.read_struct_begin()?;
        let mut element = SchemaElement::default();
        let mut name = None;
        loop {
            let field = i_prot.read_field_begin()?;
            if field.field_type == TType::Stop {
                break;
            }
            match field.id {
                Some(1) => element.physical_type = Some(i_prot.read_i32()?),
                Some(2) => element.type_length = Some(i_prot.read_i32()?),
                Some(3) => element.repetition_type = Some(i_prot.read_i32()?),
                Some(4) => name = Some(i_prot.read_string()?),
                Some(5) => element.num_children = Some(i_prot.read_i32()?),
                Some(6) => element.converted_type = Some(i_prot.read_i32()?),
                Some(7) => element.scale = Some(i_prot.read_i32()?),
                Some(8) => element.precision = Some(i_prot.read_i32()?),
                Some(9) => element.field_id = Some(i_prot.read_i32()?),
                Some(10) => element.logical_type = Some(LogicalType::read_from_in_protocol(i_prot)?),
                _ => i_prot.skip(field.field_type)?,
            }
            i_prot.read_field_end()?;
        }
        i_prot.read_struct_end()?;
        element.name = required(name, "name", "SchemaElement")?;
        Ok(element)
    }

    fn write_to_out_protocol<T: TOutputProtocol>(&self, o_prot: &mut T) -> thrift::Result<()> {
        o_prot.write_struct_begin(&TStructIdentifier::new("SchemaElement"))?;
        if let Some(v) = self.physical_type {
            write_i32_field(o_prot, "type", 1, v)?;
        }
        if let Some(v) = self.type_length {
            write_i32_field(o_prot, "type_length", 2, v)?;
        }
        if let Some(v) = self.repetition_type {
            write_i32_field(o_prot, "repetition_type", 3, v)?;
        }
        write_string_field(o_prot, "name", 4, &self.name)?;
        if let Some(v) = self.num_children {
            write_i32_field(o_prot, "num_children", 5, v)?;
        }
        if let Some(v) = self.converted_type {
            write_i32_field(o_prot, "converted_type", 6, v)?;
        }
        if let Some(v) = self.scale {
            write_i32_field(o_prot, "scale", 7, v)?;
        }
        if let Some(v) = self.precision {
            write_i32_field(o_prot, "precision", 8, v)?;
        }
        if let Some(v) = self.field_id {
            write_i32_field(o_prot, "field_id", 9, v)?;
        }
        if let Some(v) = &self.logical_type {
            write_struct_field(o_prot, "logicalType", 10, v)?;
        }
        o_prot.write_field_stop()?;
        o_prot.write_struct_end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: Option<String>,
}

impl TSerializable for KeyValue {
    fn read_from_in_protocol<T: TInputProtocol>(i_prot: &mut T) -> thrift::Result<Self> {
        i_prot.read_struct_begin()?;
        let (mut key, mut value) = (None, None);
        loop {
            let field = i_prot.read_field_begin()?;
            if field.field_type == TType::Stop {
                break;
            }
            match field.id {
                Some(1) => key = Some(i_prot.read_string()?),
                Some(2) => value = Some(i_prot.read_string()?),
                _ => i_prot.skip(field.field_type)?,
            }
            i_prot.read_field_end()?;
        }
        i_prot.read_struct_end()?;
        Ok(KeyValue {
            key: required(key, "key", "KeyValue")?,
            value,
        })
    }

    fn write_to_out_protocol<T: TOutputProtocol>(&self, o_prot: &mut T) -> thrift::Result<()> {
        o_prot.write_struct_begin(&TStructIdentifier::new("KeyValue"))?;
        write_string_field(o_prot, "key", 1, &self.key)?;
        if let Some(v) = &self.value {
            write_string_field(o_prot, "value", 2, v)?;
        }
        o_prot.write_field_stop()?;
        o_prot.write_struct_end()
    }
}

/// Encoded min/max statistics as stored in column and page metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedStatistics {
    /// Deprecated signed-order max
    pub max: Option<Vec<u8>>,
    /// Deprecated signed-order min
    pub min: Option<Vec<u8>>,
    pub null_count: Option<i64>,
    pub distinct_count: Option<i64>,
    pub max_value: Option<Vec<u8>>,
    pub min_value: Option<Vec<u8>>,
}

impl TSerializable for EncodedStatistics {
    fn read_from_in_protocol<T: TInputProtocol>(i_prot: &mut T) -> thrift::Result<Self> {
        i_prot.read_struct_begin()?;
        let mut stats = EncodedStatistics::default();
        loop {
            let field = i_prot.read_field_begin()?;
            if field.field_type == TType::Stop {
                break;
            }
            match field.id {
                Some(1) => stats.max = Some(i_prot.read_bytes()?),
                Some(2) => stats.min = Some(i_prot.read_bytes()?),
                Some(3) => stats.null_count = Some(i_prot.read_i64()?),
                Some(4) => stats.distinct_count = Some(i_prot.read_i64()?),
                Some(5) => stats.max_value = Some(i_prot.read_bytes()?),
                Some(6) => stats.min_value = Some(i_prot.read_bytes()?),
                _ => i_prot.skip(field.field_type)?,
            }
            i_prot.read_field_end()?;
        }
        i_prot.read_struct_end()?;
        Ok(stats)
    }

    fn write_to_out_protocol<T: TOutputProtocol>(&self, o_prot: &mut T) -> thrift::Result<()> {
        o_prot.write_struct_begin(&TStructIdentifier::new("Statistics"))?;
        if let Some(v) = &self.max {
            write_binary_field(o_prot, "max", 1, v)?;
        }
        if let Some(v) = &self.min {
            write_binary_field(o_prot, "min", 2, v)?;
        }
        if let Some(v) = self.null_count {
            write_i64_field(o_prot, "null_count", 3, v)?;
        }
        if let Some(v) = self.distinct_count {
            write_i64_field(o_prot, "distinct_count", 4, v)?;
        }
        if let Some(v) = &self.max_value {
            write_binary_field(o_prot, "max_value", 5, v)?;
        }
        if let Some(v) = &self.min_value {
            write_binary_field(o_prot, "min_value", 6, v)?;
        }
        o_prot.write_field_stop()?;
        o_prot.write_struct_end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMetaData {
    pub physical_type: i32,
    pub encodings: Vec<i32>,
    pub path_in_schema: Vec<String>,
    pub codec: i32,
    pub num_values: i64,
    pub total_uncompressed_size: i64,
    pub total_compressed_size: i64,
    pub key_value_metadata: Option<Vec<KeyValue>>,
    pub data_page_offset: i64,
    pub index_page_offset: Option<i64>,
    pub dictionary_page_offset: Option<i64>,
    pub statistics: Option<EncodedStatistics>,
}

impl TSerializable for ColumnMetaData {
    fn read_from_in_protocol<T: TInputProtocol>(i_prot: &mut T) -> thrift::Result<Self> {
        const NAME: &str = "ColumnMetaData";
        i_prot.read_struct_begin()?;
        let mut physical_type = None;
        let mut encodings = None;
        let mut path_in_schema = None;
        let mut codec = None;
        let mut num_values = None;
        let mut total_uncompressed_size = None;
        let mut total_compressed_size = None;
        let mut data_page_offset = None;
        let mut meta = ColumnMetaData::default();
        loop {
            let field = i_prot.read_field_begin()?;
            if field.field_type == TType::Stop {
                break;
            }
            match field.id {
                Some(1) => physical_type = Some(i_prot.read_i32()?),
                Some(2) => {
                    let list = i_prot.read_list_begin()?;
                    let mut values = Vec::with_capacity(list.size.max(0) as usize);
                    for _ in 0..list.size {
                        values.push(i_prot.read_i32()?);
                    }
                    i_prot.read_list_end()?;
                    encodings = Some(values);
                }
                Some(3) => {
                    let list = i_prot.read_list_begin()?;
                    let mut values = Vec::with_capacity(list.size.max(0) as usize);
                    for _ in 0..list.size {
                        values.push(i_prot.read_string()?);
                    }
                    i_prot.read_list_end()?;
                    path_in_schema = Some(values);
                }
                Some(4) => codec = Some(i_prot.read_i32()?),
                Some(5) => num_values = Some(i_prot.read_i64()?),
                Some(6) => total_uncompressed_size = Some(i_prot.read_i64()?),
                Some(7) => total_compressed_size = Some(i_prot.read_i64()?),
                Some(8) => meta.key_value_metadata = Some(read_struct_list(i_prot)?),
                Some(9) => data_page_offset = Some(i_prot.read_i64()?),
                Some(10) => meta.index_page_offset = Some(i_prot.read_i64()?),
                Some(11) => meta.dictionary_page_offset = Some(i_prot.read_i64()?),
                Some(12) => meta.statistics = Some(EncodedStatistics::read_from_in_protocol(i_prot)?),
                _ => i_prot.skip(field.field_type)?,
            }
            i_prot.read_field_end()?;
        }
        i_prot.read_struct_end()?;
        meta.physical_type = required(physical_type, "type", NAME)?;
        meta.encodings = required(encodings, "encodings", NAME)?;
        meta.path_in_schema = required(path_in_schema, "path_in_schema", NAME)?;
        meta.codec = required(codec, "codec", NAME)?;
        meta.num_values = required(num_values, "num_values", NAME)?;
        meta.total_uncompressed_size =
            required(total_uncompressed_size, "total_uncompressed_size", NAME)?;
        meta.total_compressed_size = required(total_compressed_size, "total_compressed_size", NAME)?;
        meta.data_page_offset = required(data_page_offset, "data_page_offset", NAME)?;
        Ok(meta)
    }

    fn write_to_out_protocol<T: TOutputProtocol>(&self, o_prot: &mut T) -> thrift::Result<()> {
        o_prot.write_struct_begin(&TStructIdentifier::new("ColumnMetaData"))?;
        write_i32_field(o_prot, "type", 1, self.physical_type)?;

        field_begin(o_prot, "encodings", TType::List, 2)?;
        o_prot.write_list_begin(&TListIdentifier::new(TType::I32, self.encodings.len() as i32))?;
        for encoding in &self.encodings {
            o_prot.write_i32(*encoding)?;
        }
        o_prot.write_list_end()?;
        o_prot.write_field_end()?;

        field_begin(o_prot, "path_in_schema", TType::List, 3)?;
        o_prot.write_list_begin(&TListIdentifier::new(
            TType::String,
            self.path_in_schema.len() as i32,
        ))?;
        for part in &self.path_in_schema {
            o_prot.write_string(part)?;
        }
        o_prot.write_list_end()?;
        o_prot.write_field_end()?;

        write_i32_field(o_prot, "codec", 4, self.codec)?;
        write_i64_field(o_prot, "num_values", 5, self.num_values)?;
        write_i64_field(o_prot, "total_uncompressed_size", 6, self.total_uncompressed_size)?;
        write_i64_field(o_prot, "total_compressed_size", 7, self.total_compressed_size)?;
        if let Some(kv) = &self.key_value_metadata {
            write_struct_list_field(o_prot, "key_value_metadata", 8, kv)?;
        }
        write_i64_field(o_prot, "data_page_offset", 9, self.data_page_offset)?;
        if let Some(v) = self.index_page_offset {
            write_i64_field(o_prot, "index_page_offset", 10, v)?;
        }
        if let Some(v) = self.dictionary_page_offset {
            write_i64_field(o_prot, "dictionary_page_offset", 11, v)?;
        }
        if let Some(stats) = &self.statistics {
            write_struct_field(o_prot, "statistics", 12, stats)?;
        }
        o_prot.write_field_stop()?;
        o_prot.write_struct_end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnChunk {
    pub file_path: Option<String>,
    pub file_offset: i64,
    pub meta_data: Option<ColumnMetaData>,
}

impl TSerializable for ColumnChunk {
    fn read_from_in_protocol<T: TInputProtocol>(i_prot: &mut T) -> thrift::Result<Self> {
        i_prot.read_struct_begin()?;
        let mut chunk = ColumnChunk::default();
        let mut file_offset = None;
        loop {
            let field = i_prot.read_field_begin()?;
            if field.field_type == TType::Stop {
                break;
            }
            match field.id {
                Some(1) => chunk.file_path = Some(i_prot.read_string()?),
                Some(2) => file_offset = Some(i_prot.read_i64()?),
                Some(3) => chunk.meta_data = Some(ColumnMetaData::read_from_in_protocol(i_prot)?),
                _ => i_prot.skip(field.field_type)?,
            }
            i_prot.read_field_end()?;
        }
        i_prot.read_struct_end()?;
        chunk.file_offset = required(file_offset, "file_offset", "ColumnChunk")?;
        Ok(chunk)
    }

    fn write_to_out_protocol<T: TOutputProtocol>(&self, o_prot: &mut T) -> thrift::Result<()> {
        o_prot.write_struct_begin(&TStructIdentifier::new("ColumnChunk"))?;
        if let Some(path) = &self.file_path {
            write_string_field(o_prot, "file_path", 1, path)?;
        }
        write_i64_field(o_prot, "file_offset", 2, self.file_offset)?;
        if let Some(meta) = &self.meta_data {
            write_struct_field(o_prot, "meta_data", 3, meta)?;
        }
        o_prot.write_field_stop()?;
        o_prot.write_struct_end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowGroup {
    pub columns: Vec<ColumnChunk>,
    pub total_byte_size: i64,
    pub num_rows: i64,
    pub file_offset: Option<i64>,
    pub total_compressed_size: Option<i64>,
    pub ordinal: Option<i16>,
}

impl TSerializable for RowGroup {
    fn read_from_in_protocol<T: TInputProtocol>(i_prot: &mut T) -> thrift::Result<Self> {
        i_prot.read_struct_begin()?;
        let mut group = RowGroup::default();
        let (mut columns, mut total_byte_size, mut num_rows) = (None, None, None);
        loop {
            let field = i_prot.read_field_begin()?;
            if field.field_type == TType::Stop {
                break;
            }
            match field.id {
                Some(1) => columns = Some(read_struct_list(i_prot)?),
                Some(2) => total_byte_size = Some(i_prot.read_i64()?),
                Some(3) => num_rows = Some(i_prot.read_i64()?),
                Some(5) => group.file_offset = Some(i_prot.read_i64()?),
                Some(6) => group.total_compressed_size = Some(i_prot.read_i64()?),
                Some(7) => group.ordinal = Some(i_prot.read_i16()?),
                _ => i_prot.skip(field.field_type)?,
            }
            i_prot.read_field_end()?;
        }
        i_prot.read_struct_end()?;
        group.columns = required(columns, "columns", "RowGroup")?;
        group.total_byte_size = required(total_byte_size, "total_byte_size", "RowGroup")?;
        group.num_rows = required(num_rows, "num_rows", "RowGroup")?;
        Ok(group)
    }

    fn write_to_out_protocol<T: TOutputProtocol>(&self, o_prot: &mut T) -> thrift::Result<()> {
        o_prot.write_struct_begin(&TStructIdentifier::new("RowGroup"))?;
        write_struct_list_field(o_prot, "columns", 1, &self.columns)?;
        write_i64_field(o_prot, "total_byte_size", 2, self.total_byte_size)?;
        write_i64_field(o_prot, "num_rows", 3, self.num_rows)?;
        if let Some(v) = self.file_offset {
            write_i64_field(o_prot, "file_offset", 5, v)?;
        }
        if let Some(v) = self.total_compressed_size {
            write_i64_field(o_prot, "total_compressed_size", 6, v)?;
        }
        if let Some(v) = self.ordinal {
            field_begin(o_prot, "ordinal", TType::I16, 7)?;
            o_prot.write_i16(v)?;
            o_prot.write_field_end()?;
        }
        o_prot.write_field_stop()?;
        o_prot.write_struct_end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMetaData {
    pub version: i32,
    pub schema: Vec<SchemaElement>,
    pub num_rows: i64,
    pub row_groups: Vec<RowGroup>,
    pub key_value_metadata: Option<Vec<KeyValue>>,
    pub created_by: Option<String>,
}

impl TSerializable for FileMetaData {
    fn read_from_in_protocol<T: TInputProtocol>(i_prot: &mut T) -> thrift::Result<Self> {
        const NAME: &str = "FileMetaData";
        i_prot.read_struct_begin()?;
        let mut meta = FileMetaData::default();
        let (mut version, mut schema, mut num_rows, mut row_groups) = (None, None, None, None);
        loop {
            let field = i_prot.read_field_begin()?;
            if field.field_type == TType::Stop {
                break;
            }
            match field.id {
                Some(1) => version = Some(i_prot.read_i32()?),
                Some(2) => schema = Some(read_struct_list(i_prot)?),
                Some(3) => num_rows = Some(i_prot.read_i64()?),
                Some(4) => row_groups = Some(read_struct_list(i_prot)?),
                Some(5) => meta.key_value_metadata = Some(read_struct_list(i_prot)?),
                Some(6) => meta.created_by = Some(i_prot.read_string()?),
                // column orders and encryption fields are not interpreted
                _ => i_prot.skip(field.field_type)?,
            }
            i_prot.read_field_end()?;
        }
        i_prot.read_struct_end()?;
        meta.version = required(version, "version", NAME)?;
        meta.schema = required(schema, "schema", NAME)?;
        meta.num_rows = required(num_rows, "num_rows", NAME)?;
        meta.row_groups = required(row_groups, "row_groups", NAME)?;
        Ok(meta)
    }

    fn write_to_out_protocol<T: TOutputProtocol>(&self, o_prot: &mut T) -> thrift::Result<()> {
        o_prot.write_struct_begin(&TStructIdentifier::new("FileMetaData"))?;
        write_i32_field(o_prot, "version", 1, self.version)?;
        write_struct_list_field(o_prot, "schema", 2, &self.schema)?;
        write_i64_field(o_prot, "num_rows", 3, self.num_rows)?;
        write_struct_list_field(o_prot, "row_groups", 4, &self.row_groups)?;
        if let Some(kv) = &self.key_value_metadata {
            write_struct_list_field(o_prot, "key_value_metadata", 5, kv)?;
        }
        if let Some(created_by) = &self.created_by {
            write_string_field(o_prot, "created_by", 6, created_by)?;
        }
        o_prot.write_field_stop()?;
        o_prot.write_struct_end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataPageHeader {
    pub num_values: i32,
    pub encoding: i32,
    pub definition_level_encoding: i32,
    pub repetition_level_encoding: i32,
    pub statistics: Option<EncodedStatistics>,
}

impl TSerializable for DataPageHeader {
    fn read_from_in_protocol<T: TInputProtocol>(i_prot: &mut T) -> thrift::Result<Self> {
        const NAME: &str = "DataPageHeader";
        i_prot.read_struct_begin()?;
        let (mut num_values, mut encoding, mut def_enc, mut rep_enc, mut statistics) =
            (None, None, None, None, None);
        loop {
            let field = i_prot.read_field_begin()?;
            if field.field_type == TType::Stop {
                break;
            }
            match field.id {
                Some(1) => num_values = Some(i_prot.read_i32()?),
                Some(2) => encoding = Some(i_prot.read_i32()?),
                Some(3) => def_enc = Some(i_prot.read_i32()?),
                Some(4) => rep_enc = Some(i_prot.read_i32()?),
                Some(5) => statistics = Some(EncodedStatistics::read_from_in_protocol(i_prot)?),
                _ => i_prot.skip(field.field_type)?,
            }
            i_prot.read_field_end()?;
        }
        i_prot.read_struct_end()?;
        Ok(DataPageHeader {
            num_values: required(num_values, "num_values", NAME)?,
            encoding: required(encoding, "encoding", NAME)?,
            definition_level_encoding: required(def_enc, "definition_level_encoding", NAME)?,
            repetition_level_encoding: required(rep_enc, "repetition_level_encoding", NAME)?,
            statistics,
        })
    }

    fn write_to_out_protocol<T: TOutputProtocol>(&self, o_prot: &mut T) -> thrift::Result<()> {
        o_prot.write_struct_begin(&TStructIdentifier::new("DataPageHeader"))?;
        write_i32_field(o_prot, "num_values", 1, self.num_values)?;
        write_i32_field(o_prot, "encoding", 2, self.encoding)?;
        write_i32_field(o_prot, "definition_level_encoding", 3, self.definition_level_encoding)?;
        write_i32_field(o_prot, "repetition_level_encoding", 4, self.repetition_level_encoding)?;
        if let Some(stats) = &self.statistics {
            write_struct_field(o_prot, "statistics", 5, stats)?;
        }
        o_prot.write_field_stop()?;
        o_prot.write_struct_end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DictionaryPageHeader {
    pub num_values: i32,
    pub encoding: i32,
    pub is_sorted: Option<bool>,
}

impl TSerializable for DictionaryPageHeader {
    fn read_from_in_protocol<T: TInputProtocol>(i_prot: &mut T) -> thrift::Result<Self> {
        i_prot.read_struct_begin()?;
        let (mut num_values, mut encoding, mut is_sorted) = (None, None, None);
        loop {
            let field = i_prot.read_field_begin()?;
            if field.field_type == TType::Stop {
                break;
            }
            match field.id {
                Some(1) => num_values = Some(i_prot.read_i32()?),
                Some(2) => encoding = Some(i_prot.read_i32()?),
                Some(3) => is_sorted = Some(i_prot.read_bool()?),
                _ => i_prot.skip(field.field_type)?,
            }
            i_prot.read_field_end()?;
        }
        i_prot.read_struct_end()?;
        Ok(DictionaryPageHeader {
            num_values: required(num_values, "num_values", "DictionaryPageHeader")?,
            encoding: required(encoding, "encoding", "DictionaryPageHeader")?,
            is_sorted,
        })
    }

    fn write_to_out_protocol<T: TOutputProtocol>(&self, o_prot: &mut T) -> thrift::Result<()> {
        o_prot.write_struct_begin(&TStructIdentifier::new("DictionaryPageHeader"))?;
        write_i32_field(o_prot, "num_values", 1, self.num_values)?;
        write_i32_field(o_prot, "encoding", 2, self.encoding)?;
        if let Some(v) = self.is_sorted {
            write_bool_field(o_prot, "is_sorted", 3, v)?;
        }
        o_prot.write_field_stop()?;
        o_prot.write_struct_end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataPageHeaderV2 {
    pub num_values: i32,
    pub num_nulls: i32,
    pub num_rows: i32,
    pub encoding: i32,
    pub definition_levels_byte_length: i32,
    pub repetition_levels_byte_length: i32,
    pub is_compressed: Option<bool>,
    pub statistics: Option<EncodedStatistics>,
}

impl TSerializable for DataPageHeaderV2 {
    fn read_from_in_protocol<T: TInputProtocol>(i_prot: &mut T) -> thrift::Result<Self> {
        const NAME: &str = "DataPageHeaderV2";
        i_prot.read_struct_begin()?;
        let mut header = DataPageHeaderV2::default();
        let mut seen = [false; 6];
        loop {
            let field = i_prot.read_field_begin()?;
            if field.field_type == TType::Stop {
                break;
            }
            match field.id {
                Some(id @ 1..=6) => {
                    let v = i_prot.read_i32()?;
                    seen[(id - 1) as usize] = true;
                    match id {
                        1 => header.num_values = v,
                        2 => header.num_nulls = v,
                        3 => header.num_rows = v,
                        4 => header.encoding = v,
                        5 => header.definition_levels_byte_length = v,
                        _ => header.repetition_levels_byte_length = v,
                    }
                }
                Some(7) => header.is_compressed = Some(i_prot.read_bool()?),
                Some(8) => header.statistics = Some(EncodedStatistics::read_from_in_protocol(i_prot)?),
                _ => i_prot.skip(field.field_type)?,
            }
            i_prot.read_field_end()?;
        }
        i_prot.read_struct_end()?;
        if let Some(idx) = seen.iter().position(|s| !s) {
            const FIELDS: [&str; 6] = [
                "num_values",
                "num_nulls",
                "num_rows",
                "encoding",
                "definition_levels_byte_length",
                "repetition_levels_byte_length",
            ];
            return Err(missing(FIELDS[idx], NAME));
        }
        Ok(header)
    }

    fn write_to_out_protocol<T: TOutputProtocol>(&self, o_prot: &mut T) -> thrift::Result<()> {
        o_prot.write_struct_begin(&TStructIdentifier::new("DataPageHeaderV2"))?;
        write_i32_field(o_prot, "num_values", 1, self.num_values)?;
        write_i32_field(o_prot, "num_nulls", 2, self.num_nulls)?;
        write_i32_field(o_prot, "num_rows", 3, self.num_rows)?;
        write_i32_field(o_prot, "encoding", 4, self.encoding)?;
        write_i32_field(
            o_prot,
            "definition_levels_byte_length",
            5,
            self.definition_levels_byte_length,
        )?;
        write_i32_field(
            o_prot,
            "repetition_levels_byte_length",
            6,
            self.repetition_levels_byte_length,
        )?;
        if let Some(v) = self.is_compressed {
            write_bool_field(o_prot, "is_compressed", 7, v)?;
        }
        if let Some(stats) = &self.statistics {
            write_struct_field(o_prot, "statistics", 8, stats)?;
        }
        o_prot.write_field_stop()?;
        o_prot.write_struct_end()
    }
}

pub const PAGE_TYPE_DATA: i32 = 0;
pub const PAGE_TYPE_INDEX: i32 = 1;
pub const PAGE_TYPE_DICTIONARY: i32 = 2;
pub const PAGE_TYPE_DATA_V2: i32 = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageHeader {
    pub page_type: i32,
    pub uncompressed_page_size: i32,
    pub compressed_page_size: i32,
    pub crc: Option<i32>,
    pub data_page_header: Option<DataPageHeader>,
    pub dictionary_page_header: Option<DictionaryPageHeader>,
    pub data_page_header_v2: Option<DataPageHeaderV2>,
}

impl TSerializable for PageHeader {
    fn read_from_in_protocol<T: TInputProtocol>(i_prot: &mut T) -> thrift::Result<Self> {
        const NAME: &str = "PageHeader";
        i_prot.read_struct_begin()?;
        let mut header = PageHeader::default();
        let (mut page_type, mut uncompressed, mut compressed) = (None, None, None);
        loop {
            let field = i_prot.read_field_begin()?;
            if field.field_type == TType::Stop {
                break;
            }
            match field.id {
                Some(1) => page_type = Some(i_prot.read_i32()?),
                Some(2) => uncompressed = Some(i_prot.read_i32()?),
                Some(3) => compressed = Some(i_prot.read_i32()?),
                Some(4) => header.crc = Some(i_prot.read_i32()?),
                Some(5) => {
                    header.data_page_header = Some(DataPageHeader::read_from_in_protocol(i_prot)?)
                }
                Some(7) => {
                    header.dictionary_page_header =
                        Some(DictionaryPageHeader::read_from_in_protocol(i_prot)?)
                }
                Some(8) => {
                    header.data_page_header_v2 =
                        Some(DataPageHeaderV2::read_from_in_protocol(i_prot)?)
                }
                _ => i_prot.skip(field.field_type)?,
            }
            i_prot.read_field_end()?;
        }
        i_prot.read_struct_end()?;
        header.page_type = required(page_type, "type", NAME)?;
        header.uncompressed_page_size = required(uncompressed, "uncompressed_page_size", NAME)?;
        header.compressed_page_size = required(compressed, "compressed_page_size", NAME)?;
        Ok(header)
    }

    fn write_to_out_protocol<T: TOutputProtocol>(&self, o_prot: &mut T) -> thrift::Result<()> {
        o_prot.write_struct_begin(&TStructIdentifier::new("PageHeader"))?;
        write_i32_field(o_prot, "type", 1, self.page_type)?;
        write_i32_field(o_prot, "uncompressed_page_size", 2, self.uncompressed_page_size)?;
        write_i32_field(o_prot, "compressed_page_size", 3, self.compressed_page_size)?;
        if let Some(v) = self.crc {
            write_i32_field(o_prot, "crc", 4, v)?;
        }
        if let Some(h) = &self.data_page_header {
            write_struct_field(o_prot, "data_page_header", 5, h)?;
        }
        if let Some(h) = &self.dictionary_page_header {
            write_struct_field(o_prot, "dictionary_page_header", 7, h)?;
        }
        if let Some(h) = &self.data_page_header_v2 {
            write_struct_field(o_prot, "data_page_header_v2", 8, h)?;
        }
        o_prot.write_field_stop()?;
        o_prot.write_struct_end()
    }
}
