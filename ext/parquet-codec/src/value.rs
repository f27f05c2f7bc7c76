use bytes::Bytes;
use indexmap::IndexMap;
use num::BigInt;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParquetValue {
    // Numeric types
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(ordered_float::OrderedFloat<f32>),
    Float64(ordered_float::OrderedFloat<f64>),

    // Basic types
    Boolean(bool),
    String(Arc<str>),
    Bytes(Bytes),

    // Date/Time types
    Date32(i32), // Days since epoch

    // Decimal types
    Decimal128(i128, i8),   // unscaled value, scale
    Decimal256(BigInt, i8), // unscaled value, scale

    // Timestamp types with optional timezone; any timezone means UTC-normalized storage
    TimestampMillis(i64, Option<Arc<str>>),
    TimestampMicros(i64, Option<Arc<str>>),
    TimestampNanos(i64, Option<Arc<str>>),

    // Time of day since midnight
    TimeMillis(i32),
    TimeMicros(i64),
    TimeNanos(i64),

    // Complex types
    List(Vec<ParquetValue>),
    Map(Vec<(ParquetValue, ParquetValue)>), // Using Vec of tuples for deterministic ordering
    Record(IndexMap<Arc<str>, ParquetValue>), // For struct/record types, preserves field order

    // Null value
    Null,
}

impl std::hash::Hash for ParquetValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            ParquetValue::Int8(i) => i.hash(state),
            ParquetValue::Int16(i) => i.hash(state),
            ParquetValue::Int32(i) => i.hash(state),
            ParquetValue::Int64(i) => i.hash(state),
            ParquetValue::UInt8(i) => i.hash(state),
            ParquetValue::UInt16(i) => i.hash(state),
            ParquetValue::UInt32(i) => i.hash(state),
            ParquetValue::UInt64(i) => i.hash(state),
            ParquetValue::Float32(f) => f.hash(state),
            ParquetValue::Float64(f) => f.hash(state),
            ParquetValue::Boolean(b) => b.hash(state),
            ParquetValue::String(s) => s.hash(state),
            ParquetValue::Bytes(b) => b.hash(state),
            ParquetValue::Date32(d) => d.hash(state),
            ParquetValue::Decimal128(d, scale) => {
                d.hash(state);
                scale.hash(state);
            }
            ParquetValue::Decimal256(d, scale) => {
                d.hash(state);
                scale.hash(state);
            }
            ParquetValue::TimestampMillis(ts, tz)
            | ParquetValue::TimestampMicros(ts, tz)
            | ParquetValue::TimestampNanos(ts, tz) => {
                ts.hash(state);
                tz.hash(state);
            }
            ParquetValue::TimeMillis(t) => t.hash(state),
            ParquetValue::TimeMicros(t) | ParquetValue::TimeNanos(t) => t.hash(state),
            ParquetValue::List(l) => l.hash(state),
            ParquetValue::Map(m) => m.hash(state),
            ParquetValue::Record(r) => {
                // IndexMap preserves insertion order, so hash is deterministic
                for (k, v) in r {
                    k.hash(state);
                    v.hash(state);
                }
            }
            ParquetValue::Null => 0_i32.hash(state),
        }
    }
}

impl ParquetValue {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, ParquetValue::Null)
    }

    /// Get the type name of the value
    pub fn type_name(&self) -> &'static str {
        match self {
            ParquetValue::Int8(_) => "Int8",
            ParquetValue::Int16(_) => "Int16",
            ParquetValue::Int32(_) => "Int32",
            ParquetValue::Int64(_) => "Int64",
            ParquetValue::UInt8(_) => "UInt8",
            ParquetValue::UInt16(_) => "UInt16",
            ParquetValue::UInt32(_) => "UInt32",
            ParquetValue::UInt64(_) => "UInt64",
            ParquetValue::Float32(_) => "Float32",
            ParquetValue::Float64(_) => "Float64",
            ParquetValue::Boolean(_) => "Boolean",
            ParquetValue::String(_) => "String",
            ParquetValue::Bytes(_) => "Bytes",
            ParquetValue::Date32(_) => "Date32",
            ParquetValue::Decimal128(_, _) => "Decimal128",
            ParquetValue::Decimal256(_, _) => "Decimal256",
            ParquetValue::TimestampMillis(_, _) => "TimestampMillis",
            ParquetValue::TimestampMicros(_, _) => "TimestampMicros",
            ParquetValue::TimestampNanos(_, _) => "TimestampNanos",
            ParquetValue::TimeMillis(_) => "TimeMillis",
            ParquetValue::TimeMicros(_) => "TimeMicros",
            ParquetValue::TimeNanos(_) => "TimeNanos",
            ParquetValue::List(_) => "List",
            ParquetValue::Map(_) => "Map",
            ParquetValue::Record(_) => "Record",
            ParquetValue::Null => "Null",
        }
    }
}

/// Formats values the way rows are rendered for diagnostics:
/// `<null>` for nulls, `[a;b]` for lists, `[k=>v]` for maps and `{a;b}` for records.
impl fmt::Display for ParquetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParquetValue::Null => f.write_str("<null>"),
            ParquetValue::Int8(v) => write!(f, "{}", v),
            ParquetValue::Int16(v) => write!(f, "{}", v),
            ParquetValue::Int32(v) => write!(f, "{}", v),
            ParquetValue::Int64(v) => write!(f, "{}", v),
            ParquetValue::UInt8(v) => write!(f, "{}", v),
            ParquetValue::UInt16(v) => write!(f, "{}", v),
            ParquetValue::UInt32(v) => write!(f, "{}", v),
            ParquetValue::UInt64(v) => write!(f, "{}", v),
            ParquetValue::Float32(v) => write!(f, "{}", v),
            ParquetValue::Float64(v) => write!(f, "{}", v),
            ParquetValue::Boolean(v) => write!(f, "{}", v),
            ParquetValue::String(s) => f.write_str(s),
            ParquetValue::Bytes(b) => {
                f.write_str("0x")?;
                for byte in b.iter() {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            ParquetValue::Date32(days) => {
                let epoch = jiff::civil::date(1970, 1, 1);
                match epoch.checked_add(jiff::SignedDuration::from_hours(i64::from(*days) * 24)) {
                    Ok(date) => write!(f, "{}", date),
                    Err(_) => write!(f, "{}", days),
                }
            }
            ParquetValue::Decimal128(v, scale) => {
                write_decimal(f, &v.to_string(), *scale)
            }
            ParquetValue::Decimal256(v, scale) => write_decimal(f, &v.to_string(), *scale),
            ParquetValue::TimestampMillis(v, _) => match jiff::Timestamp::from_millisecond(*v) {
                Ok(ts) => write!(f, "{}", ts),
                Err(_) => write!(f, "{}", v),
            },
            ParquetValue::TimestampMicros(v, _) => match jiff::Timestamp::from_microsecond(*v) {
                Ok(ts) => write!(f, "{}", ts),
                Err(_) => write!(f, "{}", v),
            },
            ParquetValue::TimestampNanos(v, _) => {
                match jiff::Timestamp::from_nanosecond(i128::from(*v)) {
                    Ok(ts) => write!(f, "{}", ts),
                    Err(_) => write!(f, "{}", v),
                }
            }
            ParquetValue::TimeMillis(v) => write_time(f, jiff::SignedDuration::from_millis(i64::from(*v))),
            ParquetValue::TimeMicros(v) => write_time(f, jiff::SignedDuration::from_micros(*v)),
            ParquetValue::TimeNanos(v) => write_time(f, jiff::SignedDuration::from_nanos(*v)),
            ParquetValue::List(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(";")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            ParquetValue::Map(entries) => {
                f.write_str("[")?;
                for (idx, (key, value)) in entries.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(";")?;
                    }
                    write!(f, "{}=>{}", key, value)?;
                }
                f.write_str("]")
            }
            ParquetValue::Record(fields) => {
                f.write_str("{")?;
                for (idx, value) in fields.values().enumerate() {
                    if idx > 0 {
                        f.write_str(";")?;
                    }
                    write!(f, "{}", value)?;
                }
                f.write_str("}")
            }
        }
    }
}

fn write_decimal(f: &mut fmt::Formatter<'_>, unscaled: &str, scale: i8) -> fmt::Result {
    if scale <= 0 {
        f.write_str(unscaled)?;
        for _ in 0..(-scale) {
            f.write_str("0")?;
        }
        return Ok(());
    }

    let (sign, digits) = match unscaled.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", unscaled),
    };
    let scale = scale as usize;
    let padded = if digits.len() <= scale {
        format!("{}{}", "0".repeat(scale - digits.len() + 1), digits)
    } else {
        digits.to_string()
    };
    let (int_part, frac_part) = padded.split_at(padded.len() - scale);
    write!(f, "{}{}.{}", sign, int_part, frac_part)
}

fn write_time(f: &mut fmt::Formatter<'_>, since_midnight: jiff::SignedDuration) -> fmt::Result {
    match jiff::civil::Time::midnight().checked_add(since_midnight) {
        Ok(time) => write!(f, "{}", time),
        Err(_) => write!(f, "{:?}", since_midnight),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordered_float::OrderedFloat;

    #[test]
    fn test_value_creation() {
        let v = ParquetValue::Int32(42);
        assert_eq!(v, ParquetValue::Int32(42));
        assert!(!v.is_null());
        assert_eq!(v.type_name(), "Int32");
    }

    #[test]
    fn test_null_value() {
        let v = ParquetValue::Null;
        assert!(v.is_null());
        assert_eq!(v.type_name(), "Null");
        assert_eq!(v.to_string(), "<null>");
    }

    #[test]
    fn test_float_equality() {
        let v1 = ParquetValue::Float32(OrderedFloat(3.5));
        let v2 = ParquetValue::Float32(OrderedFloat(3.5));
        assert_eq!(v1, v2);
    }

    #[test]
    fn test_hash_consistency() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(ParquetValue::Int32(42));
        set.insert(ParquetValue::String(Arc::from("hello")));

        assert!(set.contains(&ParquetValue::Int32(42)));
        assert!(set.contains(&ParquetValue::String(Arc::from("hello"))));
        assert!(!set.contains(&ParquetValue::Int32(43)));
    }

    #[test]
    fn test_display_nested() {
        let mut record = IndexMap::new();
        record.insert(Arc::from("country"), ParquetValue::String(Arc::from("UK")));
        record.insert(Arc::from("city"), ParquetValue::String(Arc::from("London")));

        let value = ParquetValue::List(vec![
            ParquetValue::Record(record),
            ParquetValue::Null,
        ]);
        assert_eq!(value.to_string(), "[{UK;London};<null>]");

        let map = ParquetValue::Map(vec![
            (ParquetValue::Int32(1), ParquetValue::String(Arc::from("one"))),
            (ParquetValue::Int32(2), ParquetValue::String(Arc::from("two"))),
        ]);
        assert_eq!(map.to_string(), "[1=>one;2=>two]");
    }

    #[test]
    fn test_display_decimal() {
        assert_eq!(ParquetValue::Decimal128(12, 1).to_string(), "1.2");
        assert_eq!(ParquetValue::Decimal128(-5, 2).to_string(), "-0.05");
        assert_eq!(ParquetValue::Decimal128(7, 0).to_string(), "7");
        assert_eq!(
            ParquetValue::Decimal256(BigInt::from(123456), 3).to_string(),
            "123.456"
        );
    }

    #[test]
    fn test_display_temporal() {
        assert_eq!(ParquetValue::Date32(0).to_string(), "1970-01-01");
        assert_eq!(ParquetValue::Date32(31).to_string(), "1970-02-01");
        assert_eq!(
            ParquetValue::TimestampMillis(0, None).to_string(),
            "1970-01-01T00:00:00Z"
        );
    }
}
