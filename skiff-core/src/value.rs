use crate::{Day, Error, Hour, Millisecond, Minute, Result, Second};
use rust_decimal::Decimal;
use std::{borrow::Cow, time::SystemTime};
use time::{Date, OffsetDateTime, PrimitiveDateTime};

/// Attribute level value, one variant per supported kind.
///
/// Every variant carries an `Option` so that a null still knows its kind.
#[derive(Default, Debug, Clone, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Text(Option<String>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    Decimal(Option<Decimal>),
    Boolean(Option<bool>),
    SystemTime(Option<SystemTime>),
    Day(Option<Day>),
    Hour(Option<Hour>),
    Minute(Option<Minute>),
    Second(Option<Second>),
    Millisecond(Option<Millisecond>),
    Zoned(Option<OffsetDateTime>),
    LocalDate(Option<Date>),
    LocalDateTime(Option<PrimitiveDateTime>),
    Enumeration(Option<Cow<'static, str>>),
    Bytes(Option<Box<[u8]>>),
}

/// The closed set of value kinds an attribute can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Text,
    Int32,
    Int64,
    Decimal,
    Boolean,
    SystemTime,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
    Zoned,
    LocalDate,
    LocalDateTime,
    Enumeration,
    Bytes,
}

impl ValueKind {
    /// Kinds for which the `store_as_timestamp` flag changes the stored representation.
    pub fn is_date_like(&self) -> bool {
        matches!(
            self,
            ValueKind::Day
                | ValueKind::Hour
                | ValueKind::Minute
                | ValueKind::Second
                | ValueKind::Millisecond
                | ValueKind::LocalDate
                | ValueKind::LocalDateTime
        )
    }

    /// The typed null of this kind.
    pub fn empty_value(&self) -> Value {
        match self {
            ValueKind::Text => Value::Text(None),
            ValueKind::Int32 => Value::Int32(None),
            ValueKind::Int64 => Value::Int64(None),
            ValueKind::Decimal => Value::Decimal(None),
            ValueKind::Boolean => Value::Boolean(None),
            ValueKind::SystemTime => Value::SystemTime(None),
            ValueKind::Day => Value::Day(None),
            ValueKind::Hour => Value::Hour(None),
            ValueKind::Minute => Value::Minute(None),
            ValueKind::Second => Value::Second(None),
            ValueKind::Millisecond => Value::Millisecond(None),
            ValueKind::Zoned => Value::Zoned(None),
            ValueKind::LocalDate => Value::LocalDate(None),
            ValueKind::LocalDateTime => Value::LocalDateTime(None),
            ValueKind::Enumeration => Value::Enumeration(None),
            ValueKind::Bytes => Value::Bytes(None),
        }
    }
}

impl Value {
    pub fn kind(&self) -> Option<ValueKind> {
        Some(match self {
            Value::Null => return None,
            Value::Text(..) => ValueKind::Text,
            Value::Int32(..) => ValueKind::Int32,
            Value::Int64(..) => ValueKind::Int64,
            Value::Decimal(..) => ValueKind::Decimal,
            Value::Boolean(..) => ValueKind::Boolean,
            Value::SystemTime(..) => ValueKind::SystemTime,
            Value::Day(..) => ValueKind::Day,
            Value::Hour(..) => ValueKind::Hour,
            Value::Minute(..) => ValueKind::Minute,
            Value::Second(..) => ValueKind::Second,
            Value::Millisecond(..) => ValueKind::Millisecond,
            Value::Zoned(..) => ValueKind::Zoned,
            Value::LocalDate(..) => ValueKind::LocalDate,
            Value::LocalDateTime(..) => ValueKind::LocalDateTime,
            Value::Enumeration(..) => ValueKind::Enumeration,
            Value::Bytes(..) => ValueKind::Bytes,
        })
    }

    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(v) => v.is_none(),
            Value::Int32(v) => v.is_none(),
            Value::Int64(v) => v.is_none(),
            Value::Decimal(v) => v.is_none(),
            Value::Boolean(v) => v.is_none(),
            Value::SystemTime(v) => v.is_none(),
            Value::Day(v) => v.is_none(),
            Value::Hour(v) => v.is_none(),
            Value::Minute(v) => v.is_none(),
            Value::Second(v) => v.is_none(),
            Value::Millisecond(v) => v.is_none(),
            Value::Zoned(v) => v.is_none(),
            Value::LocalDate(v) => v.is_none(),
            Value::LocalDateTime(v) => v.is_none(),
            Value::Enumeration(v) => v.is_none(),
            Value::Bytes(v) => v.is_none(),
        }
    }
}

impl From<&'static str> for Value {
    fn from(value: &'static str) -> Self {
        Value::Text(Some(value.into()))
    }
}

/// What a declared Rust type resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredType {
    Value(ValueKind),
    /// Sequences, maps and sets: never persisted, skipped by metadata extraction.
    Collection,
}

/// Resolves the textual form of a Rust type (as written in a struct definition) to its kind.
///
/// Wrappers (`Option`, `Box`, `Rc`, `Arc`) are looked through. Enumerations cannot be
/// recognized by name and are declared explicitly instead.
pub fn decode_type_name(type_name: &str) -> Result<DeclaredType> {
    let normalized: String = type_name.chars().filter(|c| !c.is_whitespace()).collect();
    let unsupported = || Error::UnsupportedAttributeType {
        type_name: type_name.trim().to_string(),
    };
    let mut current = normalized.as_str();
    loop {
        let (path, argument) = match current.find('<') {
            Some(i) if current.ends_with('>') => (&current[..i], Some(&current[i + 1..current.len() - 1])),
            Some(..) => return Err(unsupported()),
            None => (current, None),
        };
        let ident = path.rsplit("::").next().unwrap_or(path);
        let kind = match (ident, argument) {
            ("Option" | "Box" | "Rc" | "Arc", Some(argument)) => {
                current = argument;
                continue;
            }
            ("[u8]", None) => ValueKind::Bytes,
            ("Vec", Some(argument)) => {
                if argument.rsplit("::").next() == Some("u8") {
                    ValueKind::Bytes
                } else {
                    return Ok(DeclaredType::Collection);
                }
            }
            (
                "VecDeque" | "LinkedList" | "HashMap" | "BTreeMap" | "HashSet" | "BTreeSet",
                Some(..),
            ) => return Ok(DeclaredType::Collection),
            ("String", None) => ValueKind::Text,
            ("i32", None) => ValueKind::Int32,
            ("i64", None) => ValueKind::Int64,
            ("Decimal", None) => ValueKind::Decimal,
            ("bool", None) => ValueKind::Boolean,
            ("SystemTime", None) => ValueKind::SystemTime,
            ("Day", None) => ValueKind::Day,
            ("Hour", None) => ValueKind::Hour,
            ("Minute", None) => ValueKind::Minute,
            ("Second", None) => ValueKind::Second,
            ("Millisecond", None) => ValueKind::Millisecond,
            ("OffsetDateTime", None) => ValueKind::Zoned,
            ("Date", None) => ValueKind::LocalDate,
            ("PrimitiveDateTime", None) => ValueKind::LocalDateTime,
            _ => return Err(unsupported()),
        };
        return Ok(DeclaredType::Value(kind));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_scalars() {
        assert_eq!(
            decode_type_name("String").unwrap(),
            DeclaredType::Value(ValueKind::Text)
        );
        assert_eq!(
            decode_type_name("Option < i64 >").unwrap(),
            DeclaredType::Value(ValueKind::Int64)
        );
        assert_eq!(
            decode_type_name("rust_decimal::Decimal").unwrap(),
            DeclaredType::Value(ValueKind::Decimal)
        );
        assert_eq!(
            decode_type_name("std::time::SystemTime").unwrap(),
            DeclaredType::Value(ValueKind::SystemTime)
        );
        assert_eq!(
            decode_type_name("Option<skiff::Millisecond>").unwrap(),
            DeclaredType::Value(ValueKind::Millisecond)
        );
        assert_eq!(
            decode_type_name("time::PrimitiveDateTime").unwrap(),
            DeclaredType::Value(ValueKind::LocalDateTime)
        );
    }

    #[test]
    fn decode_bytes_and_collections() {
        assert_eq!(
            decode_type_name("Vec<u8>").unwrap(),
            DeclaredType::Value(ValueKind::Bytes)
        );
        assert_eq!(
            decode_type_name("Option<Box<[u8]>>").unwrap(),
            DeclaredType::Value(ValueKind::Bytes)
        );
        assert_eq!(
            decode_type_name("Vec<String>").unwrap(),
            DeclaredType::Collection
        );
        assert_eq!(
            decode_type_name("std::collections::HashMap<String, i32>").unwrap(),
            DeclaredType::Collection
        );
    }

    #[test]
    fn decode_unsupported() {
        for name in ["f64", "u8", "i16", "Option<char>", "Vec<u8", "MyStruct"] {
            let Err(Error::UnsupportedAttributeType { type_name }) = decode_type_name(name) else {
                panic!("`{name}` should not be supported");
            };
            assert_eq!(type_name, name);
        }
    }

    #[test]
    fn null_keeps_kind() {
        let value = ValueKind::Day.empty_value();
        assert!(value.is_null());
        assert_eq!(value.kind(), Some(ValueKind::Day));
        assert_eq!(Value::Null.kind(), None);
        assert!(!Value::Int32(Some(0)).is_null());
    }
}
