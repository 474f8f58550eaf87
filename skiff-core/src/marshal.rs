use crate::{
    Day, DriverValue, Error, Hour, Millisecond, Minute, Result, Second, Value, ValueKind,
    as_value::decimal_from_f64, format_local_date, format_local_datetime, parse_local_date,
    parse_local_datetime, parse_timestamp, parse_zoned,
};
use rust_decimal::Decimal;
use std::{borrow::Cow, time::SystemTime};
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Converts an attribute value into the value bound to a statement.
///
/// `store_as_timestamp` selects timestamp binding over canonical text for date like kinds.
pub fn marshal(value: Value, store_as_timestamp: bool) -> DriverValue {
    macro_rules! temporal {
        ($v:expr, $text:expr) => {
            if store_as_timestamp {
                DriverValue::Timestamp($v.into())
            } else {
                DriverValue::Text($text)
            }
        };
    }
    match value {
        v if v.is_null() => DriverValue::Null,
        Value::Text(Some(v)) => DriverValue::Text(v),
        Value::Int32(Some(v)) => DriverValue::Int32(v),
        Value::Int64(Some(v)) => DriverValue::Int64(v),
        Value::Decimal(Some(v)) => DriverValue::Decimal(v),
        Value::Boolean(Some(v)) => DriverValue::Boolean(v),
        Value::SystemTime(Some(v)) => {
            let v = OffsetDateTime::from(v).to_offset(UtcOffset::UTC);
            DriverValue::Timestamp(PrimitiveDateTime::new(v.date(), v.time()))
        }
        Value::Day(Some(v)) => temporal!(v, v.to_string()),
        Value::Hour(Some(v)) => temporal!(v, v.to_string()),
        Value::Minute(Some(v)) => temporal!(v, v.to_string()),
        Value::Second(Some(v)) => temporal!(v, v.to_string()),
        Value::Millisecond(Some(v)) => temporal!(v, v.to_string()),
        Value::Zoned(Some(v)) => DriverValue::TimestampTz(v),
        Value::LocalDate(Some(v)) => temporal!(v.midnight(), format_local_date(&v)),
        Value::LocalDateTime(Some(v)) => temporal!(v, format_local_datetime(&v)),
        Value::Enumeration(Some(v)) => DriverValue::Text(v.into_owned()),
        Value::Bytes(Some(v)) => DriverValue::Blob(v),
        _ => DriverValue::Null,
    }
}

/// Converts a column value back into an attribute value of `kind`.
///
/// A SQL null becomes the typed null of `kind`.
pub fn unmarshal(kind: ValueKind, store_as_timestamp: bool, value: DriverValue) -> Result<Value> {
    if value.is_null() {
        return Ok(kind.empty_value());
    }
    let mismatch = |value: &DriverValue| Error::conversion(value, format!("{kind:?}"));
    macro_rules! granularity {
        ($variant:ident, $ty:ty) => {{
            let datetime = if store_as_timestamp {
                timestamp(value)?
            } else {
                match value {
                    DriverValue::Text(ref v) => {
                        return Ok(Value::$variant(Some(v.parse::<$ty>()?)));
                    }
                    DriverValue::Timestamp(v) => v,
                    ref v => return Err(mismatch(v)),
                }
            };
            Value::$variant(Some(<$ty>::new(datetime)))
        }};
    }
    Ok(match kind {
        ValueKind::Text => match value {
            DriverValue::Text(v) => Value::Text(Some(v)),
            ref v => return Err(mismatch(v)),
        },
        ValueKind::Int32 => match value {
            DriverValue::Int32(v) => Value::Int32(Some(v)),
            DriverValue::Int64(v) => {
                Value::Int32(Some(i32::try_from(v).map_err(|_| Error::conversion(v, "i32"))?))
            }
            DriverValue::Boolean(v) => Value::Int32(Some(v as i32)),
            ref v => return Err(mismatch(v)),
        },
        ValueKind::Int64 => match value {
            DriverValue::Int32(v) => Value::Int64(Some(v as i64)),
            DriverValue::Int64(v) => Value::Int64(Some(v)),
            DriverValue::Decimal(v) if v.is_integer() => Value::Int64(Some(
                i64::try_from(v).map_err(|_| Error::conversion(v, "i64"))?,
            )),
            ref v => return Err(mismatch(v)),
        },
        ValueKind::Decimal => Value::Decimal(Some(match value {
            DriverValue::Decimal(v) => v,
            DriverValue::Int32(v) => Decimal::from(v),
            DriverValue::Int64(v) => Decimal::from(v),
            DriverValue::Real(v) => decimal_from_f64(v)?,
            DriverValue::Text(ref v) => v.parse::<Decimal>().map_err(|_| mismatch(&value))?,
            ref v => return Err(mismatch(v)),
        })),
        ValueKind::Boolean => Value::Boolean(Some(match value {
            DriverValue::Boolean(v) => v,
            DriverValue::Int32(v) => v != 0,
            DriverValue::Int64(v) => v != 0,
            DriverValue::Text(ref v) if v.eq_ignore_ascii_case("true") => true,
            DriverValue::Text(ref v) if v.eq_ignore_ascii_case("false") => false,
            ref v => return Err(mismatch(v)),
        })),
        ValueKind::SystemTime => {
            let value = match value {
                DriverValue::TimestampTz(v) => v,
                v => timestamp(v)?.assume_utc(),
            };
            Value::SystemTime(Some(SystemTime::from(value)))
        }
        ValueKind::Day => granularity!(Day, Day),
        ValueKind::Hour => granularity!(Hour, Hour),
        ValueKind::Minute => granularity!(Minute, Minute),
        ValueKind::Second => granularity!(Second, Second),
        ValueKind::Millisecond => granularity!(Millisecond, Millisecond),
        ValueKind::Zoned => Value::Zoned(Some(match value {
            DriverValue::TimestampTz(v) => v,
            DriverValue::Timestamp(v) => v.assume_utc(),
            DriverValue::Text(ref v) => parse_zoned(v)?,
            ref v => return Err(mismatch(v)),
        })),
        ValueKind::LocalDate => Value::LocalDate(Some(match value {
            DriverValue::Date(v) => v,
            DriverValue::Text(ref v) if !store_as_timestamp => parse_local_date(v)?,
            v => timestamp(v)?.date(),
        })),
        ValueKind::LocalDateTime => Value::LocalDateTime(Some(match value {
            DriverValue::Text(ref v) if !store_as_timestamp => parse_local_datetime(v)?,
            v => timestamp(v)?,
        })),
        ValueKind::Enumeration => match value {
            DriverValue::Text(v) => Value::Enumeration(Some(Cow::Owned(v))),
            ref v => return Err(mismatch(v)),
        },
        ValueKind::Bytes => match value {
            DriverValue::Blob(v) => Value::Bytes(Some(v)),
            DriverValue::Text(v) => Value::Bytes(Some(v.into_bytes().into_boxed_slice())),
            ref v => return Err(mismatch(v)),
        },
    })
}

/// A driver timestamp, either native or in its text form.
fn timestamp(value: DriverValue) -> Result<PrimitiveDateTime> {
    match value {
        DriverValue::Timestamp(v) => Ok(v),
        DriverValue::Date(v) => Ok(v.midnight()),
        DriverValue::Text(ref v) => parse_timestamp(v),
        v => Err(Error::conversion(v, "timestamp")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn null_is_preserved() {
        assert_eq!(marshal(Value::Day(None), true), DriverValue::Null);
        assert_eq!(marshal(Value::Null, false), DriverValue::Null);
        assert_eq!(
            unmarshal(ValueKind::Minute, false, DriverValue::Null).unwrap(),
            Value::Minute(None)
        );
    }

    #[test]
    fn granularity_storage() {
        let hour = Hour::new(datetime!(2024-03-05 14:30));
        assert_eq!(
            marshal(Value::Hour(Some(hour)), false),
            DriverValue::Text("2024-03-05T14".into())
        );
        assert_eq!(
            marshal(Value::Hour(Some(hour)), true),
            DriverValue::Timestamp(datetime!(2024-03-05 14:00))
        );
        assert_eq!(
            unmarshal(
                ValueKind::Hour,
                false,
                DriverValue::Text("2024-03-05T14".into())
            )
            .unwrap(),
            Value::Hour(Some(hour))
        );
        assert_eq!(
            unmarshal(
                ValueKind::Hour,
                true,
                DriverValue::Text("2024-03-05 14:00:00.000000000".into())
            )
            .unwrap(),
            Value::Hour(Some(hour))
        );
        assert!(
            unmarshal(
                ValueKind::Hour,
                false,
                DriverValue::Text("2024-03-05 14:00:00".into())
            )
            .is_err()
        );
    }

    #[test]
    fn local_date_storage() {
        let day = date!(2020 - 02 - 29);
        assert_eq!(
            marshal(Value::LocalDate(Some(day)), false),
            DriverValue::Text("2020-02-29".into())
        );
        assert_eq!(
            marshal(Value::LocalDate(Some(day)), true),
            DriverValue::Timestamp(datetime!(2020-02-29 0:00))
        );
        assert_eq!(
            unmarshal(
                ValueKind::LocalDate,
                true,
                DriverValue::Text("2020-02-29 00:00:00.000000000".into())
            )
            .unwrap(),
            Value::LocalDate(Some(day))
        );
    }

    #[test]
    fn legacy_time_is_a_timestamp() {
        let instant = datetime!(2001-09-09 01:46:40 UTC);
        let value = marshal(Value::SystemTime(Some(instant.into())), false);
        assert_eq!(value, DriverValue::Timestamp(datetime!(2001-09-09 01:46:40)));
        assert_eq!(
            unmarshal(ValueKind::SystemTime, false, value).unwrap(),
            Value::SystemTime(Some(instant.into()))
        );
    }

    #[test]
    fn integers() {
        assert_eq!(
            unmarshal(ValueKind::Int32, false, DriverValue::Int64(41)).unwrap(),
            Value::Int32(Some(41))
        );
        assert!(matches!(
            unmarshal(ValueKind::Int32, false, DriverValue::Int64(1 << 40)),
            Err(Error::Conversion { .. })
        ));
        assert_eq!(
            unmarshal(ValueKind::Boolean, false, DriverValue::Int64(1)).unwrap(),
            Value::Boolean(Some(true))
        );
        assert_eq!(
            unmarshal(ValueKind::Decimal, false, DriverValue::Text("12.50".into())).unwrap(),
            Value::Decimal(Some(Decimal::new(1250, 2)))
        );
    }

    #[test]
    fn enumerations_and_bytes() {
        assert_eq!(
            marshal(Value::Enumeration(Some("HIGH".into())), false),
            DriverValue::Text("HIGH".into())
        );
        assert_eq!(
            unmarshal(ValueKind::Bytes, false, DriverValue::Blob([1, 2, 3].into())).unwrap(),
            Value::Bytes(Some([1, 2, 3].into()))
        );
    }
}
