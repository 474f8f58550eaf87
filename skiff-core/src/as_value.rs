use crate::{Day, Error, Hour, Millisecond, Minute, Result, Second, Value, ValueKind};
use rust_decimal::{Decimal, prelude::FromPrimitive};
use std::{any, borrow::Cow, time::SystemTime};
use time::{Date, OffsetDateTime, PrimitiveDateTime};

/// Conversion between a Rust attribute type and its [`Value`].
///
/// Implemented for exactly the closed set of supported kinds (and `Option` of them).
/// Enumerations go through [`Enumeration`] instead.
///
/// # Examples
/// ```rust
/// use skiff_core::{AsValue, Value, ValueKind};
/// let v = 42i32.as_value();
/// assert_eq!(v, Value::Int32(Some(42)));
/// let n: i64 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// assert_eq!(<Option<i64> as AsValue>::KIND, ValueKind::Int64);
/// ```
pub trait AsValue {
    const KIND: ValueKind;
    /// The typed null of this type.
    fn as_empty_value() -> Value {
        Self::KIND.empty_value()
    }
    fn as_value(self) -> Value;
    /// Accepts the canonical variant, plus lossless numeric widening and range checked narrowing.
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

macro_rules! impl_as_value {
    ($source:ty, $kind:ident $(, $pat_rest:pat => $expr_rest:expr)* $(,)?) => {
        impl AsValue for $source {
            const KIND: ValueKind = ValueKind::$kind;
            fn as_value(self) -> Value {
                Value::$kind(Some(self.into()))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    Value::$kind(Some(v)) => Ok(v.into()),
                    $($pat_rest => $expr_rest,)*
                    _ => Err(Error::conversion(value, any::type_name::<Self>())),
                }
            }
        }
    };
}

impl_as_value!(String, Text);
impl_as_value!(
    i32,
    Int32,
    Value::Int64(Some(v)) => i32::try_from(v).map_err(|_| Error::conversion(v, "i32")),
);
impl_as_value!(i64, Int64, Value::Int32(Some(v)) => Ok(v as i64));
impl_as_value!(
    Decimal,
    Decimal,
    Value::Int32(Some(v)) => Ok(Decimal::from(v)),
    Value::Int64(Some(v)) => Ok(Decimal::from(v)),
);
impl_as_value!(bool, Boolean);
impl_as_value!(SystemTime, SystemTime);
impl_as_value!(Day, Day);
impl_as_value!(Hour, Hour);
impl_as_value!(Minute, Minute);
impl_as_value!(Second, Second);
impl_as_value!(Millisecond, Millisecond);
impl_as_value!(
    OffsetDateTime,
    Zoned,
    Value::SystemTime(Some(v)) => Ok(v.into()),
);
impl_as_value!(Date, LocalDate);
impl_as_value!(PrimitiveDateTime, LocalDateTime);
impl_as_value!(Box<[u8]>, Bytes);

impl AsValue for Vec<u8> {
    const KIND: ValueKind = ValueKind::Bytes;
    fn as_value(self) -> Value {
        Value::Bytes(Some(self.into_boxed_slice()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bytes(Some(v)) => Ok(v.into_vec()),
            _ => Err(Error::conversion(value, "Vec<u8>")),
        }
    }
}

impl<T: AsValue> AsValue for Option<T> {
    const KIND: ValueKind = T::KIND;
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Ok(if value.is_null() {
            None
        } else {
            Some(<T as AsValue>::try_from_value(value)?)
        })
    }
}

/// A unit-variant enum persisted through its symbolic name.
///
/// Usually derived with `#[derive(Enumeration)]`.
pub trait Enumeration: Sized {
    fn name(&self) -> &'static str;
    fn from_name(name: &str) -> Option<Self>;
}

/// Attribute value of an enumeration, null when `value` is `None`.
pub fn enumeration_value<E: Enumeration>(value: Option<&E>) -> Value {
    Value::Enumeration(value.map(|v| Cow::Borrowed(v.name())))
}

/// Resolves an attribute value back to the enumeration constant with the same name.
pub fn enumeration_from_value<E: Enumeration>(value: Value) -> Result<Option<E>> {
    match value {
        Value::Enumeration(Some(name)) => E::from_name(&name)
            .map(Some)
            .ok_or_else(|| Error::conversion(name, any::type_name::<E>())),
        Value::Text(Some(name)) => E::from_name(&name)
            .map(Some)
            .ok_or_else(|| Error::conversion(name, any::type_name::<E>())),
        v if v.is_null() => Ok(None),
        v => Err(Error::conversion(v, any::type_name::<E>())),
    }
}

/// Decimal from a driver level floating point, used when a backend hands back reals.
pub(crate) fn decimal_from_f64(value: f64) -> Result<Decimal> {
    Decimal::from_f64(value).ok_or_else(|| Error::conversion(value, "Decimal"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Level {
        Low,
        High,
    }
    impl Enumeration for Level {
        fn name(&self) -> &'static str {
            match self {
                Level::Low => "LOW",
                Level::High => "HIGH",
            }
        }
        fn from_name(name: &str) -> Option<Self> {
            match name {
                "LOW" => Some(Level::Low),
                "HIGH" => Some(Level::High),
                _ => None,
            }
        }
    }

    #[test]
    fn numeric_conversions() {
        assert_eq!(i64::try_from_value(Value::Int32(Some(-7))).unwrap(), -7);
        assert_eq!(i32::try_from_value(Value::Int64(Some(12))).unwrap(), 12);
        assert!(matches!(
            i32::try_from_value(Value::Int64(Some(i64::MAX))),
            Err(Error::Conversion { .. })
        ));
        assert!(matches!(
            i32::try_from_value(Value::Text(Some("1".into()))),
            Err(Error::Conversion { .. })
        ));
        assert_eq!(
            Decimal::try_from_value(Value::Int64(Some(5))).unwrap(),
            Decimal::new(5, 0)
        );
    }

    #[test]
    fn options() {
        assert_eq!(None::<String>.as_value(), Value::Text(None));
        assert_eq!(
            Option::<i32>::try_from_value(Value::Int32(None)).unwrap(),
            None
        );
        assert_eq!(
            Option::<i32>::try_from_value(Value::Int32(Some(3))).unwrap(),
            Some(3)
        );
        assert_eq!(<Option<Vec<u8>> as AsValue>::KIND, ValueKind::Bytes);
    }

    #[test]
    fn enumerations() {
        assert_eq!(
            enumeration_value(Some(&Level::High)),
            Value::Enumeration(Some("HIGH".into()))
        );
        assert_eq!(enumeration_value::<Level>(None), Value::Enumeration(None));
        assert_eq!(
            enumeration_from_value::<Level>(Value::Enumeration(Some("LOW".into()))).unwrap(),
            Some(Level::Low)
        );
        assert_eq!(
            enumeration_from_value::<Level>(Value::Enumeration(None)).unwrap(),
            None
        );
        assert!(enumeration_from_value::<Level>(Value::Text(Some("MEDIUM".into()))).is_err());
    }
}
