use crate::{Error, Result};
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, Time, format_description::well_known::Rfc3339,
    macros::format_description,
};

const DATE_FORMAT: &[time::format_description::BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

macro_rules! granularity {
    ($(#[$doc:meta])* $name:ident, $fields:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(PrimitiveDateTime);

        impl $name {
            /// Truncates `value` to this granularity.
            pub fn new(value: PrimitiveDateTime) -> Self {
                Self(truncate(value, $fields))
            }
            pub fn datetime(&self) -> PrimitiveDateTime {
                self.0
            }
            pub fn date(&self) -> Date {
                self.0.date()
            }
        }

        impl From<PrimitiveDateTime> for $name {
            fn from(value: PrimitiveDateTime) -> Self {
                Self::new(value)
            }
        }

        impl From<$name> for PrimitiveDateTime {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                write_canonical(f, &self.0, $fields)
            }
        }

        impl FromStr for $name {
            type Err = Error;
            fn from_str(s: &str) -> Result<Self> {
                parse_canonical(s, $fields)
                    .map(Self)
                    .ok_or_else(|| Error::conversion(s, stringify!($name)))
            }
        }
    };
}

granularity!(
    /// A calendar day, canonical form `2024-03-05`.
    Day,
    0
);
granularity!(
    /// An hour of a day, canonical form `2024-03-05T14`.
    Hour,
    1
);
granularity!(
    /// A minute, canonical form `2024-03-05T14:30`.
    Minute,
    2
);
granularity!(
    /// A second, canonical form `2024-03-05T14:30:15`.
    Second,
    3
);
granularity!(
    /// A millisecond, canonical form `2024-03-05T14:30:15.123`.
    Millisecond,
    4
);

impl From<Date> for Day {
    fn from(value: Date) -> Self {
        Self(value.midnight())
    }
}

fn truncate(value: PrimitiveDateTime, fields: u8) -> PrimitiveDateTime {
    let (hour, minute, second, milli) = value.time().as_hms_milli();
    let time = match fields {
        0 => Time::MIDNIGHT,
        1 => Time::from_hms(hour, 0, 0).unwrap_or(Time::MIDNIGHT),
        2 => Time::from_hms(hour, minute, 0).unwrap_or(Time::MIDNIGHT),
        3 => Time::from_hms(hour, minute, second).unwrap_or(Time::MIDNIGHT),
        _ => Time::from_hms_milli(hour, minute, second, milli).unwrap_or(Time::MIDNIGHT),
    };
    value.replace_time(time)
}

fn write_canonical(f: &mut Formatter<'_>, value: &PrimitiveDateTime, fields: u8) -> fmt::Result {
    let (hour, minute, second, milli) = value.time().as_hms_milli();
    write!(f, "{}", value.date())?;
    if fields >= 1 {
        write!(f, "T{hour:02}")?;
    }
    if fields >= 2 {
        write!(f, ":{minute:02}")?;
    }
    if fields >= 3 {
        write!(f, ":{second:02}")?;
    }
    if fields >= 4 {
        write!(f, ".{milli:03}")?;
    }
    Ok(())
}

fn parse_canonical(input: &str, fields: u8) -> Option<PrimitiveDateTime> {
    let (date, clock) = match input.split_once('T') {
        Some((date, clock)) => (date, Some(clock)),
        None => (input, None),
    };
    let date = Date::parse(date, DATE_FORMAT).ok()?;
    if fields == 0 {
        return clock.is_none().then(|| date.midnight());
    }
    let clock = clock?;
    let (clock, milli) = if fields == 4 {
        let (clock, milli) = clock.split_once('.')?;
        if milli.len() != 3 || !milli.bytes().all(|v| v.is_ascii_digit()) {
            return None;
        }
        (clock, milli.parse::<u16>().ok()?)
    } else {
        (clock, 0)
    };
    let parts = clock
        .split(':')
        .map(|v| {
            (v.len() == 2 && v.bytes().all(|v| v.is_ascii_digit()))
                .then(|| v.parse::<u8>().ok())
                .flatten()
        })
        .collect::<Option<Vec<_>>>()?;
    if parts.len() != fields.min(3) as usize {
        return None;
    }
    let part = |i: usize| parts.get(i).copied().unwrap_or(0);
    let time = Time::from_hms_milli(part(0), part(1), part(2), milli).ok()?;
    Some(date.with_time(time))
}

/// Text form of a driver timestamp, as stored by drivers lacking a native type.
pub fn format_timestamp(value: &PrimitiveDateTime) -> String {
    value
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:9]"
        ))
        .unwrap_or_else(|_| value.to_string())
}

/// Parses the text form of a timestamp, with or without fractional seconds.
pub fn parse_timestamp(input: &str) -> Result<PrimitiveDateTime> {
    let formats: [&[time::format_description::BorrowedFormatItem<'static>]; 4] = [
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ];
    formats
        .iter()
        .find_map(|format| PrimitiveDateTime::parse(input, format).ok())
        .or_else(|| Date::parse(input, DATE_FORMAT).ok().map(Date::midnight))
        .ok_or_else(|| Error::conversion(input, "timestamp"))
}

pub fn format_local_date(value: &Date) -> String {
    value.format(DATE_FORMAT).unwrap_or_else(|_| value.to_string())
}

pub fn parse_local_date(input: &str) -> Result<Date> {
    Date::parse(input, DATE_FORMAT).map_err(|_| Error::conversion(input, "local date"))
}

/// ISO 8601 local date time with nanosecond precision: `2024-03-05T14:30:15.000000001`.
pub fn format_local_datetime(value: &PrimitiveDateTime) -> String {
    value
        .format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:9]"
        ))
        .unwrap_or_else(|_| value.to_string())
}

pub fn parse_local_datetime(input: &str) -> Result<PrimitiveDateTime> {
    let formats: [&[time::format_description::BorrowedFormatItem<'static>]; 3] = [
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]"),
    ];
    formats
        .iter()
        .find_map(|format| PrimitiveDateTime::parse(input, format).ok())
        .ok_or_else(|| Error::conversion(input, "local date time"))
}

pub fn format_zoned(value: &OffsetDateTime) -> anyhow::Result<String> {
    Ok(value.format(&Rfc3339)?)
}

pub fn parse_zoned(input: &str) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(input, &Rfc3339)
        .or_else(|_| {
            OffsetDateTime::parse(
                input,
                format_description!(
                    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond][offset_hour]:[offset_minute]"
                ),
            )
        })
        .map_err(|_| Error::conversion(input, "zoned timestamp"))
}
