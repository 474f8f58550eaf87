use crate::{AsValue, DriverValue, Value, marshal, separated_by, truncate_long};
use std::{
    fmt::{self, Display, Write},
    sync::Arc,
};

/// SQL text together with its ordered bound parameters.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Query {
    pub sql: String,
    pub params: Vec<DriverValue>,
}

impl Query {
    pub fn new(sql: impl Into<String>, params: Vec<DriverValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

impl From<&str> for Query {
    fn from(value: &str) -> Self {
        Query::new(value, Vec::new())
    }
}

impl From<String> for Query {
    fn from(value: String) -> Self {
        Query::new(value, Vec::new())
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", truncate_long!(self.sql))?;
        if !self.params.is_empty() {
            let mut params = String::new();
            separated_by(
                &mut params,
                &self.params,
                |out, v| {
                    let _ = write!(out, "{v}");
                },
                ", ",
            );
            write!(f, "-- [{params}]")?;
        }
        Ok(())
    }
}

/// A parameter of caller written SQL.
///
/// Date like values bind as their canonical text unless wrapped with
/// [`Parameter::timestamp`], matching columns of attributes marked `timestamp`.
#[derive(Debug, Clone, PartialEq)]
pub enum Parameter {
    Value(Value),
    /// Bound as a driver timestamp when the value is date like.
    Timestamp(Value),
    /// Bound as is.
    Driver(DriverValue),
}

impl Parameter {
    pub fn timestamp(value: impl Into<Value>) -> Self {
        Parameter::Timestamp(value.into())
    }

    /// The value handed to the driver.
    pub fn into_driver_value(self) -> DriverValue {
        match self {
            Parameter::Value(v) => marshal(v, false),
            Parameter::Timestamp(v) => marshal(v, true),
            Parameter::Driver(v) => v,
        }
    }
}

impl From<Value> for Parameter {
    fn from(value: Value) -> Self {
        Parameter::Value(value)
    }
}

impl From<DriverValue> for Parameter {
    fn from(value: DriverValue) -> Self {
        Parameter::Driver(value)
    }
}

impl<T: AsValue> From<T> for Parameter {
    fn from(value: T) -> Self {
        Parameter::Value(value.as_value())
    }
}

/// Shared reference-counted column name list.
pub type RowNames = Arc<[String]>;
/// Owned row value slice matching `RowNames` length.
pub type Row = Box<[DriverValue]>;

/// A result row with its corresponding column labels.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLabeled {
    /// Column names.
    pub labels: RowNames,
    /// Data values (aligned by index with `labels`).
    pub values: Row,
}

impl RowLabeled {
    pub fn new(names: RowNames, values: Row) -> Self {
        Self {
            labels: names,
            values,
        }
    }
    pub fn names(&self) -> &[String] {
        &self.labels
    }
    pub fn values(&self) -> &[DriverValue] {
        &self.values
    }
    /// Position of the column named `name`, ignoring ASCII case.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.labels.iter().position(|v| v.eq_ignore_ascii_case(name))
    }
    pub fn get_column(&self, name: &str) -> Option<&DriverValue> {
        self.position(name).map(|i| &self.values[i])
    }
}

impl From<RowLabeled> for Row {
    fn from(value: RowLabeled) -> Self {
        value.values
    }
}
