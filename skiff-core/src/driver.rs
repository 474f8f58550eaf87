use crate::{Dialect, RowLabeled, RowNames, SqlWriter};
use rust_decimal::Decimal;
use std::fmt::{self, Display};
use time::{Date, OffsetDateTime, PrimitiveDateTime};

/// Parameter or column value as exchanged with a driver.
#[derive(Default, Debug, Clone, PartialEq)]
pub enum DriverValue {
    #[default]
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Real(f64),
    Decimal(Decimal),
    Text(String),
    Blob(Box<[u8]>),
    Date(Date),
    Timestamp(PrimitiveDateTime),
    TimestampTz(OffsetDateTime),
}

impl DriverValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DriverValue::Null)
    }
    /// Integer content of the value, if it is an integer column.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DriverValue::Int32(v) => Some(*v as i64),
            DriverValue::Int64(v) => Some(*v),
            _ => None,
        }
    }
}

impl Display for DriverValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverValue::Null => f.write_str("null"),
            DriverValue::Boolean(v) => write!(f, "{v}"),
            DriverValue::Int32(v) => write!(f, "{v}"),
            DriverValue::Int64(v) => write!(f, "{v}"),
            DriverValue::Real(v) => write!(f, "{v}"),
            DriverValue::Decimal(v) => write!(f, "{v}"),
            DriverValue::Text(v) => write!(f, "'{}'", v.replace('\'', "''")),
            DriverValue::Blob(v) => write!(f, "<{} bytes>", v.len()),
            DriverValue::Date(v) => write!(f, "'{v}'"),
            DriverValue::Timestamp(v) => write!(f, "'{v}'"),
            DriverValue::TimestampTz(v) => write!(f, "'{v}'"),
        }
    }
}

/// A database backend: its name, dialect and SQL writer.
pub trait Driver {
    /// Backend name, also the dialect name used by generated key ignore lists.
    const NAME: &'static str;
    type SqlWriter: SqlWriter;

    fn dialect(&self) -> Dialect {
        Dialect::from_name(Self::NAME)
    }
    fn sql_writer(&self) -> Self::SqlWriter;
}

/// One raw connection, owned by a single unit of work.
pub trait Connection {
    type Driver: Driver;
    type Statement: Statement;

    fn driver(&self) -> &Self::Driver;
    fn prepare(&mut self, sql: &str) -> anyhow::Result<Self::Statement>;
    fn set_auto_commit(&mut self, auto_commit: bool) -> anyhow::Result<()>;
    fn commit(&mut self) -> anyhow::Result<()>;
    fn rollback(&mut self) -> anyhow::Result<()>;
}

/// A prepared statement. Parameters are bound by position, starting from 0.
pub trait Statement {
    type Rows: Rows + 'static;

    fn bind(&mut self, index: usize, value: &DriverValue) -> anyhow::Result<()>;
    /// Runs the statement to completion and returns the number of affected rows.
    fn execute_update(&mut self) -> anyhow::Result<u64>;
    /// Runs the statement and hands over the driver cursor positioned before the first row.
    fn execute_query(self) -> anyhow::Result<Self::Rows>;
}

/// Driver level cursor. Dropping it releases the underlying handles.
pub trait Rows {
    fn labels(&self) -> &RowNames;
    /// Next row, `None` once the result is exhausted.
    fn fetch(&mut self) -> anyhow::Result<Option<RowLabeled>>;
}

/// Hands out connections and takes them back. Skiff never pools.
pub trait ConnectionSource {
    type Connection: Connection;

    fn acquire(&self) -> anyhow::Result<Self::Connection>;
    fn release(&self, connection: Self::Connection) -> anyhow::Result<()>;
}

/// Driver of the connections produced by a source.
pub type DriverOf<S> = <<S as ConnectionSource>::Connection as Connection>::Driver;
/// SQL writer of the connections produced by a source.
pub type WriterOf<S> = <DriverOf<S> as Driver>::SqlWriter;
