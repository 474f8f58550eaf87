use crate::{
    CBox, SharedHandle, error_message_from_ptr,
    extract::{extract_name, extract_value},
};
use anyhow::{Error, Result};
use libsqlite3_sys::*;
use skiff_core::{
    DriverValue, RowLabeled, RowNames, Rows, Statement, format_timestamp, format_zoned,
    truncate_long,
};
use std::{
    ffi::{CStr, c_int},
    fmt::{self, Display},
    os::raw::{c_char, c_void},
    sync::Arc,
};

/// Error raised by `statement`, with the message SQLite reports for its database.
fn statement_error(statement: *mut sqlite3_stmt, context: impl Display) -> Error {
    unsafe {
        let db = sqlite3_db_handle(statement);
        let query = sqlite3_sql(statement);
        let sql = if query.is_null() {
            Default::default()
        } else {
            CStr::from_ptr(query).to_string_lossy()
        };
        let error = Error::msg(error_message_from_ptr(sqlite3_errmsg(db)).to_string())
            .context(format!("{context} of query:\n{}", truncate_long!(sql)));
        log::error!("{:#}", error);
        error
    }
}

/// A prepared statement. Declared before the handle so it is finalized first.
pub struct SqliteStatement {
    pub(crate) statement: CBox<*mut sqlite3_stmt>,
    connection: SharedHandle,
}

impl SqliteStatement {
    pub(crate) fn new(statement: CBox<*mut sqlite3_stmt>, connection: SharedHandle) -> Self {
        unsafe {
            sqlite3_clear_bindings(*statement);
        }
        Self {
            statement,
            connection,
        }
    }

    fn bind_text(&mut self, index: c_int, value: &str) -> c_int {
        unsafe {
            sqlite3_bind_text(
                *self.statement,
                index,
                value.as_ptr() as *const c_char,
                value.len() as c_int,
                SQLITE_TRANSIENT(),
            )
        }
    }
}

impl Statement for SqliteStatement {
    type Rows = SqliteRows;

    fn bind(&mut self, index: usize, value: &DriverValue) -> Result<()> {
        let index = index as c_int + 1;
        let rc = unsafe {
            match value {
                DriverValue::Null => sqlite3_bind_null(*self.statement, index),
                DriverValue::Boolean(v) => sqlite3_bind_int(*self.statement, index, *v as c_int),
                DriverValue::Int32(v) => sqlite3_bind_int(*self.statement, index, *v),
                DriverValue::Int64(v) => sqlite3_bind_int64(*self.statement, index, *v),
                DriverValue::Real(v) => sqlite3_bind_double(*self.statement, index, *v),
                DriverValue::Decimal(v) => self.bind_text(index, &v.to_string()),
                DriverValue::Text(v) => self.bind_text(index, v),
                DriverValue::Blob(v) => sqlite3_bind_blob(
                    *self.statement,
                    index,
                    v.as_ptr() as *const c_void,
                    v.len() as c_int,
                    SQLITE_TRANSIENT(),
                ),
                DriverValue::Date(v) => self.bind_text(index, &v.to_string()),
                DriverValue::Timestamp(v) => self.bind_text(index, &format_timestamp(v)),
                DriverValue::TimestampTz(v) => self.bind_text(index, &format_zoned(v)?),
            }
        };
        if rc != SQLITE_OK {
            return Err(statement_error(
                *self.statement,
                format!("Cannot bind parameter {index}"),
            ));
        }
        Ok(())
    }

    /// Rows changed by this statement, 0 for statements that are not an insert, update or delete.
    fn execute_update(&mut self) -> Result<u64> {
        unsafe {
            let db = **self.connection;
            let before = sqlite3_total_changes64(db);
            loop {
                match sqlite3_step(*self.statement) {
                    SQLITE_ROW => continue,
                    SQLITE_DONE => break,
                    _ => {
                        let error = statement_error(*self.statement, "While executing");
                        sqlite3_reset(*self.statement);
                        return Err(error);
                    }
                }
            }
            let changes = if sqlite3_total_changes64(db) == before {
                0
            } else {
                sqlite3_changes64(db) as u64
            };
            sqlite3_reset(*self.statement);
            Ok(changes)
        }
    }

    fn execute_query(self) -> Result<SqliteRows> {
        let count = unsafe { sqlite3_column_count(*self.statement) };
        let labels = (0..count)
            .map(|i| extract_name(*self.statement, i))
            .collect::<Result<Arc<[_]>>>()?;
        Ok(SqliteRows {
            statement: self.statement,
            _connection: self.connection,
            labels,
            done: false,
        })
    }
}

impl Display for SqliteStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:p}", *self.statement)
    }
}

/// Rows of a running query, the statement is finalized when dropped.
pub struct SqliteRows {
    statement: CBox<*mut sqlite3_stmt>,
    _connection: SharedHandle,
    labels: RowNames,
    done: bool,
}

impl Rows for SqliteRows {
    fn labels(&self) -> &RowNames {
        &self.labels
    }

    fn fetch(&mut self) -> Result<Option<RowLabeled>> {
        if self.done {
            return Ok(None);
        }
        match unsafe { sqlite3_step(*self.statement) } {
            SQLITE_ROW => {
                let values = (0..self.labels.len() as c_int)
                    .map(|i| extract_value(*self.statement, i))
                    .collect::<Result<_>>()?;
                Ok(Some(RowLabeled::new(Arc::clone(&self.labels), values)))
            }
            SQLITE_DONE => {
                self.done = true;
                Ok(None)
            }
            _ => {
                self.done = true;
                Err(statement_error(*self.statement, "While fetching a row"))
            }
        }
    }
}
