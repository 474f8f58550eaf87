use crate::{CBox, SqliteDriver, SqliteStatement, error_message_from_ptr};
use anyhow::{Context, Error, Result};
use libsqlite3_sys::{
    SQLITE_OK, SQLITE_OPEN_CREATE, SQLITE_OPEN_READWRITE, SQLITE_OPEN_URI, sqlite3,
    sqlite3_busy_timeout, sqlite3_close, sqlite3_errmsg, sqlite3_exec, sqlite3_finalize,
    sqlite3_free, sqlite3_get_autocommit, sqlite3_open_v2, sqlite3_prepare_v2, sqlite3_stmt,
};
use skiff_core::{Connection, Driver, truncate_long};
use std::{
    ffi::{CString, c_char, c_int},
    ptr,
    rc::Rc,
    time::Duration,
};

/// Database handle shared by a connection and the statements prepared from it.
pub(crate) type SharedHandle = Rc<CBox<*mut sqlite3>>;

/// A single SQLite database handle.
///
/// Every statement and row cursor prepared from it keeps the handle alive: the database is
/// closed once the connection and all of them are gone, statements being finalized first.
pub struct SqliteConnection {
    pub(crate) connection: SharedHandle,
    driver: SqliteDriver,
    auto_commit: bool,
}

impl SqliteConnection {
    /// Opens `sqlite://<path>[?query]`, the remainder is handed to SQLite as a `file:` URI.
    pub fn connect(url: &str, busy_timeout: Option<Duration>) -> Result<SqliteConnection> {
        let prefix = format!("{}://", SqliteDriver::NAME);
        let Some(location) = url.strip_prefix(&prefix) else {
            let error = Error::msg(format!(
                "Expected sqlite connection url to start with `{prefix}`, got `{url}`"
            ));
            log::error!("{:#}", error);
            return Err(error);
        };
        let context = || format!("Error while decoding connection URL: `{url}`");
        let uri = CString::new(format!("file:{location}")).with_context(context)?;
        let mut connection = CBox::new(ptr::null_mut::<sqlite3>(), |p| unsafe {
            sqlite3_close(p);
        });
        unsafe {
            let rc = sqlite3_open_v2(
                uri.as_ptr(),
                &mut *connection,
                SQLITE_OPEN_URI | SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE,
                ptr::null(),
            );
            if rc != SQLITE_OK {
                let error = Error::msg(error_message_from_ptr(sqlite3_errmsg(*connection)).to_string())
                    .context(format!("Could not open the database at `{url}`"));
                log::error!("{:#}", error);
                return Err(error);
            }
            if let Some(timeout) = busy_timeout {
                let millis = c_int::try_from(timeout.as_millis()).unwrap_or(c_int::MAX);
                sqlite3_busy_timeout(*connection, millis);
            }
        }
        log::debug!("Connected to {url}");
        Ok(Self {
            connection: Rc::new(connection),
            driver: SqliteDriver::new(),
            auto_commit: true,
        })
    }

    /// Runs one or more statements that produce no rows.
    pub fn execute_batch(&mut self, sql: &str) -> Result<()> {
        let context = || format!("While executing:\n{}", truncate_long!(sql));
        let batch = CString::new(sql).with_context(context)?;
        unsafe {
            let mut message: *mut c_char = ptr::null_mut();
            let rc = sqlite3_exec(
                **self.connection,
                batch.as_ptr(),
                None,
                ptr::null_mut(),
                &mut message,
            );
            if rc != SQLITE_OK {
                let error = Error::msg(error_message_from_ptr(message).to_string()).context(context());
                sqlite3_free(message.cast());
                log::error!("{:#}", error);
                return Err(error);
            }
        }
        Ok(())
    }

    /// Closes the handle, rolling back a transaction still open.
    ///
    /// While statements prepared from this connection are alive the handle stays open, it is
    /// closed when the last of them is dropped.
    pub fn close(self) -> Result<()> {
        let mut handle = match Rc::try_unwrap(self.connection) {
            Ok(handle) => handle,
            Err(..) => {
                log::debug!("Statements are still alive, the database closes when they are dropped");
                return Ok(());
            }
        };
        let rc = unsafe { sqlite3_close(*handle) };
        if rc != SQLITE_OK {
            let error = Error::msg(error_message_from_ptr(unsafe { sqlite3_errmsg(*handle) }).to_string())
                .context(format!("Could not close the database, error code {rc}"));
            log::error!("{:#}", error);
            return Err(error);
        }
        *handle = ptr::null_mut();
        Ok(())
    }

    /// Number of owners of the database handle: this connection plus its live statements.
    pub fn handle_owners(&self) -> usize {
        Rc::strong_count(&self.connection)
    }

    /// True while a transaction is open on the handle.
    pub fn in_transaction(&self) -> bool {
        unsafe { sqlite3_get_autocommit(**self.connection) == 0 }
    }

    /// Ends the transaction as `end`, then opens the next one unless in auto commit.
    fn finish(&mut self, end: &str) -> Result<()> {
        if self.in_transaction() {
            self.execute_batch(end)?;
        }
        if !self.auto_commit {
            self.execute_batch("BEGIN")?;
        }
        Ok(())
    }
}

impl Connection for SqliteConnection {
    type Driver = SqliteDriver;
    type Statement = SqliteStatement;

    fn driver(&self) -> &SqliteDriver {
        &self.driver
    }

    fn prepare(&mut self, sql: &str) -> Result<SqliteStatement> {
        let context = || format!("While preparing the query:\n{}", truncate_long!(sql));
        let query = CString::new(sql)
            .context("Could not create a CString from the query String")
            .with_context(context)?;
        let mut statement = CBox::new(ptr::null_mut::<sqlite3_stmt>(), |p| unsafe {
            sqlite3_finalize(p);
        });
        unsafe {
            let mut tail: *const c_char = ptr::null();
            let rc = sqlite3_prepare_v2(
                **self.connection,
                query.as_ptr(),
                -1,
                &mut *statement,
                &mut tail,
            );
            if rc != SQLITE_OK {
                let error = Error::msg(error_message_from_ptr(sqlite3_errmsg(**self.connection)).to_string())
                    .context(context());
                log::error!("{:#}", error);
                return Err(error);
            }
            if !tail.is_null() && *tail != 0 {
                let rest = error_message_from_ptr(tail).trim();
                if !rest.is_empty() && rest != ";" {
                    let error = Error::msg("Cannot prepare more than one statement at a time")
                        .context(context());
                    log::error!("{:#}", error);
                    return Err(error);
                }
            }
        }
        if statement.is_null() {
            let error = Error::msg("The query contains no statement").context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        Ok(SqliteStatement::new(statement, Rc::clone(&self.connection)))
    }

    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<()> {
        if self.auto_commit == auto_commit {
            return Ok(());
        }
        self.auto_commit = auto_commit;
        if auto_commit {
            if self.in_transaction() {
                self.execute_batch("COMMIT")?;
            }
        } else if !self.in_transaction() {
            self.execute_batch("BEGIN")?;
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.finish("COMMIT")
    }

    fn rollback(&mut self) -> Result<()> {
        self.finish("ROLLBACK")
    }
}
