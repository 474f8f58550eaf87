use crate::{
    ArrayExtractor, AsValue, Connection, ConnectionSource, Dialect, Driver, DriverValue, Error,
    KeyPlan, MapExtractor, OpenCursors, Parameter, Query, RawArray, RawMap, Record, RecordDescriptor, Result,
    ResultCursor, RowExtractor, RowMapper, ScalarExtractor, SqlWriter, Statement, Value,
    WriterOf, describe, describe_table,
};
use std::{cell::RefCell, rc::Rc};

/// Options of record queries.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Attributes without a matching column are left unset instead of failing.
    pub tolerant: bool,
    /// Lock the selected rows until the unit ends.
    pub for_update: bool,
}

impl QueryOptions {
    pub fn tolerant() -> Self {
        Self {
            tolerant: true,
            ..Default::default()
        }
    }
    pub fn for_update() -> Self {
        Self {
            for_update: true,
            ..Default::default()
        }
    }
}

/// A unit of work: one connection, one transaction, and the cursors opened on it.
///
/// Auto-commit is disabled for the whole life of the unit. The unit ends with
/// [`ConnectionUnit::commit_and_close`] or [`ConnectionUnit::rollback_and_close`], both
/// of which close every cursor still open before releasing the connection. A unit
/// dropped while still open is rolled back.
pub struct ConnectionUnit<'s, S: ConnectionSource> {
    source: &'s S,
    connection: Option<S::Connection>,
    dialect: Dialect,
    writer: WriterOf<S>,
    cursors: Rc<RefCell<OpenCursors>>,
}

impl<'s, S: ConnectionSource> ConnectionUnit<'s, S> {
    /// Acquires a connection from `source` and starts a transaction on it.
    pub fn from_source(source: &'s S) -> Result<Self> {
        let mut connection = source
            .acquire()
            .map_err(|e| Error::operation("acquire connection", e))?;
        if let Err(e) = connection.set_auto_commit(false) {
            if let Err(e) = source.release(connection) {
                log::error!("{e:#}");
            }
            return Err(Error::operation("disable auto-commit", e));
        }
        let driver = connection.driver();
        let dialect = driver.dialect();
        let writer = driver.sql_writer();
        Ok(Self {
            source,
            connection: Some(connection),
            dialect,
            writer,
            cursors: Default::default(),
        })
    }

    /// Runs `f` inside a fresh unit: commits when it succeeds, rolls back when it fails.
    pub fn run<T, E, F>(source: &'s S, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> std::result::Result<T, E>,
        E: Into<Error>,
    {
        let mut unit = Self::from_source(source)?;
        match f(&mut unit) {
            Ok(result) => {
                if !unit.is_closed() {
                    unit.commit_and_close()?;
                }
                Ok(result)
            }
            Err(e) => Err(unit.rollback_close_and_wrap(e)),
        }
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn is_closed(&self) -> bool {
        self.connection.is_none()
    }

    /// Number of cursors opened on this unit and not yet closed.
    pub fn open_cursors(&self) -> usize {
        self.cursors.borrow().len()
    }

    fn connection(&mut self) -> Result<&mut S::Connection> {
        self.connection.as_mut().ok_or(Error::Closed)
    }

    fn prepare(
        &mut self,
        query: &Query,
    ) -> Result<<S::Connection as Connection>::Statement> {
        let connection = self.connection()?;
        log::debug!("{query}");
        let mut statement = connection
            .prepare(&query.sql)
            .map_err(|e| Error::database(query, e))?;
        for (i, value) in query.params.iter().enumerate() {
            statement
                .bind(i, value)
                .map_err(|e| Error::database(query, e))?;
        }
        Ok(statement)
    }

    fn execute_query(&mut self, query: &Query) -> Result<u64> {
        let mut statement = self.prepare(query)?;
        statement
            .execute_update()
            .map_err(|e| Error::database(query, e))
    }

    fn open_cursor<T>(
        &mut self,
        query: Query,
        mapper: Box<dyn RowMapper<T>>,
    ) -> Result<ResultCursor<T>> {
        let statement = self.prepare(&query)?;
        let rows = statement
            .execute_query()
            .map_err(|e| Error::database(&query, e))?;
        ResultCursor::open(Box::new(rows), mapper, &self.cursors, query)
    }

    /// The only value produced by `cursor`.
    fn exactly_one<T>(mut cursor: ResultCursor<T>) -> Result<T> {
        let Some(result) = cursor.next() else {
            return Err(Error::NotFound {
                what: cursor.query().sql.clone(),
            });
        };
        let result = result?;
        if cursor.has_next() {
            return Err(Error::MultipleRows {
                what: cursor.query().sql.clone(),
            });
        }
        Ok(result)
    }

    fn expect_one_affected<R>(descriptor: &RecordDescriptor<R>, operation: &str, count: u64) -> Result<()> {
        let what = || {
            format!(
                "{operation} of `{}` affected {count} rows",
                descriptor.relation()
            )
        };
        match count {
            0 => Err(Error::NotFound { what: what() }),
            1 => Ok(()),
            _ => Err(Error::MultipleRows { what: what() }),
        }
    }

    /// Runs `sql` with `params` and returns the number of affected rows.
    pub fn execute(&mut self, sql: &str, params: &[Parameter]) -> Result<u64> {
        let query = caller_query(sql, params);
        self.execute_query(&query)
    }

    /// Value of the single column of the single row returned by `sql`.
    pub fn query_scalar(&mut self, sql: &str, params: &[Parameter]) -> Result<DriverValue> {
        let cursor = self.open_cursor(caller_query(sql, params), Box::new(ScalarExtractor))?;
        Self::exactly_one(cursor)
    }

    fn query_key(&mut self, sql: String) -> Result<i64> {
        let value = self.query_scalar(&sql, &[])?;
        value
            .as_i64()
            .ok_or_else(|| Error::conversion(&value, "generated key"))
    }

    /// Next value of the sequence `name`.
    pub fn next_sequence_value(&mut self, name: &str) -> Result<i64> {
        let sql = self.dialect.next_value_sql(name)?;
        self.query_key(sql)
    }

    /// Fills an absent sequence key, returns the read back query of an auto-increment key.
    fn prepare_generated_key<R: Record>(
        &mut self,
        descriptor: &RecordDescriptor<R>,
        record: &mut R,
    ) -> Result<Option<String>> {
        let Some(generated) = descriptor.generated_key() else {
            return Ok(None);
        };
        let attribute = &descriptor.attributes()[generated.attribute];
        if !attribute.get(record).is_null() {
            return Ok(None);
        }
        match generated.plan(&self.dialect)? {
            KeyPlan::Ignore => Ok(None),
            KeyPlan::Sequence { sql } => {
                let key = self.query_key(sql)?;
                attribute.set(record, Value::Int64(Some(key)))?;
                Ok(None)
            }
            KeyPlan::AutoIncrement { sql } => Ok(Some(sql)),
        }
    }

    fn read_back_key<R: Record>(
        &mut self,
        descriptor: &RecordDescriptor<R>,
        record: &mut R,
        sql: Option<String>,
    ) -> Result<()> {
        if let (Some(sql), Some(generated)) = (sql, descriptor.generated_key()) {
            let key = self.query_key(sql)?;
            descriptor.attributes()[generated.attribute].set(record, Value::Int64(Some(key)))?;
        }
        Ok(())
    }

    /// Inserts `record`, filling its generated key if it has one. Returns the row count.
    pub fn insert<R: Record>(&mut self, record: &mut R) -> Result<u64> {
        self.connection()?;
        let descriptor = describe_table::<R>()?;
        let read_back = self.prepare_generated_key(&descriptor, record)?;
        let query = self.writer.write_insert(&descriptor, record, None);
        let count = self.execute_query(&query)?;
        self.read_back_key(&descriptor, record, read_back)?;
        Ok(count)
    }

    /// Inserts `record` and returns the value the database stored in `column`.
    pub fn insert_returning<R: Record>(&mut self, record: &mut R, column: &str) -> Result<DriverValue> {
        self.connection()?;
        let descriptor = describe_table::<R>()?;
        let read_back = self.prepare_generated_key(&descriptor, record)?;
        let query = self.writer.write_insert(&descriptor, record, Some(column));
        let cursor = self.open_cursor(query, Box::new(ScalarExtractor))?;
        let result = Self::exactly_one(cursor)?;
        self.read_back_key(&descriptor, record, read_back)?;
        Ok(result)
    }

    /// Updates every non key attribute of the row with the key of `record`.
    pub fn update<R: Record>(&mut self, record: &R) -> Result<()> {
        self.connection()?;
        let descriptor = describe_table::<R>()?;
        let query = self.writer.write_update(&descriptor, record)?;
        let count = self.execute_query(&query)?;
        Self::expect_one_affected(&descriptor, "update", count)
    }

    /// Deletes the row with the key of `record`.
    pub fn delete<R: Record>(&mut self, record: &R) -> Result<()> {
        self.connection()?;
        let descriptor = describe_table::<R>()?;
        let query = self.writer.write_delete(&descriptor, record)?;
        let count = self.execute_query(&query)?;
        Self::expect_one_affected(&descriptor, "delete", count)
    }

    /// Deletes the row with the given key, one value per key attribute.
    pub fn delete_by_key<R: Record>(&mut self, key: &[Value]) -> Result<()> {
        self.connection()?;
        let descriptor = describe_table::<R>()?;
        let query = self.writer.write_delete_by_key(&descriptor, key.to_vec())?;
        let count = self.execute_query(&query)?;
        Self::expect_one_affected(&descriptor, "delete", count)
    }

    /// The record whose single key attribute equals `key`.
    pub fn get<R: Record>(&mut self, key: impl AsValue) -> Result<R> {
        self.connection()?;
        let descriptor = describe_table::<R>()?;
        let query = self
            .writer
            .write_select_by_key(&descriptor, key.as_value(), false)?;
        let cursor = self.open_cursor(query, Box::new(RowExtractor::new(descriptor, false)))?;
        Self::exactly_one(cursor)
    }

    /// Like [`ConnectionUnit::get`], `None` when no row has that key.
    pub fn find<R: Record>(&mut self, key: impl AsValue) -> Result<Option<R>> {
        match self.get(key) {
            Ok(record) => Ok(Some(record)),
            Err(Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// The record with the given key, one value per key attribute.
    pub fn get_by_key<R: Record>(&mut self, key: &[Value]) -> Result<R> {
        self.connection()?;
        let descriptor = describe_table::<R>()?;
        let query = self
            .writer
            .write_select_by_keys(&descriptor, key.to_vec(), false)?;
        let cursor = self.open_cursor(query, Box::new(RowExtractor::new(descriptor, false)))?;
        Self::exactly_one(cursor)
    }

    /// Records selected by `fragment`, either a full select or a `where ...` clause.
    pub fn query<R: Record>(&mut self, fragment: &str, params: &[Parameter]) -> Result<ResultCursor<R>> {
        self.query_with(fragment, params, QueryOptions::default())
    }

    pub fn query_with<R: Record>(
        &mut self,
        fragment: &str,
        params: &[Parameter],
        options: QueryOptions,
    ) -> Result<ResultCursor<R>> {
        self.connection()?;
        let descriptor = describe::<R>()?;
        let sql = self
            .writer
            .write_select(&descriptor, fragment, options.for_update);
        self.open_cursor(
            caller_query(sql, params),
            Box::new(RowExtractor::new(descriptor, options.tolerant)),
        )
    }

    /// The single record selected by `fragment`.
    pub fn query_one<R: Record>(&mut self, fragment: &str, params: &[Parameter]) -> Result<R> {
        let cursor = self.query(fragment, params)?;
        Self::exactly_one(cursor)
    }

    /// Rows of `sql` as column name to value maps.
    pub fn query_maps(&mut self, sql: &str, params: &[Parameter]) -> Result<ResultCursor<RawMap>> {
        self.open_cursor(caller_query(sql, params), Box::new(MapExtractor))
    }

    /// Rows of `sql` as positional values.
    pub fn query_arrays(&mut self, sql: &str, params: &[Parameter]) -> Result<ResultCursor<RawArray>> {
        self.open_cursor(caller_query(sql, params), Box::new(ArrayExtractor))
    }

    fn close_cursors(&mut self) {
        let closed = self.cursors.borrow_mut().close_all();
        if closed > 0 {
            log::debug!("Closed {closed} cursors left open");
        }
    }

    fn release(&mut self, connection: S::Connection) -> Result<()> {
        self.source
            .release(connection)
            .map_err(|e| Error::operation("release connection", e))
    }

    /// Closes the open cursors, commits and releases the connection.
    pub fn commit_and_close(&mut self) -> Result<()> {
        let mut connection = self.connection.take().ok_or(Error::Closed)?;
        self.close_cursors();
        let result = connection
            .commit()
            .map_err(|e| Error::operation("commit", e));
        if result.is_err() {
            if let Err(e) = connection.rollback() {
                log::error!("{e:#}");
            }
        }
        let released = self.release(connection);
        result.and(released)
    }

    /// Closes the open cursors, rolls back and releases the connection.
    pub fn rollback_and_close(&mut self) -> Result<()> {
        let mut connection = self.connection.take().ok_or(Error::Closed)?;
        self.close_cursors();
        let result = connection
            .rollback()
            .map_err(|e| Error::operation("rollback", e));
        let released = self.release(connection);
        result.and(released)
    }

    /// Rolls back and closes the unit unless already closed, then returns `error` as an [`Error`].
    ///
    /// Failures of the rollback itself are logged, `error` is what the caller gets.
    pub fn rollback_close_and_wrap(&mut self, error: impl Into<Error>) -> Error {
        if !self.is_closed() {
            if let Err(e) = self.rollback_and_close() {
                log::error!("{e:#}");
            }
        }
        error.into()
    }
}

impl<S: ConnectionSource> Drop for ConnectionUnit<'_, S> {
    fn drop(&mut self) {
        if self.is_closed() {
            return;
        }
        log::warn!("Connection unit dropped while open, rolling back");
        if let Err(e) = self.rollback_and_close() {
            log::warn!("{e:#}");
        }
    }
}

/// Caller supplied SQL with its parameters marshalled as given.
fn caller_query(sql: impl Into<String>, params: &[Parameter]) -> Query {
    Query::new(
        sql,
        params
            .iter()
            .cloned()
            .map(Parameter::into_driver_value)
            .collect(),
    )
}
