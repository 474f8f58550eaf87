use crate::{
    AttributeDescriptor, DriverValue, Error, Query, RecordDescriptor, Result, Value, marshal,
    separated_by, starts_with_where,
};

/// Produces the SQL of the generated statements.
///
/// The default methods write the generic dialect, drivers override what differs.
pub trait SqlWriter {
    fn write_identifier(&self, out: &mut String, value: &str) {
        out.push_str(value);
    }

    fn write_placeholder(&self, out: &mut String, _index: usize) {
        out.push('?');
    }

    /// Row locking clause appended to selects asked to lock.
    fn write_for_update(&self, out: &mut String) {
        out.push_str(" for update");
    }

    fn write_returning(&self, out: &mut String, column: &str) {
        out.push_str(" returning ");
        self.write_identifier(out, column);
    }

    /// `column = ?` for every key attribute joined by `and`, binding `values` in key order.
    fn write_key_condition<R>(
        &self,
        out: &mut String,
        params: &mut Vec<DriverValue>,
        descriptor: &RecordDescriptor<R>,
        values: Vec<Value>,
    ) -> Result<()>
    where
        Self: Sized,
    {
        let keys = descriptor.key_attributes();
        if keys.len() == 0 {
            return Err(Error::NoPrimaryKey {
                record: descriptor.type_name(),
            });
        }
        if keys.len() != values.len() {
            return Err(Error::UnsupportedShape {
                record: descriptor.type_name(),
                reason: format!(
                    "has {} key attributes but {} key values were given",
                    keys.len(),
                    values.len()
                ),
            });
        }
        separated_by(
            out,
            keys.zip(values),
            |out, (attribute, value)| {
                self.write_identifier(out, &attribute.column_name);
                out.push_str(" = ");
                self.write_placeholder(out, params.len());
                params.push(marshal(value, attribute.store_as_timestamp));
            },
            " and ",
        );
        Ok(())
    }

    /// Insert of every non null attribute of `record`, in descriptor order.
    fn write_insert<R>(
        &self,
        descriptor: &RecordDescriptor<R>,
        record: &R,
        returning: Option<&str>,
    ) -> Query
    where
        Self: Sized,
    {
        let mut sql = String::with_capacity(128);
        let mut params = Vec::new();
        sql.push_str("insert into ");
        self.write_identifier(&mut sql, descriptor.relation());
        let values: Vec<(&AttributeDescriptor<R>, Value)> = descriptor
            .attributes()
            .iter()
            .map(|v| (v, v.get(record)))
            .filter(|(_, v)| !v.is_null())
            .collect();
        if values.is_empty() {
            sql.push_str(" default values");
        } else {
            sql.push_str(" (");
            separated_by(
                &mut sql,
                &values,
                |out, (attribute, _)| self.write_identifier(out, &attribute.column_name),
                ", ",
            );
            sql.push_str(") values (");
            separated_by(
                &mut sql,
                values,
                |out, (attribute, value)| {
                    self.write_placeholder(out, params.len());
                    params.push(marshal(value, attribute.store_as_timestamp));
                },
                ", ",
            );
            sql.push(')');
        }
        if let Some(column) = returning {
            self.write_returning(&mut sql, column);
        }
        Query::new(sql, params)
    }

    /// Update of every non key attribute, located by the key of `record`.
    fn write_update<R>(&self, descriptor: &RecordDescriptor<R>, record: &R) -> Result<Query>
    where
        Self: Sized,
    {
        let mut sql = String::with_capacity(128);
        let mut params = Vec::new();
        sql.push_str("update ");
        self.write_identifier(&mut sql, descriptor.relation());
        sql.push_str(" set ");
        let len = sql.len();
        separated_by(
            &mut sql,
            descriptor.non_key_attributes(),
            |out, attribute| {
                self.write_identifier(out, &attribute.column_name);
                out.push_str(" = ");
                self.write_placeholder(out, params.len());
                params.push(marshal(attribute.get(record), attribute.store_as_timestamp));
            },
            ", ",
        );
        if sql.len() == len {
            return Err(Error::UnsupportedShape {
                record: descriptor.type_name(),
                reason: "has no attribute outside of the key to update".into(),
            });
        }
        sql.push_str(" where ");
        self.write_key_condition(&mut sql, &mut params, descriptor, key_values(descriptor, record))?;
        Ok(Query::new(sql, params))
    }

    fn write_delete<R>(&self, descriptor: &RecordDescriptor<R>, record: &R) -> Result<Query>
    where
        Self: Sized,
    {
        self.write_delete_by_key(descriptor, key_values(descriptor, record))
    }

    fn write_delete_by_key<R>(
        &self,
        descriptor: &RecordDescriptor<R>,
        key: Vec<Value>,
    ) -> Result<Query>
    where
        Self: Sized,
    {
        let mut sql = String::with_capacity(64);
        let mut params = Vec::new();
        sql.push_str("delete from ");
        self.write_identifier(&mut sql, descriptor.relation());
        sql.push_str(" where ");
        self.write_key_condition(&mut sql, &mut params, descriptor, key)?;
        Ok(Query::new(sql, params))
    }

    /// Select of the whole relation filtered by `fragment`.
    ///
    /// A fragment starting with `where` is appended to `select * from <relation>`, any
    /// other fragment is taken as a complete statement.
    fn write_select<R>(&self, descriptor: &RecordDescriptor<R>, fragment: &str, for_update: bool) -> String
    where
        Self: Sized,
    {
        let mut sql = String::with_capacity(64 + fragment.len());
        if starts_with_where(fragment) {
            sql.push_str("select * from ");
            self.write_identifier(&mut sql, descriptor.relation());
            sql.push(' ');
            sql.push_str(fragment.trim_start());
        } else {
            sql.push_str(fragment);
        }
        if for_update {
            self.write_for_update(&mut sql);
        }
        sql
    }

    /// Select of the row whose single key attribute equals `key`.
    fn write_select_by_key<R>(
        &self,
        descriptor: &RecordDescriptor<R>,
        key: Value,
        for_update: bool,
    ) -> Result<Query>
    where
        Self: Sized,
    {
        let attribute = descriptor.single_key()?;
        let mut sql = String::with_capacity(64);
        sql.push_str("select * from ");
        self.write_identifier(&mut sql, descriptor.relation());
        sql.push_str(" where ");
        self.write_identifier(&mut sql, &attribute.column_name);
        sql.push_str(" = ");
        self.write_placeholder(&mut sql, 0);
        if for_update {
            self.write_for_update(&mut sql);
        }
        Ok(Query::new(
            sql,
            vec![marshal(key, attribute.store_as_timestamp)],
        ))
    }

    /// Select of the row with the given key, one value per key attribute.
    fn write_select_by_keys<R>(
        &self,
        descriptor: &RecordDescriptor<R>,
        key: Vec<Value>,
        for_update: bool,
    ) -> Result<Query>
    where
        Self: Sized,
    {
        let mut sql = String::with_capacity(64);
        let mut params = Vec::new();
        sql.push_str("select * from ");
        self.write_identifier(&mut sql, descriptor.relation());
        sql.push_str(" where ");
        self.write_key_condition(&mut sql, &mut params, descriptor, key)?;
        if for_update {
            self.write_for_update(&mut sql);
        }
        Ok(Query::new(sql, params))
    }
}

/// Current key values of `record`, in key order.
pub fn key_values<R>(descriptor: &RecordDescriptor<R>, record: &R) -> Vec<Value> {
    descriptor
        .key_attributes()
        .map(|v| v.get(record))
        .collect()
}

/// Writer of the generic dialect.
#[derive(Default, Debug, Clone, Copy)]
pub struct GenericSqlWriter;

impl GenericSqlWriter {
    pub fn new() -> Self {
        Self
    }
}

impl SqlWriter for GenericSqlWriter {}
