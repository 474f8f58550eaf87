use crate::{DriverValue, Query, separated_by, truncate_long};
use std::fmt::Write;

pub type Result<T> = std::result::Result<T, Error>;

/// Boxed failure coming from a driver or from user code.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Every failure reported by Skiff.
///
/// Driver failures arrive as [`anyhow::Error`] and are wrapped into
/// [`Error::DatabaseError`] together with the statement that produced them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No row found: {what}")]
    NotFound { what: String },
    #[error("Expected exactly one row but found more: {what}")]
    MultipleRows { what: String },
    #[error("Type `{type_name}` is not a supported attribute type")]
    UnsupportedAttributeType { type_name: String },
    #[error("Record type `{record}` is already registered")]
    DuplicateRegistration { record: &'static str },
    #[error(
        "Record type `{record}` marks its key on the attributes and also receives key names at registration"
    )]
    ConflictingKeyDeclaration { record: &'static str },
    #[error("Record type `{record}` has no primary key attribute")]
    NoPrimaryKey { record: &'static str },
    #[error("Record type `{record}` has no attribute named `{attribute}`")]
    UnknownAttribute {
        record: &'static str,
        attribute: String,
    },
    #[error("Record type `{record}` has an invalid generated key: {reason}")]
    InvalidGeneratedKey {
        record: &'static str,
        reason: String,
    },
    #[error("Dialect `{dialect}` does not support {feature}")]
    UnsupportedDialect {
        dialect: String,
        feature: &'static str,
    },
    #[error("Record type `{record}` {reason}")]
    UnsupportedShape {
        record: &'static str,
        reason: String,
    },
    #[error("Column `{column}` is not present in the result set")]
    MissingColumn { column: String },
    #[error("Cannot convert {value} into {target}")]
    Conversion { value: String, target: String },
    #[error("The connection unit is already closed")]
    Closed,
    #[error("{source}{}", describe_statement(.sql, .params))]
    DatabaseError {
        sql: String,
        params: Vec<DriverValue>,
        #[source]
        source: BoxedError,
    },
}

impl Error {
    /// Wraps a driver failure with the statement being executed.
    pub fn database(query: &Query, source: anyhow::Error) -> Self {
        Error::DatabaseError {
            sql: query.sql.clone(),
            params: query.params.clone(),
            source: source.into(),
        }
    }

    /// Wraps a driver failure not tied to a statement (commit, rollback, acquire).
    pub fn operation(operation: &str, source: anyhow::Error) -> Self {
        Error::DatabaseError {
            sql: operation.into(),
            params: Vec::new(),
            source: source.into(),
        }
    }

    pub fn conversion(value: impl std::fmt::Debug, target: impl Into<String>) -> Self {
        Error::Conversion {
            value: format!("{value:?}"),
            target: target.into(),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        match value.downcast::<Error>() {
            Ok(error) => error,
            Err(other) => Error::DatabaseError {
                sql: String::new(),
                params: Vec::new(),
                source: other.into(),
            },
        }
    }
}

fn describe_statement(sql: &str, params: &[DriverValue]) -> String {
    if sql.is_empty() {
        return String::new();
    }
    let mut out = format!("\nWhile executing: {}", truncate_long!(sql));
    if !params.is_empty() {
        out.push_str("With parameters: ");
        separated_by(
            &mut out,
            params,
            |out, v| {
                let _ = write!(out, "{v}");
            },
            ", ",
        );
    }
    out
}
