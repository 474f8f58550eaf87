use crate::{Error, Result};
use std::fmt::{self, Display};

/// SQL dialect of a backend, as far as Skiff needs to tell them apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dialect {
    Sqlite,
    Postgres,
    MySql,
    H2,
    Oracle,
    Other(String),
}

/// How a dialect produces generated keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStrategy {
    /// The key is drawn from a named sequence before the insert.
    Sequence,
    /// The database assigns the key, read back after the insert.
    AutoIncrement,
}

/// Generated key handling for one record type on one dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPlan {
    /// The dialect is in the ignore list: the key is inserted as is.
    Ignore,
    /// Run `sql` first and store its scalar result into the key.
    Sequence { sql: String },
    /// Omit the key and run `sql` after the insert to read it back.
    AutoIncrement { sql: String },
}

impl Dialect {
    pub const KNOWN: [Dialect; 5] = [
        Dialect::Sqlite,
        Dialect::Postgres,
        Dialect::MySql,
        Dialect::H2,
        Dialect::Oracle,
    ];

    /// Case insensitive lookup, unknown names become [`Dialect::Other`].
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Dialect::Sqlite,
            "postgres" | "postgresql" => Dialect::Postgres,
            "mysql" | "mariadb" => Dialect::MySql,
            "h2" => Dialect::H2,
            "oracle" => Dialect::Oracle,
            _ => Dialect::Other(name.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::H2 => "h2",
            Dialect::Oracle => "oracle",
            Dialect::Other(name) => name,
        }
    }

    /// True when `name` (as written in an ignore list) designates this dialect.
    pub fn matches(&self, name: &str) -> bool {
        let name = name.trim();
        !name.is_empty() && Dialect::from_name(name).name().eq_ignore_ascii_case(self.name())
    }

    pub fn key_strategy(&self) -> Result<KeyStrategy> {
        match self {
            Dialect::Postgres | Dialect::Oracle | Dialect::H2 => Ok(KeyStrategy::Sequence),
            Dialect::Sqlite | Dialect::MySql => Ok(KeyStrategy::AutoIncrement),
            Dialect::Other(..) => Err(self.unsupported("generated keys")),
        }
    }

    /// Query returning the next value of `sequence`.
    pub fn next_value_sql(&self, sequence: &str) -> Result<String> {
        match self {
            Dialect::Postgres => Ok(format!("select nextval('{sequence}')")),
            Dialect::Oracle => Ok(format!("select {sequence}.nextval from dual")),
            Dialect::H2 => Ok(format!("select next value for {sequence}")),
            _ => Err(self.unsupported("sequences")),
        }
    }

    /// Query returning the key assigned by the last insert on the same connection.
    pub fn last_insert_id_sql(&self) -> Result<String> {
        match self {
            Dialect::Sqlite => Ok("select last_insert_rowid()".into()),
            Dialect::MySql => Ok("select last_insert_id()".into()),
            _ => Err(self.unsupported("auto increment keys")),
        }
    }

    /// Resolves the generated key handling of a sequence named `sequence`.
    pub fn key_plan(&self, sequence: &str, ignore_dialects: &[String]) -> Result<KeyPlan> {
        if ignore_dialects.iter().any(|v| self.matches(v)) {
            return Ok(KeyPlan::Ignore);
        }
        Ok(match self.key_strategy()? {
            KeyStrategy::Sequence => KeyPlan::Sequence {
                sql: self.next_value_sql(sequence)?,
            },
            KeyStrategy::AutoIncrement => KeyPlan::AutoIncrement {
                sql: self.last_insert_id_sql()?,
            },
        })
    }

    fn unsupported(&self, feature: &'static str) -> Error {
        Error::UnsupportedDialect {
            dialect: self.name().to_string(),
            feature,
        }
    }
}

impl Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
