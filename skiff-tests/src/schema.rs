use skiff::{ConnectionSource, ConnectionUnit, Dialect, KeyStrategy, Result};

/// Column definition of a key generated by the database or filled from a sequence.
pub(crate) fn generated_key(dialect: &Dialect) -> &'static str {
    match dialect {
        Dialect::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT",
        Dialect::MySql => "BIGINT AUTO_INCREMENT PRIMARY KEY",
        _ => "BIGINT PRIMARY KEY",
    }
}

/// Column type of the `{name}` placeholder.
pub(crate) fn column_type(dialect: &Dialect, name: &str) -> &'static str {
    match (dialect, name) {
        (_, "key") => generated_key(dialect),
        (Dialect::Sqlite, "blob") => "BLOB",
        (Dialect::Sqlite, "boolean") => "INTEGER",
        (Dialect::Sqlite, _) => "TEXT",
        (Dialect::Postgres, "blob") => "BYTEA",
        (Dialect::Postgres, "timestamptz") => "TIMESTAMPTZ",
        (Dialect::MySql, "timestamp" | "timestamptz") => "DATETIME(6)",
        (_, "blob") => "BLOB",
        (_, "boolean") => "BOOLEAN",
        (_, "decimal") => "DECIMAL(20,6)",
        (_, "timestamptz") => "TIMESTAMP WITH TIME ZONE",
        _ => "TIMESTAMP",
    }
}

/// Drops and creates `relation`, plus `sequence` on dialects drawing keys from sequences.
///
/// Placeholders inside `columns` expand to the dialect's types: `{key}`, `{blob}`,
/// `{boolean}`, `{decimal}`, `{timestamp}` and `{timestamptz}`.
pub(crate) fn recreate<S: ConnectionSource>(
    source: &S,
    relation: &str,
    columns: &str,
    sequence: Option<&str>,
) {
    ConnectionUnit::run(source, |unit| -> Result<()> {
        let dialect = unit.dialect().clone();
        unit.execute(&format!("DROP TABLE IF EXISTS {relation}"), &[])?;
        if let Some(sequence) = sequence {
            if matches!(dialect.key_strategy(), Ok(KeyStrategy::Sequence)) {
                unit.execute(&format!("DROP SEQUENCE IF EXISTS {sequence}"), &[])?;
                unit.execute(&format!("CREATE SEQUENCE {sequence}"), &[])?;
            }
        }
        let columns = ["key", "blob", "boolean", "decimal", "timestamptz", "timestamp"]
            .into_iter()
            .fold(columns.to_string(), |columns, name| {
                columns.replace(&format!("{{{name}}}"), column_type(&dialect, name))
            });
        unit.execute(&format!("CREATE TABLE {relation} ({columns})"), &[])?;
        Ok(())
    })
    .unwrap_or_else(|e| panic!("Failed to create the table `{relation}`: {e}"));
}
