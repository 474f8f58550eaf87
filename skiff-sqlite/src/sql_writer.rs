use skiff_core::SqlWriter;

/// SQLite flavor: quoted identifiers, no row locking clause.
#[derive(Default, Debug, Clone, Copy)]
pub struct SqliteSqlWriter {}

impl SqlWriter for SqliteSqlWriter {
    fn write_identifier(&self, out: &mut String, value: &str) {
        out.push('"');
        out.push_str(&value.replace('"', "\"\""));
        out.push('"');
    }

    // The whole database is locked by the writing transaction.
    fn write_for_update(&self, _out: &mut String) {}
}
