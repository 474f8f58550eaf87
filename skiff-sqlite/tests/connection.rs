#[cfg(test)]
mod tests {
    use indoc::indoc;
    use skiff::{Connection, ConnectionUnit, Driver, Rows, SqlWriter, Statement, Value};
    use skiff_sqlite::{SqliteConnection, SqliteDriver, SqliteSource};
    use skiff_tests::{init_logs, silent_logs};

    #[test]
    fn create_database() {
        init_logs();
        let directory = tempfile::tempdir().expect("Could not create a temporary directory");
        let path = directory.path().join("creation.sqlite");
        assert!(!path.exists(), "Database file should not exist before test");
        SqliteConnection::connect(&format!("sqlite://{}?mode=rwc", path.display()), None)
            .expect("Could not open the database")
            .close()
            .expect("Could not close the database");
        assert!(path.exists(), "Database file should be created after connection");
        SqliteConnection::connect(&format!("sqlite://{}?mode=ro", path.display()), None)
            .expect("Could not open the database read only");
        std::fs::remove_file(&path).expect("Failed to remove the test database file");
        silent_logs! {
            assert!(
                SqliteConnection::connect(&format!("sqlite://{}?mode=ro", path.display()), None)
                    .is_err(),
                "Should not be able to open in read only an unexisting database"
            );
        }
    }

    #[test]
    fn wrong_url() {
        silent_logs! {
            assert!(SqliteConnection::connect("postgres://localhost/db", None).is_err());
        }
    }

    #[test]
    fn statements() {
        init_logs();
        let mut connection = SqliteConnection::connect("sqlite://:memory:", None)
            .expect("Could not open an in memory database");
        assert_eq!(connection.driver().dialect(), skiff::Dialect::Sqlite);
        connection
            .execute_batch(indoc! {"
                CREATE TABLE point (x INTEGER, label TEXT, weight REAL, data BLOB);
                INSERT INTO point VALUES (1, 'one', 0.5, x'00ff');
                INSERT INTO point VALUES (2, NULL, NULL, NULL);
            "})
            .expect("Could not create the table");
        let mut statement = connection
            .prepare("UPDATE point SET label = ? WHERE x >= ?")
            .expect("Could not prepare the update");
        statement
            .bind(0, &skiff::DriverValue::Text("any".into()))
            .expect("Could not bind the label");
        statement
            .bind(1, &skiff::DriverValue::Int32(1))
            .expect("Could not bind the bound");
        assert_eq!(statement.execute_update().expect("Update failed"), 2);
        let mut create = connection
            .prepare("CREATE TABLE other (x INTEGER)")
            .expect("Could not prepare the create");
        assert_eq!(create.execute_update().expect("Create failed"), 0);
        let mut delete = connection
            .prepare("DELETE FROM point WHERE x > 100")
            .expect("Could not prepare the delete");
        assert_eq!(delete.execute_update().expect("Delete failed"), 0);
        let mut rows = connection
            .prepare("SELECT x, label AS Name, weight, data FROM point ORDER BY x")
            .expect("Could not prepare the select")
            .execute_query()
            .expect("Could not run the select");
        assert_eq!(&rows.labels()[..], ["x", "Name", "weight", "data"]);
        let first = rows.fetch().expect("Fetch failed").expect("Expected a row");
        assert_eq!(first.get_column("name"), Some(&skiff::DriverValue::Text("any".into())));
        assert_eq!(first.values()[2], skiff::DriverValue::Real(0.5));
        assert_eq!(first.values()[3], skiff::DriverValue::Blob([0u8, 255].into()));
        let second = rows.fetch().expect("Fetch failed").expect("Expected a row");
        assert_eq!(second.values()[2], skiff::DriverValue::Null);
        assert!(rows.fetch().expect("Fetch failed").is_none());
        assert!(rows.fetch().expect("Fetch after the end failed").is_none());
        silent_logs! {
            assert!(connection.prepare("SELECT 1; SELECT 2").is_err());
            assert!(connection.prepare("SELEC 1").is_err());
        }
    }

    #[test]
    fn rows_outlive_connection() {
        init_logs();
        let mut connection = SqliteConnection::connect("sqlite://:memory:", None)
            .expect("Could not open an in memory database");
        connection
            .execute_batch("CREATE TABLE item (x INTEGER); INSERT INTO item VALUES (1), (2);")
            .expect("Could not create the table");
        let mut rows = connection
            .prepare("SELECT x FROM item ORDER BY x")
            .expect("Could not prepare the select")
            .execute_query()
            .expect("Could not run the select");
        assert_eq!(connection.handle_owners(), 2);
        connection.close().expect("Close should wait for the open rows");
        let first = rows.fetch().expect("Fetch failed").expect("Expected a row");
        assert_eq!(first.values()[0], skiff::DriverValue::Int64(1));
        let second = rows.fetch().expect("Fetch failed").expect("Expected a row");
        assert_eq!(second.values()[0], skiff::DriverValue::Int64(2));
        assert!(rows.fetch().expect("Fetch failed").is_none());
        drop(rows);

        let connection = SqliteConnection::connect("sqlite://:memory:", None)
            .expect("Could not open an in memory database");
        assert_eq!(connection.handle_owners(), 1);
        connection.close().expect("Could not close the database");
    }

    #[test]
    fn transactions() {
        init_logs();
        let directory = tempfile::tempdir().expect("Could not create a temporary directory");
        let url = format!(
            "sqlite://{}?mode=rwc",
            directory.path().join("transactions.sqlite").display()
        );
        let source = SqliteSource::new(url.clone());
        ConnectionUnit::run(&source, |unit| {
            unit.execute("CREATE TABLE counter (value INTEGER)", &[])?;
            unit.execute("INSERT INTO counter VALUES (?)", &[Value::Int32(Some(1)).into()])
        })
        .expect("Could not create the counter");
        let mut unit = ConnectionUnit::from_source(&source).expect("Failed to start a unit");
        unit.execute("UPDATE counter SET value = 2", &[])
            .expect("Could not update the counter");
        let mut observer = SqliteConnection::connect(&url, None).expect("Could not connect");
        let mut rows = observer
            .prepare("SELECT value FROM counter")
            .expect("Could not prepare the select")
            .execute_query()
            .expect("Could not read the counter");
        let row = rows.fetch().expect("Fetch failed").expect("Expected a row");
        assert_eq!(row.values()[0], skiff::DriverValue::Int64(1));
        drop(rows);
        unit.commit_and_close().expect("Could not commit");
        let value = ConnectionUnit::run(&source, |unit| {
            unit.query_scalar("SELECT value FROM counter", &[])
        })
        .expect("Could not read the counter");
        assert_eq!(value, skiff::DriverValue::Int64(2));
    }

    #[test]
    fn writer() {
        let writer = SqliteDriver::new().sql_writer();
        let mut out = String::from("select * from point");
        writer.write_for_update(&mut out);
        assert_eq!(out, "select * from point");
    }
}
