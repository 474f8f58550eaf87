#[cfg(test)]
mod tests {
    use skiff_sqlite::SqliteSource;
    use skiff_tests::{execute_tests, init_logs};
    use std::time::Duration;

    #[test]
    fn sqlite() {
        init_logs();
        let directory = tempfile::tempdir().expect("Could not create a temporary directory");
        let path = directory.path().join("tests.sqlite");
        let source = SqliteSource::new(format!("sqlite://{}?mode=rwc", path.display()))
            .busy_timeout(Duration::from_secs(5));
        execute_tests(&source);
        assert!(path.exists(), "Database file should exist after the suite");
    }
}
