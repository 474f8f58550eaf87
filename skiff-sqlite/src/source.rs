use crate::SqliteConnection;
use anyhow::Result;
use skiff_core::ConnectionSource;
use std::time::Duration;

/// Opens a fresh connection on every acquire and closes it on release.
#[derive(Debug, Clone)]
pub struct SqliteSource {
    url: String,
    busy_timeout: Option<Duration>,
}

impl SqliteSource {
    /// `url` is `sqlite://<path>`, optionally followed by SQLite URI parameters like `?mode=rwc`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            busy_timeout: None,
        }
    }

    /// How long a statement waits on a locked database before failing.
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = Some(timeout);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ConnectionSource for SqliteSource {
    type Connection = SqliteConnection;

    fn acquire(&self) -> Result<SqliteConnection> {
        SqliteConnection::connect(&self.url, self.busy_timeout)
    }

    fn release(&self, connection: SqliteConnection) -> Result<()> {
        connection.close()
    }
}
