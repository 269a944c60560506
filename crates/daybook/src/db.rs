//! Opens the journal database.
//!
//! The file at `db.path` (and its directory) is created on first use. WAL
//! mode lets `daybook recap` run while `daybook serve` keeps writing.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::time::Duration;
use tracing::debug;

use crate::config::Config;

const MAX_CONNECTIONS: u32 = 5;

/// Concurrent writers from the server and the CLI wait this long for the lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let path = &config.db.path;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create database directory {}", dir.display()))?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open database at {}", path.display()))?;

    debug!(path = %path.display(), "opened journal database");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;
    use tempfile::TempDir;

    fn config_at(path: &std::path::Path) -> Config {
        toml::from_str(&format!(
            "[db]\npath = \"{}\"\n\n[server]\nbind = \"127.0.0.1:0\"\n",
            path.display()
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_connect_creates_nested_dir_in_wal_mode() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data").join("journal").join("daybook.sqlite");
        let pool = connect(&config_at(&path)).await.unwrap();

        assert!(path.exists());
        let mode: String = sqlx::query("PRAGMA journal_mode")
            .fetch_one(&pool)
            .await
            .unwrap()
            .get(0);
        assert_eq!(mode.to_lowercase(), "wal");
        pool.close().await;
    }
}
