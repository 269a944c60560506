//! Schema migrations.
//!
//! Creates the `entries` and `recaps` tables. Every statement is
//! idempotent, so `daybook init` can be run any number of times.
//!
//! Entries are one flat table with no versioning column: timestamps are
//! epoch milliseconds, media references are a JSON array, and a missing
//! location is two `NULL` coordinates.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let result = apply(&pool).await;
    pool.close().await;
    result
}

/// Apply the schema to an open pool.
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS entries (
            id TEXT PRIMARY KEY,
            text TEXT,
            latitude REAL,
            longitude REAL,
            media_json TEXT NOT NULL DEFAULT '[]',
            timestamp_ms INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS recaps (
            id TEXT PRIMARY KEY,
            created_at_ms INTEGER NOT NULL,
            window_start_ms INTEGER NOT NULL,
            window_end_ms INTEGER NOT NULL,
            entry_count INTEGER NOT NULL,
            map_ref TEXT,
            video_ref TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_entries_timestamp ON entries(timestamp_ms)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_recaps_created_at ON recaps(created_at_ms DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
