//! Entry commands: `daybook add`, `daybook list`, `daybook get`.
//!
//! `add` goes through the same ingestion path as `POST /entries`, reading
//! media files from disk instead of a multipart body.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::path::PathBuf;

use daybook_core::ingest::{ingest_entry, EntrySubmission, MediaUpload};
use daybook_core::models::Entry;
use daybook_core::store::EntryStore;

use crate::config::Config;
use crate::db;
use crate::placeholders::PlaceholderBlobStore;
use crate::sqlite_store::SqliteStore;

async fn open_store(config: &Config) -> Result<SqliteStore> {
    Ok(SqliteStore::new(db::connect(config).await?))
}

/// Read media files from disk into uploads named after their file names.
fn read_media(paths: &[PathBuf]) -> Result<Vec<MediaUpload>> {
    paths
        .iter()
        .map(|path| {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read media file: {}", path.display()))?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "upload".to_string());
            Ok(MediaUpload { filename, bytes })
        })
        .collect()
}

/// Create an entry and return its id.
pub async fn add_entry(
    config: &Config,
    text: Option<String>,
    latitude: Option<String>,
    longitude: Option<String>,
    media: &[PathBuf],
) -> Result<String> {
    let submission = EntrySubmission {
        text,
        latitude,
        longitude,
        media: read_media(media)?,
    };

    let store = open_store(config).await?;
    let blobs = PlaceholderBlobStore::from_config(config);
    let result = ingest_entry(&store, &blobs, submission, Utc::now()).await;
    store.close().await;
    result
}

pub async fn run_add(
    config: &Config,
    text: Option<String>,
    latitude: Option<String>,
    longitude: Option<String>,
    media: &[PathBuf],
) -> Result<()> {
    let id = add_entry(config, text, latitude, longitude, media).await?;
    println!("Journal entry created: {}", id);
    Ok(())
}

pub async fn list_entries(config: &Config) -> Result<Vec<Entry>> {
    let store = open_store(config).await?;
    let result = store.list_entries().await;
    store.close().await;
    result
}

pub async fn get_entry(config: &Config, id: &str) -> Result<Entry> {
    let store = open_store(config).await?;
    let result = store.get_entry(id).await;
    store.close().await;
    match result? {
        Some(entry) => Ok(entry),
        None => bail!("entry not found: {}", id),
    }
}

/// CLI entry point for `daybook list`.
pub async fn run_list(config: &Config, json: bool) -> Result<()> {
    let entries = list_entries(config).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No journal entries.");
        return Ok(());
    }

    for entry in &entries {
        println!("{}", summary_line(entry));
    }
    println!();
    println!("{} entries", entries.len());
    Ok(())
}

/// CLI entry point for `daybook get`.
pub async fn run_get(config: &Config, id: &str) -> Result<()> {
    let entry = get_entry(config, id).await?;

    println!("--- Entry ---");
    println!("id:        {}", entry.id);
    println!("timestamp: {}", entry.timestamp.to_rfc3339());
    match entry.location {
        Some(loc) => println!("location:  {}, {}", loc.latitude, loc.longitude),
        None => println!("location:  (none)"),
    }
    println!();

    println!("--- Text ---");
    println!("{}", entry.text.as_deref().unwrap_or(""));
    println!();

    println!("--- Media ({}) ---", entry.media_urls.len());
    for url in &entry.media_urls {
        println!("{}", url);
    }

    Ok(())
}

fn summary_line(entry: &Entry) -> String {
    let text: String = entry
        .text
        .as_deref()
        .unwrap_or("")
        .lines()
        .next()
        .unwrap_or("")
        .chars()
        .take(60)
        .collect();
    let media = match entry.media_urls.len() {
        0 => String::new(),
        1 => "  [1 media]".to_string(),
        n => format!("  [{} media]", n),
    };
    let pin = if entry.location.is_some() { "  @" } else { "" };
    format!(
        "{}  {}  {}{}{}",
        entry.timestamp.format("%Y-%m-%d %H:%M"),
        entry.id,
        text,
        media,
        pin
    )
}
