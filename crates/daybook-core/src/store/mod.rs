//! Storage abstraction for Daybook.
//!
//! The [`EntryStore`] trait defines every storage operation the ingestion
//! endpoint, the listing endpoint, and the recap job need, enabling
//! pluggable backends (SQLite in the app crate, in-memory here).
//!
//! A store is an explicitly owned handle: callers create it once, pass it
//! to whoever needs it, and call [`EntryStore::close`] when done. There is
//! no global connection.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{Entry, NewEntry, RecapRecord};

/// Abstract storage backend for journal entries and recap records.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert_entry`](EntryStore::insert_entry) | Insert an entry, assigning its id |
/// | [`list_entries`](EntryStore::list_entries) | All entries in natural (insertion) order |
/// | [`get_entry`](EntryStore::get_entry) | One entry by id |
/// | [`entries_between`](EntryStore::entries_between) | Entries in a closed time interval |
/// | [`insert_recap`](EntryStore::insert_recap) | Persist a recap outcome |
/// | [`latest_recap`](EntryStore::latest_recap) | Newest recap outcome |
/// | [`close`](EntryStore::close) | Release the underlying connection(s) |
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Insert a new entry. Returns the id assigned by the store.
    async fn insert_entry(&self, entry: &NewEntry) -> Result<String>;

    /// Every stored entry, in insertion order.
    async fn list_entries(&self) -> Result<Vec<Entry>>;

    async fn get_entry(&self, id: &str) -> Result<Option<Entry>>;

    /// Entries whose timestamp lies in `[start, end]`, both ends inclusive,
    /// ordered by timestamp ascending and then by insertion order.
    async fn entries_between(&self, start: DateTime<Utc>, end: DateTime<Utc>)
        -> Result<Vec<Entry>>;

    async fn insert_recap(&self, recap: &RecapRecord) -> Result<()>;

    async fn latest_recap(&self) -> Result<Option<RecapRecord>>;

    /// Release the store. Must be safe to call more than once.
    async fn close(&self);
}
