//! In-memory [`EntryStore`] implementation for tests and embedding.
//!
//! Uses `Vec`s behind `std::sync::RwLock` for thread safety. Insertion
//! order is the natural order, matching the SQLite backend's rowid order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{Entry, NewEntry, RecapRecord};

use super::EntryStore;

/// In-memory store for tests and embedded use.
pub struct InMemoryStore {
    entries: RwLock<Vec<Entry>>,
    recaps: RwLock<Vec<RecapRecord>>,
    closed: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            recaps: RwLock::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Seed an entry with a known id, bypassing id assignment.
    pub fn push_entry(&self, entry: Entry) {
        self.entries.write().unwrap().push(entry);
    }

    /// `true` once [`EntryStore::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            bail!("store is closed");
        }
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntryStore for InMemoryStore {
    async fn insert_entry(&self, entry: &NewEntry) -> Result<String> {
        self.ensure_open()?;
        let id = uuid::Uuid::new_v4().to_string();
        self.entries
            .write()
            .unwrap()
            .push(entry.clone().into_entry(id.clone()));
        Ok(id)
    }

    async fn list_entries(&self) -> Result<Vec<Entry>> {
        self.ensure_open()?;
        Ok(self.entries.read().unwrap().clone())
    }

    async fn get_entry(&self, id: &str) -> Result<Option<Entry>> {
        self.ensure_open()?;
        let entries = self.entries.read().unwrap();
        Ok(entries.iter().find(|e| e.id == id).cloned())
    }

    async fn entries_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Entry>> {
        self.ensure_open()?;
        let mut selected: Vec<Entry> = self
            .entries
            .read()
            .unwrap()
            .iter()
            .filter(|e| e.timestamp >= start && e.timestamp <= end)
            .cloned()
            .collect();
        // Stable sort keeps insertion order among equal timestamps.
        selected.sort_by_key(|e| e.timestamp);
        Ok(selected)
    }

    async fn insert_recap(&self, recap: &RecapRecord) -> Result<()> {
        self.ensure_open()?;
        self.recaps.write().unwrap().push(recap.clone());
        Ok(())
    }

    async fn latest_recap(&self) -> Result<Option<RecapRecord>> {
        self.ensure_open()?;
        let recaps = self.recaps.read().unwrap();
        Ok(recaps.iter().max_by_key(|r| r.created_at).cloned())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
