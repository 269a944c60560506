//! SQLite-backed [`EntryStore`] implementation.
//!
//! Maps each [`EntryStore`] operation onto the `entries` and `recaps`
//! tables created by [`migrate`](crate::migrate). The store's natural order
//! is rowid order, i.e. insertion order.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use daybook_core::models::{Entry, Location, NewEntry, RecapRecord};
use daybook_core::store::EntryStore;

/// SQLite implementation of the [`EntryStore`] trait.
///
/// Wraps a [`SqlitePool`]. [`EntryStore::close`] closes the pool, after
/// which every other operation fails.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn ts_from_millis(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| anyhow!("timestamp out of range: {}", ms))
}

/// Smallest whole millisecond not before `ts`. Stored timestamps are whole
/// milliseconds, so this keeps a sub-millisecond lower bound exclusive of
/// the millisecond it falls inside.
fn ceil_millis(ts: DateTime<Utc>) -> i64 {
    let ms = ts.timestamp_millis();
    if ts.timestamp_subsec_nanos() % 1_000_000 == 0 {
        ms
    } else {
        ms + 1
    }
}

fn entry_from_row(row: &SqliteRow) -> Result<Entry> {
    let latitude: Option<f64> = row.get("latitude");
    let longitude: Option<f64> = row.get("longitude");
    let media_json: String = row.get("media_json");

    Ok(Entry {
        id: row.get("id"),
        text: row.get("text"),
        location: match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Some(Location {
                latitude,
                longitude,
            }),
            _ => None,
        },
        media_urls: serde_json::from_str(&media_json)?,
        timestamp: ts_from_millis(row.get("timestamp_ms"))?,
    })
}

fn recap_from_row(row: &SqliteRow) -> Result<RecapRecord> {
    let entry_count: i64 = row.get("entry_count");
    Ok(RecapRecord {
        id: row.get("id"),
        created_at: ts_from_millis(row.get("created_at_ms"))?,
        window_start: ts_from_millis(row.get("window_start_ms"))?,
        window_end: ts_from_millis(row.get("window_end_ms"))?,
        entry_count: entry_count as usize,
        map_ref: row.get("map_ref"),
        video_ref: row.get("video_ref"),
    })
}

const ENTRY_COLUMNS: &str = "id, text, latitude, longitude, media_json, timestamp_ms";

#[async_trait]
impl EntryStore for SqliteStore {
    async fn insert_entry(&self, entry: &NewEntry) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let media_json = serde_json::to_string(&entry.media_urls)?;

        sqlx::query(
            r#"
            INSERT INTO entries (id, text, latitude, longitude, media_json, timestamp_ms)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&entry.text)
        .bind(entry.location.map(|l| l.latitude))
        .bind(entry.location.map(|l| l.longitude))
        .bind(&media_json)
        .bind(entry.timestamp.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn list_entries(&self) -> Result<Vec<Entry>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM entries ORDER BY rowid ASC",
            ENTRY_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(entry_from_row).collect()
    }

    async fn get_entry(&self, id: &str) -> Result<Option<Entry>> {
        let row = sqlx::query(&format!("SELECT {} FROM entries WHERE id = ?", ENTRY_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(entry_from_row).transpose()
    }

    async fn entries_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Entry>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM entries
            WHERE timestamp_ms >= ? AND timestamp_ms <= ?
            ORDER BY timestamp_ms ASC, rowid ASC
            "#,
            ENTRY_COLUMNS
        ))
        .bind(ceil_millis(start))
        .bind(end.timestamp_millis())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(entry_from_row).collect()
    }

    async fn insert_recap(&self, recap: &RecapRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO recaps (id, created_at_ms, window_start_ms, window_end_ms,
                                entry_count, map_ref, video_ref)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&recap.id)
        .bind(recap.created_at.timestamp_millis())
        .bind(recap.window_start.timestamp_millis())
        .bind(recap.window_end.timestamp_millis())
        .bind(recap.entry_count as i64)
        .bind(&recap.map_ref)
        .bind(&recap.video_ref)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn latest_recap(&self) -> Result<Option<RecapRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, created_at_ms, window_start_ms, window_end_ms,
                   entry_count, map_ref, video_ref
            FROM recaps
            ORDER BY created_at_ms DESC, rowid DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(recap_from_row).transpose()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use daybook_core::store::memory::InMemoryStore;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_store() -> SqliteStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::migrate::apply(&pool).await.unwrap();
        SqliteStore::new(pool)
    }

    fn new_entry(text: &str, ts: DateTime<Utc>) -> NewEntry {
        NewEntry {
            text: Some(text.to_string()),
            location: None,
            media_urls: Vec::new(),
            timestamp: ts,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let store = memory_store().await;
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap() + Duration::milliseconds(250);
        let entry = NewEntry {
            text: Some("Morning run".into()),
            location: Some(Location {
                latitude: 0.0,
                longitude: -0.1276,
            }),
            media_urls: vec!["u/1.jpg".into(), "u/2.mp4".into()],
            timestamp: ts,
        };

        let id = store.insert_entry(&entry).await.unwrap();
        let stored = store.get_entry(&id).await.unwrap().unwrap();

        assert_eq!(stored, entry.into_entry(id));
    }

    #[tokio::test]
    async fn test_entry_without_text_or_location() {
        let store = memory_store().await;
        let entry = NewEntry {
            text: None,
            location: None,
            media_urls: Vec::new(),
            timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap(),
        };
        let id = store.insert_entry(&entry).await.unwrap();
        let stored = store.get_entry(&id).await.unwrap().unwrap();
        assert!(stored.text.is_none());
        assert!(stored.location.is_none());
        assert!(store.get_entry("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_is_insertion_order() {
        let store = memory_store().await;
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        store.insert_entry(&new_entry("second-by-time", now)).await.unwrap();
        store
            .insert_entry(&new_entry("first-by-time", now - Duration::hours(1)))
            .await
            .unwrap();

        let texts: Vec<_> = store
            .list_entries()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.text.unwrap())
            .collect();
        assert_eq!(texts, vec!["second-by-time", "first-by-time"]);
    }

    #[tokio::test]
    async fn test_entries_between_closed_and_ordered() {
        let store = memory_store().await;
        let end = Utc.with_ymd_and_hms(2024, 6, 2, 12, 0, 0).unwrap();
        let start = end - Duration::days(1);
        store.insert_entry(&new_entry("end", end)).await.unwrap();
        store.insert_entry(&new_entry("start", start)).await.unwrap();
        store
            .insert_entry(&new_entry("too-old", start - Duration::milliseconds(1)))
            .await
            .unwrap();
        store
            .insert_entry(&new_entry("middle", start + Duration::hours(6)))
            .await
            .unwrap();

        let texts: Vec<_> = store
            .entries_between(start, end)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.text.unwrap())
            .collect();
        assert_eq!(texts, vec!["start", "middle", "end"]);
    }

    #[tokio::test]
    async fn test_sub_millisecond_start_matches_memory_store() {
        let sqlite = memory_store().await;
        let memory = InMemoryStore::new();
        let stamped = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let stores: [&dyn EntryStore; 2] = [&sqlite, &memory];
        for store in stores {
            store.insert_entry(&new_entry("on-the-ms", stamped)).await.unwrap();
        }

        let start = stamped + Duration::microseconds(500);
        let end = start + Duration::days(1);
        let from_sqlite = sqlite.entries_between(start, end).await.unwrap();
        let from_memory = memory.entries_between(start, end).await.unwrap();
        assert!(from_sqlite.is_empty());
        assert_eq!(from_sqlite.len(), from_memory.len());

        let hits = sqlite
            .entries_between(stamped, stamped + Duration::microseconds(999))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_ceil_millis() {
        let whole = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(ceil_millis(whole), whole.timestamp_millis());
        assert_eq!(
            ceil_millis(whole + Duration::nanoseconds(1)),
            whole.timestamp_millis() + 1
        );
        assert_eq!(
            ceil_millis(whole - Duration::microseconds(1)),
            whole.timestamp_millis()
        );
    }

    #[tokio::test]
    async fn test_latest_recap() {
        let store = memory_store().await;
        assert!(store.latest_recap().await.unwrap().is_none());

        let end = Utc.with_ymd_and_hms(2024, 6, 2, 21, 0, 0).unwrap();
        for (i, video) in ["first.mp4", "second.mp4"].iter().enumerate() {
            let created = end + Duration::days(i as i64);
            store
                .insert_recap(&RecapRecord {
                    id: format!("r{}", i),
                    created_at: created,
                    window_start: created - Duration::days(1),
                    window_end: created,
                    entry_count: 3,
                    map_ref: None,
                    video_ref: video.to_string(),
                })
                .await
                .unwrap();
        }

        let latest = store.latest_recap().await.unwrap().unwrap();
        assert_eq!(latest.video_ref, "second.mp4");
        assert_eq!(latest.entry_count, 3);
    }

    #[tokio::test]
    async fn test_closed_store_fails() {
        let store = memory_store().await;
        store.close().await;
        assert!(store.list_entries().await.is_err());
    }
}
