//! Entry ingestion shared by the HTTP endpoint and the CLI.
//!
//! A submission carries raw form values exactly as a client sent them.
//! Ingestion stamps the entry with the server clock, resolves the location,
//! hands every media file to the [`BlobStore`], and inserts one entry.

use anyhow::{Context, Result};
use chrono::{DateTime, SubsecRound, Utc};
use tracing::{debug, info};

use crate::models::{Location, NewEntry};
use crate::services::BlobStore;
use crate::store::EntryStore;

/// One uploaded media file, fully buffered.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Raw, unvalidated form input for a new entry.
#[derive(Debug, Clone, Default)]
pub struct EntrySubmission {
    pub text: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub media: Vec<MediaUpload>,
}

/// Turn a submission into a stored entry and return its id.
///
/// `received_at` is the server time the request was handled; any clock the
/// client may have is ignored. It is truncated to milliseconds, the
/// resolution every store keeps.
pub async fn ingest_entry(
    store: &dyn EntryStore,
    blobs: &dyn BlobStore,
    submission: EntrySubmission,
    received_at: DateTime<Utc>,
) -> Result<String> {
    let location = Location::from_fields(
        submission.latitude.as_deref(),
        submission.longitude.as_deref(),
    );
    if location.is_none() && (submission.latitude.is_some() || submission.longitude.is_some()) {
        debug!(
            latitude = ?submission.latitude,
            longitude = ?submission.longitude,
            "coordinates did not parse; storing entry without location"
        );
    }

    let mut media_urls = Vec::with_capacity(submission.media.len());
    for upload in &submission.media {
        let url = blobs
            .store(&upload.bytes, &upload.filename)
            .await
            .with_context(|| format!("Failed to store media file '{}'", upload.filename))?;
        media_urls.push(url);
    }

    let entry = NewEntry {
        text: submission.text,
        location,
        media_urls,
        timestamp: received_at.trunc_subsecs(3),
    };

    let id = store.insert_entry(&entry).await?;
    info!(entry_id = %id, media = entry.media_urls.len(), "journal entry created");
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;
    use async_trait::async_trait;

    struct EchoBlobs;

    #[async_trait]
    impl BlobStore for EchoBlobs {
        async fn store(&self, bytes: &[u8], filename: &str) -> Result<String> {
            Ok(format!("blob://{}/{}", bytes.len(), filename))
        }
    }

    struct FailingBlobs;

    #[async_trait]
    impl BlobStore for FailingBlobs {
        async fn store(&self, _bytes: &[u8], _filename: &str) -> Result<String> {
            anyhow::bail!("bucket unavailable")
        }
    }

    fn upload(name: &str, bytes: &[u8]) -> MediaUpload {
        MediaUpload {
            filename: name.to_string(),
            bytes: bytes.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_ingest_with_location_and_media() {
        let store = InMemoryStore::new();
        let submission = EntrySubmission {
            text: Some("Beach day".into()),
            latitude: Some("12.5".into()),
            longitude: Some("77.2".into()),
            media: vec![upload("one.jpg", b"abc"), upload("two.mp4", b"defg")],
        };

        let id = ingest_entry(&store, &EchoBlobs, submission, Utc::now())
            .await
            .unwrap();
        let entry = store.get_entry(&id).await.unwrap().unwrap();

        assert_eq!(entry.text.as_deref(), Some("Beach day"));
        assert_eq!(
            entry.location,
            Some(Location {
                latitude: 12.5,
                longitude: 77.2
            })
        );
        assert_eq!(entry.media_urls, vec!["blob://3/one.jpg", "blob://4/two.mp4"]);
    }

    #[tokio::test]
    async fn test_ingest_bad_coordinates_store_no_location() {
        let store = InMemoryStore::new();
        let submission = EntrySubmission {
            text: Some("Somewhere".into()),
            latitude: Some("not-a-number".into()),
            longitude: Some("77.2".into()),
            media: Vec::new(),
        };

        let id = ingest_entry(&store, &EchoBlobs, submission, Utc::now())
            .await
            .unwrap();
        let entry = store.get_entry(&id).await.unwrap().unwrap();
        assert!(entry.location.is_none());
        assert!(entry.media_urls.is_empty());
    }

    #[tokio::test]
    async fn test_ingest_uses_server_time_truncated_to_millis() {
        let store = InMemoryStore::new();
        let received = DateTime::from_timestamp(1_700_000_000, 123_456_789).unwrap();
        let id = ingest_entry(&store, &EchoBlobs, EntrySubmission::default(), received)
            .await
            .unwrap();
        let entry = store.get_entry(&id).await.unwrap().unwrap();
        assert_eq!(entry.timestamp.timestamp_subsec_nanos(), 123_000_000);
    }

    #[tokio::test]
    async fn test_ingest_blob_failure_inserts_nothing() {
        let store = InMemoryStore::new();
        let submission = EntrySubmission {
            media: vec![upload("a.jpg", b"x")],
            ..Default::default()
        };
        let err = ingest_entry(&store, &FailingBlobs, submission, Utc::now())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("a.jpg"));
        assert!(store.list_entries().await.unwrap().is_empty());
    }
}
