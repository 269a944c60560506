//! Core data models used throughout Daybook.
//!
//! A journal [`Entry`] is immutable once stored: the store assigns its `id`,
//! the server clock assigns its `timestamp`, and nothing ever updates or
//! deletes it afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A geolocation reading attached to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    /// Builds a location from two raw form values.
    ///
    /// Returns `None` unless both values parse as finite `f64`s. Empty,
    /// missing, non-numeric, `NaN`, and infinite inputs all yield no location,
    /// so nothing downstream ever sees a sentinel coordinate.
    pub fn from_fields(latitude: Option<&str>, longitude: Option<&str>) -> Option<Self> {
        let latitude = parse_coordinate(latitude?)?;
        let longitude = parse_coordinate(longitude?)?;
        Some(Self {
            latitude,
            longitude,
        })
    }

    /// `true` if both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// A journal entry as persisted and served by the listing endpoint.
///
/// Serialized in camelCase (`mediaUrls`) to match the stored document layout
/// that browser clients already consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: String,
    pub text: Option<String>,
    pub location: Option<Location>,
    pub media_urls: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// An entry that has not been stored yet and therefore has no `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub text: Option<String>,
    pub location: Option<Location>,
    pub media_urls: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl NewEntry {
    pub fn into_entry(self, id: String) -> Entry {
        Entry {
            id,
            text: self.text,
            location: self.location,
            media_urls: self.media_urls,
            timestamp: self.timestamp,
        }
    }
}

/// The persisted outcome of a recap run that produced a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecapRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub entry_count: usize,
    pub map_ref: Option<String>,
    pub video_ref: String,
}
