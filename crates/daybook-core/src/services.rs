//! External collaborator traits.
//!
//! Daybook talks to three services it does not implement itself: blob
//! storage for uploaded media, a static map renderer, and a video composer.
//! The traits live here so that ingestion and the recap job can be written
//! against them; concrete implementations (including the placeholders the
//! binary ships with) live in the `daybook` app crate.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::Location;

/// Stores raw media bytes out of band and returns a reference to them.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn store(&self, bytes: &[u8], filename: &str) -> Result<String>;
}

/// Renders a static map image for a set of locations.
#[async_trait]
pub trait MapRenderer: Send + Sync {
    async fn render(&self, locations: &[Location]) -> Result<String>;
}

/// Per-clip caption data: when an entry was written and where.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    pub timestamp: DateTime<Utc>,
    pub location: Option<Location>,
}

/// Assembles the recap video.
///
/// Implementations are expected to prepend the map image when `map_ref` is
/// present, concatenate `media_refs` in the given order, and caption each
/// clip with its overlay.
#[async_trait]
pub trait VideoComposer: Send + Sync {
    async fn compose(
        &self,
        map_ref: Option<&str>,
        media_refs: &[String],
        overlays: &[Overlay],
    ) -> Result<String>;
}
