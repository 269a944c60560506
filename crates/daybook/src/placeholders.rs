//! Placeholder implementations of the external collaborators.
//!
//! - **[`PlaceholderBlobStore`]**: names a URL under `media.base_url`
//!   without uploading anything.
//! - **[`StaticMapRenderer`]**: builds a static-map URL with one marker per
//!   location; no request is made.
//! - **[`PlaceholderComposer`]**: logs the composition it would run,
//!   simulates the processing time, and names an output URL.
//!
//! None of these can fail. Real integrations implement the same traits from
//! [`daybook_core::services`].

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

use daybook_core::models::Location;
use daybook_core::services::{BlobStore, MapRenderer, Overlay, VideoComposer};

use crate::config::Config;

const STATIC_MAP_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/staticmap";

/// Strip any directory components a client put in an upload's filename.
fn base_name(filename: &str) -> &str {
    filename
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("upload")
}

/// Names uploads `{base_url}/{filename}`.
pub struct PlaceholderBlobStore {
    base_url: String,
}

impl PlaceholderBlobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.media.base_url.clone())
    }
}

#[async_trait]
impl BlobStore for PlaceholderBlobStore {
    async fn store(&self, bytes: &[u8], filename: &str) -> Result<String> {
        let url = format!("{}/{}", self.base_url, base_name(filename));
        debug!(bytes = bytes.len(), %url, "media upload skipped (placeholder)");
        Ok(url)
    }
}

/// Builds Google Static Maps style URLs.
pub struct StaticMapRenderer {
    api_key: String,
    size: String,
}

impl StaticMapRenderer {
    pub fn new(api_key: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            size: size.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.map.api_key.clone(), config.map.size.clone())
    }

    pub fn url_for(&self, locations: &[Location]) -> String {
        let mut url = format!("{}?size={}", STATIC_MAP_ENDPOINT, self.size);
        for loc in locations {
            url.push_str(&format!("&markers={},{}", loc.latitude, loc.longitude));
        }
        if !self.api_key.is_empty() {
            url.push_str("&key=");
            url.push_str(&self.api_key);
        }
        url
    }
}

#[async_trait]
impl MapRenderer for StaticMapRenderer {
    async fn render(&self, locations: &[Location]) -> Result<String> {
        info!(markers = locations.len(), "generating static map URL (placeholder)");
        Ok(self.url_for(locations))
    }
}

/// Stands in for an FFmpeg pipeline.
pub struct PlaceholderComposer {
    base_url: String,
    delay: Duration,
}

impl PlaceholderComposer {
    pub fn new(base_url: impl Into<String>, delay: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            delay,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.media.base_url.clone(),
            Duration::from_millis(config.recap.compose_delay_ms),
        )
    }
}

#[async_trait]
impl VideoComposer for PlaceholderComposer {
    async fn compose(
        &self,
        map_ref: Option<&str>,
        media_refs: &[String],
        overlays: &[Overlay],
    ) -> Result<String> {
        info!(
            map = map_ref.unwrap_or("-"),
            clips = media_refs.len(),
            overlays = overlays.len(),
            "composing recap video (placeholder)"
        );
        for (i, clip) in media_refs.iter().enumerate() {
            debug!(index = i, %clip, "clip");
        }
        for overlay in overlays {
            debug!(timestamp = %overlay.timestamp, location = ?overlay.location, "overlay");
        }

        tokio::time::sleep(self.delay).await;

        Ok(format!(
            "{}/recaps/{}.mp4",
            self.base_url,
            uuid::Uuid::new_v4()
        ))
    }
}
