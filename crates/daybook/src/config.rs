//! Configuration parsing and validation.
//!
//! Daybook is configured via a TOML file (default: `config/daybook.toml`).
//! Only `[db]` and `[server]` are required; every other section has
//! defaults.
//!
//! # Example Configuration
//!
//! ```toml
//! [db]
//! path = "./data/daybook.sqlite"
//!
//! [server]
//! bind = "127.0.0.1:3000"
//! max_upload_bytes = 52428800
//!
//! [media]
//! base_url = "https://blob.example.invalid/daybook"
//!
//! [map]
//! api_key = ""
//! size = "640x640"
//!
//! [recap]
//! window = "calendar"     # or "fixed"
//! timezone = "local"      # "local", "utc", or an offset like "+05:30"
//! legacy_zero_filter = false
//! compose_delay_ms = 2000
//! ```
//!
//! # Environment Overrides
//!
//! Credentials may come from the environment instead of the file:
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `DAYBOOK_DB_PATH` | `db.path` |
//! | `DAYBOOK_MAPS_API_KEY` | `map.api_key` |
//!
//! # Validation
//!
//! [`load_config`] rejects an empty `server.bind`, a zero
//! `server.max_upload_bytes`, and an unparseable `recap.timezone`.

use anyhow::{bail, Context, Result};
use chrono::FixedOffset;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use daybook_core::recap::{LocationFilter, RecapOptions, WindowMode};

pub const DB_PATH_ENV: &str = "DAYBOOK_DB_PATH";
pub const MAPS_API_KEY_ENV: &str = "DAYBOOK_MAPS_API_KEY";

/// Top-level configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub recap: RecapConfig,
}

/// SQLite database settings.
#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file. Created on first use.
    pub path: PathBuf,
}

/// HTTP server settings.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Socket address to bind (e.g. `"127.0.0.1:3000"`).
    pub bind: String,
    /// Upper bound on a buffered request body, uploads included.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

/// Where uploaded media is said to live.
#[derive(Debug, Deserialize, Clone)]
pub struct MediaConfig {
    #[serde(default = "default_media_base_url")]
    pub base_url: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            base_url: default_media_base_url(),
        }
    }
}

fn default_media_base_url() -> String {
    "https://blob.example.invalid/daybook".to_string()
}

/// Static map rendering settings.
#[derive(Debug, Deserialize, Clone)]
pub struct MapConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_map_size")]
    pub size: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            size: default_map_size(),
        }
    }
}

fn default_map_size() -> String {
    "640x640".to_string()
}

/// Daily recap settings.
#[derive(Debug, Deserialize, Clone)]
pub struct RecapConfig {
    #[serde(default)]
    pub window: WindowMode,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Drop zero and NaN coordinates from the map, as recaps did originally.
    #[serde(default)]
    pub legacy_zero_filter: bool,
    /// Simulated composition time of the placeholder composer.
    #[serde(default = "default_compose_delay_ms")]
    pub compose_delay_ms: u64,
}

impl Default for RecapConfig {
    fn default() -> Self {
        Self {
            window: WindowMode::default(),
            timezone: default_timezone(),
            legacy_zero_filter: false,
            compose_delay_ms: default_compose_delay_ms(),
        }
    }
}

fn default_timezone() -> String {
    "local".to_string()
}

fn default_compose_delay_ms() -> u64 {
    2000
}

/// The time zone a recap day is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecapTimezone {
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl RecapTimezone {
    /// Parses `"local"`, `"utc"`, or a `±HH:MM` offset.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => return Ok(Self::Local),
            "utc" | "z" => return Ok(Self::Utc),
            _ => {}
        }
        let offset: FixedOffset = s
            .trim()
            .parse()
            .with_context(|| format!("invalid recap.timezone '{}'", s))?;
        Ok(Self::Fixed(offset))
    }
}

impl RecapConfig {
    pub fn timezone(&self) -> Result<RecapTimezone> {
        RecapTimezone::parse(&self.timezone)
    }

    pub fn options(&self, dry_run: bool) -> RecapOptions {
        RecapOptions {
            location_filter: if self.legacy_zero_filter {
                LocationFilter::LegacyTruthy
            } else {
                LocationFilter::Finite
            },
            dry_run,
        }
    }
}

/// Load, apply environment overrides to, and validate a configuration file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate(&config)?;

    Ok(config)
}

fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(path) = var(DB_PATH_ENV).filter(|v| !v.is_empty()) {
        info!("{DB_PATH_ENV} set, using database at {path}");
        config.db.path = PathBuf::from(path);
    }
    if let Some(key) = var(MAPS_API_KEY_ENV).filter(|v| !v.is_empty()) {
        config.map.api_key = key;
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.server.bind.trim().is_empty() {
        bail!("server.bind must not be empty");
    }

    if config.server.max_upload_bytes == 0 {
        bail!("server.max_upload_bytes must be > 0");
    }

    config.recap.timezone()?;

    Ok(())
}
