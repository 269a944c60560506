//! The daily recap job.
//!
//! Selects the entries written during the trailing day, reduces them to a
//! [`RecapPlan`] (locations for a static map, an ordered clip list, and one
//! caption overlay per entry), and drives the [`MapRenderer`] and
//! [`VideoComposer`] collaborators.
//!
//! # Lifecycle
//!
//! ```text
//! Started -> Connected -> Queried -> NoEntries ------------------------------+
//!                                 -> HasEntries -> MapSkipped   -+          |
//!                                               -> MapGenerated -+          |
//!                                                  -> CompositionSkipped  --+-> Closed
//!                                                  -> CompositionInvoked  --+
//! ```
//!
//! Every path ends in `Closed`: [`run_recap`] releases the store whether the
//! run succeeded or aborted part way. Nothing is retried.
//!
//! # Window
//!
//! The window is `[now - 1 day, now]`, closed on both ends. In
//! [`WindowMode::Calendar`] "1 day" is a calendar day in the caller's time
//! zone: chrono normalises month and year boundaries (1 March 10:00 →
//! 28 or 29 February 10:00) and the window stretches or shrinks across a DST
//! change. If the shifted wall-clock time does not exist or is ambiguous the
//! window falls back to exactly 24 hours, which is what
//! [`WindowMode::Fixed`] always uses.
//!
//! # Location filter
//!
//! [`LocationFilter::Finite`] keeps any location whose coordinates are both
//! finite, so `0.0` (equator, prime meridian) counts.
//! [`LocationFilter::LegacyTruthy`] drops a location if either coordinate is
//! `0` or `NaN`, for output compatible with recaps produced before the fix.

use anyhow::{Context, Result};
use chrono::{DateTime, Days, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::models::{Entry, Location, RecapRecord};
use crate::services::{MapRenderer, Overlay, VideoComposer};
use crate::store::EntryStore;

/// How "the last day" is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowMode {
    #[default]
    Calendar,
    Fixed,
}

/// Which entry locations are plotted on the recap map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationFilter {
    #[default]
    Finite,
    LegacyTruthy,
}

impl LocationFilter {
    pub fn keeps(&self, loc: &Location) -> bool {
        match self {
            LocationFilter::Finite => loc.is_finite(),
            LocationFilter::LegacyTruthy => truthy(loc.latitude) && truthy(loc.longitude),
        }
    }
}

fn truthy(v: f64) -> bool {
    v != 0.0 && !v.is_nan()
}

/// A closed time interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecapWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl RecapWindow {
    /// The day ending at `now`, measured in `now`'s time zone.
    pub fn trailing_day<Tz: TimeZone>(now: &DateTime<Tz>, mode: WindowMode) -> Self {
        let fixed = || now.clone() - Duration::hours(24);
        let start = match mode {
            WindowMode::Calendar => now
                .clone()
                .checked_sub_days(Days::new(1))
                .unwrap_or_else(fixed),
            WindowMode::Fixed => fixed(),
        };
        Self {
            start: start.with_timezone(&Utc),
            end: now.with_timezone(&Utc),
        }
    }

    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        *ts >= self.start && *ts <= self.end
    }
}

/// Everything the collaborators need, derived from the selected entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecapPlan {
    /// Locations that pass the filter, in entry order.
    pub locations: Vec<Location>,
    /// All media references, entry order then per-entry order.
    pub media: Vec<String>,
    /// One overlay per entry, in entry order.
    pub overlays: Vec<Overlay>,
}

impl RecapPlan {
    pub fn build(entries: &[Entry], filter: LocationFilter) -> Self {
        let locations = entries
            .iter()
            .filter_map(|e| e.location)
            .filter(|loc| filter.keeps(loc))
            .collect();

        let media = entries
            .iter()
            .flat_map(|e| e.media_urls.iter().cloned())
            .collect();

        let overlays = entries
            .iter()
            .map(|e| Overlay {
                timestamp: e.timestamp,
                location: e.location,
            })
            .collect();

        Self {
            locations,
            media,
            overlays,
        }
    }
}

/// Steps of a recap run, recorded in [`RecapReport::states`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecapState {
    Started,
    Connected,
    Queried,
    NoEntries,
    HasEntries,
    MapSkipped,
    MapGenerated,
    CompositionSkipped,
    CompositionInvoked,
    Closed,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RecapOptions {
    pub location_filter: LocationFilter,
    /// Select and plan only: no collaborator calls, nothing persisted.
    pub dry_run: bool,
}

/// The collaborators a recap run calls out to.
pub struct RecapServices<'a> {
    pub map: &'a dyn MapRenderer,
    pub composer: &'a dyn VideoComposer,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecapReport {
    pub window: RecapWindow,
    pub states: Vec<RecapState>,
    pub entry_count: usize,
    pub plan: Option<RecapPlan>,
    pub map_ref: Option<String>,
    pub video_ref: Option<String>,
}

impl RecapReport {
    fn new(window: RecapWindow) -> Self {
        Self {
            window,
            states: vec![RecapState::Started, RecapState::Connected],
            entry_count: 0,
            plan: None,
            map_ref: None,
            video_ref: None,
        }
    }

    fn enter(&mut self, state: RecapState) {
        self.states.push(state);
    }

    pub fn last_state(&self) -> RecapState {
        self.states.last().copied().unwrap_or(RecapState::Started)
    }
}

/// Run one recap over `window` against an already connected store.
///
/// The store is always closed before this returns. On error the remaining
/// steps are skipped and the error carries the last state reached.
pub async fn run_recap(
    store: &dyn EntryStore,
    services: &RecapServices<'_>,
    options: &RecapOptions,
    window: RecapWindow,
) -> Result<RecapReport> {
    info!(start = %window.start, end = %window.end, "daily recap started");
    let mut report = RecapReport::new(window);

    let outcome = execute(store, services, options, &mut report).await;

    store.close().await;
    let aborted_at = report.last_state();
    report.enter(RecapState::Closed);
    info!("store connection closed; daily recap finished");

    match outcome {
        Ok(()) => Ok(report),
        Err(e) => {
            error!(error = %e, state = ?aborted_at, "daily recap aborted");
            Err(e.context(format!("recap aborted after {:?}", aborted_at)))
        }
    }
}

async fn execute(
    store: &dyn EntryStore,
    services: &RecapServices<'_>,
    options: &RecapOptions,
    report: &mut RecapReport,
) -> Result<()> {
    let window = report.window;
    let entries = store
        .entries_between(window.start, window.end)
        .await
        .context("Failed to query entries in the recap window")?;
    report.enter(RecapState::Queried);
    report.entry_count = entries.len();

    if entries.is_empty() {
        report.enter(RecapState::NoEntries);
        info!("no new entries in the recap window");
        return Ok(());
    }
    report.enter(RecapState::HasEntries);
    info!(count = entries.len(), "found new entries");

    let plan = RecapPlan::build(&entries, options.location_filter);
    if options.dry_run {
        info!(
            locations = plan.locations.len(),
            media = plan.media.len(),
            "dry run; skipping map and composition"
        );
        report.plan = Some(plan);
        return Ok(());
    }

    let map_ref = if plan.locations.is_empty() {
        report.enter(RecapState::MapSkipped);
        info!("no GPS coordinates in recent entries");
        None
    } else {
        let map_ref = services
            .map
            .render(&plan.locations)
            .await
            .context("Failed to render static map")?;
        report.enter(RecapState::MapGenerated);
        info!(map = %map_ref, "static map generated");
        Some(map_ref)
    };
    report.map_ref = map_ref.clone();

    if plan.media.is_empty() && map_ref.is_none() {
        report.enter(RecapState::CompositionSkipped);
        info!("no media clips or map to create a recap video");
        report.plan = Some(plan);
        return Ok(());
    }

    let video_ref = services
        .composer
        .compose(map_ref.as_deref(), &plan.media, &plan.overlays)
        .await
        .context("Failed to compose recap video")?;
    report.enter(RecapState::CompositionInvoked);
    info!(video = %video_ref, clips = plan.media.len(), "recap video generated");

    let record = RecapRecord {
        id: uuid::Uuid::new_v4().to_string(),
        created_at: window.end,
        window_start: window.start,
        window_end: window.end,
        entry_count: entries.len(),
        map_ref,
        video_ref: video_ref.clone(),
    };
    store
        .insert_recap(&record)
        .await
        .context("Failed to record recap")?;

    report.video_ref = Some(video_ref);
    report.plan = Some(plan);
    Ok(())
}
