//! `daybook recap`: the nightly recap batch job.
//!
//! Wires the core [`run_recap`](daybook_core::recap::run_recap) algorithm to
//! the SQLite store and the placeholder map and video collaborators, and
//! prints a summary of the run. Intended to be run once a day by cron or a
//! systemd timer; the job itself does no scheduling.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};

use daybook_core::recap::{self, RecapReport, RecapServices, RecapWindow, WindowMode};

use crate::config::{Config, RecapTimezone};
use crate::db;
use crate::placeholders::{PlaceholderComposer, StaticMapRenderer};
use crate::sqlite_store::SqliteStore;

/// The recap window ending at `now`, measured in `timezone`.
pub fn window_at(now: DateTime<Utc>, timezone: RecapTimezone, mode: WindowMode) -> RecapWindow {
    match timezone {
        RecapTimezone::Local => RecapWindow::trailing_day(&now.with_timezone(&Local), mode),
        RecapTimezone::Utc => RecapWindow::trailing_day(&now, mode),
        RecapTimezone::Fixed(offset) => {
            RecapWindow::trailing_day(&now.with_timezone(&offset), mode)
        }
    }
}

/// Run the recap for the day ending now.
///
/// Connects to the database, runs the job, and always closes the
/// connection pool before returning.
pub async fn run_recap(config: &Config, dry_run: bool) -> Result<RecapReport> {
    let window = window_at(Utc::now(), config.recap.timezone()?, config.recap.window);
    run_recap_for_window(config, window, dry_run).await
}

/// Run the recap over an explicit window.
pub async fn run_recap_for_window(
    config: &Config,
    window: RecapWindow,
    dry_run: bool,
) -> Result<RecapReport> {
    let pool = db::connect(config)
        .await
        .context("Failed to connect to the journal database")?;
    let store = SqliteStore::new(pool);

    let map = StaticMapRenderer::from_config(config);
    let composer = PlaceholderComposer::from_config(config);
    let services = RecapServices {
        map: &map,
        composer: &composer,
    };

    recap::run_recap(&store, &services, &config.recap.options(dry_run), window).await
}

/// Print a human-readable summary of a finished run.
pub fn print_report(report: &RecapReport) {
    println!(
        "Recap window: {} .. {}",
        report.window.start.to_rfc3339(),
        report.window.end.to_rfc3339()
    );
    println!("  entries:   {}", report.entry_count);
    if let Some(plan) = &report.plan {
        println!("  locations: {}", plan.locations.len());
        println!("  media:     {}", plan.media.len());
    }
    if let Some(map) = &report.map_ref {
        println!("  map:       {}", map);
    }
    match &report.video_ref {
        Some(video) => println!("  video:     {}", video),
        None => println!("  video:     (none)"),
    }
    let states: Vec<String> = report.states.iter().map(|s| format!("{:?}", s)).collect();
    println!("  path:      {}", states.join(" -> "));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, TimeZone};

    #[test]
    fn test_window_at_utc_month_boundary() {
        let now = Utc.with_ymd_and_hms(2023, 3, 1, 6, 0, 0).unwrap();
        let w = window_at(now, RecapTimezone::Utc, WindowMode::Calendar);
        assert_eq!(w.start, Utc.with_ymd_and_hms(2023, 2, 28, 6, 0, 0).unwrap());
        assert_eq!(w.end, now);
    }

    #[test]
    fn test_window_at_fixed_offset_crosses_utc_date() {
        // 2023-03-01 01:00 at +05:30 is still 28 February in UTC.
        let offset = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let now = offset
            .with_ymd_and_hms(2023, 3, 1, 1, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let w = window_at(now, RecapTimezone::Fixed(offset), WindowMode::Calendar);
        assert_eq!(w.end - w.start, Duration::hours(24));
        assert_eq!(w.end, now);
    }

    #[test]
    fn test_window_at_fixed_mode() {
        let now = Utc.with_ymd_and_hms(2024, 10, 27, 3, 0, 0).unwrap();
        let w = window_at(now, RecapTimezone::Local, WindowMode::Fixed);
        assert_eq!(w.end - w.start, Duration::hours(24));
    }
}
