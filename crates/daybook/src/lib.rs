//! # Daybook
//!
//! **A personal journaling backend with a daily recap job.**
//!
//! Daybook accepts journal entries (text, media, geolocation) over HTTP,
//! stores them in SQLite, and once a day assembles a recap of the last
//! day's entries: a static map of where they were written and a video of
//! their media, captioned with time and place.
//!
//! ## Architecture
//!
//! ```text
//!  browser ──POST /entries──▶ ┌──────────┐        ┌──────────┐
//!          ◀──GET /entries─── │  server  │──────▶ │  SQLite  │
//!                             └──────────┘        └────┬─────┘
//!                                                      │ last day
//!                                                 ┌────▼─────┐   map  ┌───────────┐
//!                                                 │  recap   │──────▶ │ renderer  │
//!                                                 │  (cron)  │──────▶ │ composer  │
//!                                                 └──────────┘  video └───────────┘
//! ```
//!
//! Models, the store trait, ingestion, and the recap algorithm live in
//! [`daybook_core`]; this crate provides SQLite storage, configuration, the
//! HTTP server, placeholder collaborators, and the `daybook` CLI.
//!
//! ## Quick Start
//!
//! ```bash
//! daybook init                  # create database
//! daybook serve                 # start HTTP server
//! daybook add --text "Hello" --lat 12.5 --lon 77.2 --media photo.jpg
//! daybook list
//! daybook recap --dry-run       # show what tonight's recap would use
//! daybook recap
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite-backed entry store |
//! | [`placeholders`] | Placeholder blob, map, and video collaborators |
//! | [`entries`] | `add` / `list` / `get` commands |
//! | [`recap`] | Daily recap job |
//! | [`server`] | HTTP server |

pub mod config;
pub mod db;
pub mod entries;
pub mod migrate;
pub mod placeholders;
pub mod recap;
pub mod server;
pub mod sqlite_store;
