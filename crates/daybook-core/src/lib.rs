//! # Daybook Core
//!
//! Storage-agnostic logic for Daybook: journal entry models, the store
//! abstraction, ingestion, external collaborator traits, and the daily
//! recap algorithm.
//!
//! This crate has no tokio, sqlx or filesystem dependencies; the SQLite
//! store, HTTP server and CLI live in the `daybook` crate.

pub mod ingest;
pub mod models;
pub mod recap;
pub mod services;
pub mod store;
