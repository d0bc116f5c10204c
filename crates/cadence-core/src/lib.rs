//! # Cadence Core Library
//!
//! A recurring-event occurrence engine: series with an optional daily, weekly
//! or monthly rule are expanded into concrete occurrences for any query window,
//! with per-occurrence exclusions and overrides folded in.
//!
//! ## Features
//!
//! - **Drift-free recurrence**: every anchor is computed from the original
//!   start, so month-end clamping never accumulates
//! - **Exclusions and overrides**: single occurrences can be removed or edited
//!   without touching the rest of the series
//! - **Atomic occurrence mutations**: exclusion and override writes commit
//!   together or not at all, retried on concurrent writers
//! - **Deterministic output**: occurrences sort by start, then series, then
//!   anchor
//!
//! ## Core Modules
//!
//! - [`recurrence`]: Pure rule expansion into anchors
//! - [`exclusions`]: Per-series excluded anchors and their stored payload
//! - [`overrides`]: Override records keyed by `(series, anchor)`
//! - [`compositor`]: Merges anchors, exclusions and overrides for a window
//! - [`repository`]: SQLite persistence and the mutation coordinator
//! - [`validation`]: Input checks run before any write
//! - [`auth`]: Actor and access policy seam
//! - [`db`]: Connection and migration management
//! - [`models`]: Core data structures
//! - [`error`]: Error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use cadence_core::{
//!     auth::Actor,
//!     db,
//!     models::{EngineConfig, RecurrenceKind, SeriesInput, TimeWindow},
//!     repository::{OccurrenceRepository, SeriesRepository, SqliteRepository},
//! };
//! use chrono::{Duration, TimeZone, Utc};
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = db::establish_connection("cadence.db").await?;
//!     let repo = SqliteRepository::new(pool, EngineConfig::default());
//!     let me = Actor::user(Uuid::now_v7());
//!
//!     let start = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
//!     repo.create_series(&me, SeriesInput {
//!         title: "Standup".to_string(),
//!         start,
//!         end: start + Duration::hours(1),
//!         recurrence: RecurrenceKind::Weekly,
//!         count: Some(3),
//!         ..Default::default()
//!     }).await?;
//!
//!     let january = TimeWindow::new(start, start + Duration::days(30))?;
//!     for occurrence in repo.find_occurrences(&me, january).await? {
//!         println!("{} {}", occurrence.start, occurrence.title);
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod compositor;
pub mod db;
pub mod error;
pub mod exclusions;
pub mod models;
pub mod overrides;
pub mod recurrence;
pub mod repository;
pub mod validation;
