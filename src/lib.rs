//! appt_insights
//!
//! A small Rust library for ingesting, slicing and comparing appointment records.
//! Pairs with the `appt` CLI.
//!
//! ### Features
//! - Normalize heterogeneous spreadsheet rows (serial dates, free-text dates, loose column names)
//! - Keep a local JSON snapshot; ingestion is additive
//! - Filter by source / location / service sets and an inclusive date range
//! - Bucket by year, quarter, month, week or day in canonical order
//! - KPIs (total, top/bottom per dimension, source → service ranking)
//! - Current vs previous period comparison with a division-safe growth figure
//! - Render bucket charts to SVG/PNG
//!
//! ### Example
//! ```no_run
//! use appt_insights::{FilterSpec, Granularity, RawRow};
//! use appt_insights::storage::{self, JsonFileStore, Store};
//!
//! let mut store = JsonFileStore::new("records.json");
//! let rows = vec![RawRow::new().with("Appointment Date", 45292.0).with("Source", "Web")];
//! let report = storage::ingest(&mut store, &rows)?;
//! println!("accepted {} rows", report.accepted);
//!
//! let records = store.load();
//! let subset = appt_insights::filter::filter(&records, &FilterSpec::new().sources(["Web"]));
//! let months = appt_insights::calendar::bucket(&subset, Granularity::Month);
//! let kpis = appt_insights::stats::summarize(&subset);
//! println!("{:#?} {:#?}", months, kpis);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod calendar;
pub mod compare;
pub mod config;
pub mod filter;
pub mod models;
pub mod normalize;
pub mod stats;
pub mod storage;
pub mod viz;

pub use models::{
    Bucket, ComparisonResult, Dimension, FilterSpec, Granularity, PeriodPreset, RawRow, RawValue,
    Record, Summary,
};
