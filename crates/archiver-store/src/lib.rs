//! Durable measurement store for the Aranet4 archiver.
//!
//! This crate provides SQLite-based storage for sensor samples. It owns the
//! `(device, timestamp)` uniqueness invariant and the on-disk layout:
//!
//! ```sql
//! measurements(device TEXT, timestamp INTEGER, temperature REAL,
//!              humidity INTEGER, pressure REAL, co2 INTEGER,
//!              PRIMARY KEY(device, timestamp))
//! ```
//!
//! # Features
//!
//! - Idempotent schema creation, compatible with existing stores
//! - Per-device checkpoint lookup (latest stored timestamp)
//! - Atomic, duplicate-ignoring bulk merge
//! - Half-open range queries with an allowlisted sensor projection
//!
//! # Example
//!
//! ```
//! use archiver_store::{RangeQuery, Store};
//! use archiver_types::{HistorySample, QueryWindow, Sensor};
//!
//! let mut store = Store::open_in_memory()?;
//! let sample = HistorySample {
//!     timestamp: 1_700_000_000,
//!     temperature: 21.5,
//!     humidity: 40,
//!     pressure: 1012.3,
//!     co2: 612,
//! };
//! let inserted = store.insert_ignoring_duplicates(&[sample.into_measurement("office")])?;
//! assert_eq!(inserted, 1);
//! assert_eq!(store.latest_timestamp("office")?, Some(1_700_000_000));
//!
//! let window = QueryWindow::new(1_700_000_000, 1_700_000_001).unwrap();
//! let rows = store.query_range(&RangeQuery::new(window).sensors([Sensor::Co2]))?;
//! assert_eq!(rows[0].co2, Some(612));
//! # Ok::<(), archiver_store::Error>(())
//! ```

mod error;
mod models;
mod queries;
mod schema;
mod store;

pub use error::{Error, Result};
pub use models::DeviceSummary;
pub use queries::{RangeQuery, RecentQuery};
pub use schema::SCHEMA_VERSION;
pub use store::Store;

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/aranet4-archiver/aranet4.db`
/// - macOS: `~/Library/Application Support/aranet4-archiver/aranet4.db`
/// - Windows: `C:\Users\<user>\AppData\Local\aranet4-archiver\aranet4.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("aranet4-archiver")
        .join("aranet4.db")
}
