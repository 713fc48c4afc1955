//! Command-line archiver for Aranet4 sensor history.
//!
//! The `aranet4-archiver` binary keeps a local SQLite copy of a sensor's
//! recorded history and lets you look at it from the terminal.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `fetch` | Download measurements newer than the stored checkpoint |
//! | `plot` | Chart, table, CSV or JSON of a date range |
//! | `print` | Newest (or oldest) stored measurements |
//! | `tail` | Last measurements in chronological order |
//! | `stats` | Per-device counts and time span |
//!
//! # Configuration
//!
//! Settings come from built-in defaults, then
//! `<config dir>/aranet4-archiver/config.toml` (or `--config`), then a
//! `.env` file, then the environment:
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `DEVICE_NAME` | Identifier measurements are stored under |
//! | `DEVICE_MAC` | Address the gateway uses to reach the sensor |
//! | `DB_PATH` | SQLite database (`~` is expanded) |
//! | `LOCAL_TIMEZONE` | IANA zone for dates and display |
//! | `ARCHIVER_GATEWAY_URL` | Base URL of the history gateway |
//!
//! # Output Formats
//!
//! - **Chart** (plot default): one sparkline per sensor
//! - **Table**: rounded tables, or blank-bordered with `--style plain`
//! - **CSV** and **JSON**: for scripts and spreadsheets

pub mod cli;
pub mod commands;
pub mod config;
pub mod format;
pub mod style;
pub mod util;

// Re-export core dependencies for convenience
pub use archiver_core;
pub use archiver_store;
pub use archiver_types;
