//! Sync and query engines for the Aranet4 archiver.
//!
//! This crate sits between a device's history download and the durable
//! [`archiver_store::Store`]:
//!
//! - **Sync**: [`SyncEngine`] pulls everything newer than the stored
//!   checkpoint, retries transient failures, drops invalid samples and
//!   merges idempotently.
//! - **Range resolution**: [`range::resolve`] turns `YYYY-MM-DD` dates in a
//!   local timezone into a half-open UTC [`QueryWindow`].
//! - **Reading**: [`SampleReader`] projects allowlisted sensors over a
//!   window and thins large results for display.
//!
//! History comes from any [`HistorySource`]: the HTTP [`GatewayClient`] in
//! production, [`MockSource`] in tests. Time comes from a [`Clock`].
//!
//! # Quick Start
//!
//! ```
//! use archiver_core::{range, Clock, ManualClock, MockSource, SampleReader, SyncEngine};
//! use archiver_store::Store;
//! use archiver_types::HistorySample;
//!
//! let mut store = Store::open_in_memory()?;
//! let source = MockSource::new(vec![
//!     HistorySample { timestamp: 1_718_000_000, temperature: 22.1, humidity: 48, pressure: 1009.0, co2: 640 },
//!     HistorySample { timestamp: 1_718_000_300, temperature: 22.0, humidity: 48, pressure: 1009.1, co2: -1 },
//! ]);
//! let clock = ManualClock::at_timestamp(1_718_020_000);
//!
//! let report = SyncEngine::new(&mut store, &source, &clock).sync("office", "AA:BB:CC:DD:EE:FF", 3)?;
//! assert_eq!((report.inserted, report.filtered), (1, 1));
//!
//! let window = range::resolve(Some("2024-06-09"), None, 3, "UTC", clock.now_utc())?;
//! let readout = SampleReader::new(&store).read(window, ["co2"], 2000)?;
//! assert_eq!(readout.rows[0].co2, Some(640));
//! # Ok::<(), archiver_core::Error>(())
//! ```

pub mod clock;
pub mod error;
pub mod gateway;
pub mod mock;
pub mod range;
pub mod reader;
pub mod retry;
pub mod source;
pub mod sync;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use gateway::GatewayClient;
pub use mock::MockSource;
pub use reader::{Readout, SampleReader, downsample, select_sensors};
pub use retry::{Exhausted, RetryConfig, with_retry};
pub use source::{FetchError, FetchWindow, HistorySource};
pub use sync::{SyncEngine, SyncReport};

// Re-export the shared types for convenience
pub use archiver_types::{HistorySample, Measurement, QueryWindow, Row, Sensor};
