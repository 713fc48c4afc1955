//! Incremental sync of device history into the store.
//!
//! A sync run:
//!
//! 1. reads the device's checkpoint (latest stored timestamp),
//! 2. asks the [`HistorySource`] for everything from the checkpoint to now,
//!    retrying transient failures with a fresh "now" per attempt,
//! 3. drops sentinel samples (negative CO2),
//! 4. merges the rest, ignoring rows already stored.
//!
//! If every attempt fails nothing is written. Because the checkpoint
//! sample itself is re-requested and then ignored by the merge, running the
//! same sync twice never duplicates rows.

use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{debug, info, warn};

use archiver_store::Store;
use archiver_types::{HistorySample, Measurement};

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::retry::{RetryConfig, with_retry};
use crate::source::{FetchWindow, HistorySource};

/// Outcome of one sync run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    /// Device identifier rows were stored under.
    pub device: String,
    /// Samples returned by the source on the successful attempt.
    pub fetched: usize,
    /// Sentinel samples dropped before the merge.
    pub filtered: usize,
    /// Rows newly added to the store.
    pub inserted: usize,
    /// Attempts used, including the successful one.
    pub attempts: u32,
    /// The window requested on the successful attempt.
    pub window: FetchWindow,
}

impl SyncReport {
    /// Valid samples that were already stored.
    pub fn duplicates(&self) -> usize {
        self.fetched - self.filtered - self.inserted
    }
}

/// Pulls device history into a [`Store`].
///
/// # Example
///
/// ```
/// use archiver_core::{ManualClock, MockSource, SyncEngine};
/// use archiver_store::Store;
/// use archiver_types::HistorySample;
///
/// let mut store = Store::open_in_memory()?;
/// let source = MockSource::new(vec![HistorySample {
///     timestamp: 100, temperature: 20.0, humidity: 40, pressure: 1000.0, co2: 500,
/// }]);
/// let clock = ManualClock::at_timestamp(1_000);
///
/// let mut engine = SyncEngine::new(&mut store, &source, &clock);
/// let report = engine.sync("office", "AA:BB:CC:DD:EE:FF", 3)?;
/// assert_eq!(report.inserted, 1);
/// # Ok::<(), archiver_core::Error>(())
/// ```
pub struct SyncEngine<'a, S: ?Sized, C: ?Sized> {
    store: &'a mut Store,
    source: &'a S,
    clock: &'a C,
    timezone: Tz,
    retry: RetryConfig,
}

impl<'a, S, C> SyncEngine<'a, S, C>
where
    S: HistorySource + ?Sized,
    C: Clock + ?Sized,
{
    /// An engine with UTC timestamps and immediate retries.
    pub fn new(store: &'a mut Store, source: &'a S, clock: &'a C) -> Self {
        Self {
            store,
            source,
            clock,
            timezone: chrono_tz::UTC,
            retry: RetryConfig::default(),
        }
    }

    /// Timezone in which fetch bounds are expressed to the source.
    #[must_use]
    pub fn timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Delay strategy between attempts. The attempt count is given per run.
    #[must_use]
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Sync `device_id`'s history from the device at `address`.
    ///
    /// Makes at most `max_attempts` fetch attempts (zero counts as one).
    /// On exhaustion returns [`Error::FetchFailed`] and leaves the store
    /// untouched.
    pub fn sync(
        &mut self,
        device_id: &str,
        address: &str,
        max_attempts: u32,
    ) -> Result<SyncReport> {
        let checkpoint = self.store.latest_timestamp(device_id)?;
        let start = checkpoint
            .map(|ts| to_zone(ts, &self.timezone))
            .transpose()?;

        match &start {
            Some(s) => info!("Syncing {} from checkpoint {}", device_id, s),
            None => info!("Syncing {} from the beginning", device_id),
        }

        let config = self.retry.clone().max_attempts(max_attempts);
        let source = self.source;
        let clock = self.clock;
        let timezone = self.timezone;
        let mut attempts = 0;

        let outcome = with_retry(&config, "fetch_history", |attempt| {
            attempts = attempt;
            let window = FetchWindow {
                start,
                end: clock.now_utc().with_timezone(&timezone),
            };
            debug!("Attempt {}: requesting {}", attempt, window);
            source
                .fetch_history(address, &window)
                .map(|samples| (samples, window))
        });

        let (samples, window) = match outcome {
            Ok(fetched) => fetched,
            Err(exhausted) => {
                warn!("Quitting, failed to fetch measurements.");
                return Err(Error::FetchFailed {
                    attempts: exhausted.attempts,
                    last: exhausted.last_error,
                });
            }
        };

        info!("Fetched {} measurements in range: {}", samples.len(), window);

        let fetched = samples.len();
        let measurements = filter_sentinels(samples, device_id);
        let filtered = fetched - measurements.len();
        if filtered > 0 {
            debug!("Dropped {} invalid samples", filtered);
        }

        let inserted = self.store.insert_ignoring_duplicates(&measurements)?;

        Ok(SyncReport {
            device: device_id.to_string(),
            fetched,
            filtered,
            inserted,
            attempts,
            window,
        })
    }
}

/// Drop sentinel samples and tag the rest with `device_id`.
pub fn filter_sentinels(samples: Vec<HistorySample>, device_id: &str) -> Vec<Measurement> {
    samples
        .into_iter()
        .filter(|s| !s.is_sentinel())
        .map(|s| s.into_measurement(device_id))
        .collect()
}

fn to_zone(timestamp: i64, timezone: &Tz) -> Result<DateTime<Tz>> {
    timezone
        .timestamp_opt(timestamp, 0)
        .single()
        .ok_or(Error::TimestampOutOfRange(timestamp))
}
