//! Mock history source for testing.
//!
//! [`MockSource`] implements [`HistorySource`] without any hardware or
//! network, so the sync engine can be driven end to end in tests.
//!
//! # Features
//!
//! - **Scripted history**: the samples the "device" holds
//! - **Failure injection**: fail the next N fetches, or every fetch
//! - **Call log**: every requested window is recorded for assertions

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use archiver_types::HistorySample;

use crate::source::{FetchError, FetchWindow, HistorySource};

/// A scripted history source.
///
/// # Example
///
/// ```
/// use archiver_core::{FetchWindow, HistorySource, MockSource};
/// use archiver_types::HistorySample;
/// use chrono::TimeZone;
///
/// let source = MockSource::new(vec![HistorySample {
///     timestamp: 100, temperature: 20.0, humidity: 40, pressure: 1000.0, co2: 500,
/// }]);
/// source.fail_next(1);
///
/// let window = FetchWindow { start: None, end: chrono_tz::UTC.timestamp_opt(200, 0).unwrap() };
/// assert!(source.fetch_history("AA:BB", &window).is_err());
/// assert_eq!(source.fetch_history("AA:BB", &window).unwrap().len(), 1);
/// assert_eq!(source.call_count(), 2);
/// ```
#[derive(Debug, Default)]
pub struct MockSource {
    samples: Mutex<Vec<HistorySample>>,
    should_fail: AtomicBool,
    remaining_failures: AtomicU32,
    fail_message: Mutex<String>,
    /// Return samples regardless of the requested window.
    ignore_window: AtomicBool,
    calls: Mutex<Vec<(String, FetchWindow)>>,
}

impl MockSource {
    /// A source holding `samples`.
    pub fn new(samples: Vec<HistorySample>) -> Self {
        Self {
            samples: Mutex::new(samples),
            fail_message: Mutex::new("Mock failure".to_string()),
            ..Default::default()
        }
    }

    /// A source whose every fetch fails.
    pub fn failing() -> Self {
        let source = Self::new(Vec::new());
        source.set_should_fail(true, None);
        source
    }

    /// Replace the held samples.
    pub fn set_samples(&self, samples: Vec<HistorySample>) {
        *lock(&self.samples) = samples;
    }

    /// Append samples, as a device does when it records new measurements.
    pub fn push(&self, samples: impl IntoIterator<Item = HistorySample>) {
        lock(&self.samples).extend(samples);
    }

    /// Make every fetch fail (or stop failing).
    pub fn set_should_fail(&self, fail: bool, message: Option<&str>) {
        self.should_fail.store(fail, Ordering::Relaxed);
        if let Some(msg) = message {
            *lock(&self.fail_message) = msg.to_string();
        }
    }

    /// Fail the next `count` fetches, then succeed.
    pub fn fail_next(&self, count: u32) {
        self.remaining_failures.store(count, Ordering::Relaxed);
    }

    /// Return every held sample even when it lies outside the window.
    pub fn ignore_window(&self, ignore: bool) {
        self.ignore_window.store(ignore, Ordering::Relaxed);
    }

    /// Number of fetches made so far.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// The windows requested so far, oldest first.
    pub fn requested_windows(&self) -> Vec<FetchWindow> {
        lock(&self.calls).iter().map(|(_, w)| w.clone()).collect()
    }

    /// The addresses requested so far, oldest first.
    pub fn requested_addresses(&self) -> Vec<String> {
        lock(&self.calls).iter().map(|(a, _)| a.clone()).collect()
    }

    fn check_should_fail(&self) -> Result<(), FetchError> {
        let message = || FetchError::Device(lock(&self.fail_message).clone());

        if self.should_fail.load(Ordering::Relaxed) {
            return Err(message());
        }

        let failed = self
            .remaining_failures
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
        if failed.is_ok() {
            return Err(message());
        }

        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl HistorySource for MockSource {
    fn fetch_history(
        &self,
        address: &str,
        window: &FetchWindow,
    ) -> Result<Vec<HistorySample>, FetchError> {
        lock(&self.calls).push((address.to_string(), window.clone()));
        self.check_should_fail()?;

        let ignore_window = self.ignore_window.load(Ordering::Relaxed);
        Ok(lock(&self.samples)
            .iter()
            .filter(|s| ignore_window || window.contains(s.timestamp))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(timestamp: i64) -> HistorySample {
        HistorySample {
            timestamp,
            temperature: 21.0,
            humidity: 45,
            pressure: 1010.0,
            co2: 600,
        }
    }

    fn window(start: Option<i64>, end: i64) -> FetchWindow {
        FetchWindow {
            start: start.map(|s| chrono_tz::UTC.timestamp_opt(s, 0).unwrap()),
            end: chrono_tz::UTC.timestamp_opt(end, 0).unwrap(),
        }
    }

    #[test]
    fn test_filters_by_window() {
        let source = MockSource::new(vec![sample(100), sample(200), sample(300)]);
        let got = source.fetch_history("dev", &window(Some(200), 300)).unwrap();
        let stamps: Vec<_> = got.iter().map(|s| s.timestamp).collect();
        assert_eq!(stamps, vec![200, 300]);
    }

    #[test]
    fn test_ignore_window_returns_everything() {
        let source = MockSource::new(vec![sample(100), sample(200)]);
        source.ignore_window(true);
        let got = source.fetch_history("dev", &window(Some(150), 160)).unwrap();
        assert_eq!(got.len(), 2);
    }

    #[test]
    fn test_fail_next_counts_down() {
        let source = MockSource::new(vec![sample(100)]);
        source.fail_next(2);
        let w = window(None, 1_000);
        assert!(source.fetch_history("dev", &w).is_err());
        assert!(source.fetch_history("dev", &w).is_err());
        assert!(source.fetch_history("dev", &w).is_ok());
        assert_eq!(source.call_count(), 3);
    }

    #[test]
    fn test_always_failing_uses_message() {
        let source = MockSource::failing();
        source.set_should_fail(true, Some("out of range"));
        let err = source.fetch_history("dev", &window(None, 0)).unwrap_err();
        assert_eq!(err.to_string(), "Device error: out of range");
    }

    #[test]
    fn test_records_requests() {
        let source = MockSource::new(Vec::new());
        source.fetch_history("AA:BB", &window(Some(5), 10)).unwrap();
        assert_eq!(source.requested_addresses(), vec!["AA:BB"]);
        assert_eq!(source.requested_windows(), vec![window(Some(5), 10)]);
    }
}
