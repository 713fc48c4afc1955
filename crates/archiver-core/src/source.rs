//! The seam between the sync engine and whatever downloads device history.
//!
//! The engine only needs one operation: "give me the samples recorded in
//! this window". Implementations:
//!
//! - [`crate::GatewayClient`]: HTTP gateway that talks to the sensor
//! - [`crate::MockSource`]: scripted samples and failure injection for tests

use std::fmt;

use chrono::{DateTime, SecondsFormat};
use chrono_tz::Tz;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use thiserror::Error;

use archiver_types::HistorySample;

/// A transient failure while downloading history.
///
/// Every variant is retryable from the sync engine's point of view.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    /// The gateway could not be reached.
    #[error("Gateway not reachable at {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP request or response decoding failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The gateway answered with a non-success status.
    #[error("Gateway error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The gateway URL is malformed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The device or link reported a failure.
    #[error("Device error: {0}")]
    Device(String),
}

/// Time window handed to a [`HistorySource`].
///
/// `start` is `None` when the device has no stored checkpoint, meaning
/// "from the beginning of the device's history". Both bounds are
/// inclusive and expressed in the configured local timezone.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchWindow {
    pub start: Option<DateTime<Tz>>,
    pub end: DateTime<Tz>,
}

impl FetchWindow {
    /// Whether a sample taken at `timestamp` (epoch seconds) falls inside
    /// the window, both bounds included.
    pub fn contains(&self, timestamp: i64) -> bool {
        let after_start = self
            .start
            .as_ref()
            .is_none_or(|start| timestamp >= start.timestamp());
        after_start && timestamp <= self.end.timestamp()
    }
}

impl fmt::Display for FetchWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.start {
            Some(start) => write!(f, "({start}, {})", self.end),
            None => write!(f, "(beginning, {})", self.end),
        }
    }
}

impl Serialize for FetchWindow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FetchWindow", 2)?;
        state.serialize_field(
            "start",
            &self
                .start
                .as_ref()
                .map(|s| s.to_rfc3339_opts(SecondsFormat::Secs, false)),
        )?;
        state.serialize_field("end", &self.end.to_rfc3339_opts(SecondsFormat::Secs, false))?;
        state.end()
    }
}

/// Something that can download a device's recorded history.
pub trait HistorySource {
    /// Download samples for `address` whose timestamps lie within `window`.
    ///
    /// Samples may include the device's invalid-record sentinel
    /// (negative CO2); filtering is the caller's job.
    fn fetch_history(
        &self,
        address: &str,
        window: &FetchWindow,
    ) -> Result<Vec<HistorySample>, FetchError>;
}

impl<T: HistorySource + ?Sized> HistorySource for &T {
    fn fetch_history(
        &self,
        address: &str,
        window: &FetchWindow,
    ) -> Result<Vec<HistorySample>, FetchError> {
        (**self).fetch_history(address, window)
    }
}

impl<T: HistorySource + ?Sized> HistorySource for Box<T> {
    fn fetch_history(
        &self,
        address: &str,
        window: &FetchWindow,
    ) -> Result<Vec<HistorySample>, FetchError> {
        (**self).fetch_history(address, window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn window(start: Option<i64>, end: i64) -> FetchWindow {
        let tz = chrono_tz::Europe::Rome;
        FetchWindow {
            start: start.map(|s| tz.timestamp_opt(s, 0).unwrap()),
            end: tz.timestamp_opt(end, 0).unwrap(),
        }
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let w = window(Some(100), 200);
        assert!(w.contains(100));
        assert!(w.contains(200));
        assert!(!w.contains(99));
        assert!(!w.contains(201));
    }

    #[test]
    fn test_open_start_accepts_everything_before_end() {
        let w = window(None, 200);
        assert!(w.contains(i64::MIN));
        assert!(!w.contains(201));
    }

    #[test]
    fn test_display_names_missing_start_as_beginning() {
        let w = window(None, 0);
        assert_eq!(w.to_string(), "(beginning, 1970-01-01 01:00:00 CET)");
    }

    #[test]
    fn test_serialize_uses_local_offset() {
        let json = serde_json::to_value(window(Some(0), 3600)).unwrap();
        assert_eq!(json["start"], "1970-01-01T01:00:00+01:00");
        assert_eq!(json["end"], "1970-01-01T02:00:00+01:00");
    }
}
