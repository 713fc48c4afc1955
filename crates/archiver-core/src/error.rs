//! Error types for archiver-core.
//!
//! # Error Recovery Strategies
//!
//! | Error Type | Strategy | Store effect |
//! |------------|----------|--------------|
//! | [`Error::FetchFailed`] | Re-run the sync later | None: nothing was merged |
//! | [`Error::Store`] | Fix the store path or permissions | None: merges are atomic |
//! | [`Error::InvalidDateFormat`] | Fix the input (`YYYY-MM-DD`) | None: no query ran |
//! | [`Error::UnknownTimezone`] | Use an IANA name such as `Europe/Rome` | None: no query ran |
//! | [`Error::NoValidSensors`] | Pick from temperature, humidity, pressure, co2 | None |
//! | [`Error::RangeOutOfBounds`] | Ask for fewer days or a nearer date | None: no query ran |
//!
//! Retries happen only inside the sync engine, for [`crate::FetchError`].
//! Store and range errors are returned immediately.

use thiserror::Error;

use crate::source::FetchError;

/// Errors surfaced at the boundary of a sync run or a query run.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Every fetch attempt failed. No samples were merged.
    #[error("Failed to fetch measurements after {attempts} attempt(s): {last}")]
    FetchFailed {
        /// Number of attempts made.
        attempts: u32,
        /// The error from the final attempt.
        #[source]
        last: FetchError,
    },

    /// The measurement store could not be opened, read or written.
    #[error(transparent)]
    Store(#[from] archiver_store::Error),

    /// A supplied date string is not a `YYYY-MM-DD` calendar date.
    #[error("Invalid date format '{0}'. Use YYYY-MM-DD.")]
    InvalidDateFormat(String),

    /// The named timezone is not a known IANA zone.
    #[error("Unknown timezone '{0}'")]
    UnknownTimezone(String),

    /// None of the requested sensor names were valid.
    #[error(
        "No valid sensors selected (requested: {}). Please choose from: temperature, humidity, pressure, co2",
        requested.join(", ")
    )]
    NoValidSensors {
        /// The names that were asked for.
        requested: Vec<String>,
    },

    /// A requested date range does not fit in the supported calendar.
    #[error("Requested range is out of bounds: {0}")]
    RangeOutOfBounds(String),

    /// A stored or computed timestamp is outside the representable range.
    #[error("Timestamp {0} is out of range")]
    TimestampOutOfRange(i64),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Whether this error was caused by user input rather than the
    /// environment (bad dates, timezones or sensor names).
    #[must_use]
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            Error::InvalidDateFormat(_)
                | Error::UnknownTimezone(_)
                | Error::NoValidSensors { .. }
                | Error::RangeOutOfBounds(_)
        )
    }
}

/// Result type alias using archiver-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidDateFormat("2024-13-01".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid date format '2024-13-01'. Use YYYY-MM-DD."
        );

        let err = Error::NoValidSensors {
            requested: vec!["radon".to_string(), "voc".to_string()],
        };
        assert!(err.to_string().contains("requested: radon, voc"));

        let err = Error::FetchFailed {
            attempts: 3,
            last: FetchError::Device("timeout".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Failed to fetch measurements after 3 attempt(s): Device error: timeout"
        );
    }

    #[test]
    fn test_user_input_classification() {
        assert!(Error::UnknownTimezone("Mars/Base".to_string()).is_user_input());
        assert!(!Error::InvalidConfig("x".to_string()).is_user_input());
        assert!(Error::RangeOutOfBounds("200000000 days".to_string()).is_user_input());
    }

    #[test]
    fn test_store_error_conversion() {
        let store_err = archiver_store::Error::CreateDirectory {
            path: "/nope".into(),
            source: std::io::Error::other("denied"),
        };
        let err: Error = store_err.into();
        assert!(matches!(err, Error::Store(_)));
    }
}
