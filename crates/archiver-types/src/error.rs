//! Error types for value parsing in archiver-types.

use thiserror::Error;

/// Errors that can occur when parsing user-facing values into typed ones.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The name does not match any known sensor field.
    #[error("Unknown sensor '{0}'. Valid options are: temperature, humidity, pressure, co2")]
    UnknownSensor(String),

    /// A window was built with its end before its start.
    #[error("Invalid window: start {start} is after end {end}")]
    InvertedWindow { start: i64, end: i64 },
}

/// Result type alias using archiver-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
