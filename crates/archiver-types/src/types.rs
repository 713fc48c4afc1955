//! Core types for archived sensor data.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ParseError, ParseResult};

/// A sensor field that can be selected for queries and display.
///
/// The set is closed: every variant maps to exactly one column of the
/// `measurements` table, so user input never reaches SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Sensor {
    /// Temperature in degrees Celsius.
    Temperature,
    /// Relative humidity percentage.
    Humidity,
    /// Atmospheric pressure in hPa.
    Pressure,
    /// CO2 concentration in ppm.
    Co2,
}

impl Sensor {
    /// All sensors in canonical column order.
    pub const ALL: [Sensor; 4] = [
        Sensor::Temperature,
        Sensor::Humidity,
        Sensor::Pressure,
        Sensor::Co2,
    ];

    /// Column name in the `measurements` table.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Sensor::Temperature => "temperature",
            Sensor::Humidity => "humidity",
            Sensor::Pressure => "pressure",
            Sensor::Co2 => "co2",
        }
    }

    /// Display unit for this sensor.
    #[must_use]
    pub const fn unit(self) -> &'static str {
        match self {
            Sensor::Temperature => "°C",
            Sensor::Humidity => "%",
            Sensor::Pressure => "hPa",
            Sensor::Co2 => "ppm",
        }
    }

    /// Human-readable label, as used in chart and table headers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Sensor::Temperature => "Temperature",
            Sensor::Humidity => "Humidity",
            Sensor::Pressure => "Pressure",
            Sensor::Co2 => "CO2",
        }
    }

    /// Whether values of this sensor are stored as integers.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Sensor::Humidity | Sensor::Co2)
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Sensor {
    type Err = ParseError;

    /// Parse a sensor name, case-insensitively and ignoring surrounding
    /// whitespace (`"CO2"`, `" co2 "` and `"Temperature"` all parse).
    fn from_str(s: &str) -> ParseResult<Self> {
        let name = s.trim();
        Sensor::ALL
            .into_iter()
            .find(|sensor| sensor.column().eq_ignore_ascii_case(name))
            .ok_or_else(|| ParseError::UnknownSensor(name.to_string()))
    }
}

/// A single sample as returned by a remote device, before it is attributed
/// to a device identity.
///
/// `co2` may be negative: the device uses negative values as a sentinel for
/// "no valid reading".
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HistorySample {
    /// Seconds since the Unix epoch, UTC.
    pub timestamp: i64,
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity percentage.
    pub humidity: i64,
    /// Atmospheric pressure in hPa.
    pub pressure: f64,
    /// CO2 concentration in ppm, negative when the device had no reading.
    pub co2: i64,
}

impl HistorySample {
    /// Whether this sample carries the device's "no reading" sentinel.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.co2 < 0
    }

    /// Attribute this sample to a device, producing a storable measurement.
    #[must_use]
    pub fn into_measurement(self, device: &str) -> Measurement {
        Measurement {
            device: device.to_string(),
            timestamp: self.timestamp,
            temperature: self.temperature,
            humidity: self.humidity,
            pressure: self.pressure,
            co2: self.co2,
        }
    }
}

/// One persisted sensor sample.
///
/// `(device, timestamp)` is the natural key: a stored measurement is never
/// updated, and re-inserting the same key is a no-op.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Measurement {
    /// Device identifier, stable per physical unit.
    pub device: String,
    /// Seconds since the Unix epoch, UTC.
    pub timestamp: i64,
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity percentage.
    pub humidity: i64,
    /// Atmospheric pressure in hPa.
    pub pressure: f64,
    /// CO2 concentration in ppm.
    pub co2: i64,
}

impl Measurement {
    /// Timestamp as a UTC date-time, if it is within chrono's range.
    #[must_use]
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }

    /// Project this measurement onto a subset of sensors.
    #[must_use]
    pub fn project(&self, sensors: &[Sensor]) -> Row {
        let mut row = Row::new(self.timestamp);
        for sensor in sensors {
            match sensor {
                Sensor::Temperature => row.temperature = Some(self.temperature),
                Sensor::Humidity => row.humidity = Some(self.humidity),
                Sensor::Pressure => row.pressure = Some(self.pressure),
                Sensor::Co2 => row.co2 = Some(self.co2),
            }
        }
        row
    }
}

/// A typed projection of a stored measurement.
///
/// Only the sensors that were requested are populated; the rest stay `None`.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Row {
    /// Seconds since the Unix epoch, UTC.
    pub timestamp: i64,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub temperature: Option<f64>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub humidity: Option<i64>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub pressure: Option<f64>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub co2: Option<i64>,
}

impl Row {
    /// Create an empty row at the given timestamp.
    #[must_use]
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            ..Default::default()
        }
    }

    /// Value of a sensor as a float, for charting and statistics.
    #[must_use]
    pub fn value(&self, sensor: Sensor) -> Option<f64> {
        match sensor {
            Sensor::Temperature => self.temperature,
            Sensor::Humidity => self.humidity.map(|v| v as f64),
            Sensor::Pressure => self.pressure,
            Sensor::Co2 => self.co2.map(|v| v as f64),
        }
    }

    /// Value of a sensor formatted for display, without unit.
    #[must_use]
    pub fn display_value(&self, sensor: Sensor) -> Option<String> {
        match sensor {
            Sensor::Temperature => self.temperature.map(|v| format!("{v:.1}")),
            Sensor::Humidity => self.humidity.map(|v| v.to_string()),
            Sensor::Pressure => self.pressure.map(|v| format!("{v:.1}")),
            Sensor::Co2 => self.co2.map(|v| v.to_string()),
        }
    }

    /// Timestamp as a UTC date-time, if it is within chrono's range.
    #[must_use]
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}

/// A half-open time interval `[start, end)` in UTC epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QueryWindow {
    start: i64,
    end: i64,
}

impl QueryWindow {
    /// Create a window from epoch seconds. `start == end` is a valid, empty
    /// window; `start > end` is rejected.
    pub fn new(start: i64, end: i64) -> ParseResult<Self> {
        if start > end {
            return Err(ParseError::InvertedWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Create a window from UTC date-times.
    pub fn from_datetimes(start: DateTime<Utc>, end: DateTime<Utc>) -> ParseResult<Self> {
        Self::new(start.timestamp(), end.timestamp())
    }

    /// Inclusive lower bound.
    #[must_use]
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Exclusive upper bound.
    #[must_use]
    pub fn end(&self) -> i64 {
        self.end
    }

    /// Lower bound as a UTC date-time.
    #[must_use]
    pub fn start_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.start, 0)
    }

    /// Upper bound as a UTC date-time.
    #[must_use]
    pub fn end_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.end, 0)
    }

    /// Whether `timestamp` lies in `[start, end)`.
    #[must_use]
    pub fn contains(&self, timestamp: i64) -> bool {
        self.start <= timestamp && timestamp < self.end
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for QueryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start_utc(), self.end_utc()) {
            (Some(start), Some(end)) => write!(
                f,
                "{} UTC and {} UTC",
                start.format("%Y-%m-%d %H:%M:%S"),
                end.format("%Y-%m-%d %H:%M:%S")
            ),
            _ => write!(f, "{} and {}", self.start, self.end),
        }
    }
}
