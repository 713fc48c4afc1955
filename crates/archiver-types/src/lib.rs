//! Shared types for the Aranet4 archiver.
//!
//! This crate holds the value types that flow between the store, the sync
//! engine, the query engine and the CLI:
//!
//! - [`HistorySample`]: a sample as returned by the remote device
//! - [`Measurement`]: a persisted sample, keyed by `(device, timestamp)`
//! - [`Sensor`]: the closed set of selectable sensor fields
//! - [`Row`]: a typed projection of a measurement onto selected sensors
//! - [`QueryWindow`]: a half-open UTC interval
//!
//! # Example
//!
//! ```
//! use archiver_types::{HistorySample, QueryWindow, Sensor};
//!
//! let sample = HistorySample {
//!     timestamp: 1_700_000_000,
//!     temperature: 21.5,
//!     humidity: 40,
//!     pressure: 1012.3,
//!     co2: 612,
//! };
//! let measurement = sample.into_measurement("office");
//! let row = measurement.project(&[Sensor::Co2]);
//! assert_eq!(row.co2, Some(612));
//! assert_eq!(row.temperature, None);
//!
//! let window = QueryWindow::new(1_700_000_000, 1_700_000_060).unwrap();
//! assert!(window.contains(measurement.timestamp));
//! ```

pub mod error;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use types::{HistorySample, Measurement, QueryWindow, Row, Sensor};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample(timestamp: i64, co2: i64) -> HistorySample {
        HistorySample {
            timestamp,
            temperature: 22.5,
            humidity: 45,
            pressure: 1013.2,
            co2,
        }
    }

    // --- Sensor parsing ---

    #[test]
    fn test_sensor_parse_is_case_insensitive() {
        assert_eq!("CO2".parse::<Sensor>().unwrap(), Sensor::Co2);
        assert_eq!("co2".parse::<Sensor>().unwrap(), Sensor::Co2);
        assert_eq!("Temperature".parse::<Sensor>().unwrap(), Sensor::Temperature);
        assert_eq!(" humidity ".parse::<Sensor>().unwrap(), Sensor::Humidity);
        assert_eq!("PRESSURE".parse::<Sensor>().unwrap(), Sensor::Pressure);
    }

    #[test]
    fn test_sensor_parse_rejects_unknown() {
        let err = "radon".parse::<Sensor>().unwrap_err();
        assert_eq!(err, ParseError::UnknownSensor("radon".to_string()));
        assert!(err.to_string().contains("Valid options"));
    }

    #[test]
    fn test_sensor_columns_match_schema() {
        let columns: Vec<_> = Sensor::ALL.iter().map(|s| s.column()).collect();
        assert_eq!(columns, ["temperature", "humidity", "pressure", "co2"]);
    }

    #[test]
    fn test_sensor_units() {
        assert_eq!(Sensor::Temperature.unit(), "°C");
        assert_eq!(Sensor::Humidity.unit(), "%");
        assert_eq!(Sensor::Pressure.unit(), "hPa");
        assert_eq!(Sensor::Co2.unit(), "ppm");
    }

    // --- Samples and measurements ---

    #[test]
    fn test_sentinel_detection() {
        assert!(sample(100, -1).is_sentinel());
        assert!(!sample(100, 0).is_sentinel());
        assert!(!sample(100, 400).is_sentinel());
    }

    #[test]
    fn test_into_measurement_keeps_values() {
        let m = sample(100, 420).into_measurement("office");
        assert_eq!(m.device, "office");
        assert_eq!(m.timestamp, 100);
        assert_eq!(m.co2, 420);
        assert_eq!(m.humidity, 45);
    }

    #[test]
    fn test_projection_only_fills_requested() {
        let m = sample(100, 420).into_measurement("office");
        let row = m.project(&[Sensor::Temperature, Sensor::Humidity]);
        assert_eq!(row.timestamp, 100);
        assert_eq!(row.temperature, Some(22.5));
        assert_eq!(row.humidity, Some(45));
        assert_eq!(row.pressure, None);
        assert_eq!(row.co2, None);
        assert_eq!(row.value(Sensor::Humidity), Some(45.0));
        assert_eq!(row.display_value(Sensor::Temperature).as_deref(), Some("22.5"));
    }

    #[test]
    fn test_row_serializes_only_present_fields() {
        let row = sample(100, 420)
            .into_measurement("office")
            .project(&[Sensor::Co2]);
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json, serde_json::json!({"timestamp": 100, "co2": 420}));
    }

    // --- Windows ---

    #[test]
    fn test_window_rejects_inverted_bounds() {
        assert!(QueryWindow::new(10, 5).is_err());
        assert!(QueryWindow::new(5, 5).unwrap().is_empty());
    }

    #[test]
    fn test_window_is_half_open() {
        let window = QueryWindow::new(100, 500).unwrap();
        assert!(window.contains(100));
        assert!(window.contains(499));
        assert!(!window.contains(500));
        assert!(!window.contains(99));
    }

    #[test]
    fn test_window_display() {
        let window = QueryWindow::new(1_717_718_400, 1_718_064_000).unwrap();
        assert_eq!(
            window.to_string(),
            "2024-06-07 00:00:00 UTC and 2024-06-11 00:00:00 UTC"
        );
    }

    proptest! {
        #[test]
        fn prop_window_contains_start_never_end(start in -1_000_000i64..1_000_000, len in 1i64..1_000_000) {
            let window = QueryWindow::new(start, start + len).unwrap();
            prop_assert!(window.contains(start));
            prop_assert!(!window.contains(start + len));
        }
    }
}
