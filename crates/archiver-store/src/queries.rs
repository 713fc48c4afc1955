//! Query builders for range reads and recent-row listings.
//!
//! Both builders produce parameterized SQL. Column lists are assembled only
//! from [`Sensor::column`], never from caller-supplied strings.
//!
//! # Example
//!
//! ```
//! use archiver_store::{RangeQuery, RecentQuery, Store};
//! use archiver_types::{QueryWindow, Sensor};
//!
//! let store = Store::open_in_memory()?;
//! let window = QueryWindow::new(1_717_718_400, 1_718_064_000).unwrap();
//!
//! let query = RangeQuery::new(window)
//!     .device("office")
//!     .sensors([Sensor::Co2, Sensor::Temperature]);
//! let rows = store.query_range(&query)?;
//! assert!(rows.is_empty());
//!
//! let newest = store.recent(&RecentQuery::new().limit(10))?;
//! assert!(newest.is_empty());
//! # Ok::<(), archiver_store::Error>(())
//! ```

use archiver_types::{QueryWindow, Sensor};
use rusqlite::types::Value;

/// Bounded time-range query over the `measurements` table.
///
/// Results are ordered by `timestamp` ascending and cover the half-open
/// window `[start, end)`.
#[derive(Debug, Clone)]
pub struct RangeQuery {
    /// Filter by device (optional).
    pub device: Option<String>,
    /// Sensor columns to project, in output order.
    pub sensors: Vec<Sensor>,
    /// Half-open time window.
    pub window: QueryWindow,
}

impl RangeQuery {
    /// Query every sensor of every device within `window`.
    pub fn new(window: QueryWindow) -> Self {
        Self {
            device: None,
            sensors: Sensor::ALL.to_vec(),
            window,
        }
    }

    /// Restrict to a single device.
    pub fn device(mut self, device: &str) -> Self {
        self.device = Some(device.to_string());
        self
    }

    /// Restrict the projection to these sensors. Duplicates are dropped,
    /// first occurrence wins.
    pub fn sensors(mut self, sensors: impl IntoIterator<Item = Sensor>) -> Self {
        self.sensors.clear();
        for sensor in sensors {
            if !self.sensors.contains(&sensor) {
                self.sensors.push(sensor);
            }
        }
        self
    }

    /// Build the SQL text and its positional parameters.
    pub(crate) fn build(&self) -> (String, Vec<Value>) {
        let mut columns = vec!["timestamp"];
        columns.extend(self.sensors.iter().map(|s| s.column()));

        let mut sql = format!(
            "SELECT {} FROM measurements WHERE timestamp >= ?1 AND timestamp < ?2",
            columns.join(", ")
        );
        let mut params = vec![
            Value::Integer(self.window.start()),
            Value::Integer(self.window.end()),
        ];

        if let Some(ref device) = self.device {
            sql.push_str(" AND device = ?3");
            params.push(Value::Text(device.clone()));
        }

        sql.push_str(" ORDER BY timestamp ASC");
        (sql, params)
    }
}

/// Listing of full measurements, newest first unless asked otherwise.
#[derive(Debug, Clone)]
pub struct RecentQuery {
    /// Filter by device (optional).
    pub device: Option<String>,
    /// Maximum number of rows (optional).
    pub limit: Option<u32>,
    /// Order by timestamp descending. Default: true.
    pub newest_first: bool,
}

impl Default for RecentQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl RecentQuery {
    /// Create a new query: all devices, no limit, newest first.
    pub fn new() -> Self {
        Self {
            device: None,
            limit: None,
            newest_first: true,
        }
    }

    /// Restrict to a single device.
    pub fn device(mut self, device: &str) -> Self {
        self.device = Some(device.to_string());
        self
    }

    /// Limit the number of rows returned.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Order by oldest first.
    pub fn oldest_first(mut self) -> Self {
        self.newest_first = false;
        self
    }

    pub(crate) fn build(&self) -> (String, Vec<Value>) {
        let mut sql = String::from(
            "SELECT device, timestamp, temperature, humidity, pressure, co2 FROM measurements",
        );
        let mut params = Vec::new();

        if let Some(ref device) = self.device {
            sql.push_str(" WHERE device = ?1");
            params.push(Value::Text(device.clone()));
        }

        let order = if self.newest_first { "DESC" } else { "ASC" };
        sql.push_str(&format!(" ORDER BY timestamp {order}"));

        if let Some(limit) = self.limit {
            params.push(Value::Integer(i64::from(limit)));
            sql.push_str(&format!(" LIMIT ?{}", params.len()));
        }

        (sql, params)
    }
}
