//! Main store implementation.

use std::path::Path;

use archiver_types::{Measurement, Row, Sensor};
use rusqlite::{Connection, params, params_from_iter};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::DeviceSummary;
use crate::queries::{RangeQuery, RecentQuery};
use crate::schema;

/// SQLite-based store for archived measurements.
///
/// The store is the only owner of persisted samples. It is designed for a
/// single writer: merges are atomic, but checkpoint reads and merges are not
/// wrapped in a shared transaction.
pub struct Store {
    conn: Connection,
    location: String,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("location", &self.location)
            .finish()
    }
}

impl Store {
    /// Open or create a database at the given path.
    ///
    /// The parent directory must already exist; a missing directory or an
    /// unwritable medium yields [`Error::Unavailable`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let location = path.display().to_string();

        info!("Opening measurement store at {}", location);
        let conn = Connection::open(path).map_err(|e| Error::from_sqlite(&location, e))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::from_sqlite(&location, e))?;

        let store = Self { conn, location };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Open the default database location, creating its directory if needed.
    pub fn open_default() -> Result<Self> {
        let path = crate::default_db_path();
        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        Self::open(path)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let location = ":memory:".to_string();
        let conn = Connection::open_in_memory().map_err(|e| Error::from_sqlite(&location, e))?;
        let store = Self { conn, location };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Where this store lives (a file path, or `:memory:`).
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Idempotently create the `measurements` table.
    pub fn ensure_schema(&self) -> Result<()> {
        schema::initialize(&self.conn).map_err(|e| Error::from_sqlite(&self.location, e))
    }
}

// Checkpoint operations
impl Store {
    /// Latest stored timestamp for a device, or `None` if it has no rows.
    ///
    /// Served by the `(device, timestamp)` primary key index.
    pub fn latest_timestamp(&self, device: &str) -> Result<Option<i64>> {
        let latest = self.conn.query_row(
            "SELECT MAX(timestamp) FROM measurements WHERE device = ?1",
            [device],
            |row| row.get::<_, Option<i64>>(0),
        )?;
        debug!("Latest timestamp for {}: {:?}", device, latest);
        Ok(latest)
    }

    /// Oldest stored timestamp for a device, or `None` if it has no rows.
    pub fn oldest_timestamp(&self, device: &str) -> Result<Option<i64>> {
        let oldest = self.conn.query_row(
            "SELECT MIN(timestamp) FROM measurements WHERE device = ?1",
            [device],
            |row| row.get::<_, Option<i64>>(0),
        )?;
        Ok(oldest)
    }
}

// Write operations
impl Store {
    /// Insert measurements, skipping any whose `(device, timestamp)` already
    /// exists.
    ///
    /// The whole batch runs in one transaction: either every non-duplicate
    /// row lands or none does. Returns the number of rows actually added.
    pub fn insert_ignoring_duplicates(&mut self, samples: &[Measurement]) -> Result<usize> {
        if samples.is_empty() {
            return Ok(0);
        }

        let location = &self.location;
        let wrap = |e| Error::from_sqlite(location, e);

        let tx = self.conn.transaction().map_err(wrap)?;
        let mut inserted = 0;
        {
            let mut stmt = tx
                .prepare_cached(
                    "INSERT OR IGNORE INTO measurements
                     (device, timestamp, temperature, humidity, pressure, co2)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )
                .map_err(wrap)?;

            for sample in samples {
                inserted += stmt
                    .execute(params![
                        sample.device,
                        sample.timestamp,
                        sample.temperature,
                        sample.humidity,
                        sample.pressure,
                        sample.co2,
                    ])
                    .map_err(wrap)?;
            }
        }
        tx.commit().map_err(wrap)?;

        info!(
            "Inserted {} new measurements ({} duplicates skipped)",
            inserted,
            samples.len() - inserted
        );
        Ok(inserted)
    }
}

// Read operations
impl Store {
    /// Rows within the query window, ordered by timestamp ascending.
    pub fn query_range(&self, query: &RangeQuery) -> Result<Vec<Row>> {
        let (sql, params) = query.build();
        debug!("Executing query: {}", sql);

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                let mut out = Row::new(row.get(0)?);
                for (i, sensor) in query.sensors.iter().enumerate() {
                    let idx = i + 1;
                    match sensor {
                        Sensor::Temperature => out.temperature = row.get(idx)?,
                        Sensor::Humidity => out.humidity = row.get(idx)?,
                        Sensor::Pressure => out.pressure = row.get(idx)?,
                        Sensor::Co2 => out.co2 = row.get(idx)?,
                    }
                }
                Ok(out)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Full measurements, newest or oldest first, with an optional limit.
    pub fn recent(&self, query: &RecentQuery) -> Result<Vec<Measurement>> {
        let (sql, params) = query.build();
        debug!("Executing query: {}", sql);

        let mut stmt = self.conn.prepare(&sql)?;
        let measurements = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                Ok(Measurement {
                    device: row.get(0)?,
                    timestamp: row.get(1)?,
                    temperature: row.get(2)?,
                    humidity: row.get(3)?,
                    pressure: row.get(4)?,
                    co2: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(measurements)
    }

    /// Count measurements, optionally for one device.
    pub fn count(&self, device: Option<&str>) -> Result<u64> {
        let count: i64 = match device {
            Some(id) => self.conn.query_row(
                "SELECT COUNT(*) FROM measurements WHERE device = ?1",
                [id],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM measurements", [], |row| row.get(0))?,
        };

        Ok(count as u64)
    }

    /// Per-device summary of stored data, ordered by device id.
    pub fn devices(&self) -> Result<Vec<DeviceSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT device, COUNT(*), MIN(timestamp), MAX(timestamp)
             FROM measurements GROUP BY device ORDER BY device",
        )?;

        let devices = stmt
            .query_map([], |row| {
                Ok(DeviceSummary {
                    device: row.get(0)?,
                    count: row.get::<_, i64>(1)? as u64,
                    first_timestamp: row.get(2)?,
                    last_timestamp: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(devices)
    }
}
