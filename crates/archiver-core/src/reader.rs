//! Read a window of samples for display.
//!
//! Sensor names from the user are checked against the fixed allowlist
//! before anything reaches SQL; unknown names are dropped with a warning.
//! Large results are thinned by repeatedly keeping every second row until
//! they fit the requested point budget.

use serde::Serialize;
use tracing::{info, warn};

use archiver_store::{RangeQuery, Store};
use archiver_types::{QueryWindow, Row, Sensor};

use crate::error::{Error, Result};

/// Keep only the allowlisted sensor names, in first-seen order.
///
/// Unknown names are logged and skipped. Fails with
/// [`Error::NoValidSensors`] when nothing valid remains.
pub fn select_sensors<I, S>(names: I) -> Result<Vec<Sensor>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut requested = Vec::new();
    let mut sensors = Vec::new();

    for name in names {
        let name = name.as_ref();
        requested.push(name.to_string());
        match name.parse::<Sensor>() {
            Ok(sensor) if !sensors.contains(&sensor) => sensors.push(sensor),
            Ok(_) => {}
            Err(e) => warn!("{}", e),
        }
    }

    if sensors.is_empty() {
        return Err(Error::NoValidSensors { requested });
    }
    Ok(sensors)
}

/// Halve `rows` (keeping indices 0, 2, 4, ...) until at most `max_points`
/// remain. Returns the thinned rows and the number of halving passes.
///
/// A budget of zero is treated as one.
pub fn downsample<T>(mut rows: Vec<T>, max_points: usize) -> (Vec<T>, u32) {
    let max_points = max_points.max(1);
    let mut passes = 0;

    while rows.len() > max_points {
        rows = rows.into_iter().step_by(2).collect();
        passes += 1;
    }

    (rows, passes)
}

/// Result of a read.
#[derive(Debug, Clone, Serialize)]
pub struct Readout {
    /// The window that was queried.
    pub window: QueryWindow,
    /// Sensors present in every row, in request order.
    pub sensors: Vec<Sensor>,
    /// Rows in ascending timestamp order, after downsampling.
    pub rows: Vec<Row>,
    /// Rows matched before downsampling.
    pub matched: usize,
    /// Halving passes applied.
    pub passes: u32,
}

impl Readout {
    /// Whether the window held no data.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether rows were discarded to fit the point budget.
    pub fn is_downsampled(&self) -> bool {
        self.passes > 0
    }
}

/// Reads projected, downsampled rows from a [`Store`].
///
/// # Example
///
/// ```
/// use archiver_core::SampleReader;
/// use archiver_store::Store;
/// use archiver_types::QueryWindow;
///
/// let store = Store::open_in_memory()?;
/// let window = QueryWindow::new(0, 86_400).unwrap();
/// let readout = SampleReader::new(&store).read(window, ["co2", "radon"], 2000)?;
/// assert!(readout.is_empty());
/// # Ok::<(), archiver_core::Error>(())
/// ```
#[derive(Debug)]
pub struct SampleReader<'a> {
    store: &'a Store,
    device: Option<String>,
}

impl<'a> SampleReader<'a> {
    /// A reader over every device in `store`.
    pub fn new(store: &'a Store) -> Self {
        Self {
            store,
            device: None,
        }
    }

    /// Restrict reads to one device.
    #[must_use]
    pub fn device(mut self, device: Option<&str>) -> Self {
        self.device = device.map(str::to_string);
        self
    }

    /// Read `sensors` for every sample in `window`, thinned to at most
    /// `max_points` rows.
    pub fn read<I, S>(&self, window: QueryWindow, sensors: I, max_points: usize) -> Result<Readout>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let sensors = select_sensors(sensors)?;
        info!("Querying data between {}", window);

        let mut query = RangeQuery::new(window).sensors(sensors.iter().copied());
        if let Some(device) = &self.device {
            query = query.device(device);
        }

        let rows = self.store.query_range(&query)?;
        let matched = rows.len();
        if matched > max_points.max(1) {
            warn!(
                "Too many measures: {}. Discarding one every two. --max-measures={}",
                matched, max_points
            );
        }
        let (rows, passes) = downsample(rows, max_points);

        Ok(Readout {
            window,
            sensors,
            rows,
            matched,
            passes,
        })
    }
}
