//! Output formatting for tables, charts, CSV and JSON.

use anyhow::{Context, Result};
use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;
use tabled::builder::Builder;
use tracing::warn;

use archiver_core::{Readout, SyncReport, range};
use archiver_store::DeviceSummary;
use archiver_types::{Measurement, Row, Sensor};

use crate::cli::StyleMode;
use crate::style;

/// Timestamp layout used in every human-readable output.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Sparkline glyphs, lowest to highest.
const SPARK_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Columns reserved for the left margin of a chart line.
const CHART_MARGIN: usize = 2;

/// Formatting options for output.
#[derive(Debug, Clone, Copy)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Visual styling mode.
    pub style: StyleMode,
    /// Timezone timestamps are shown in.
    pub zone: Tz,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            no_color: false,
            style: StyleMode::Rich,
            zone: chrono_tz::UTC,
        }
    }
}

impl FormatOptions {
    pub fn new(no_color: bool, style: StyleMode, zone: Tz) -> Self {
        // Plain mode automatically disables colors for pipe-friendliness
        let effective_no_color = no_color || style == StyleMode::Plain;
        Self {
            no_color: effective_no_color,
            style,
            zone,
        }
    }

    /// Check if rich styling is enabled.
    pub fn is_rich(&self) -> bool {
        self.style == StyleMode::Rich
    }

    /// Serialize to pretty JSON.
    pub fn as_json<T: Serialize>(&self, value: &T) -> Result<String> {
        serde_json::to_string_pretty(value).context("Failed to serialize JSON")
    }

    /// Format an epoch timestamp in the display zone.
    pub fn timestamp(&self, timestamp: i64) -> String {
        format_timestamp(timestamp, &self.zone)
    }
}

/// Resolve the display timezone, falling back to UTC with a warning.
pub fn display_zone(name: &str) -> Tz {
    match range::parse_timezone(name) {
        Ok(tz) => tz,
        Err(e) => {
            warn!("{}; showing times in UTC", e);
            chrono_tz::UTC
        }
    }
}

/// Format an epoch timestamp as `%Y-%m-%d %H:%M:%S %z` in `zone`.
pub fn format_timestamp(timestamp: i64, zone: &Tz) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.with_timezone(zone).format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

fn render(builder: Builder, opts: &FormatOptions) -> String {
    let mut table = builder.build();
    style::apply_table_style(&mut table, opts.style);
    let mut output = table.to_string();
    output.push('\n');
    output
}

// ============================================================================
// Stored measurements (print / tail)
// ============================================================================

/// Full measurement rows as a table.
pub fn format_measurements_table(rows: &[Measurement], opts: &FormatOptions) -> String {
    let mut builder = Builder::default();
    builder.push_record(["device", "timestamp", "temperature", "humidity", "pressure", "CO2"]);

    for m in rows {
        builder.push_record([
            m.device.clone(),
            opts.timestamp(m.timestamp),
            style::format_temp_colored(m.temperature, opts.no_color),
            style::format_humidity_colored(m.humidity, opts.no_color),
            format!("{:.1}", m.pressure),
            style::format_co2_colored(m.co2, opts.no_color),
        ]);
    }

    render(builder, opts)
}

// ============================================================================
// Query results (plot)
// ============================================================================

fn sensor_header(sensor: Sensor) -> String {
    format!("{} ({})", sensor.label(), sensor.unit())
}

/// Projected rows as a table.
pub fn format_rows_table(readout: &Readout, opts: &FormatOptions) -> String {
    let mut builder = Builder::default();
    let mut header = vec!["Timestamp".to_string()];
    header.extend(readout.sensors.iter().map(|s| sensor_header(*s)));
    builder.push_record(header);

    for row in &readout.rows {
        let mut record = vec![opts.timestamp(row.timestamp)];
        record.extend(readout.sensors.iter().map(|s| cell(row, *s, opts.no_color)));
        builder.push_record(record);
    }

    render(builder, opts)
}

fn cell(row: &Row, sensor: Sensor, no_color: bool) -> String {
    match sensor {
        Sensor::Co2 => row.co2.map(|v| style::format_co2_colored(v, no_color)),
        Sensor::Temperature => row
            .temperature
            .map(|v| style::format_temp_colored(v, no_color)),
        Sensor::Humidity => row
            .humidity
            .map(|v| style::format_humidity_colored(v, no_color)),
        Sensor::Pressure => row.display_value(sensor),
    }
    .unwrap_or_else(|| "-".to_string())
}

/// Projected rows as CSV with a header row.
pub fn format_rows_csv(readout: &Readout, opts: &FormatOptions) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["timestamp"];
    header.extend(readout.sensors.iter().map(|s| s.column()));
    writer.write_record(&header)?;

    for row in &readout.rows {
        let mut record = vec![opts.timestamp(row.timestamp)];
        record.extend(
            readout
                .sensors
                .iter()
                .map(|s| row.display_value(*s).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output was not UTF-8")
}

/// Projected rows as a JSON document.
pub fn format_rows_json(readout: &Readout, opts: &FormatOptions) -> Result<String> {
    #[derive(Serialize)]
    struct RowJson<'a> {
        time: String,
        #[serde(flatten)]
        row: &'a Row,
    }

    #[derive(Serialize)]
    struct ReadoutJson<'a> {
        start: String,
        end: String,
        timezone: &'a str,
        sensors: &'a [Sensor],
        matched: usize,
        shown: usize,
        rows: Vec<RowJson<'a>>,
    }

    let doc = ReadoutJson {
        start: opts.timestamp(readout.window.start()),
        end: opts.timestamp(readout.window.end()),
        timezone: opts.zone.name(),
        sensors: &readout.sensors,
        matched: readout.matched,
        shown: readout.rows.len(),
        rows: readout
            .rows
            .iter()
            .map(|row| RowJson {
                time: opts.timestamp(row.timestamp),
                row,
            })
            .collect(),
    };
    opts.as_json(&doc)
}

/// Bucket `values` into at most `width` means, preserving order.
pub fn resample(values: &[f64], width: usize) -> Vec<f64> {
    let width = width.max(1);
    if values.len() <= width {
        return values.to_vec();
    }

    (0..width)
        .map(|i| {
            let start = i * values.len() / width;
            let end = ((i + 1) * values.len() / width).max(start + 1);
            let bucket = &values[start..end];
            bucket.iter().sum::<f64>() / bucket.len() as f64
        })
        .collect()
}

/// Render values as a sparkline scaled between their min and max.
pub fn sparkline(values: &[f64]) -> String {
    let (min, max) = min_max(values).unwrap_or((0.0, 0.0));
    let span = max - min;
    let top = (SPARK_CHARS.len() - 1) as f64;

    values
        .iter()
        .map(|v| {
            if span <= f64::EPSILON {
                SPARK_CHARS[SPARK_CHARS.len() / 2]
            } else {
                let level = ((v - min) / span * top).round() as usize;
                SPARK_CHARS[level.min(SPARK_CHARS.len() - 1)]
            }
        })
        .collect()
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values.iter().copied().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

fn format_number(value: f64, sensor: Sensor) -> String {
    if sensor.is_integer() {
        format!("{}", value.round() as i64)
    } else {
        format!("{:.1}", value)
    }
}

/// One sparkline per sensor, resampled to `width` columns.
pub fn format_chart(readout: &Readout, width: usize, opts: &FormatOptions) -> String {
    let (Some(first), Some(last)) = (readout.rows.first(), readout.rows.last()) else {
        return String::new();
    };

    let mut output = format!(
        "{} measures from {} to {}\n",
        readout.rows.len(),
        opts.timestamp(first.timestamp),
        opts.timestamp(last.timestamp)
    );
    if readout.passes > 0 {
        output.push_str(&style::dimmed(
            &format!(
                "(thinned from {} measures, {} halving pass(es))\n",
                readout.matched, readout.passes
            ),
            opts.no_color,
        ));
    }

    let columns = width.saturating_sub(CHART_MARGIN).max(1);
    for sensor in &readout.sensors {
        let values: Vec<f64> = readout.rows.iter().filter_map(|r| r.value(*sensor)).collect();
        let Some((min, max)) = min_max(&values) else {
            continue;
        };
        let latest = values.last().copied().unwrap_or(max);

        let title = sensor_header(*sensor);
        let title = if opts.no_color {
            title
        } else {
            use owo_colors::OwoColorize;
            format!("{}", title.bold())
        };
        output.push_str(&format!(
            "\n{}  min {}  max {}  last {}\n",
            title,
            format_number(min, *sensor),
            format_number(max, *sensor),
            format_number(latest, *sensor),
        ));
        let line = sparkline(&resample(&values, columns));
        output.push_str(&format!(
            "{}{}\n",
            " ".repeat(CHART_MARGIN),
            style::paint_sensor(*sensor, &line, opts.no_color)
        ));
    }

    output
}

// ============================================================================
// Store summaries (stats / fetch)
// ============================================================================

/// Per-device summary table.
pub fn format_devices_table(devices: &[DeviceSummary], opts: &FormatOptions) -> String {
    if devices.is_empty() {
        return "No measurements stored. Run 'aranet4-archiver fetch' first.\n".to_string();
    }

    let mut builder = Builder::default();
    builder.push_record(["Device", "Measurements", "First", "Last"]);
    for d in devices {
        builder.push_record([
            d.device.clone(),
            d.count.to_string(),
            opts.timestamp(d.first_timestamp),
            opts.timestamp(d.last_timestamp),
        ]);
    }

    let mut output = render(builder, opts);
    let total: u64 = devices.iter().map(|d| d.count).sum();
    output.push_str(&format!("Number of measurements: {}\n", total));
    output
}

/// Fetch outcome as text.
pub fn format_sync_text(report: &SyncReport, total_stored: u64, opts: &FormatOptions) -> String {
    let mut output = style::format_success(
        &format!("Synced {} ({})", report.device, report.window),
        opts.no_color,
    );
    output.push('\n');
    output.push_str(&format!("Fetched:      {}\n", report.fetched));
    if report.filtered > 0 {
        output.push_str(&format!("Invalid:      {}\n", report.filtered));
    }
    output.push_str(&format!("New records:  {}\n", report.inserted));
    output.push_str(&format!("Total stored: {}\n", total_stored));
    if report.attempts > 1 {
        output.push_str(&style::format_warning(
            &format!("succeeded after {} attempts", report.attempts),
            opts.no_color,
        ));
        output.push('\n');
    }
    output
}

/// Fetch outcome as JSON.
pub fn format_sync_json(report: &SyncReport, total_stored: u64, opts: &FormatOptions) -> Result<String> {
    #[derive(Serialize)]
    struct SyncJson<'a> {
        #[serde(flatten)]
        report: &'a SyncReport,
        total_stored: u64,
    }

    opts.as_json(&SyncJson {
        report,
        total_stored,
    })
}
