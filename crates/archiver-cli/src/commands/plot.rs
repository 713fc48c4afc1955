//! Plot command - show stored measurements over a date range.

use std::path::PathBuf;

use anyhow::Result;
use archiver_core::{Clock, SampleReader, SystemClock, range};
use tracing::info;

use crate::cli::PlotFormat;
use crate::config::Settings;
use crate::format::{
    FormatOptions, format_chart, format_rows_csv, format_rows_json, format_rows_table,
};
use crate::style;
use crate::util::{open_store, write_output};

/// Arguments for the plot command.
pub struct PlotArgs {
    pub sensors: Option<Vec<String>>,
    pub days: Option<u32>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub max_measures: Option<usize>,
    pub device: Option<String>,
    pub format: PlotFormat,
}

/// Execute the plot command.
pub fn cmd_plot(
    args: PlotArgs,
    settings: &Settings,
    opts: &FormatOptions,
    output: Option<&PathBuf>,
) -> Result<()> {
    let window = range::resolve(
        args.start_date.as_deref(),
        args.end_date.as_deref(),
        args.days.unwrap_or(settings.days),
        &settings.timezone,
        SystemClock.now_utc(),
    )?;
    let sensors = args.sensors.as_ref().unwrap_or(&settings.sensors);
    let max_measures = args.max_measures.unwrap_or(settings.max_measures);

    let store = open_store(&settings.db_path)?;
    let readout = SampleReader::new(&store)
        .device(args.device.as_deref())
        .read(window, sensors, max_measures)?;

    if readout.is_empty() {
        eprintln!(
            "{}",
            style::format_warning("No data found in the specified date range", opts.no_color)
        );
        return Ok(());
    }
    info!("Plotting {} measures.", readout.rows.len());

    let content = match args.format {
        PlotFormat::Chart => format_chart(&readout, style::terminal_width(), opts),
        PlotFormat::Table => format_rows_table(&readout, opts),
        PlotFormat::Csv => format_rows_csv(&readout, opts)?,
        PlotFormat::Json => {
            let mut json = format_rows_json(&readout, opts)?;
            json.push('\n');
            json
        }
    };

    write_output(output, &content)
}
