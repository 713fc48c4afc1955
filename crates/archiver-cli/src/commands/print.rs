//! Print and tail commands - show stored measurements.

use std::path::PathBuf;

use anyhow::Result;
use archiver_store::RecentQuery;

use crate::config::Settings;
use crate::format::{FormatOptions, format_measurements_table};
use crate::util::{open_store, write_output};

/// Print the newest (or oldest) `n` measurements.
pub fn cmd_print(
    oldest: bool,
    n: u32,
    device: Option<&str>,
    settings: &Settings,
    opts: &FormatOptions,
    output: Option<&PathBuf>,
) -> Result<()> {
    let store = open_store(&settings.db_path)?;

    let mut query = RecentQuery::new().limit(n);
    if oldest {
        query = query.oldest_first();
    }
    if let Some(device) = device {
        query = query.device(device);
    }
    let rows = store.recent(&query)?;

    write_output(output, &format_measurements_table(&rows, opts))
}

/// Print the last `n` measurements oldest first, with a count summary.
pub fn cmd_tail(
    n: u32,
    device: Option<&str>,
    settings: &Settings,
    opts: &FormatOptions,
    output: Option<&PathBuf>,
) -> Result<()> {
    let store = open_store(&settings.db_path)?;

    let mut query = RecentQuery::new().limit(n);
    if let Some(device) = device {
        query = query.device(device);
    }
    let mut rows = store.recent(&query)?;
    rows.reverse();
    let total = store.count(device)?;

    let mut content = format_measurements_table(&rows, opts);
    content.push_str(&format!(
        "\nPrinted {} of {} measurements.\n",
        rows.len(),
        total
    ));
    write_output(output, &content)
}
