//! Stats command - summarize the store.

use std::path::PathBuf;

use anyhow::Result;

use crate::config::Settings;
use crate::format::{FormatOptions, format_devices_table};
use crate::util::{open_store, write_output};

/// Execute the stats command.
pub fn cmd_stats(settings: &Settings, opts: &FormatOptions, output: Option<&PathBuf>) -> Result<()> {
    let store = open_store(&settings.db_path)?;
    let devices = store.devices()?;
    write_output(output, &format_devices_table(&devices, opts))
}
