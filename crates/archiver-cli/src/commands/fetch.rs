//! Fetch command - pull new history from the device into the store.

use std::path::PathBuf;

use anyhow::{Context, Result};
use archiver_core::{GatewayClient, RetryConfig, SyncEngine, SystemClock};
use tracing::info;

use crate::cli::OutputFormat;
use crate::config::Settings;
use crate::format::{FormatOptions, format_sync_json, format_sync_text};
use crate::util::{open_store_for_writing, write_output};

/// Arguments for the fetch command.
pub struct FetchArgs {
    pub num_retries: Option<u32>,
    pub backoff: bool,
    pub format: OutputFormat,
}

/// Execute the fetch command.
pub fn cmd_fetch(
    args: FetchArgs,
    settings: &Settings,
    opts: &FormatOptions,
    output: Option<&PathBuf>,
) -> Result<()> {
    let target = settings.validate_for_fetch()?;
    let attempts = args.num_retries.unwrap_or(settings.num_retries);
    let retry = if args.backoff || settings.retry_backoff {
        RetryConfig::backoff(attempts)
    } else {
        RetryConfig::immediate(attempts)
    };

    let mut store = open_store_for_writing(&settings.db_path)?;
    let client = GatewayClient::new(&settings.gateway_url, settings.timeout)
        .context("Invalid gateway configuration")?;
    info!(
        "Fetching {} ({}) via {}",
        target.device_name,
        target.device_mac,
        client.base_url()
    );

    let report = SyncEngine::new(&mut store, &client, &SystemClock)
        .timezone(opts.zone)
        .retry(retry)
        .sync(target.device_name, target.device_mac, attempts)
        .with_context(|| format!("Failed to sync {}", target.device_name))?;

    let total_stored = store.count(Some(target.device_name))?;
    let content = match args.format {
        OutputFormat::Json => {
            let mut json = format_sync_json(&report, total_stored, opts)?;
            json.push('\n');
            json
        }
        OutputFormat::Text => format_sync_text(&report, total_stored, opts),
    };

    write_output(output, &content)
}
