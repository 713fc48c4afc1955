use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use archiver_cli::cli::{Cli, Commands};
use archiver_cli::commands::{FetchArgs, PlotArgs, cmd_fetch, cmd_plot, cmd_print, cmd_stats, cmd_tail};
use archiver_cli::config::Settings;
use archiver_cli::format::{FormatOptions, display_zone};

fn main() -> Result<()> {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    // Initialize tracing
    // When quiet mode is enabled, suppress info-level logging
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::load(cli.config.as_deref())?;
    let opts = FormatOptions::new(
        cli.no_color || settings.no_color,
        cli.style,
        display_zone(&settings.timezone),
    );
    let output = cli.output.as_ref();

    match cli.command {
        Commands::Fetch {
            num_retries,
            backoff,
            format,
        } => cmd_fetch(
            FetchArgs {
                num_retries,
                backoff,
                format,
            },
            &settings,
            &opts,
            output,
        ),
        Commands::Plot {
            sensors,
            days,
            start_date,
            end_date,
            max_measures,
            device,
            format,
        } => cmd_plot(
            PlotArgs {
                sensors,
                days,
                start_date,
                end_date,
                max_measures,
                device,
                format,
            },
            &settings,
            &opts,
            output,
        ),
        Commands::Print { oldest, n, device } => {
            cmd_print(oldest, n, device.as_deref(), &settings, &opts, output)
        }
        Commands::Tail { n, device } => cmd_tail(n, device.as_deref(), &settings, &opts, output),
        Commands::Stats => cmd_stats(&settings, &opts, output),
    }
}
