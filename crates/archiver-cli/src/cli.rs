//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Output format for the fetch report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Output format for plotted data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum PlotFormat {
    /// One sparkline per sensor, sized to the terminal
    #[default]
    Chart,
    /// Timestamped table of the selected sensors
    Table,
    /// Comma-separated values with a header row
    Csv,
    /// JSON array of rows
    Json,
}

/// Visual styling mode for output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum StyleMode {
    /// Standard styling with colors
    Minimal,
    /// Rounded tables and colored values (default)
    #[default]
    Rich,
    /// Plain text with no decorations (for scripting)
    Plain,
}

#[derive(Debug, Parser)]
#[command(name = "aranet4-archiver")]
#[command(author, version, about = "Archive and explore Aranet4 sensor history", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, env = "ARCHIVER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Visual styling mode (minimal, rich, plain)
    #[arg(
        long,
        global = true,
        value_enum,
        default_value = "rich",
        env = "ARCHIVER_STYLE"
    )]
    pub style: StyleMode,

    /// Write output to file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Download new measurements from the device into the store
    Fetch {
        /// Number of fetch attempts before giving up
        #[arg(long)]
        num_retries: Option<u32>,

        /// Wait with exponential backoff between attempts
        #[arg(long)]
        backoff: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show stored measurements over a date range
    Plot {
        /// Sensors to show, default co2 (comma-separated: temperature,humidity,pressure,co2)
        #[arg(short, long, value_delimiter = ',')]
        sensors: Option<Vec<String>>,

        /// Days to show before the end date when no start date is given
        #[arg(short, long)]
        days: Option<u32>,

        /// Start the range the day after this date (YYYY-MM-DD, local timezone)
        #[arg(long)]
        start_date: Option<String>,

        /// Last day to include (YYYY-MM-DD, local timezone)
        #[arg(long)]
        end_date: Option<String>,

        /// Maximum number of points; larger results are thinned
        #[arg(long)]
        max_measures: Option<usize>,

        /// Only show measurements from this device
        #[arg(long)]
        device: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "chart")]
        format: PlotFormat,
    },

    /// Print the most recent (or oldest) measurements
    Print {
        /// Print the oldest measurements instead
        #[arg(long)]
        oldest: bool,

        /// Number of measurements to print
        #[arg(short, long, default_value = "10")]
        n: u32,

        /// Only print measurements from this device
        #[arg(long)]
        device: Option<String>,
    },

    /// Print the last measurements in chronological order
    Tail {
        /// Number of measurements to print
        #[arg(short, long, default_value = "30")]
        n: u32,

        /// Only print measurements from this device
        #[arg(long)]
        device: Option<String>,
    },

    /// Summarize what the store holds per device
    Stats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_plot_sensor_list_splits_on_commas() {
        let cli = Cli::try_parse_from([
            "aranet4-archiver",
            "plot",
            "--sensors",
            "co2,temperature",
            "--days",
            "7",
        ])
        .unwrap();
        match cli.command {
            Commands::Plot { sensors, days, .. } => {
                assert_eq!(sensors.unwrap(), vec!["co2", "temperature"]);
                assert_eq!(days, Some(7));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["aranet4-archiver", "print", "--oldest", "-q"]).unwrap();
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Print { oldest: true, n: 10, .. }));
    }

    #[test]
    fn test_fetch_defaults() {
        let cli = Cli::try_parse_from(["aranet4-archiver", "fetch"]).unwrap();
        match cli.command {
            Commands::Fetch {
                num_retries,
                backoff,
                format,
            } => {
                assert_eq!(num_retries, None);
                assert!(!backoff);
                assert_eq!(format, OutputFormat::Text);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
