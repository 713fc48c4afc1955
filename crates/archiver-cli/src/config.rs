//! Runtime settings.
//!
//! Settings are built once at startup from, lowest to highest precedence:
//!
//! 1. built-in defaults,
//! 2. the TOML config file,
//! 3. a `.env` file in the working directory,
//! 4. process environment variables.
//!
//! The resulting [`Settings`] value is passed by reference to each command.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Placeholder value shipped in example `.env` files.
const PLACEHOLDER: &str = "XXX";

/// Environment variable names.
pub mod env {
    pub const DEVICE_NAME: &str = "DEVICE_NAME";
    pub const DEVICE_MAC: &str = "DEVICE_MAC";
    pub const DB_PATH: &str = "DB_PATH";
    pub const LOCAL_TIMEZONE: &str = "LOCAL_TIMEZONE";
    pub const GATEWAY_URL: &str = "ARCHIVER_GATEWAY_URL";
}

/// Configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Identifier measurements are stored under
    #[serde(default)]
    pub device_name: Option<String>,

    /// Address the gateway uses to reach the sensor
    #[serde(default)]
    pub device_mac: Option<String>,

    /// SQLite database location
    #[serde(default)]
    pub db_path: Option<String>,

    /// IANA timezone for date arguments and display
    #[serde(default)]
    pub timezone: Option<String>,

    /// Base URL of the history gateway
    #[serde(default)]
    pub gateway_url: Option<String>,

    /// Gateway request timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,

    /// Fetch attempts per run
    #[serde(default)]
    pub num_retries: Option<u32>,

    /// Wait with exponential backoff between fetch attempts
    #[serde(default)]
    pub retry_backoff: Option<bool>,

    /// Point budget for plots
    #[serde(default)]
    pub max_measures: Option<usize>,

    /// Default plot span in days
    #[serde(default)]
    pub days: Option<u32>,

    /// Default plotted sensors
    #[serde(default)]
    pub sensors: Option<Vec<String>>,

    /// Disable colored output
    #[serde(default)]
    pub no_color: bool,
}

impl ConfigFile {
    /// Default config file path.
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("aranet4-archiver").join("config.toml"))
    }

    /// Read and parse a config file.
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Load the config file.
    ///
    /// An explicitly given path must exist and parse. The default path is
    /// optional: a missing file yields defaults and a broken one is
    /// reported and ignored.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::read(path);
        }

        let Some(path) = Self::path() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }

        match Self::read(&path) {
            Ok(config) => {
                debug!("Loaded config from {}", path.display());
                Ok(config)
            }
            Err(e) => {
                warn!("{:#}", e);
                Ok(Self::default())
            }
        }
    }
}

/// Effective settings after layering.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub device_name: Option<String>,
    pub device_mac: Option<String>,
    pub db_path: PathBuf,
    pub timezone: String,
    pub gateway_url: String,
    pub timeout: Duration,
    pub num_retries: u32,
    pub retry_backoff: bool,
    pub max_measures: usize,
    pub days: u32,
    pub sensors: Vec<String>,
    pub no_color: bool,
}

/// Identity of the device a fetch targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTarget<'a> {
    pub device_name: &'a str,
    pub device_mac: &'a str,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            device_name: None,
            device_mac: None,
            db_path: archiver_store::default_db_path(),
            timezone: system_timezone(),
            gateway_url: "http://localhost:8080".to_string(),
            timeout: archiver_core::gateway::DEFAULT_TIMEOUT,
            num_retries: 3,
            retry_backoff: false,
            max_measures: 2000,
            days: 3,
            sensors: vec![archiver_types::Sensor::Co2.column().to_string()],
            no_color: false,
        }
    }
}

impl Settings {
    /// Build settings from the config file, `.env` and the environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let file = ConfigFile::load(config_path)?;

        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => warn!("Ignoring .env file: {}", e),
        }

        Ok(Self::layered(file, |key| std::env::var(key).ok()))
    }

    /// Layer a parsed config file and an environment lookup over defaults.
    ///
    /// Empty environment values are treated as unset.
    pub fn layered<F>(file: ConfigFile, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_path = lookup(env::DB_PATH)
            .or(file.db_path)
            .map(|p| expand_home(&p))
            .unwrap_or(defaults.db_path);

        Self {
            device_name: lookup(env::DEVICE_NAME).or(file.device_name),
            device_mac: lookup(env::DEVICE_MAC).or(file.device_mac),
            db_path,
            timezone: lookup(env::LOCAL_TIMEZONE)
                .or(file.timezone)
                .unwrap_or(defaults.timezone),
            gateway_url: lookup(env::GATEWAY_URL)
                .or(file.gateway_url)
                .unwrap_or(defaults.gateway_url),
            timeout: file
                .timeout
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            num_retries: file.num_retries.unwrap_or(defaults.num_retries),
            retry_backoff: file.retry_backoff.unwrap_or(defaults.retry_backoff),
            max_measures: file.max_measures.unwrap_or(defaults.max_measures),
            days: file.days.unwrap_or(defaults.days),
            sensors: file
                .sensors
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.sensors),
            no_color: file.no_color,
        }
    }

    /// Check that a fetch has a device to talk to.
    pub fn validate_for_fetch(&self) -> Result<FetchTarget<'_>> {
        let Some(device_name) = configured(&self.device_name) else {
            bail!("device_name not set. Have you configured .env ?");
        };
        let Some(device_mac) = configured(&self.device_mac) else {
            bail!("device_mac not set. Have you configured .env ?");
        };
        Ok(FetchTarget {
            device_name,
            device_mac,
        })
    }
}

fn configured(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != PLACEHOLDER)
}

/// The system's IANA timezone, or `UTC` when it cannot be determined.
pub fn system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let home = || dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    if path == "~" {
        home()
    } else if let Some(rest) = path.strip_prefix("~/") {
        home().join(rest)
    } else {
        PathBuf::from(path)
    }
}
