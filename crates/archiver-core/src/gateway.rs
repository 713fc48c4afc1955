//! HTTP client for a history gateway.
//!
//! The gateway is a small service sitting next to the sensor that owns the
//! radio link and exposes the device's recorded history over REST:
//!
//! ```text
//! GET {base}/api/devices/{address}/history?since={unix}&until={unix}
//! ```
//!
//! Both bounds are inclusive epoch seconds; `since` is omitted to request
//! the full history. The response body is
//! `{"data": [{"timestamp": "<RFC3339>", "co2": .., "temperature": ..,
//! "pressure": .., "humidity": ..}, ..], "pagination": {..}}`.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use archiver_core::{FetchWindow, GatewayClient, HistorySource};
//!
//! let client = GatewayClient::new("http://localhost:8080", Duration::from_secs(30))?;
//! let window = FetchWindow { start: None, end: chrono::Utc::now().with_timezone(&chrono_tz::UTC) };
//! let samples = client.fetch_history("AA:BB:CC:DD:EE:FF", &window)?;
//! println!("{} samples", samples.len());
//! # Ok::<(), archiver_core::FetchError>(())
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Url;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use archiver_types::HistorySample;

use crate::source::{FetchError, FetchWindow, HistorySource};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking HTTP client for the history gateway.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
}

/// One page of history as returned by the gateway.
#[derive(Debug, Deserialize)]
struct HistoryPage {
    data: Vec<GatewayRecord>,
}

#[derive(Debug, Deserialize)]
struct GatewayRecord {
    timestamp: DateTime<Utc>,
    co2: i64,
    temperature: f64,
    pressure: f64,
    humidity: i64,
}

impl From<GatewayRecord> for HistorySample {
    fn from(record: GatewayRecord) -> Self {
        HistorySample {
            timestamp: record.timestamp.timestamp(),
            temperature: record.temperature,
            humidity: record.humidity,
            pressure: record.pressure,
            co2: record.co2,
        }
    }
}

impl GatewayClient {
    /// Create a client for the gateway at `base_url`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the gateway (e.g., "http://localhost:8080")
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Self::with_client(base_url, client)
    }

    /// Create a client with a preconfigured reqwest client.
    pub fn with_client(base_url: &str, client: Client) -> Result<Self, FetchError> {
        let base_url = base_url.trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(FetchError::InvalidUrl(format!(
                "URL must start with http:// or https://, got: {}",
                base_url
            )));
        }
        Url::parse(&base_url).map_err(|e| FetchError::InvalidUrl(format!("{base_url}: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of a device's history resource, with the address percent-encoded.
    pub fn history_url(&self, address: &str) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| FetchError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["api", "devices", address, "history"]);
        Ok(url)
    }
}

impl HistorySource for GatewayClient {
    fn fetch_history(
        &self,
        address: &str,
        window: &FetchWindow,
    ) -> Result<Vec<HistorySample>, FetchError> {
        let url = self.history_url(address)?;

        let mut query = Vec::with_capacity(2);
        if let Some(start) = &window.start {
            query.push(("since", start.timestamp()));
        }
        query.push(("until", window.end.timestamp()));

        debug!("GET {} {:?}", url, query);
        let response = self
            .client
            .get(url.clone())
            .query(&query)
            .send()
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    FetchError::Unreachable {
                        url: url.to_string(),
                        source: e,
                    }
                } else {
                    FetchError::Request(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(FetchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let page: HistoryPage = response.json()?;
        debug!("Gateway returned {} records", page.data.len());
        Ok(page.data.into_iter().map(HistorySample::from).collect())
    }
}
