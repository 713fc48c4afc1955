//! Summary models derived from stored data.

use serde::{Deserialize, Serialize};

/// Per-device summary of what the store holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSummary {
    /// Device identifier.
    pub device: String,
    /// Number of stored measurements.
    pub count: u64,
    /// Oldest stored timestamp (epoch seconds, UTC).
    pub first_timestamp: i64,
    /// Newest stored timestamp (epoch seconds, UTC), i.e. the sync checkpoint.
    pub last_timestamp: i64,
}
