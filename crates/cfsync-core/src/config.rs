//! Configuration types for cfsync
//!
//! The configuration is a JSON document loaded once at startup and never
//! reloaded.
//!
//! ```json
//! {
//!   "zone_id": "023e105f4ecef8ad9ca31a8372d0c353",
//!   "api_token": "...",
//!   "frequency_secs": 300,
//!   "check_ipv6": true,
//!   "records": [
//!     { "name": "home.example.com", "type": "A" },
//!     { "name": "home.example.com", "type": "AAAA" }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::queue::DEFAULT_BACKPRESSURE_LIMIT;
use crate::records::DesiredRecord;

/// Main cfsync configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Provider zone identifier
    pub zone_id: String,

    /// Provider API token
    #[serde(default)]
    pub api_token: String,

    /// Polling interval in seconds
    #[serde(default = "default_frequency_secs", alias = "frequency")]
    pub frequency_secs: u64,

    /// Whether to also discover and publish an IPv6 address
    #[serde(default)]
    pub check_ipv6: bool,

    /// Capacity of the reconciliation queue
    #[serde(default = "default_backpressure_limit")]
    pub backpressure_limit: usize,

    /// Outbound call budget shared by discovery and updates
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Log intended updates instead of sending them
    #[serde(default)]
    pub dry_run: bool,

    /// Records to keep in sync, in processing order
    pub records: Vec<DesiredRecord>,
}

impl SyncConfig {
    /// Create a configuration with defaults for everything but the essentials
    pub fn new(
        zone_id: impl Into<String>,
        api_token: impl Into<String>,
        records: Vec<DesiredRecord>,
    ) -> Self {
        Self {
            zone_id: zone_id.into(),
            api_token: api_token.into(),
            frequency_secs: default_frequency_secs(),
            check_ipv6: false,
            backpressure_limit: default_backpressure_limit(),
            rate_limit: RateLimitConfig::default(),
            dry_run: false,
            records,
        }
    }

    /// Parse a configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration file
    ///
    /// The file is only parsed here; call [`SyncConfig::validate`] once any
    /// overrides (e.g. a token from the environment) have been applied.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Cannot read configuration file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_json_str(&content).map_err(|e| {
            Error::config(format!(
                "Cannot parse configuration file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Polling interval as a duration
    pub fn frequency(&self) -> Duration {
        Duration::from_secs(self.frequency_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.zone_id.trim().is_empty() {
            return Err(Error::config("Zone ID cannot be empty"));
        }

        if self.api_token.trim().is_empty() {
            return Err(Error::config("API token cannot be empty"));
        }

        if self.frequency_secs == 0 {
            return Err(Error::config("Polling frequency must be > 0 seconds"));
        }

        if self.backpressure_limit == 0 {
            return Err(Error::config("Backpressure limit must be > 0"));
        }

        self.rate_limit.validate()?;

        if self.records.is_empty() {
            return Err(Error::config("No records configured"));
        }

        if let Some(position) = self.records.iter().position(|r| r.name.trim().is_empty()) {
            return Err(Error::config(format!(
                "Record #{} has an empty name",
                position + 1
            )));
        }

        Ok(())
    }
}

// The API token must never show up in logs.
impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("zone_id", &self.zone_id)
            .field("api_token", &"<REDACTED>")
            .field("frequency_secs", &self.frequency_secs)
            .field("check_ipv6", &self.check_ipv6)
            .field("backpressure_limit", &self.backpressure_limit)
            .field("rate_limit", &self.rate_limit)
            .field("dry_run", &self.dry_run)
            .field("records", &self.records)
            .finish()
    }
}

/// Outbound call budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Calls allowed to start per period
    #[serde(default = "default_rate_calls")]
    pub calls: u32,

    /// Period length in seconds
    #[serde(default = "default_rate_per_secs")]
    pub per_secs: u64,
}

impl RateLimitConfig {
    /// Period as a duration
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.per_secs)
    }

    /// Validate the rate limit
    pub fn validate(&self) -> Result<()> {
        if self.calls == 0 {
            return Err(Error::config("Rate limit must allow at least one call"));
        }
        if self.per_secs == 0 {
            return Err(Error::config("Rate limit period must be > 0 seconds"));
        }
        Ok(())
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            calls: default_rate_calls(),
            per_secs: default_rate_per_secs(),
        }
    }
}

fn default_frequency_secs() -> u64 {
    60
}

fn default_backpressure_limit() -> usize {
    DEFAULT_BACKPRESSURE_LIMIT
}

fn default_rate_calls() -> u32 {
    4
}

fn default_rate_per_secs() -> u64 {
    1
}
