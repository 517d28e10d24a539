// # ipify Address Source
//
// This crate provides an `AddressSource` backed by the ipify lookup service.
//
// ## Endpoints
//
// - IPv4: `GET https://api.ipify.org` → `203.0.113.9`
// - IPv6: `GET https://api6.ipify.org` → `2001:db8::1`
//
// Both answer with the bare address as plain text. The IPv6 endpoint is
// only reachable over IPv6, so on a v4-only host that lookup fails at the
// transport level and the discoverer carries on without IPv6.
//
// ## Scope
//
// One request per lookup. Parsing, rate limiting and scheduling live in
// cfsync-core.

use async_trait::async_trait;
use cfsync_core::traits::{AddressFamily, AddressSource};
use cfsync_core::{Error, Result};
use std::time::Duration;
use tracing::debug;

/// Default IPv4 lookup endpoint
pub const DEFAULT_V4_URL: &str = "https://api.ipify.org";

/// Default IPv6 lookup endpoint
pub const DEFAULT_V6_URL: &str = "https://api6.ipify.org";

/// Transport timeout for a single lookup
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// ipify HTTP client
#[derive(Debug, Clone)]
pub struct IpifyClient {
    v4_url: String,
    v6_url: String,
    client: reqwest::Client,
}

impl IpifyClient {
    /// Create a client for the public ipify endpoints
    pub fn new() -> Result<Self> {
        Self::with_endpoints(DEFAULT_V4_URL, DEFAULT_V6_URL)
    }

    /// Create a client for custom endpoints
    pub fn with_endpoints(v4_url: impl Into<String>, v6_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("cfsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::startup(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            v4_url: v4_url.into(),
            v6_url: v6_url.into(),
            client,
        })
    }

    fn url_for(&self, family: AddressFamily) -> &str {
        match family {
            AddressFamily::V4 => &self.v4_url,
            AddressFamily::V6 => &self.v6_url,
        }
    }
}

#[async_trait]
impl AddressSource for IpifyClient {
    async fn lookup(&self, family: AddressFamily) -> Result<String> {
        let url = self.url_for(family);
        debug!("Looking up public {} via {}", family, url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::address_source(format!("{} request failed: {}", family, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::address_source(format!(
                "{} lookup returned HTTP {}",
                family, status
            )));
        }

        response
            .text()
            .await
            .map_err(|e| Error::address_source(format!("Failed to read {} response: {}", family, e)))
    }

    fn source_name(&self) -> &'static str {
        "ipify"
    }
}
