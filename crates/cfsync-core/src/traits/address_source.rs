// # Address Source Trait
//
// Defines the interface to an external address-discovery service.
//
// ## Implementations
//
// - ipify: `cfsync-ip-ipify` crate
//
// ## Usage
//
// ```rust,ignore
// use cfsync_core::traits::{AddressFamily, AddressSource};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* AddressSource implementation */;
//
//     let body = source.lookup(AddressFamily::V4).await?;
//     println!("public ipv4: {}", body.trim());
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::fmt;

/// Address family to look up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    V4,
    V6,
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::V4 => f.write_str("ipv4"),
            AddressFamily::V6 => f.write_str("ipv6"),
        }
    }
}

/// Trait for address-discovery services
///
/// An address source answers one question: "what does the outside world
/// see as my address for this family?". It returns the raw textual answer;
/// parsing and validation belong to the `AddressDiscoverer`.
///
/// # Contract
///
/// - One remote request per call, no retries, no caching
/// - A non-success status is an error, not an empty body
/// - No rate limiting: the discoverer takes a token before every call
/// - Must be usable concurrently from multiple tasks
#[async_trait]
pub trait AddressSource: Send + Sync {
    /// Look up the public address for `family`
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The response body (may carry surrounding whitespace)
    /// - `Err(Error)`: Transport failure or non-success status
    async fn lookup(&self, family: AddressFamily) -> Result<String, crate::Error>;

    /// Name of the service (for logging)
    fn source_name(&self) -> &'static str;
}
