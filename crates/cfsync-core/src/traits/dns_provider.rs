// # DNS Provider Trait
//
// Defines the interface to the remote DNS provider.
//
// ## Implementations
//
// - Cloudflare: `cfsync-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use cfsync_core::traits::DnsProvider;
// use cfsync_core::records::{RecordKind, RecordUpdate};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     // Fetch the zone once
//     let upstream = provider.list_records().await?;
//
//     // Point a record at a new address
//     provider.update_record(&RecordUpdate {
//         identity: upstream[0].id.clone(),
//         name: upstream[0].name.clone(),
//         kind: RecordKind::AddressV4,
//         content: "203.0.113.9".to_string(),
//     }).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::records::{RecordUpdate, UpstreamRecord};

/// Trait for DNS provider implementations
///
/// A provider is bound to one zone at construction time and exposes the
/// two calls the core needs.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Contract
///
/// - Single-shot: one logical API operation per call, no retry or backoff
/// - Stateless: no caching between calls
/// - No rate limiting: the reconciler takes a token before each update
/// - No decision making: every update handed over is attempted, even when
///   the content is unchanged
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List every record of the configured zone
    ///
    /// Called once at startup to build the name → identity index.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<UpstreamRecord>)`: All records in the zone
    /// - `Err(Error)`: If the listing failed (a startup error for the manager)
    async fn list_records(&self) -> Result<Vec<UpstreamRecord>, crate::Error>;

    /// Update the record identified by `update.identity`
    ///
    /// An empty identity means the name was missing from the startup
    /// listing; implementations should reject it with an error.
    ///
    /// # Returns
    ///
    /// - `Ok(UpstreamRecord)`: The record as the provider now reports it
    /// - `Err(Error)`: If the update failed
    async fn update_record(&self, update: &RecordUpdate) -> Result<UpstreamRecord, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
