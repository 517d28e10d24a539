// # Cloudflare DNS Provider
//
// This crate provides the Cloudflare implementation of `DnsProvider`.
//
// ## Behavior
//
// - One zone per provider, fixed at construction
// - `list_records` reads every page of the zone's DNS records
// - `update_record` sends one PATCH per call, even if the content is
//   already current
// - No retry, backoff, rate limiting or caching: those decisions belong to
//   cfsync-core
// - Dry-run mode: listings still happen, updates are only logged
//
// ## Security Requirements
//
// - API token NEVER appears in logs or `Debug` output
// - Construction fails fast if the token or zone is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List DNS Records: GET `/zones/:zone_id/dns_records?page=N&per_page=100`
// - Patch DNS Record: PATCH `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use cfsync_core::config::SyncConfig;
use cfsync_core::records::{RecordUpdate, UpstreamRecord};
use cfsync_core::traits::DnsProvider;
use cfsync_core::{Error, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Page size for record listings
const LIST_PAGE_SIZE: u32 = 100;

/// Standard Cloudflare response envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    page: u32,
    total_pages: u32,
}

#[derive(Debug, Deserialize)]
struct DnsRecord {
    id: String,
    name: String,
    #[serde(default)]
    content: String,
}

impl From<DnsRecord> for UpstreamRecord {
    fn from(record: DnsRecord) -> Self {
        UpstreamRecord::new(record.id, record.name, record.content)
    }
}

#[derive(Debug, Serialize)]
struct RecordPatch<'a> {
    content: &'a str,
    name: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
}

/// Cloudflare DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform listings as usual
/// - Log the intended PATCH payload
/// - **NOT** modify any DNS record
///
/// # Security
///
/// The Debug implementation does NOT expose the API token.
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// Zone all records live in
    zone_id: String,

    /// API base URL (overridable for tests)
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, list as usual but skip updates
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `zone_id`: Zone holding the records
    /// - `dry_run`: If true, list records but skip updates
    ///
    /// # Errors
    ///
    /// Returns a startup error if the token or zone is empty, or if the HTTP
    /// client cannot be built.
    pub fn new(
        api_token: impl Into<String>,
        zone_id: impl Into<String>,
        dry_run: bool,
    ) -> Result<Self> {
        let api_token = api_token.into();
        let zone_id = zone_id.into();

        if api_token.trim().is_empty() {
            return Err(Error::startup("Cloudflare API token cannot be empty"));
        }
        if zone_id.trim().is_empty() {
            return Err(Error::startup("Cloudflare zone ID cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::startup(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            zone_id,
            base_url: CLOUDFLARE_API_BASE.to_string(),
            client,
            dry_run,
        })
    }

    /// Create a provider in live mode
    pub fn new_live(api_token: impl Into<String>, zone_id: impl Into<String>) -> Result<Self> {
        Self::new(api_token, zone_id, false)
    }

    /// Create a provider in dry-run mode
    pub fn new_dry_run(api_token: impl Into<String>, zone_id: impl Into<String>) -> Result<Self> {
        Self::new(api_token, zone_id, true)
    }

    /// Create a provider from the daemon configuration
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        if config.dry_run {
            tracing::warn!("Cloudflare provider running in DRY-RUN mode - no changes will be made");
        }
        Self::new(config.api_token.clone(), config.zone_id.clone(), config.dry_run)
    }

    /// Point the provider at a different API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether updates are logged instead of sent
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn records_url(&self) -> String {
        format!("{}/zones/{}/dns_records", self.base_url, self.zone_id)
    }

    /// Fetch one page of the zone's records
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?page=1&per_page=100
    /// Authorization: Bearer <token>
    /// ```
    async fn list_page(&self, page: u32) -> Result<(Vec<DnsRecord>, Option<ResultInfo>)> {
        let response = self
            .client
            .get(self.records_url())
            .bearer_auth(&self.api_token)
            .query(&[("page", page), ("per_page", LIST_PAGE_SIZE)])
            .send()
            .await
            .map_err(|e| Error::http(format!("Cloudflare request failed: {}", e)))?;

        let envelope: Envelope<Vec<DnsRecord>> =
            read_envelope(response, "Record listing").await?;

        Ok((envelope.result.unwrap_or_default(), envelope.result_info))
    }
}

/// Map a non-success HTTP status to an error
fn status_error(status: StatusCode, body: &str, context: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "Invalid API token or insufficient permissions. Status: {}",
            status
        )),
        404 => Error::not_found(format!("{}: {}", context, status)),
        409 => Error::provider(
            "cloudflare",
            format!("Conflict: record is being modified elsewhere. Status: {}", status),
        ),
        429 => Error::rate_limited(format!("Cloudflare rate limit exceeded. Status: {}", status)),
        500..=599 => Error::provider(
            "cloudflare",
            format!("Cloudflare server error (transient): {} - {}", status, body),
        ),
        _ => Error::provider(
            "cloudflare",
            format!("{} failed: {} - {}", context, status, body),
        ),
    }
}

/// Check the status, decode the envelope and reject `success: false`
async fn read_envelope<T>(response: reqwest::Response, context: &str) -> Result<Envelope<T>>
where
    T: for<'de> Deserialize<'de>,
{
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        return Err(status_error(status, &body, context));
    }

    let envelope: Envelope<T> = response
        .json()
        .await
        .map_err(|e| Error::provider("cloudflare", format!("Failed to parse response: {}", e)))?;

    if !envelope.success {
        let messages: Vec<String> = envelope
            .errors
            .iter()
            .map(|m| format!("{} ({})", m.message, m.code))
            .collect();
        return Err(Error::provider(
            "cloudflare",
            format!("{} rejected: {}", context, messages.join("; ")),
        ));
    }

    Ok(envelope)
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn list_records(&self) -> Result<Vec<UpstreamRecord>> {
        let mut records = Vec::new();
        let mut page = 1;

        loop {
            let (batch, info) = self.list_page(page).await?;
            tracing::debug!("Fetched page {} with {} records", page, batch.len());
            records.extend(batch.into_iter().map(UpstreamRecord::from));

            match info {
                Some(info) if page < info.total_pages => page += 1,
                _ => break,
            }
        }

        tracing::info!("Listed {} records in zone {}", records.len(), self.zone_id);
        Ok(records)
    }

    /// Point a record at a new address
    ///
    /// # API Call
    ///
    /// ```http
    /// PATCH /zones/:zone_id/dns_records/:record_id
    /// {
    ///   "content": "203.0.113.9",
    ///   "name": "home.example.com",
    ///   "type": "A"
    /// }
    /// ```
    async fn update_record(&self, update: &RecordUpdate) -> Result<UpstreamRecord> {
        if !update.has_identity() {
            return Err(Error::not_found(format!(
                "No record identity known for {}",
                update.name
            )));
        }

        let url = format!("{}/{}", self.records_url(), update.identity);
        let payload = RecordPatch {
            content: &update.content,
            name: &update.name,
            kind: update.kind.as_str(),
        };

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PATCH request to {} with payload: {}",
                url,
                serde_json::to_string(&payload)?
            );
            return Ok(UpstreamRecord::new(
                update.identity.clone(),
                update.name.clone(),
                update.content.clone(),
            ));
        }

        tracing::debug!(
            "Patching {} record {} -> {}",
            update.kind,
            update.name,
            update.content
        );

        let response = self
            .client
            .patch(&url)
            .bearer_auth(&self.api_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::http(format!("Cloudflare request failed: {}", e)))?;

        let envelope: Envelope<DnsRecord> = read_envelope(response, "Record update").await?;
        let record = envelope.result.ok_or_else(|| {
            Error::provider("cloudflare", "Invalid response format: result is missing")
        })?;

        Ok(record.into())
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}
