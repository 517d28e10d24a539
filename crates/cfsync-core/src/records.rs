//! Record types
//!
//! - [`DesiredRecord`]: a configured name the operator wants kept in sync
//! - [`UpstreamRecord`]: the provider's view of a record, with its identity
//! - [`UpstreamIndex`]: name → identity table built once at startup
//! - [`RecordUpdate`]: the payload of a single update call

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// DNS record kind handled by cfsync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// A record (IPv4)
    #[serde(rename = "A")]
    AddressV4,
    /// AAAA record (IPv6)
    #[serde(rename = "AAAA")]
    AddressV6,
}

impl RecordKind {
    /// The DNS type mnemonic
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::AddressV4 => "A",
            RecordKind::AddressV6 => "AAAA",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configured DNS record to keep pointed at the current address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredRecord {
    /// Fully qualified record name (e.g., "home.example.com")
    pub name: String,

    /// Record kind ("A" or "AAAA" in configuration)
    #[serde(rename = "type")]
    pub kind: RecordKind,
}

impl DesiredRecord {
    /// Create a new desired record
    pub fn new(name: impl Into<String>, kind: RecordKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Shorthand for an A record
    pub fn a(name: impl Into<String>) -> Self {
        Self::new(name, RecordKind::AddressV4)
    }

    /// Shorthand for an AAAA record
    pub fn aaaa(name: impl Into<String>) -> Self {
        Self::new(name, RecordKind::AddressV6)
    }
}

/// A record as the DNS provider reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamRecord {
    /// Provider-assigned identity
    pub id: String,
    /// Record name
    pub name: String,
    /// Record content (the address, for A/AAAA records)
    pub content: String,
}

impl UpstreamRecord {
    /// Create a record from its provider identity, name and content
    pub fn new(id: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Lookup table from record name to provider identity
///
/// Built once from the startup listing and never refreshed. When the
/// provider lists several records under one name, the last one wins.
#[derive(Debug, Clone, Default)]
pub struct UpstreamIndex {
    by_name: HashMap<String, String>,
}

impl UpstreamIndex {
    /// Build the index from a provider listing
    pub fn from_records(records: &[UpstreamRecord]) -> Self {
        records.iter().cloned().collect()
    }

    /// Identity of the record with the given name
    pub fn identity_for(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    /// Number of distinct names
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl FromIterator<UpstreamRecord> for UpstreamIndex {
    fn from_iter<I: IntoIterator<Item = UpstreamRecord>>(iter: I) -> Self {
        let by_name = iter.into_iter().map(|record| (record.name, record.id)).collect();
        Self { by_name }
    }
}

/// One update call issued to the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    /// Provider identity; empty when the name was not found upstream
    pub identity: String,
    /// Record name
    pub name: String,
    /// Record kind
    pub kind: RecordKind,
    /// New content, the address in canonical text form
    pub content: String,
}

impl RecordUpdate {
    /// Whether the identity could not be resolved from the upstream index
    pub fn has_identity(&self) -> bool {
        !self.identity.is_empty()
    }
}
