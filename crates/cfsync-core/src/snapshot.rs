//! Address snapshots
//!
//! An [`AddressSnapshot`] is one observation of the host's public
//! addresses. It is built by the discoverer once per poll cycle and
//! consumed exactly once by the reconciler.

use chrono::{DateTime, Utc};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::records::RecordKind;

/// Immutable observation of the current public address(es)
///
/// The IPv4 address is not optional: a snapshot only exists when the
/// IPv4 lookup succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressSnapshot {
    ipv4: Ipv4Addr,
    ipv6: Option<Ipv6Addr>,
    observed_at: DateTime<Utc>,
}

impl AddressSnapshot {
    /// Create a snapshot holding only an IPv4 address
    pub fn new(ipv4: Ipv4Addr) -> Self {
        Self {
            ipv4,
            ipv6: None,
            observed_at: Utc::now(),
        }
    }

    /// Attach an IPv6 address
    pub fn with_ipv6(mut self, ipv6: Ipv6Addr) -> Self {
        self.ipv6 = Some(ipv6);
        self
    }

    /// The public IPv4 address
    pub fn ipv4(&self) -> Ipv4Addr {
        self.ipv4
    }

    /// The public IPv6 address, as discovered
    pub fn ipv6(&self) -> Option<Ipv6Addr> {
        self.ipv6
    }

    /// The IPv6 address if it can be published in an AAAA record
    ///
    /// IPv4-mapped addresses (`::ffff:a.b.c.d`) are not usable.
    pub fn usable_ipv6(&self) -> Option<Ipv6Addr> {
        self.ipv6.filter(|addr| addr.to_ipv4_mapped().is_none())
    }

    /// When the snapshot was taken
    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    /// The address a record of the given kind should point at, if any
    pub fn address_for(&self, kind: RecordKind) -> Option<IpAddr> {
        match kind {
            RecordKind::AddressV4 => Some(IpAddr::V4(self.ipv4)),
            RecordKind::AddressV6 => self.usable_ipv6().map(IpAddr::V6),
        }
    }
}

impl fmt::Display for AddressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ipv6 {
            Some(v6) => write!(f, "ipv4={} ipv6={}", self.ipv4, v6),
            None => write!(f, "ipv4={} ipv6=none", self.ipv4),
        }
    }
}
