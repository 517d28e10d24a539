//! Address discovery
//!
//! The [`AddressDiscoverer`] is the producer side of the pipeline. One call
//! to [`AddressDiscoverer::discover`] is one poll cycle:
//!
//! 1. Take a rate token, look up the IPv4 address (failure ends the cycle)
//! 2. Optionally take a second token and look up the IPv6 address
//!    (failure is logged, the snapshot goes out without IPv6)
//! 3. Enqueue the snapshot, waiting while the queue is full

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::queue::SnapshotSender;
use crate::rate::RateBudget;
use crate::snapshot::AddressSnapshot;
use crate::traits::{AddressFamily, AddressSource};

/// Rate-limited producer of address snapshots
pub struct AddressDiscoverer {
    source: Arc<dyn AddressSource>,
    budget: Arc<RateBudget>,
    queue: SnapshotSender,
}

impl AddressDiscoverer {
    /// Create a discoverer feeding `queue`
    pub fn new(
        source: Arc<dyn AddressSource>,
        budget: Arc<RateBudget>,
        queue: SnapshotSender,
    ) -> Self {
        Self {
            source,
            budget,
            queue,
        }
    }

    /// Run one discovery cycle and enqueue the resulting snapshot
    ///
    /// Nothing is enqueued when the IPv4 lookup fails.
    pub async fn discover(&self, check_ipv6: bool) -> Result<AddressSnapshot> {
        info!("Refreshing public address via {}", self.source.source_name());

        let ipv4 = self.lookup_v4().await?;
        info!("Current public ipv4 is {}", ipv4);

        let mut snapshot = AddressSnapshot::new(ipv4);

        if check_ipv6 {
            match self.lookup_v6().await {
                Ok(ipv6) => {
                    info!("Current public ipv6 is {}", ipv6);
                    snapshot = snapshot.with_ipv6(ipv6);
                }
                Err(e) => {
                    warn!(error = %e, "IPv6 discovery failed, continuing with ipv4 only");
                }
            }
        }

        self.queue.send(snapshot).await?;
        debug!(%snapshot, "Snapshot enqueued");

        Ok(snapshot)
    }

    async fn lookup_v4(&self) -> Result<Ipv4Addr> {
        let body = self.lookup(AddressFamily::V4).await?;
        parse_ipv4(&body)
    }

    async fn lookup_v6(&self) -> Result<Ipv6Addr> {
        let body = self.lookup(AddressFamily::V6).await?;
        parse_ipv6(&body)
    }

    async fn lookup(&self, family: AddressFamily) -> Result<String> {
        self.budget.take().await;
        self.source.lookup(family).await
    }
}

/// Parse a service response into an IPv4 address
pub fn parse_ipv4(body: &str) -> Result<Ipv4Addr> {
    let text = body.trim();
    text.parse()
        .map_err(|_| Error::address_source(format!("Invalid ipv4 address: {:?}", text)))
}

/// Parse a service response into an IPv6 address
pub fn parse_ipv6(body: &str) -> Result<Ipv6Addr> {
    let text = body.trim();
    text.parse()
        .map_err(|_| Error::address_source(format!("Invalid ipv6 address: {:?}", text)))
}
