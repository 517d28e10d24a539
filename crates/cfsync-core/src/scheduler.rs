//! Periodic discovery scheduler
//!
//! Fires the [`AddressDiscoverer`] once immediately and then once per
//! interval on its own task. Every cycle runs in a separately spawned task,
//! so an error or a panic ends that cycle only. Cancellation is observed
//! between cycles; a running cycle is always allowed to finish.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::discoverer::AddressDiscoverer;
use crate::snapshot::AddressSnapshot;

/// Result of a single discovery cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A snapshot was produced and enqueued
    Enqueued(AddressSnapshot),

    /// The cycle returned an error
    Failed(String),

    /// The cycle panicked
    Panicked,
}

/// Drives the discoverer on a fixed interval
pub struct Scheduler {
    discoverer: Arc<AddressDiscoverer>,
    period: Duration,
    check_ipv6: bool,
}

impl Scheduler {
    /// Wrap a discoverer; nothing runs until [`Scheduler::spawn`]
    pub fn new(discoverer: AddressDiscoverer, period: Duration, check_ipv6: bool) -> Self {
        Self {
            discoverer: Arc::new(discoverer),
            period,
            check_ipv6,
        }
    }

    /// Polling interval
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start the scheduling loop on a new task
    ///
    /// The loop exits once `cancel` fires. The discoverer (and with it the
    /// queue's producer half) is dropped when the task ends.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(cancel).await })
    }

    async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Scheduler started (every {}s)", self.period.as_secs());

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    debug!("Scheduler cancelled");
                    break;
                }

                _ = ticker.tick() => {
                    self.fire_once().await;
                }
            }
        }

        info!("Scheduler stopped");
    }

    /// Run one discovery cycle behind a fault boundary
    pub async fn fire_once(&self) -> CycleOutcome {
        let discoverer = Arc::clone(&self.discoverer);
        let check_ipv6 = self.check_ipv6;

        let cycle = tokio::spawn(async move { discoverer.discover(check_ipv6).await });

        match cycle.await {
            Ok(Ok(snapshot)) => CycleOutcome::Enqueued(snapshot),
            Ok(Err(e)) => {
                warn!(error = %e, "Discovery cycle failed");
                CycleOutcome::Failed(e.to_string())
            }
            Err(e) if e.is_panic() => {
                error!("Discovery cycle panicked, continuing with the next tick");
                CycleOutcome::Panicked
            }
            Err(e) => {
                warn!(error = %e, "Discovery cycle aborted");
                CycleOutcome::Failed(e.to_string())
            }
        }
    }
}
