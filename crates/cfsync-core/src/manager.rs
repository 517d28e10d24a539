//! Pipeline manager
//!
//! The [`Manager`] owns every component and their wiring:
//!
//! ```text
//!                  ┌────────────────┐
//!  Scheduler ────▶ │ AddressSource  │
//!  (interval)      └────────────────┘
//!      │ AddressDiscoverer     ▲
//!      ▼                       │ take()
//!  ┌────────────────────┐   ┌────────────┐
//!  │ ReconciliationQueue│   │ RateBudget │
//!  └────────────────────┘   └────────────┘
//!      │                       │ take()
//!      ▼                       ▼
//!  RecordReconciler ────▶ DnsProvider
//! ```
//!
//! ## Lifecycle
//!
//! 1. [`Manager::new`] validates the configuration, lists upstream records
//!    and builds all components. Any failure is a startup error.
//! 2. [`Manager::run`] spawns the consumer and scheduler tasks.
//! 3. [`Manager::stop`] cancels the scheduler; dropping it closes the queue,
//!    the consumer drains and exits, and both tasks are awaited.
//!
//! A stopped manager cannot be restarted. Dropping a manager cancels its
//! scheduler.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::SyncConfig;
use crate::discoverer::AddressDiscoverer;
use crate::error::{Error, Result};
use crate::queue::{self, SnapshotReceiver};
use crate::rate::RateBudget;
use crate::reconciler::RecordReconciler;
use crate::records::UpstreamIndex;
use crate::scheduler::Scheduler;
use crate::traits::{AddressSource, DnsProvider};

enum Lifecycle {
    Ready {
        scheduler: Scheduler,
        reconciler: RecordReconciler,
        queue: SnapshotReceiver,
    },
    Running {
        scheduler: JoinHandle<()>,
        consumer: JoinHandle<()>,
    },
    Stopped,
}

impl Lifecycle {
    fn name(&self) -> &'static str {
        match self {
            Lifecycle::Ready { .. } => "ready",
            Lifecycle::Running { .. } => "running",
            Lifecycle::Stopped => "stopped",
        }
    }
}

/// Owner of the discovery → reconciliation pipeline
pub struct Manager {
    config: SyncConfig,
    cancel: CancellationToken,
    state: Mutex<Lifecycle>,
}

impl Manager {
    /// Build a manager ready to run
    ///
    /// # Errors
    ///
    /// - [`Error::Config`]: The configuration is invalid
    /// - [`Error::Startup`]: The upstream record listing failed
    pub async fn new(
        config: SyncConfig,
        provider: Arc<dyn DnsProvider>,
        source: Arc<dyn AddressSource>,
    ) -> Result<Self> {
        config.validate()?;

        let listing = provider.list_records().await.map_err(|e| {
            Error::startup(format!(
                "Cannot list records via {}: {}",
                provider.provider_name(),
                e
            ))
        })?;
        let upstream = UpstreamIndex::from_records(&listing);
        info!(
            "Fetched {} upstream records ({} distinct names)",
            listing.len(),
            upstream.len()
        );

        let budget = Arc::new(RateBudget::new(
            config.rate_limit.calls,
            config.rate_limit.period(),
        )?);
        let (sender, receiver) = queue::channel(config.backpressure_limit)?;

        let discoverer = AddressDiscoverer::new(source, Arc::clone(&budget), sender);
        let scheduler = Scheduler::new(discoverer, config.frequency(), config.check_ipv6);
        let reconciler = RecordReconciler::new(provider, budget, config.records.clone(), upstream);

        Ok(Self {
            config,
            cancel: CancellationToken::new(),
            state: Mutex::new(Lifecycle::Ready {
                scheduler,
                reconciler,
                queue: receiver,
            }),
        })
    }

    /// Configuration the manager was built with
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Start the consumer and scheduler tasks
    ///
    /// Calling `run` on a running manager is a no-op.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`]: The manager was already stopped
    pub async fn run(&self) -> Result<()> {
        let mut state = self.state.lock().await;

        match std::mem::replace(&mut *state, Lifecycle::Stopped) {
            Lifecycle::Ready {
                scheduler,
                reconciler,
                queue,
            } => {
                let consumer = reconciler.spawn(queue);
                let scheduler = scheduler.spawn(self.cancel.clone());
                *state = Lifecycle::Running {
                    scheduler,
                    consumer,
                };
                info!("Manager running");
                Ok(())
            }
            running @ Lifecycle::Running { .. } => {
                debug!("Manager already running");
                *state = running;
                Ok(())
            }
            Lifecycle::Stopped => Err(Error::invalid_input(
                "Manager has been stopped and cannot be restarted",
            )),
        }
    }

    /// Stop both tasks and wait for them to finish
    ///
    /// Snapshots already queued are still reconciled. Safe to call more
    /// than once, and before [`Manager::run`].
    pub async fn stop(&self) {
        self.cancel.cancel();

        let mut state = self.state.lock().await;
        match std::mem::replace(&mut *state, Lifecycle::Stopped) {
            Lifecycle::Ready { .. } => {
                debug!("Manager stopped before running, components released");
            }
            Lifecycle::Running {
                scheduler,
                consumer,
            } => {
                info!("Stopping manager");
                if let Err(e) = scheduler.await {
                    error!("Scheduler task ended abnormally: {}", e);
                }
                if let Err(e) = consumer.await {
                    error!("Reconciler task ended abnormally: {}", e);
                }
                info!("Manager stopped");
            }
            Lifecycle::Stopped => {}
        }
    }

    /// Whether the tasks have been started and not yet stopped
    pub async fn is_running(&self) -> bool {
        matches!(*self.state.lock().await, Lifecycle::Running { .. })
    }

    /// Current lifecycle phase ("ready", "running" or "stopped")
    pub async fn phase(&self) -> &'static str {
        self.state.lock().await.name()
    }
}

impl Drop for Manager {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
