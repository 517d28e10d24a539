//! Record reconciliation
//!
//! The [`RecordReconciler`] is the consumer side of the pipeline. For each
//! snapshot it walks the desired records in configured order and issues one
//! provider update per applicable record:
//!
//! ```text
//! snapshot ──▶ for each desired record
//!                 ├─ AAAA without usable ipv6 ──▶ skipped
//!                 ├─ resolve identity by name (miss: empty identity)
//!                 ├─ take rate token
//!                 └─ provider.update_record ──▶ updated | failed
//! ```
//!
//! There is no "last applied" cache: the same snapshot twice means the same
//! updates twice.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

use crate::queue::SnapshotReceiver;
use crate::rate::RateBudget;
use crate::records::{DesiredRecord, RecordUpdate, UpstreamIndex};
use crate::snapshot::AddressSnapshot;
use crate::traits::DnsProvider;

/// A record whose update failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    /// Record name
    pub name: String,
    /// Provider error, rendered
    pub error: String,
}

/// Per-snapshot summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Records the provider accepted
    pub updated: Vec<String>,
    /// Records with no applicable address in the snapshot
    pub skipped: Vec<String>,
    /// Records the provider rejected
    pub failed: Vec<RecordFailure>,
}

impl ReconcileReport {
    /// Number of update calls issued
    pub fn attempted(&self) -> usize {
        self.updated.len() + self.failed.len()
    }

    /// True when no update was rejected
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Applies snapshots to the provider
pub struct RecordReconciler {
    provider: Arc<dyn DnsProvider>,
    budget: Arc<RateBudget>,
    desired: Vec<DesiredRecord>,
    upstream: UpstreamIndex,
}

impl RecordReconciler {
    /// Create a reconciler over a fixed identity index
    pub fn new(
        provider: Arc<dyn DnsProvider>,
        budget: Arc<RateBudget>,
        desired: Vec<DesiredRecord>,
        upstream: UpstreamIndex,
    ) -> Self {
        Self {
            provider,
            budget,
            desired,
            upstream,
        }
    }

    /// Desired records, in processing order
    pub fn desired(&self) -> &[DesiredRecord] {
        &self.desired
    }

    /// Reconcile every desired record against one snapshot
    ///
    /// Provider errors are logged and recorded in the report; the remaining
    /// records are still attempted.
    pub async fn reconcile(&self, snapshot: &AddressSnapshot) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for record in &self.desired {
            let Some(address) = snapshot.address_for(record.kind) else {
                debug!(record = %record.name, kind = %record.kind, "No usable address, skipping");
                report.skipped.push(record.name.clone());
                continue;
            };

            let identity = match self.upstream.identity_for(&record.name) {
                Some(id) => id.to_string(),
                None => {
                    warn!(
                        record = %record.name,
                        "Record not found upstream, attempting update without an identity"
                    );
                    String::new()
                }
            };

            let update = RecordUpdate {
                identity,
                name: record.name.clone(),
                kind: record.kind,
                content: address.to_string(),
            };

            self.budget.take().await;

            match self.provider.update_record(&update).await {
                Ok(applied) => {
                    info!(
                        record = %record.name,
                        kind = %record.kind,
                        "Updated record to {}",
                        applied.content
                    );
                    report.updated.push(record.name.clone());
                }
                Err(e) => {
                    error!(record = %record.name, error = %e, "Failed to update record");
                    report.failed.push(RecordFailure {
                        name: record.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        report
    }

    /// Consume snapshots until the queue is closed and drained
    ///
    /// Each snapshot is reconciled on its own task, so a panicking provider
    /// call loses that snapshot only.
    pub async fn run(self, queue: SnapshotReceiver) {
        info!(
            "Reconciler started via {} ({} records, {} known upstream)",
            self.provider.provider_name(),
            self.desired.len(),
            self.upstream.len()
        );

        let reconciler = Arc::new(self);
        let mut snapshots = queue.into_stream();
        while let Some(snapshot) = snapshots.next().await {
            let cycle = {
                let reconciler = Arc::clone(&reconciler);
                tokio::spawn(async move { reconciler.reconcile(&snapshot).await })
            };

            match cycle.await {
                Ok(report) if report.is_clean() => {
                    info!(
                        updated = report.updated.len(),
                        skipped = report.skipped.len(),
                        "Reconciled {}",
                        snapshot
                    );
                }
                Ok(report) => {
                    warn!(
                        updated = report.updated.len(),
                        skipped = report.skipped.len(),
                        failed = report.failed.len(),
                        "Reconciled {} with failures",
                        snapshot
                    );
                }
                Err(e) if e.is_panic() => {
                    error!(
                        "Reconciliation of {} panicked, continuing with the next snapshot",
                        snapshot
                    );
                }
                Err(e) => {
                    warn!(error = %e, "Reconciliation of {} aborted", snapshot);
                }
            }
        }

        info!("Reconciliation queue closed, reconciler stopped");
    }

    /// Start the consumer loop on a new task
    pub fn spawn(self, queue: SnapshotReceiver) -> JoinHandle<()> {
        tokio::spawn(self.run(queue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::records::{RecordKind, UpstreamRecord};
    use async_trait::async_trait;
    use std::net::Ipv4Addr;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingProvider {
        calls: Mutex<Vec<RecordUpdate>>,
    }

    #[async_trait]
    impl DnsProvider for RecordingProvider {
        async fn list_records(&self) -> Result<Vec<UpstreamRecord>> {
            Ok(Vec::new())
        }

        async fn update_record(&self, update: &RecordUpdate) -> Result<UpstreamRecord> {
            self.calls.lock().unwrap().push(update.clone());
            if !update.has_identity() {
                return Err(Error::not_found("missing identity"));
            }
            Ok(UpstreamRecord::new(&update.identity, &update.name, &update.content))
        }

        fn provider_name(&self) -> &'static str {
            "recording"
        }
    }

    fn reconciler(provider: Arc<RecordingProvider>, desired: Vec<DesiredRecord>) -> RecordReconciler {
        let upstream = UpstreamIndex::from_records(&[
            UpstreamRecord::new("id-1", "home.example.com", "192.0.2.1"),
            UpstreamRecord::new("id-2", "v6.example.com", "2001:db8::ff"),
        ]);
        let budget = Arc::new(RateBudget::per_second(1000).unwrap());
        RecordReconciler::new(provider, budget, desired, upstream)
    }

    #[tokio::test]
    async fn test_updates_in_configured_order() {
        let provider = Arc::new(RecordingProvider::default());
        let reconciler = reconciler(
            provider.clone(),
            vec![
                DesiredRecord::aaaa("v6.example.com"),
                DesiredRecord::a("home.example.com"),
            ],
        );
        let snapshot = AddressSnapshot::new(Ipv4Addr::new(203, 0, 113, 9))
            .with_ipv6("2001:db8::1".parse().unwrap());

        let report = reconciler.reconcile(&snapshot).await;

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].identity, "id-2");
        assert_eq!(calls[0].kind, RecordKind::AddressV6);
        assert_eq!(calls[0].content, "2001:db8::1");
        assert_eq!(calls[1].identity, "id-1");
        assert_eq!(calls[1].content, "203.0.113.9");
        assert_eq!(report.updated.len(), 2);
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn test_mapped_ipv6_is_not_usable() {
        let provider = Arc::new(RecordingProvider::default());
        let reconciler = reconciler(provider.clone(), vec![DesiredRecord::aaaa("v6.example.com")]);
        let snapshot = AddressSnapshot::new(Ipv4Addr::new(203, 0, 113, 9))
            .with_ipv6("::ffff:203.0.113.9".parse().unwrap());

        let report = reconciler.reconcile(&snapshot).await;

        assert!(provider.calls.lock().unwrap().is_empty());
        assert_eq!(report.skipped, vec!["v6.example.com".to_string()]);
    }

    #[tokio::test]
    async fn test_identity_miss_is_reported_as_failure() {
        let provider = Arc::new(RecordingProvider::default());
        let reconciler = reconciler(
            provider.clone(),
            vec![
                DesiredRecord::a("unknown.example.com"),
                DesiredRecord::a("home.example.com"),
            ],
        );
        let snapshot = AddressSnapshot::new(Ipv4Addr::new(203, 0, 113, 9));

        let report = reconciler.reconcile(&snapshot).await;

        assert_eq!(provider.calls.lock().unwrap()[0].identity, "");
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].name, "unknown.example.com");
        assert_eq!(report.updated, vec!["home.example.com".to_string()]);
        assert_eq!(report.attempted(), 2);
    }

    #[tokio::test]
    async fn test_run_drains_until_closed() {
        let provider = Arc::new(RecordingProvider::default());
        let reconciler = reconciler(provider.clone(), vec![DesiredRecord::a("home.example.com")]);
        let (tx, rx) = crate::queue::channel(4).unwrap();

        for octet in [1, 2, 3] {
            tx.send(AddressSnapshot::new(Ipv4Addr::new(198, 51, 100, octet)))
                .await
                .unwrap();
        }
        drop(tx);

        reconciler.spawn(rx).await.unwrap();

        let contents: Vec<_> = provider
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|u| u.content.clone())
            .collect();
        assert_eq!(contents, vec!["198.51.100.1", "198.51.100.2", "198.51.100.3"]);
    }
}
