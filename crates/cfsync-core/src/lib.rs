// # cfsync-core
//
// Core library for the cfsync dynamic DNS daemon.
//
// ## Architecture Overview
//
// Two tasks connected by a bounded queue:
// - **Scheduler** fires the **AddressDiscoverer** on a fixed interval; each
//   cycle asks an **AddressSource** for the public address(es) and enqueues
//   an **AddressSnapshot**
// - **RecordReconciler** dequeues snapshots in order and pushes every
//   desired record to the **DnsProvider**
// - A single **RateBudget** paces outbound calls of both tasks
// - **Manager** builds, starts and stops the whole pipeline
//
// ## Design Principles
//
// 1. **Library-First**: The daemon is a thin shell around `Manager`
// 2. **Narrow seams**: Remote services sit behind the `traits` module
// 3. **No hidden state**: No caches, no persistence, upstream identities are
//    fetched once at startup

pub mod config;
pub mod discoverer;
pub mod error;
pub mod manager;
pub mod queue;
pub mod rate;
pub mod reconciler;
pub mod records;
pub mod scheduler;
pub mod snapshot;
pub mod traits;

// Re-export core types for convenience
pub use config::{RateLimitConfig, SyncConfig};
pub use discoverer::AddressDiscoverer;
pub use error::{Error, Result};
pub use manager::Manager;
pub use queue::{SnapshotReceiver, SnapshotSender};
pub use rate::RateBudget;
pub use reconciler::{ReconcileReport, RecordFailure, RecordReconciler};
pub use records::{DesiredRecord, RecordKind, RecordUpdate, UpstreamIndex, UpstreamRecord};
pub use scheduler::{CycleOutcome, Scheduler};
pub use snapshot::AddressSnapshot;
pub use traits::{AddressFamily, AddressSource, DnsProvider};
