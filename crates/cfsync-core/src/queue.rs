//! Reconciliation queue
//!
//! Bounded FIFO carrying [`AddressSnapshot`]s from the discoverer to the
//! reconciler. A full queue blocks the producer; nothing is ever dropped.
//! The queue closes once every [`SnapshotSender`] is gone, which is the
//! consumer's signal to drain and exit.

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::{Error, Result};
use crate::snapshot::AddressSnapshot;

/// Default queue capacity
pub const DEFAULT_BACKPRESSURE_LIMIT: usize = 100;

/// Create a reconciliation queue with the given capacity
pub fn channel(capacity: usize) -> Result<(SnapshotSender, SnapshotReceiver)> {
    if capacity == 0 {
        return Err(Error::config("Backpressure limit must be > 0"));
    }

    let (tx, rx) = mpsc::channel(capacity);
    Ok((SnapshotSender { tx }, SnapshotReceiver { rx }))
}

/// Producer half of the queue
#[derive(Debug, Clone)]
pub struct SnapshotSender {
    tx: mpsc::Sender<AddressSnapshot>,
}

impl SnapshotSender {
    /// Enqueue a snapshot, waiting while the queue is full
    pub async fn send(&self, snapshot: AddressSnapshot) -> Result<()> {
        self.tx.send(snapshot).await.map_err(|_| Error::QueueClosed)
    }

    /// Whether the consumer half has been dropped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half of the queue
#[derive(Debug)]
pub struct SnapshotReceiver {
    rx: mpsc::Receiver<AddressSnapshot>,
}

impl SnapshotReceiver {
    /// Dequeue the next snapshot; `None` once closed and drained
    pub async fn recv(&mut self) -> Option<AddressSnapshot> {
        self.rx.recv().await
    }

    /// Dequeue without waiting
    pub fn try_recv(&mut self) -> Option<AddressSnapshot> {
        self.rx.try_recv().ok()
    }

    /// Number of snapshots waiting
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether no snapshot is waiting
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Turn the receiver into a stream of snapshots
    pub fn into_stream(self) -> ReceiverStream<AddressSnapshot> {
        ReceiverStream::new(self.rx)
    }
}
