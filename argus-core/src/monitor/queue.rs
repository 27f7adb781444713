//! Ordered, bounded dispatch of classified events

use crate::monitor::ChangeEvent;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

/// Counters shared between the receive loop and the sequencer
#[derive(Debug, Default)]
pub struct DispatchStats {
    total_enqueued: AtomicU64,
    total_published: AtomicU64,
    total_dropped: AtomicU64,
    total_failed: AtomicU64,
    total_primitive_errors: AtomicU64,
}

/// Point-in-time copy of [`DispatchStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub enqueued: u64,
    pub published: u64,
    /// Dropped because the dispatch queue was full
    pub dropped: u64,
    /// Dropped because encoding failed
    pub failed: u64,
    pub primitive_errors: u64,
}

impl DispatchStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            enqueued: self.total_enqueued.load(Ordering::Relaxed),
            published: self.total_published.load(Ordering::Relaxed),
            dropped: self.total_dropped.load(Ordering::Relaxed),
            failed: self.total_failed.load(Ordering::Relaxed),
            primitive_errors: self.total_primitive_errors.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn record_primitive_error(&self) {
        self.total_primitive_errors.fetch_add(1, Ordering::Relaxed);
    }
}

/// Front of the dispatch pipeline
///
/// Events are queued without waiting and published by a single
/// sequencer task, so the outbound order is the enqueue order and a
/// slow subscriber never stalls the caller of [`DispatchQueue::enqueue`].
pub struct DispatchQueue {
    tx: mpsc::Sender<ChangeEvent>,
    stats: Arc<DispatchStats>,
}

impl DispatchQueue {
    /// Spawn the sequencer publishing onto `outbound`
    ///
    /// The returned handle completes once the queue is dropped and every
    /// queued event has been published.
    pub fn start(
        capacity: usize,
        outbound: mpsc::UnboundedSender<String>,
        stats: Arc<DispatchStats>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let sequencer = tokio::spawn(run_sequencer(rx, outbound, stats.clone()));
        (Self { tx, stats }, sequencer)
    }

    /// Queue an event for publication
    ///
    /// Returns false when the event was dropped.
    pub fn enqueue(&self, event: ChangeEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => {
                self.stats.total_enqueued.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!("Dispatch queue full, dropping event: {:?}", event.path);
                self.stats.total_dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                error!("Dispatch queue closed, dropping event: {:?}", event.path);
                self.stats.total_dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

async fn run_sequencer(
    mut rx: mpsc::Receiver<ChangeEvent>,
    outbound: mpsc::UnboundedSender<String>,
    stats: Arc<DispatchStats>,
) {
    let mut subscriber_gone = false;

    while let Some(event) = rx.recv().await {
        let data = match event.to_json() {
            Ok(data) => data,
            Err(e) => {
                error!("Dropping event: {}", e);
                stats.total_failed.fetch_add(1, Ordering::Relaxed);
                continue;
            }
        };

        if subscriber_gone {
            continue;
        }

        if outbound.send(data).is_err() {
            debug!("Event subscriber dropped, discarding further events");
            subscriber_gone = true;
            continue;
        }

        stats.total_published.fetch_add(1, Ordering::Relaxed);
        trace!("Published {:?} for {:?}", event.action, event.path);
    }

    debug!("Dispatch sequencer stopped");
}
