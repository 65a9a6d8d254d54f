//! Run progress counters, published over a watch channel.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;
use tokio::sync::watch;

/// Counters for one mass-apply run. `percent` is 0 before anything has been
/// submitted and exactly 100 once every item has completed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatchProgress {
    pub processed: usize,
    pub total: usize,
    pub percent: f32,
}

impl BatchProgress {
    fn new(processed: usize, total: usize) -> Self {
        let percent = if total == 0 {
            0.0
        } else {
            processed as f32 / total as f32 * 100.0
        };

        Self {
            processed,
            total,
            percent,
        }
    }

    pub fn idle() -> Self {
        Self::new(0, 0)
    }
}

/// Single-writer progress state owned by the coordinator.
///
/// Observers subscribe and read whatever the latest counters are; watch
/// semantics guarantee a lagging observer sees the newest value, never a
/// stale or decreasing one. Counters only move via atomic increments, so a
/// completion recorded from any task is visible before the next one lands.
#[derive(Debug)]
pub struct ProgressTracker {
    tx: watch::Sender<BatchProgress>,
    processed: AtomicUsize,
    total: AtomicUsize,
}

impl ProgressTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(BatchProgress::idle());
        Self {
            tx,
            processed: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<BatchProgress> {
        self.tx.subscribe()
    }

    /// Starts a fresh run over `total` items.
    pub fn reset(&self, total: usize) {
        self.processed.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
        self.tx.send_replace(BatchProgress::new(0, total));
    }

    /// Records one completed item (success or failure) and publishes the
    /// updated counters. Returns what was published.
    pub fn record_completion(&self) -> BatchProgress {
        let processed = self.processed.fetch_add(1, Ordering::SeqCst) + 1;
        let total = self.total.load(Ordering::SeqCst);
        let progress = BatchProgress::new(processed, total);
        self.tx.send_replace(progress);
        progress
    }

    pub fn current(&self) -> BatchProgress {
        *self.tx.borrow()
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
