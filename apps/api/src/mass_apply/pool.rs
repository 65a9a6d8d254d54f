//! Bounded worker pool for resume processing.
//!
//! A fixed number of workers pull submissions off a shared FIFO queue, so
//! at most `size` resumes are in flight at once and everything beyond that
//! waits its turn in submission order. Every accepted submission gets
//! exactly one outcome through its [`SubmissionHandle`], success or
//! failure, never both and never silence.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::debug;

use super::processor::{ApplicationProcessor, ProcessError, ResumeSubmission};
use crate::models::application::NewApplication;

/// One processed-resume outcome.
pub type ProcessOutcome = Result<NewApplication, ProcessError>;

struct PendingRequest {
    submission: ResumeSubmission,
    reply: oneshot::Sender<ProcessOutcome>,
}

/// Receives the single outcome for one submitted resume.
pub struct SubmissionHandle {
    rx: oneshot::Receiver<ProcessOutcome>,
}

impl SubmissionHandle {
    /// Waits for the submission's outcome. Consumes the handle; a
    /// submission resolves exactly once.
    pub async fn outcome(self) -> ProcessOutcome {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(ProcessError::Pool(
                "worker pool shut down before the resume was processed".to_string(),
            )),
        }
    }
}

/// Fixed-size pool of workers sharing one FIFO queue.
///
/// Dropping the pool closes the queue to new submissions. Workers keep
/// draining what was already queued and reply to any handle still held;
/// they exit once the queue is empty.
pub struct WorkerPool {
    queue_tx: mpsc::UnboundedSender<PendingRequest>,
    active: Arc<AtomicUsize>,
    queued: Arc<AtomicUsize>,
    size: usize,
}

impl WorkerPool {
    /// Spawns `size` workers (at least one) over the given processor.
    pub fn new(size: usize, processor: Arc<dyn ApplicationProcessor>) -> Self {
        let size = size.max(1);
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let queue_rx = Arc::new(Mutex::new(queue_rx));
        let active = Arc::new(AtomicUsize::new(0));
        let queued = Arc::new(AtomicUsize::new(0));

        for worker_id in 0..size {
            tokio::spawn(run_worker(
                worker_id,
                Arc::clone(&queue_rx),
                Arc::clone(&processor),
                Arc::clone(&active),
                Arc::clone(&queued),
            ));
        }

        Self {
            queue_tx,
            active,
            queued,
            size,
        }
    }

    /// Enqueues a submission and returns the handle carrying its outcome.
    /// Never blocks; the queue is unbounded and workers apply the actual
    /// concurrency limit.
    pub fn submit(&self, submission: ResumeSubmission) -> SubmissionHandle {
        let (reply, rx) = oneshot::channel();
        self.queued.fetch_add(1, Ordering::SeqCst);
        if self
            .queue_tx
            .send(PendingRequest { submission, reply })
            .is_err()
        {
            // All workers are gone. The dropped `reply` resolves the
            // handle to a pool error.
            self.queued.fetch_sub(1, Ordering::SeqCst);
        }
        SubmissionHandle { rx }
    }

    /// Number of worker slots.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Submissions waiting for a free worker.
    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    /// Submissions currently being processed.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

async fn run_worker(
    worker_id: usize,
    queue: Arc<Mutex<mpsc::UnboundedReceiver<PendingRequest>>>,
    processor: Arc<dyn ApplicationProcessor>,
    active: Arc<AtomicUsize>,
    queued: Arc<AtomicUsize>,
) {
    loop {
        // Hold the queue lock only for the dequeue itself. Lock
        // acquisition is FIFO, so idle workers take submissions in
        // arrival order.
        let request = { queue.lock().await.recv().await };
        let Some(PendingRequest { submission, reply }) = request else {
            // Queue closed: the pool was dropped.
            break;
        };
        queued.fetch_sub(1, Ordering::SeqCst);

        if reply.is_closed() {
            // Nobody is waiting for this one anymore. Skip the work.
            debug!(worker_id, "submission abandoned before processing");
            continue;
        }

        active.fetch_add(1, Ordering::SeqCst);
        let outcome = processor.process(submission).await;
        active.fetch_sub(1, Ordering::SeqCst);

        // The receiver may have gone away mid-flight; nothing to do then.
        let _ = reply.send(outcome);
    }
}
