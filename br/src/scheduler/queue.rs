//! Pipeline channels and run statistics

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, mpsc};

use crate::job::Job;

/// Sending half of the inbox (producer side)
pub type InboxSender = mpsc::Sender<Job>;

/// Receiving half of the inbox (scheduler side)
pub type InboxReceiver = mpsc::Receiver<Job>;

/// Sending half of the work queue, owned by the scheduler alone
pub type WorkQueueSender = mpsc::Sender<Job>;

/// Create the bounded inbox between producer and scheduler
pub fn inbox(capacity: usize) -> (InboxSender, InboxReceiver) {
    mpsc::channel(capacity)
}

/// Create the bounded work queue between scheduler and workers
pub fn work_queue(capacity: usize) -> (WorkQueueSender, WorkQueue) {
    let (tx, rx) = mpsc::channel(capacity);
    (tx, WorkQueue::new(rx))
}

/// Multi-consumer receiving half of the work queue
///
/// Clones share one receiver, so each job is handed to exactly one worker.
/// `recv` returns `None` once the sender is dropped and the queue is empty.
#[derive(Clone)]
pub struct WorkQueue {
    rx: Arc<Mutex<mpsc::Receiver<Job>>>,
}

impl WorkQueue {
    fn new(rx: mpsc::Receiver<Job>) -> Self {
        Self {
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    pub async fn recv(&self) -> Option<Job> {
        self.rx.lock().await.recv().await
    }
}

/// Counters shared by every pipeline stage
#[derive(Debug, Default)]
pub struct PipelineStats {
    produced: AtomicU64,
    skipped: AtomicU64,
    forwarded: AtomicU64,
    dispatched: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    in_flight: AtomicU64,
    peak_in_flight: AtomicU64,
}

impl PipelineStats {
    pub fn record_produced(&self) {
        self.produced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_forwarded(&self) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark a job as started; pair with [`PipelineStats::finish`]
    pub fn start(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    pub fn finish(&self, success: bool) {
        if success {
            self.completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            produced: self.produced.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::SeqCst),
            peak_in_flight: self.peak_in_flight.load(Ordering::SeqCst),
        }
    }
}

/// Point-in-time copy of [`PipelineStats`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub produced: u64,
    pub skipped: u64,
    pub forwarded: u64,
    pub dispatched: u64,
    pub completed: u64,
    pub failed: u64,
    pub in_flight: u64,
    pub peak_in_flight: u64,
}
