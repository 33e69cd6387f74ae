//! Scheduler implementation

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::queue::{InboxReceiver, PipelineStats, WorkQueueSender};

/// Why the scheduler stopped forwarding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerExit {
    /// Cancellation was observed
    Cancelled,

    /// The producer finished and the inbox drained
    InboxClosed,

    /// Every worker went away
    QueueClosed,
}

/// The Scheduler moves jobs from the inbox into the work queue.
///
/// It is the only writer to the work queue; dropping it closes the queue,
/// which is how workers learn there is nothing left to do.
pub struct Scheduler {
    inbox: InboxReceiver,
    queue: WorkQueueSender,
    cancel: CancellationToken,
    stats: Arc<PipelineStats>,
}

impl Scheduler {
    pub fn new(
        inbox: InboxReceiver,
        queue: WorkQueueSender,
        cancel: CancellationToken,
        stats: Arc<PipelineStats>,
    ) -> Self {
        debug!("Scheduler::new: called");
        Self {
            inbox,
            queue,
            cancel,
            stats,
        }
    }

    /// Forward jobs until cancelled or the inbox is exhausted
    ///
    /// A full work queue blocks forwarding; that stall is what limits
    /// admission to the worker count. A job pulled from the inbox but not yet
    /// forwarded when cancellation arrives is dropped.
    pub async fn run(mut self) -> SchedulerExit {
        debug!("Scheduler::run: called");
        let exit = loop {
            let job = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("Scheduler::run: cancelled while waiting on inbox");
                    break SchedulerExit::Cancelled;
                }
                job = self.inbox.recv() => match job {
                    Some(job) => job,
                    None => {
                        debug!("Scheduler::run: inbox closed and drained");
                        break SchedulerExit::InboxClosed;
                    }
                },
            };

            let url = job.url().to_string();
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!(%url, "Scheduler::run: cancelled while forwarding, dropping job");
                    break SchedulerExit::Cancelled;
                }
                sent = self.queue.send(job) => {
                    if sent.is_err() {
                        warn!("Work queue closed, no workers left");
                        break SchedulerExit::QueueClosed;
                    }
                    self.stats.record_forwarded();
                }
            }
        };

        // Refuse further sends so a blocked producer wakes up
        self.inbox.close();
        info!(?exit, forwarded = self.stats.snapshot().forwarded, "Scheduler stopped");
        exit
    }
}
