//! WorkerPool - fixed set of workers competing for the work queue

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::scheduler::WorkQueue;

use super::executor::Executor;

/// Fixed-size pool of worker tasks
///
/// Each worker executes one job at a time, so at most `size` jobs are ever
/// in flight. Workers exit only when the work queue is closed and empty.
pub struct WorkerPool {
    workers: Vec<JoinHandle<u64>>,
}

impl WorkerPool {
    /// Spawn `size` workers on the current runtime
    pub fn spawn(size: usize, queue: WorkQueue, executor: Arc<Executor>) -> Self {
        debug!(size, "WorkerPool::spawn: called");
        let workers = (0..size)
            .map(|id| tokio::spawn(worker(id, queue.clone(), executor.clone())))
            .collect();
        Self { workers }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Wait for every worker to exit; returns the number of jobs they handled
    pub async fn join(self) -> u64 {
        debug!(size = self.workers.len(), "WorkerPool::join: called");
        let mut handled = 0;
        for (id, handle) in self.workers.into_iter().enumerate() {
            match handle.await {
                Ok(count) => handled += count,
                Err(e) => error!(worker = id, error = %e, "Worker task failed"),
            }
        }
        info!(handled, "All workers drained");
        handled
    }
}

async fn worker(id: usize, queue: WorkQueue, executor: Arc<Executor>) -> u64 {
    debug!(id, "worker: started");
    let mut handled = 0;
    while let Some(job) = queue.recv().await {
        executor.execute(job).await;
        handled += 1;
    }
    debug!(id, handled, "worker: queue closed, exiting");
    handled
}
