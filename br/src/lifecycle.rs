//! Lifecycle - wires the pipeline together and owns shutdown
//!
//! ```text
//! JobSource -> Producer -> inbox -> Scheduler -> work queue -> WorkerPool -> Dispatcher
//!                  ^                    ^
//!                  +---- cancellation --+
//! ```
//!
//! Cancellation stops the producer and scheduler; workers never see it and
//! stop only when the scheduler drops the work queue, so every admitted job
//! finishes before [`Lifecycle::run_until`] returns.

use std::future::Future;
use std::sync::Arc;

use eyre::{Context, Result};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::producer::{ProduceSummary, Producer};
use crate::scheduler::{PipelineConfig, PipelineStats, Scheduler, SchedulerExit, StatsSnapshot, inbox, work_queue};
use crate::source::JobSource;
use crate::worker::{Dispatcher, Executor, WorkerPool};

/// Outcome of a whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub produce: ProduceSummary,
    pub scheduler: Option<SchedulerExit>,
    pub stats: StatsSnapshot,
    pub handled: u64,
    pub cancelled: bool,
}

/// A started pipeline
pub struct Lifecycle {
    cancel: CancellationToken,
    stats: Arc<PipelineStats>,
    producer: JoinHandle<ProduceSummary>,
    scheduler: JoinHandle<SchedulerExit>,
    pool: WorkerPool,
}

impl Lifecycle {
    /// Start producer, scheduler and workers
    ///
    /// The source is listed once before anything is spawned so an unreadable
    /// source fails the run before a single request goes out.
    pub async fn start(
        config: PipelineConfig,
        source: Arc<dyn JobSource>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Result<Self> {
        debug!(?config, source = %source.describe(), "Lifecycle::start: called");
        let definitions = source.list().await.context("Job source is not readable")?;
        info!(
            definitions = definitions.len(),
            jobs = config.jobs(),
            concurrency = config.concurrency(),
            source = %source.describe(),
            "Starting pipeline"
        );

        let cancel = CancellationToken::new();
        let stats = Arc::new(PipelineStats::default());
        let (inbox_tx, inbox_rx) = inbox(config.inbox_capacity());
        let (queue_tx, queue) = work_queue(config.queue_capacity());

        let executor = Arc::new(Executor::new(dispatcher, stats.clone()));
        let pool = WorkerPool::spawn(config.concurrency(), queue, executor);

        let scheduler = Scheduler::new(inbox_rx, queue_tx, cancel.clone(), stats.clone());
        let scheduler = tokio::spawn(scheduler.run());

        let producer = Producer::new(source, config.jobs(), stats.clone());
        let producer = tokio::spawn(producer.run(inbox_tx, cancel.clone()));

        Ok(Self {
            cancel,
            stats,
            producer,
            scheduler,
            pool,
        })
    }

    /// Token that triggers graceful shutdown when cancelled
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run until the pipeline drains on its own or `shutdown` resolves
    ///
    /// On shutdown, cancellation is triggered and this waits for every worker
    /// to finish its current job and the jobs already queued. Jobs still in
    /// the inbox are discarded.
    pub async fn run_until<F>(self, shutdown: F) -> RunSummary
    where
        F: Future<Output = ()>,
    {
        debug!("Lifecycle::run_until: called");
        let Self {
            cancel,
            stats,
            producer,
            scheduler,
            pool,
        } = self;

        let drained = pool.join();
        tokio::pin!(drained);

        let mut cancelled = false;
        let handled = tokio::select! {
            handled = &mut drained => handled,
            _ = shutdown => {
                info!("Shutdown requested, draining workers");
                cancelled = true;
                cancel.cancel();
                drained.await
            }
            _ = cancel.cancelled() => {
                info!("Cancelled, draining workers");
                cancelled = true;
                drained.await
            }
        };

        // Workers are gone; make sure nothing upstream stays blocked
        cancel.cancel();

        let scheduler = match scheduler.await {
            Ok(exit) => Some(exit),
            Err(e) => {
                error!(error = %e, "Scheduler task failed");
                None
            }
        };
        let produce = match producer.await {
            Ok(summary) => summary,
            Err(e) => {
                error!(error = %e, "Producer task failed");
                ProduceSummary::default()
            }
        };

        let summary = RunSummary {
            produce,
            scheduler,
            stats: stats.snapshot(),
            handled,
            cancelled,
        };
        debug!(?summary, "Lifecycle::run_until: done");
        summary
    }

    /// Cancel and wait for the workers to drain
    pub async fn shutdown(self) -> RunSummary {
        self.cancel.cancel();
        self.run_until(std::future::pending()).await
    }
}
