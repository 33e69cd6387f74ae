//! Executor - runs one job on behalf of a worker

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::error::DispatchError;
use crate::job::Job;
use crate::scheduler::PipelineStats;

/// Sends a job somewhere and reports what came back
///
/// Implementations own request building, sending and response handling.
/// Errors are terminal to the one dispatch; nothing is retried.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, job: &Job) -> Result<StatusCode, DispatchError>;
}

/// Applies a job's delay, hands it to the dispatcher and records the outcome
pub struct Executor {
    dispatcher: Arc<dyn Dispatcher>,
    stats: Arc<PipelineStats>,
}

impl Executor {
    pub fn new(dispatcher: Arc<dyn Dispatcher>, stats: Arc<PipelineStats>) -> Self {
        debug!("Executor::new: called");
        Self { dispatcher, stats }
    }

    /// Run one job to completion
    ///
    /// The delay counts against the calling worker's slot.
    pub async fn execute(&self, job: Job) {
        debug!(method = %job.method(), url = %job.url(), "Executor::execute: called");
        self.stats.start();

        if let Some(delay) = job.delay() {
            debug!(?delay, "Executor::execute: delaying");
            tokio::time::sleep(delay).await;
        }

        let success = match self.dispatcher.dispatch(&job).await {
            Ok(status) => {
                debug!(%status, url = %job.url(), "Executor::execute: dispatched");
                true
            }
            Err(e) => {
                warn!(method = %job.method(), url = %job.url(), error = %e, "Job failed");
                false
            }
        };

        self.stats.finish(success);
    }
}
