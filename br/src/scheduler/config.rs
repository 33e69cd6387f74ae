//! Pipeline sizing

use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};

/// Sizes of the pipeline's buffers and worker pool
///
/// Both values are guaranteed non-zero once constructed through [`PipelineConfig::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Full production repetitions; also the inbox capacity
    jobs: usize,

    /// Worker count; also the work queue capacity
    concurrency: usize,
}

impl PipelineConfig {
    pub fn new(jobs: usize, concurrency: usize) -> Result<Self> {
        if jobs == 0 {
            return Err(eyre!("The job count must be greater than zero (-j/--jobs)"));
        }
        if concurrency == 0 {
            return Err(eyre!("The concurrency value must be greater than zero (-c/--concurrency)"));
        }
        Ok(Self { jobs, concurrency })
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn inbox_capacity(&self) -> usize {
        self.jobs
    }

    pub fn queue_capacity(&self) -> usize {
        self.concurrency
    }
}
