//! Scheduler for the job pipeline
//!
//! Owns the two bounded buffers (inbox and work queue) and the single task
//! that moves jobs between them.

mod config;
mod core;
mod queue;

pub use config::PipelineConfig;
pub use core::{Scheduler, SchedulerExit};
pub use queue::{
    InboxReceiver, InboxSender, PipelineStats, StatsSnapshot, WorkQueue, WorkQueueSender, inbox, work_queue,
};
