//! Bearer - concurrent HTTP load generator
//!
//! Bearer replays a directory of JSON job definitions as HTTP requests. Jobs
//! flow through two bounded buffers into a fixed pool of workers, so the
//! number of requests in flight never exceeds the configured concurrency.
//!
//! # Modules
//!
//! - [`job`] - job definitions and the validated [`Job`] value
//! - [`source`] - where definitions come from
//! - [`producer`] - repeated passes over the source into the inbox
//! - [`scheduler`] - inbox to work queue forwarding and pipeline counters
//! - [`worker`] - worker pool, executor and the HTTP dispatcher
//! - [`lifecycle`] - startup wiring and graceful shutdown
//! - [`config`] / [`cli`] - configuration and command line

pub mod cli;
pub mod config;
pub mod error;
pub mod job;
pub mod lifecycle;
pub mod producer;
pub mod scheduler;
pub mod signal;
pub mod source;
pub mod worker;

pub use config::{Config, HttpConfig, RunConfig};
pub use error::{DispatchError, JobError, SourceError};
pub use job::{Job, JobDefinition};
pub use lifecycle::{Lifecycle, RunSummary};
pub use producer::{ProduceSummary, Producer};
pub use scheduler::{PipelineConfig, PipelineStats, Scheduler, SchedulerExit, StatsSnapshot};
pub use signal::ShutdownSignal;
pub use source::{DirSource, JobSource};
pub use worker::{Dispatcher, Executor, HttpDispatcher, WorkerPool};
