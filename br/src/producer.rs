//! Producer - re-reads the job source and feeds the inbox

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::job::Job;
use crate::scheduler::{InboxSender, PipelineStats};
use crate::source::JobSource;

/// What a producer run achieved
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProduceSummary {
    /// Repetitions that ran to the end of the source
    pub repetitions: usize,

    /// Jobs accepted by the inbox
    pub produced: u64,

    /// Definitions that could not be read or validated
    pub skipped: u64,

    /// Stopped early by cancellation, a closed inbox or a source failure
    pub stopped_early: bool,
}

enum Step {
    Continue,
    Stop,
}

/// Pushes every job in the source into the inbox, `repetitions` times over
pub struct Producer {
    source: Arc<dyn JobSource>,
    repetitions: usize,
    stats: Arc<PipelineStats>,
}

impl Producer {
    pub fn new(source: Arc<dyn JobSource>, repetitions: usize, stats: Arc<PipelineStats>) -> Self {
        debug!(repetitions, source = %source.describe(), "Producer::new: called");
        Self {
            source,
            repetitions,
            stats,
        }
    }

    /// Produce until done or cancelled
    ///
    /// Dropping `inbox` on return is what tells the scheduler production is
    /// over.
    pub async fn run(self, inbox: InboxSender, cancel: CancellationToken) -> ProduceSummary {
        debug!(repetitions = self.repetitions, "Producer::run: called");
        let mut summary = ProduceSummary::default();

        for repetition in 0..self.repetitions {
            if cancel.is_cancelled() {
                debug!(repetition, "Producer::run: cancelled between repetitions");
                summary.stopped_early = true;
                break;
            }

            let names = match self.source.list().await {
                Ok(names) => names,
                Err(e) => {
                    error!(error = %e, repetition, "Job source unreadable, stopping production");
                    summary.stopped_early = true;
                    break;
                }
            };

            let mut stop = false;
            for name in &names {
                if let Step::Stop = self.produce_one(name, &inbox, &cancel, &mut summary).await {
                    stop = true;
                    break;
                }
            }
            if stop {
                summary.stopped_early = true;
                break;
            }

            summary.repetitions += 1;
            debug!(repetition, jobs = names.len(), "Producer::run: repetition complete");
        }

        info!(
            repetitions = summary.repetitions,
            produced = summary.produced,
            skipped = summary.skipped,
            stopped_early = summary.stopped_early,
            "Producer finished"
        );
        summary
    }

    async fn produce_one(
        &self,
        name: &str,
        inbox: &InboxSender,
        cancel: &CancellationToken,
        summary: &mut ProduceSummary,
    ) -> Step {
        if cancel.is_cancelled() {
            debug!(%name, "Producer::produce_one: cancelled before read");
            return Step::Stop;
        }

        let job = match self.source.read(name).await {
            Ok(def) => match Job::try_from(def) {
                Ok(job) => job,
                Err(e) => {
                    warn!(%name, error = %e, "Skipping invalid job definition");
                    summary.skipped += 1;
                    self.stats.record_skipped();
                    return Step::Continue;
                }
            },
            Err(e) => {
                warn!(error = %e, "Skipping unreadable job definition");
                summary.skipped += 1;
                self.stats.record_skipped();
                return Step::Continue;
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(%name, "Producer::produce_one: cancelled while inbox full");
                Step::Stop
            }
            sent = inbox.send(job) => match sent {
                Ok(()) => {
                    summary.produced += 1;
                    self.stats.record_produced();
                    Step::Continue
                }
                Err(_) => {
                    debug!(%name, "Producer::produce_one: inbox closed");
                    Step::Stop
                }
            },
        }
    }
}
