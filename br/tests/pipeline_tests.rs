//! Pipeline tests for Bearer
//!
//! These drive the full producer -> scheduler -> worker pipeline from a job
//! directory, with a recording dispatcher in place of the network.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bearer::{DirSource, DispatchError, Dispatcher, Job, JobSource, Lifecycle, PipelineConfig};
use reqwest::StatusCode;
use tempfile::TempDir;

// =============================================================================
// Helpers
// =============================================================================

struct Recording {
    hold: Duration,
    urls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    finished: AtomicUsize,
}

impl Recording {
    fn new(hold: Duration) -> Arc<Self> {
        Arc::new(Self {
            hold,
            urls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.urls.lock().unwrap().len()
    }
}

#[async_trait]
impl Dispatcher for Recording {
    async fn dispatch(&self, job: &Job) -> Result<StatusCode, DispatchError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.urls.lock().unwrap().push(job.url().to_string());

        tokio::time::sleep(self.hold).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(StatusCode::OK)
    }
}

fn write_job(dir: &Path, name: &str, body: &str) {
    std::fs::write(dir.join(name), body).expect("Failed to write job definition");
}

fn job_dir(count: usize) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    for n in 0..count {
        write_job(
            dir.path(),
            &format!("{:02}.json", n),
            &format!(r#"{{"url":"http://target/{}","method":"GET"}}"#, n),
        );
    }
    dir
}

fn source(dir: &TempDir) -> Arc<dyn JobSource> {
    Arc::new(DirSource::new(dir.path()))
}

// =============================================================================
// Completion
// =============================================================================

#[tokio::test]
async fn test_two_definitions_three_passes_two_workers() {
    let dir = job_dir(2);
    let recording = Recording::new(Duration::from_millis(20));

    let lifecycle = Lifecycle::start(PipelineConfig::new(3, 2).unwrap(), source(&dir), recording.clone())
        .await
        .expect("Failed to start pipeline");
    let summary = tokio::time::timeout(Duration::from_secs(5), lifecycle.run_until(std::future::pending()))
        .await
        .expect("Pipeline should drain on its own");

    assert_eq!(recording.calls(), 6);
    assert!(recording.peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(summary.produce.produced, 6);
    assert_eq!(summary.stats.completed, 6);
    assert!(summary.stats.peak_in_flight <= 2);
    assert!(!summary.cancelled);
}

#[tokio::test]
async fn test_job_count_independent_of_workers() {
    let dir = job_dir(4);

    for workers in [1, 3, 8] {
        let recording = Recording::new(Duration::from_millis(1));
        let lifecycle = Lifecycle::start(PipelineConfig::new(5, workers).unwrap(), source(&dir), recording.clone())
            .await
            .unwrap();
        let summary = lifecycle.run_until(std::future::pending()).await;

        assert_eq!(recording.calls(), 20, "workers = {}", workers);
        assert_eq!(summary.handled, 20);
        assert!(recording.peak.load(Ordering::SeqCst) <= workers);
    }
}

#[tokio::test]
async fn test_definitions_offered_in_name_order() {
    let dir = job_dir(3);
    let recording = Recording::new(Duration::ZERO);

    let lifecycle = Lifecycle::start(PipelineConfig::new(1, 1).unwrap(), source(&dir), recording.clone())
        .await
        .unwrap();
    lifecycle.run_until(std::future::pending()).await;

    let urls = recording.urls.lock().unwrap().clone();
    assert_eq!(urls, vec!["http://target/0", "http://target/1", "http://target/2"]);
}

#[tokio::test]
async fn test_delay_holds_worker_slot() {
    let dir = TempDir::new().unwrap();
    write_job(dir.path(), "slow.json", r#"{"url":"http://target/slow","delay":60}"#);
    let recording = Recording::new(Duration::ZERO);

    let started = Instant::now();
    let lifecycle = Lifecycle::start(PipelineConfig::new(2, 1).unwrap(), source(&dir), recording.clone())
        .await
        .unwrap();
    lifecycle.run_until(std::future::pending()).await;

    assert_eq!(recording.calls(), 2);
    assert!(started.elapsed() >= Duration::from_millis(120));
}

// =============================================================================
// Failure handling
// =============================================================================

#[tokio::test]
async fn test_malformed_definition_skipped() {
    let dir = job_dir(2);
    write_job(dir.path(), "bad.json", "{ this is not json");
    write_job(dir.path(), "wrong-type.json", r#"{"url":"http://target/x","headers":{"X-N":1}}"#);
    let recording = Recording::new(Duration::ZERO);

    let lifecycle = Lifecycle::start(PipelineConfig::new(2, 2).unwrap(), source(&dir), recording.clone())
        .await
        .unwrap();
    let summary = lifecycle.run_until(std::future::pending()).await;

    assert_eq!(recording.calls(), 4);
    assert_eq!(summary.produce.skipped, 4);
    assert!(recording.urls.lock().unwrap().iter().all(|u| u != "http://target/x"));
}

#[tokio::test]
async fn test_oversized_delay_does_not_stall_single_worker() {
    let dir = TempDir::new().unwrap();
    write_job(dir.path(), "a.json", r#"{"url":"http://target/huge","delay":1e300}"#);
    write_job(dir.path(), "b.json", r#"{"url":"http://target/ok"}"#);
    let recording = Recording::new(Duration::ZERO);

    let lifecycle = Lifecycle::start(PipelineConfig::new(2, 1).unwrap(), source(&dir), recording.clone())
        .await
        .unwrap();
    let summary = tokio::time::timeout(Duration::from_secs(5), lifecycle.run_until(std::future::pending()))
        .await
        .expect("Pipeline should drain on its own");

    assert_eq!(recording.calls(), 2);
    assert_eq!(summary.produce.skipped, 2);
    assert_eq!(summary.stats.completed, 2);
    assert_eq!(summary.stats.in_flight, 0);
    assert_eq!(summary.handled, 2);
}

#[tokio::test]
async fn test_unreadable_source_fails_before_any_request() {
    let dir = TempDir::new().unwrap();
    let missing: Arc<dyn JobSource> = Arc::new(DirSource::new(dir.path().join("missing")));
    let recording = Recording::new(Duration::ZERO);

    let result = Lifecycle::start(PipelineConfig::new(1, 1).unwrap(), missing, recording.clone()).await;

    assert!(result.is_err());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(recording.calls(), 0);
}

// =============================================================================
// Shutdown
// =============================================================================

#[tokio::test]
async fn test_shutdown_waits_for_in_flight_jobs() {
    let dir = job_dir(1);
    let recording = Recording::new(Duration::from_millis(100));

    let lifecycle = Lifecycle::start(PipelineConfig::new(500, 3).unwrap(), source(&dir), recording.clone())
        .await
        .unwrap();
    let summary = tokio::time::timeout(
        Duration::from_secs(5),
        lifecycle.run_until(tokio::time::sleep(Duration::from_millis(150))),
    )
    .await
    .expect("Shutdown should not hang");

    assert!(summary.cancelled);
    assert_eq!(recording.in_flight.load(Ordering::SeqCst), 0);
    assert_eq!(recording.finished.load(Ordering::SeqCst), recording.calls());
    assert!(recording.calls() < 500);
    assert!(recording.peak.load(Ordering::SeqCst) <= 3);
    assert_eq!(summary.stats.in_flight, 0);
}

#[tokio::test]
async fn test_cancel_token_triggers_shutdown() {
    let dir = job_dir(2);
    let recording = Recording::new(Duration::from_millis(50));

    let lifecycle = Lifecycle::start(PipelineConfig::new(200, 2).unwrap(), source(&dir), recording.clone())
        .await
        .unwrap();
    let token = lifecycle.cancel_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(80)).await;
        token.cancel();
    });

    let summary = tokio::time::timeout(Duration::from_secs(5), lifecycle.run_until(std::future::pending()))
        .await
        .expect("Cancellation should stop the run");

    assert!(summary.cancelled);
    assert_eq!(recording.in_flight.load(Ordering::SeqCst), 0);
    assert_eq!(recording.finished.load(Ordering::SeqCst), recording.calls());
}

#[tokio::test]
async fn test_immediate_shutdown() {
    let dir = job_dir(1);
    let recording = Recording::new(Duration::from_millis(10));

    let lifecycle = Lifecycle::start(PipelineConfig::new(50, 2).unwrap(), source(&dir), recording.clone())
        .await
        .unwrap();
    let summary = tokio::time::timeout(Duration::from_secs(5), lifecycle.shutdown())
        .await
        .expect("Shutdown should not hang");

    assert!(summary.cancelled);
    assert_eq!(recording.finished.load(Ordering::SeqCst), recording.calls());
}
