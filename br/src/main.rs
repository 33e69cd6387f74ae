//! Bearer - CLI entry point

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use eyre::{Context, Result};
use tracing::info;

use bearer::cli::Cli;
use bearer::config::Config;
use bearer::{DirSource, Dispatcher, HttpDispatcher, JobSource, Lifecycle, ShutdownSignal};

fn setup_logging(level: Option<&str>, log_file: Option<&PathBuf>) -> Result<()> {
    let level = match level.map(|s| s.to_uppercase()) {
        None => tracing::Level::INFO,
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
    };

    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    match log_file {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir).context("Failed to create log directory")?;
            }
            let file = fs::File::create(path).context("Failed to create log file")?;
            tracing_subscriber::fmt()
                .with_writer(file)
                .with_ansi(false)
                .with_env_filter(filter)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(filter)
                .init();
        }
    }

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log level priority: CLI > config file > INFO
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref().or(config_log_level.as_deref()), cli.log_file.as_ref())
        .context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let run = config.resolve(cli.source, cli.jobs, cli.concurrency)?;
    info!(
        source = %run.source.display(),
        jobs = run.pipeline.jobs(),
        concurrency = run.pipeline.concurrency(),
        "Bearer {} configured",
        env!("CARGO_PKG_VERSION")
    );

    // Register handlers before any work starts so no signal is missed
    let shutdown = ShutdownSignal::install().context("Failed to install signal handlers")?;

    let source: Arc<dyn JobSource> = Arc::new(DirSource::new(&run.source));
    let dispatcher: Arc<dyn Dispatcher> = Arc::new(HttpDispatcher::new(&run.http)?);

    let lifecycle = Lifecycle::start(run.pipeline, source, dispatcher).await?;
    info!("Running. Press Ctrl+C to stop.");

    let summary = lifecycle.run_until(shutdown.recv()).await;
    info!(
        produced = summary.produce.produced,
        skipped = summary.produce.skipped,
        dispatched = summary.stats.dispatched,
        completed = summary.stats.completed,
        failed = summary.stats.failed,
        peak_in_flight = summary.stats.peak_in_flight,
        cancelled = summary.cancelled,
        "Run finished"
    );
    Ok(())
}
