//! CLI argument parsing

use std::path::PathBuf;

use clap::{ArgAction, Parser};

/// Bearer - concurrent HTTP load generator
#[derive(Parser, Debug)]
#[command(
    name = "bearer",
    about = "Replay JSON job definitions as HTTP load at a fixed concurrency",
    version,
    disable_version_flag = true
)]
pub struct Cli {
    /// Print the program name and version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    pub version: Option<bool>,

    /// Directory of job definitions
    #[arg(short = 's', long = "source", value_name = "DIR")]
    pub source: Option<PathBuf>,

    /// Number of full passes over the job definitions
    #[arg(short = 'j', long = "jobs", value_name = "N")]
    pub jobs: Option<usize>,

    /// Number of concurrent connections (workers)
    #[arg(short = 'c', long = "concurrency", value_name = "N")]
    pub concurrency: Option<usize>,

    /// Path to config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Write logs to a file instead of stderr
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}
