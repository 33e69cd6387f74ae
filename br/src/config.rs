//! Bearer configuration types and loading

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};

use crate::scheduler::PipelineConfig;

/// Main configuration, optionally loaded from YAML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Shared HTTP client settings
    pub http: HttpConfig,

    /// Defaults for the run options; command-line values take precedence
    pub run: RunDefaults,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Project-local config: ./bearer.yml
        let local_config = PathBuf::from("bearer.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // User config: ~/.config/bearer/bearer.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("bearer").join("bearer.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let path = match config_path {
            Some(path) => path.clone(),
            None => {
                let local = PathBuf::from("bearer.yml");
                if local.exists() {
                    local
                } else {
                    dirs::config_dir()?.join("bearer").join("bearer.yml")
                }
            }
        };
        let content = fs::read_to_string(path).ok()?;
        let config: Self = serde_yaml::from_str(&content).ok()?;
        config.log_level
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Merge command-line values over file defaults and validate
    ///
    /// Fails naming the first missing or invalid option; nothing is started
    /// on failure.
    pub fn resolve(&self, source: Option<PathBuf>, jobs: Option<usize>, concurrency: Option<usize>) -> Result<RunConfig> {
        let source = source
            .or_else(|| self.run.source.clone())
            .ok_or_else(|| eyre!("The source path value must be set (-s/--source)"))?;
        let concurrency = concurrency
            .or(self.run.concurrency)
            .ok_or_else(|| eyre!("The concurrency value must be set (-c/--concurrency)"))?;
        let jobs = jobs
            .or(self.run.jobs)
            .ok_or_else(|| eyre!("The job count must be set (-j/--jobs)"))?;

        Ok(RunConfig {
            source,
            pipeline: PipelineConfig::new(jobs, concurrency)?,
            http: self.http.clone(),
        })
    }
}

/// Shared HTTP client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Connection establishment timeout in milliseconds
    #[serde(rename = "connect-timeout-ms")]
    pub connect_timeout_ms: u64,

    /// TCP keep-alive interval in milliseconds
    #[serde(rename = "keep-alive-ms")]
    pub keep_alive_ms: u64,

    /// Idle connections kept per host
    #[serde(rename = "pool-max-idle-per-host")]
    pub pool_max_idle_per_host: usize,

    /// Idle connection lifetime in milliseconds
    #[serde(rename = "pool-idle-timeout-ms")]
    pub pool_idle_timeout_ms: u64,

    /// User-Agent sent unless a job sets its own
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Keep no idle connections between requests
    #[serde(rename = "recycle-after-response")]
    pub recycle_after_response: bool,

    /// Honor HTTP_PROXY/HTTPS_PROXY from the environment
    #[serde(rename = "system-proxy")]
    pub system_proxy: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 30_000,
            keep_alive_ms: 30_000,
            pool_max_idle_per_host: 10,
            pool_idle_timeout_ms: 30_000,
            user_agent: format!("bearer/{}", env!("CARGO_PKG_VERSION")),
            recycle_after_response: true,
            system_proxy: true,
        }
    }
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_millis(self.keep_alive_ms)
    }

    pub fn pool_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.pool_idle_timeout_ms)
    }
}

/// Run option defaults from the config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunDefaults {
    pub source: Option<PathBuf>,
    pub jobs: Option<usize>,
    pub concurrency: Option<usize>,
}

/// Validated, immutable settings for one run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub source: PathBuf,
    pub pipeline: PipelineConfig,
    pub http: HttpConfig,
}
