//! Error types for job definitions, job sources and dispatch

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while turning a stored definition into a Job
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Invalid job definition: {0}")]
    Definition(#[source] serde_json::Error),

    #[error("Invalid payload JSON: {0}")]
    Payload(#[source] serde_json::Error),

    #[error("Invalid HTTP method '{0}'")]
    InvalidMethod(String),

    #[error("Invalid delay {0}ms")]
    InvalidDelay(f64),
}

/// Errors produced by a job source
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to list job source {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read job definition {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Skipping job definition {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: JobError,
    },
}

impl SourceError {
    /// A listing failure means the whole source is unusable
    pub fn is_fatal(&self) -> bool {
        matches!(self, SourceError::List { .. })
    }
}

/// Errors that abort a single dispatch
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to build request: {0}")]
    Build(#[source] reqwest::Error),

    #[error("Error during HTTP request: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Error reading response body: {0}")]
    ReadBody(#[source] reqwest::Error),
}

impl DispatchError {
    /// Check if the request never produced a response
    pub fn is_transport(&self) -> bool {
        matches!(self, DispatchError::Transport(_))
    }

    /// Check if the job was abandoned before anything was sent
    pub fn is_build(&self) -> bool {
        matches!(self, DispatchError::Serialize(_) | DispatchError::Build(_))
    }
}
