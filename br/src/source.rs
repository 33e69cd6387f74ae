//! Job sources - where job definitions are read from

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::error::SourceError;
use crate::job::JobDefinition;

/// Producer-facing view of a store of job definitions
///
/// `list` must fail when the store as a whole cannot be read; `read`
/// failures are local to one definition.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Names of all definitions, in the order they should be produced
    async fn list(&self) -> Result<Vec<String>, SourceError>;

    /// Read and parse one definition
    async fn read(&self, name: &str) -> Result<JobDefinition, SourceError>;

    /// Human readable location, used in logs
    fn describe(&self) -> String;
}

/// Reads one JSON definition per file from a directory
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        debug!(?root, "DirSource::new: called");
        Self { root }
    }
}

#[async_trait]
impl JobSource for DirSource {
    async fn list(&self) -> Result<Vec<String>, SourceError> {
        debug!(root = ?self.root, "DirSource::list: called");
        let list_err = |source| SourceError::List {
            path: self.root.clone(),
            source,
        };

        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(list_err)?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(list_err)? {
            let file_type = match entry.file_type().await {
                Ok(t) => t,
                Err(e) => {
                    debug!(path = ?entry.path(), %e, "DirSource::list: cannot stat entry, skipping");
                    continue;
                }
            };
            if file_type.is_dir() {
                debug!(path = ?entry.path(), "DirSource::list: skipping directory");
                continue;
            }
            names.push(entry.file_name().to_string_lossy().into_owned());
        }

        names.sort();
        debug!(count = names.len(), "DirSource::list: done");
        Ok(names)
    }

    async fn read(&self, name: &str) -> Result<JobDefinition, SourceError> {
        let path = self.root.join(name);
        debug!(?path, "DirSource::read: called");

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| SourceError::Read { path: path.clone(), source })?;

        JobDefinition::from_slice(&bytes).map_err(|source| SourceError::Parse {
            name: name.to_string(),
            source,
        })
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}
