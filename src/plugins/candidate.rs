//! Plugin candidates and the metadata protocol
//!
//! A candidate is an executable that might be a plugin. The only thing we
//! ever ask of it before validation is its metadata, obtained by running
//! `<path> docker-cli-plugin-metadata` and capturing standard output.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{HostError, Result};

use super::types::METADATA_SUBCOMMAND_NAME;

/// Default upper bound on how long a plugin may take to print its metadata.
pub const DEFAULT_METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// An unvalidated executable that might be a plugin.
#[async_trait]
pub trait Candidate: Send + Sync {
    /// Filesystem path of the executable.
    fn path(&self) -> &Path;

    /// Raw bytes the executable prints for the metadata subcommand.
    async fn metadata(&self) -> Result<Vec<u8>>;
}

/// A candidate that is queried by actually executing it.
#[derive(Debug, Clone)]
pub struct ExecCandidate {
    path: PathBuf,
    timeout: Duration,
}

impl ExecCandidate {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            timeout: DEFAULT_METADATA_TIMEOUT,
        }
    }

    /// Override how long the metadata subcommand may run before it is killed.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Candidate for ExecCandidate {
    fn path(&self) -> &Path {
        &self.path
    }

    async fn metadata(&self) -> Result<Vec<u8>> {
        debug!(path = %self.path.display(), "Fetching plugin metadata");

        // Dropping the future on timeout kills the child.
        let output = tokio::time::timeout(
            self.timeout,
            Command::new(&self.path)
                .arg(METADATA_SUBCOMMAND_NAME)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| HostError::MetadataTimeout(self.timeout))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            return Err(HostError::MetadataCommand(if stderr.is_empty() {
                output.status.to_string()
            } else {
                format!("{}: {}", output.status, stderr)
            }));
        }

        Ok(output.stdout)
    }
}
