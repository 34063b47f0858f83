//! Pipeline error taxonomy
//!
//! Every job-level failure is a [`PipelineError`]. The queue asks
//! [`PipelineError::is_recoverable`] whether another attempt can help.

use std::path::PathBuf;
use std::time::Duration;

use pinner_core::ValidationError;
use pinner_indexer::IndexerError;
use pinner_storage::ProviderError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid job payload: {0}")]
    Validation(#[from] ValidationError),

    /// Upload, pin, or provider selection failure.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Pin record sync failed: {0}")]
    IndexerSync(#[from] IndexerError),

    #[error("Temp file unavailable at {}: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write manifest: {0}")]
    ManifestWrite(String),

    /// One or more file-level steps of a release run failed.
    #[error("Release {release_id} pinned incompletely: {failed} step(s) failed")]
    ReleaseIncomplete { release_id: String, failed: usize },

    #[error("Job timed out after {0:?}")]
    Timeout(Duration),
}

impl PipelineError {
    /// Whether retrying the whole job can succeed. A bad payload or a missing
    /// temp file will look the same on every attempt.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            PipelineError::Validation(_) | PipelineError::FileSystem { .. }
        )
    }

    pub fn is_no_provider(&self) -> bool {
        matches!(
            self,
            PipelineError::Provider(ProviderError::NoProviderAvailable)
        )
    }
}
