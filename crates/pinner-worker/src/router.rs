//! Job router
//!
//! Maps a job's type tag to its orchestrator. Unknown tags are logged and
//! completed without side effects. On a retry every pin record of the payload
//! goes back to PINNING before orchestration starts.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use pinner_core::{Job, JobPayload, PinRecordUpdate};
use pinner_indexer::PinRecordStore;
use pinner_storage::ProviderSelector;

use crate::cleanup::cleanup_job_files;
use crate::context::{JobDispatcher, JobStatus};
use crate::error::PipelineError;
use crate::orchestrator::{
    update_best_effort, LogoPinOutcome, OrganizationLogoOrchestrator, ReleaseFilesOrchestrator,
    ReleasePinReport,
};

/// Successful result of one dispatched job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    ReleasePinned(ReleasePinReport),
    LogoPinned(LogoPinOutcome),
    /// No handler for this job type.
    Skipped { job_type: String },
}

pub struct JobRouter {
    store: Arc<dyn PinRecordStore>,
    release_files: ReleaseFilesOrchestrator,
    organization_logo: OrganizationLogoOrchestrator,
}

impl JobRouter {
    pub fn new(
        selector: Arc<ProviderSelector>,
        store: Arc<dyn PinRecordStore>,
        manifest_dir: PathBuf,
    ) -> Self {
        Self {
            release_files: ReleaseFilesOrchestrator::new(
                selector.clone(),
                store.clone(),
                manifest_dir,
            ),
            organization_logo: OrganizationLogoOrchestrator::new(selector, store.clone()),
            store,
        }
    }

    #[tracing::instrument(
        skip(self, job),
        fields(job.id = %job.id, job.type = %job.job_type, job.attempt = job.attempts_made + 1)
    )]
    pub async fn route(&self, job: &Job) -> Result<JobOutcome, PipelineError> {
        let Some(job_type) = job.known_type() else {
            tracing::warn!("Unknown job type, skipping");
            return Ok(JobOutcome::Skipped {
                job_type: job.job_type.clone(),
            });
        };

        let payload = JobPayload::parse(job_type, &job.payload).map_err(|e| {
            tracing::error!(error = %e, "Rejecting job with invalid payload");
            e
        })?;

        if job.is_retry() {
            self.reset_pin_records(&payload).await;
        }

        match payload {
            JobPayload::ReleaseFiles(p) => self
                .release_files
                .run(&p)
                .await
                .map(JobOutcome::ReleasePinned),
            JobPayload::OrganizationLogo(p) => self
                .organization_logo
                .run(&p)
                .await
                .map(JobOutcome::LogoPinned),
        }
    }

    /// Put every record of a retried job back to PINNING so observers never see
    /// a stale FAILED from the previous attempt while this one runs.
    async fn reset_pin_records(&self, payload: &JobPayload) {
        let ids = payload.pin_record_ids();
        tracing::info!(
            records = ids.len(),
            "Retry: resetting pin records to PINNING"
        );
        for id in ids {
            update_best_effort(self.store.as_ref(), id, PinRecordUpdate::pinning()).await;
        }
    }
}

#[async_trait]
impl JobDispatcher for JobRouter {
    async fn dispatch(&self, job: &Job) -> Result<JobOutcome, PipelineError> {
        self.route(job).await
    }

    async fn on_terminal(&self, job: &Job, status: JobStatus) {
        tracing::debug!(job_id = %job.id, status = ?status, "Job reached terminal state");
        cleanup_job_files(job).await;
    }
}
