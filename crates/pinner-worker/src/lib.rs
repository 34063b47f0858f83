//! Pinner Worker
//!
//! Routes queued jobs to the pin orchestrators, runs them on a bounded worker
//! pool with retry and backoff, and removes local temp files once a job reaches
//! a terminal state.
//!
//! Data flow: [`JobQueue`] delivers a [`pinner_core::Job`] to the [`JobRouter`],
//! which validates the payload, resets pin records on retries, and hands the
//! payload to the release-files or organization-logo orchestrator. Orchestrators
//! resolve a provider through [`pinner_storage::ProviderSelector`] and report
//! per-file status through [`pinner_indexer::PinRecordStore`].

pub mod cleanup;
pub mod context;
pub mod error;
pub mod orchestrator;
pub mod queue;
pub mod router;
pub mod telemetry;

pub use cleanup::{cleanup_job_files, remove_temp_files, CleanupReport};
pub use context::{JobDispatcher, JobStatus};
pub use error::PipelineError;
pub use orchestrator::{
    FileOutcome, FileRole, LogoPinOutcome, ManifestOutcome, ManifestSkip, ManifestStep,
    OrganizationLogoOrchestrator, ReleaseFilesOrchestrator, ReleasePinReport, StatusSync,
};
pub use queue::{JobFinishedSender, JobQueue, JobQueueConfig};
pub use router::{JobOutcome, JobRouter};
