//! Job dispatch seam
//!
//! The queue only knows this trait. [`crate::JobRouter`] implements it; tests
//! substitute scripted dispatchers.

use async_trait::async_trait;

use pinner_core::Job;

use crate::error::PipelineError;
use crate::router::JobOutcome;

/// Terminal state of a job as decided by the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Completed,
    Failed,
}

#[async_trait]
pub trait JobDispatcher: Send + Sync {
    /// Run one delivery attempt of `job`. An error asks the queue to apply its retry policy.
    async fn dispatch(&self, job: &Job) -> Result<JobOutcome, PipelineError>;

    /// Called exactly once when `job` will not be delivered again.
    async fn on_terminal(&self, job: &Job, status: JobStatus);
}
