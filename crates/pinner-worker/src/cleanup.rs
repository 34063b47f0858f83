//! Temp file cleanup for jobs that reached a terminal state.
//!
//! Each path is removed independently. A path that is already gone counts as
//! cleaned, so running cleanup twice is harmless.

use std::io;
use std::path::{Path, PathBuf};

use pinner_core::{Job, JobPayload};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    pub already_absent: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

pub async fn remove_temp_files(paths: &[&Path]) -> CleanupReport {
    let mut report = CleanupReport::default();

    for path in paths {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Removed temp file");
                report.removed.push(path.to_path_buf());
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                report.already_absent.push(path.to_path_buf());
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove temp file");
                report.failed.push(path.to_path_buf());
            }
        }
    }

    report
}

/// Remove every temp file referenced by `job`'s payload.
///
/// Only the payload's shape matters here: a job rejected for an empty id still
/// gets its files removed. Jobs of unknown type or with a payload that does not
/// deserialize reference nothing this pipeline created, so nothing is removed.
pub async fn cleanup_job_files(job: &Job) -> CleanupReport {
    let Some(job_type) = job.known_type() else {
        return CleanupReport::default();
    };

    let payload = match JobPayload::from_value(job_type, &job.payload) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::debug!(
                job_id = %job.id,
                error = %e,
                "No temp files to clean for malformed payload"
            );
            return CleanupReport::default();
        }
    };

    let report = remove_temp_files(&payload.temp_paths()).await;
    if report.is_clean() {
        tracing::info!(
            job_id = %job.id,
            removed = report.removed.len(),
            already_absent = report.already_absent.len(),
            "Temp file cleanup finished"
        );
    } else {
        tracing::warn!(
            job_id = %job.id,
            removed = report.removed.len(),
            failed = report.failed.len(),
            "Temp file cleanup left files behind"
        );
    }
    report
}
