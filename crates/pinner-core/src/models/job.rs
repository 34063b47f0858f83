use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

use crate::constants::{JOB_TYPE_ORGANIZATION_LOGO, JOB_TYPE_RELEASE_FILES};
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum JobType {
    #[serde(rename = "pin-release-files")]
    ReleaseFiles,
    #[serde(rename = "pin-organization-logo")]
    OrganizationLogo,
}

impl Display for JobType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            JobType::ReleaseFiles => write!(f, "{}", JOB_TYPE_RELEASE_FILES),
            JobType::OrganizationLogo => write!(f, "{}", JOB_TYPE_ORGANIZATION_LOGO),
        }
    }
}

impl FromStr for JobType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            JOB_TYPE_RELEASE_FILES => Ok(JobType::ReleaseFiles),
            JOB_TYPE_ORGANIZATION_LOGO => Ok(JobType::OrganizationLogo),
            _ => Err(anyhow::anyhow!("Invalid job type: {}", s)),
        }
    }
}

/// A job as delivered by the queue: a raw type tag, an opaque payload and the
/// number of earlier delivery attempts.
///
/// The tag stays a string so that unknown job types can be logged and skipped
/// instead of failing deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub job_type: String,
    pub payload: serde_json::Value,
    /// Zero on first delivery, incremented for every requeued retry.
    pub attempts_made: u32,
    pub enqueued_at: DateTime<Utc>,
}

impl Job {
    pub fn new(job_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_type: job_type.into(),
            payload,
            attempts_made: 0,
            enqueued_at: Utc::now(),
        }
    }

    pub fn is_retry(&self) -> bool {
        self.attempts_made > 0
    }

    /// The same job, redelivered after a failed attempt.
    pub fn next_attempt(&self) -> Self {
        Self {
            attempts_made: self.attempts_made + 1,
            ..self.clone()
        }
    }

    /// Parse the job type tag. Returns `None` for tags this pipeline does not handle.
    pub fn known_type(&self) -> Option<JobType> {
        self.job_type.parse().ok()
    }
}

/// A local temp file waiting to be pinned, tied to an indexer pin record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub temp_path: PathBuf,
    pub original_name: String,
    pub pin_id: String,
}

impl FileDescriptor {
    fn validate(&self, field: &str) -> Result<(), ValidationError> {
        if self.temp_path.as_os_str().is_empty() {
            return Err(ValidationError::EmptyField(format!("{field}.tempPath")));
        }
        if self.pin_id.trim().is_empty() {
            return Err(ValidationError::EmptyField(format!("{field}.pinId")));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseFilesPayload {
    pub organization_id: String,
    pub release_id: String,
    #[serde(default)]
    pub main_file: Option<FileDescriptor>,
    #[serde(default)]
    pub thumbnails: Vec<FileDescriptor>,
    /// Thumbnails pinned by an earlier job, carried into the manifest without re-upload.
    #[serde(
        default,
        rename = "existingThumbnailCIDs",
        alias = "existingThumbnailCids"
    )]
    pub existing_thumbnail_cids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationLogoPayload {
    pub organization_id: String,
    pub temp_path: PathBuf,
    pub original_name: String,
    pub pin_id: String,
}

/// Payload narrowed to the shape its job type expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobPayload {
    ReleaseFiles(ReleaseFilesPayload),
    OrganizationLogo(OrganizationLogoPayload),
}

impl JobPayload {
    /// Deserialize and validate `payload` as the shape required by `job_type`.
    pub fn parse(job_type: JobType, payload: &serde_json::Value) -> Result<Self, ValidationError> {
        let parsed = Self::from_value(job_type, payload)?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Deserialize `payload` as the shape required by `job_type` without
    /// checking field contents.
    pub fn from_value(
        job_type: JobType,
        payload: &serde_json::Value,
    ) -> Result<Self, ValidationError> {
        let malformed = |source| ValidationError::Malformed {
            job_type: job_type.to_string(),
            source,
        };

        let parsed = match job_type {
            JobType::ReleaseFiles => JobPayload::ReleaseFiles(
                serde_json::from_value(payload.clone()).map_err(malformed)?,
            ),
            JobType::OrganizationLogo => JobPayload::OrganizationLogo(
                serde_json::from_value(payload.clone()).map_err(malformed)?,
            ),
        };
        Ok(parsed)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            JobPayload::ReleaseFiles(p) => {
                non_empty("organizationId", &p.organization_id)?;
                non_empty("releaseId", &p.release_id)?;
                if let Some(main) = &p.main_file {
                    main.validate("mainFile")?;
                }
                for (i, thumb) in p.thumbnails.iter().enumerate() {
                    thumb.validate(&format!("thumbnails[{i}]"))?;
                }
                Ok(())
            }
            JobPayload::OrganizationLogo(p) => {
                non_empty("organizationId", &p.organization_id)?;
                non_empty("pinId", &p.pin_id)?;
                if p.temp_path.as_os_str().is_empty() {
                    return Err(ValidationError::EmptyField("tempPath".to_string()));
                }
                Ok(())
            }
        }
    }

    /// Pin record ids referenced by the payload, in payload order.
    pub fn pin_record_ids(&self) -> Vec<&str> {
        match self {
            JobPayload::ReleaseFiles(p) => p
                .main_file
                .iter()
                .chain(p.thumbnails.iter())
                .map(|f| f.pin_id.as_str())
                .collect(),
            JobPayload::OrganizationLogo(p) => vec![p.pin_id.as_str()],
        }
    }

    /// Local temp files referenced by the payload, in payload order. Empty
    /// paths are left out.
    pub fn temp_paths(&self) -> Vec<&Path> {
        let paths: Vec<&Path> = match self {
            JobPayload::ReleaseFiles(p) => p
                .main_file
                .iter()
                .chain(p.thumbnails.iter())
                .map(|f| f.temp_path.as_path())
                .collect(),
            JobPayload::OrganizationLogo(p) => vec![p.temp_path.as_path()],
        };
        paths
            .into_iter()
            .filter(|path| !path.as_os_str().is_empty())
            .collect()
    }
}

fn non_empty(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::EmptyField(field.to_string()))
    } else {
        Ok(())
    }
}
