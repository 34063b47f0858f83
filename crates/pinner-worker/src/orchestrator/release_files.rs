//! Release-files pinning
//!
//! Pins a release's main file, then each thumbnail, then a manifest listing
//! every thumbnail CID of the release. Each file reports its own status to the
//! indexer; a failed file never stops the remaining files from being attempted.
//! The manifest is only built when every earlier step succeeded.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use pinner_core::constants::MANIFEST_FILE_PREFIX;
use pinner_core::{FileDescriptor, Manifest, PinRecordUpdate, ReleaseFilesPayload};
use pinner_indexer::PinRecordStore;
use pinner_storage::{PersistenceProvider, ProviderSelector};

use super::update_best_effort;
use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    Main,
    Thumbnail,
}

/// Result of pinning one file of a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub pin_id: String,
    pub role: FileRole,
    pub cid: Option<String>,
    pub error: Option<String>,
}

impl FileOutcome {
    pub fn is_failure(&self) -> bool {
        self.cid.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestOutcome {
    pub pin_id: String,
    pub cid: String,
    pub thumbnail_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestSkip {
    /// A main-file or thumbnail step failed.
    EarlierFailure,
    /// Neither existing nor newly pinned thumbnails.
    NoThumbnails,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestStep {
    Pinned(ManifestOutcome),
    Skipped(ManifestSkip),
    Failed(String),
}

/// What a release run did, file by file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasePinReport {
    pub release_id: String,
    /// `None` when the release had nothing to pin.
    pub provider: Option<String>,
    pub files: Vec<FileOutcome>,
    pub manifest: ManifestStep,
}

impl ReleasePinReport {
    pub fn failed_steps(&self) -> usize {
        let files = self.files.iter().filter(|f| f.is_failure()).count();
        let manifest = usize::from(matches!(self.manifest, ManifestStep::Failed(_)));
        files + manifest
    }

    pub fn any_failure(&self) -> bool {
        self.failed_steps() > 0
    }

    /// CIDs of the thumbnails pinned during this run, in payload order.
    pub fn thumbnail_cids(&self) -> Vec<&str> {
        self.files
            .iter()
            .filter(|f| f.role == FileRole::Thumbnail)
            .filter_map(|f| f.cid.as_deref())
            .collect()
    }
}

pub struct ReleaseFilesOrchestrator {
    selector: Arc<ProviderSelector>,
    store: Arc<dyn PinRecordStore>,
    manifest_dir: PathBuf,
}

impl ReleaseFilesOrchestrator {
    pub fn new(
        selector: Arc<ProviderSelector>,
        store: Arc<dyn PinRecordStore>,
        manifest_dir: PathBuf,
    ) -> Self {
        Self {
            selector,
            store,
            manifest_dir,
        }
    }

    /// Pin every file of the release.
    ///
    /// Returns the report when every step succeeded, and
    /// [`PipelineError::ReleaseIncomplete`] after all files were attempted
    /// when at least one step failed.
    #[tracing::instrument(
        skip(self, payload),
        fields(
            release_id = %payload.release_id,
            organization_id = %payload.organization_id,
            thumbnails = payload.thumbnails.len()
        )
    )]
    pub async fn run(
        &self,
        payload: &ReleaseFilesPayload,
    ) -> Result<ReleasePinReport, PipelineError> {
        if payload.main_file.is_none()
            && payload.thumbnails.is_empty()
            && payload.existing_thumbnail_cids.is_empty()
        {
            tracing::info!("Release has nothing to pin");
            return Ok(ReleasePinReport {
                release_id: payload.release_id.clone(),
                provider: None,
                files: Vec::new(),
                manifest: ManifestStep::Skipped(ManifestSkip::NoThumbnails),
            });
        }

        // One provider for the whole run.
        let provider = match self.selector.select().await {
            Ok(provider) => provider,
            Err(e) => {
                tracing::error!(error = %e, "No pinning provider available for release");
                for file in payload.main_file.iter().chain(payload.thumbnails.iter()) {
                    update_best_effort(
                        self.store.as_ref(),
                        &file.pin_id,
                        PinRecordUpdate::failed(None),
                    )
                    .await;
                }
                return Err(e.into());
            }
        };

        let mut files = Vec::with_capacity(payload.thumbnails.len() + 1);

        if let Some(main) = &payload.main_file {
            let result = self.pin_main_file(provider.as_ref(), main).await;
            files.push(
                self.settle(provider.as_ref(), main, FileRole::Main, result)
                    .await,
            );
        }

        for thumbnail in &payload.thumbnails {
            let result = self.pin_thumbnail(provider.as_ref(), thumbnail).await;
            files.push(
                self.settle(provider.as_ref(), thumbnail, FileRole::Thumbnail, result)
                    .await,
            );
        }

        let earlier_failure = files.iter().any(FileOutcome::is_failure);
        let manifest = if earlier_failure {
            tracing::warn!("Skipping manifest because an earlier file failed");
            ManifestStep::Skipped(ManifestSkip::EarlierFailure)
        } else {
            let new_cids: Vec<String> = files
                .iter()
                .filter(|f| f.role == FileRole::Thumbnail)
                .filter_map(|f| f.cid.clone())
                .collect();
            let manifest = Manifest::compose(&payload.existing_thumbnail_cids, &new_cids);

            if manifest.is_empty() {
                tracing::debug!("Release has no thumbnails, no manifest to pin");
                ManifestStep::Skipped(ManifestSkip::NoThumbnails)
            } else {
                match self
                    .pin_manifest(provider.as_ref(), &payload.release_id, &manifest)
                    .await
                {
                    Ok(outcome) => ManifestStep::Pinned(outcome),
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to pin release manifest");
                        ManifestStep::Failed(e.to_string())
                    }
                }
            }
        };

        let report = ReleasePinReport {
            release_id: payload.release_id.clone(),
            provider: Some(provider.name().to_string()),
            files,
            manifest,
        };

        if report.any_failure() {
            let failed = report.failed_steps();
            tracing::error!(failed_steps = failed, "Release pinned incompletely");
            return Err(PipelineError::ReleaseIncomplete {
                release_id: payload.release_id.clone(),
                failed,
            });
        }

        tracing::info!(
            provider = %provider.name(),
            files = report.files.len(),
            "Release pinned"
        );
        Ok(report)
    }

    async fn pin_main_file(
        &self,
        provider: &dyn PersistenceProvider,
        file: &FileDescriptor,
    ) -> Result<String, PipelineError> {
        let added = provider.add(&file.temp_path, &file.original_name).await?;
        provider.pin(&added.cid, &file.original_name).await?;

        let update = PinRecordUpdate::pinned(&added.cid, provider.name())
            .with_asset_hash(&added.content_hash);
        self.store.update_pin_record(&file.pin_id, &update).await?;

        Ok(added.cid)
    }

    async fn pin_thumbnail(
        &self,
        provider: &dyn PersistenceProvider,
        file: &FileDescriptor,
    ) -> Result<String, PipelineError> {
        let added = provider.add(&file.temp_path, &file.original_name).await?;

        let update = PinRecordUpdate::pinned(&added.cid, provider.name());
        self.store.update_pin_record(&file.pin_id, &update).await?;

        Ok(added.cid)
    }

    /// Turn a file result into its outcome, marking the record FAILED on error.
    async fn settle(
        &self,
        provider: &dyn PersistenceProvider,
        file: &FileDescriptor,
        role: FileRole,
        result: Result<String, PipelineError>,
    ) -> FileOutcome {
        match result {
            Ok(cid) => {
                tracing::info!(pin_id = %file.pin_id, role = ?role, cid = %cid, "File pinned");
                FileOutcome {
                    pin_id: file.pin_id.clone(),
                    role,
                    cid: Some(cid),
                    error: None,
                }
            }
            Err(e) => {
                tracing::error!(
                    pin_id = %file.pin_id,
                    role = ?role,
                    file = %file.original_name,
                    error = %e,
                    "Failed to pin file"
                );
                update_best_effort(
                    self.store.as_ref(),
                    &file.pin_id,
                    PinRecordUpdate::failed(Some(provider.name())),
                )
                .await;
                FileOutcome {
                    pin_id: file.pin_id.clone(),
                    role,
                    cid: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Write the manifest to a temp file, pin it and record it. The temp file is
    /// removed on every path out of this function.
    async fn pin_manifest(
        &self,
        provider: &dyn PersistenceProvider,
        release_id: &str,
        manifest: &Manifest,
    ) -> Result<ManifestOutcome, PipelineError> {
        let prefix = format!("{}{}-", MANIFEST_FILE_PREFIX, file_safe(release_id));
        let temp = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".json")
            .tempfile_in(&self.manifest_dir)
            .map_err(|e| {
                PipelineError::ManifestWrite(format!(
                    "cannot create temp file in {}: {}",
                    self.manifest_dir.display(),
                    e
                ))
            })?;

        let result = self
            .upload_manifest(provider, release_id, manifest, temp.path())
            .await;

        let path = temp.path().to_path_buf();
        if let Err(e) = temp.close() {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to remove temporary manifest file"
            );
        }

        result
    }

    async fn upload_manifest(
        &self,
        provider: &dyn PersistenceProvider,
        release_id: &str,
        manifest: &Manifest,
        path: &Path,
    ) -> Result<ManifestOutcome, PipelineError> {
        let bytes = manifest
            .to_json_bytes()
            .map_err(|e| PipelineError::ManifestWrite(e.to_string()))?;
        tokio::fs::write(path, &bytes)
            .await
            .map_err(|e| PipelineError::ManifestWrite(e.to_string()))?;

        let filename = format!("{}{}.json", MANIFEST_FILE_PREFIX, release_id);
        let added = provider.add(path, &filename).await?;
        provider.pin(&added.cid, &filename).await?;

        let pin_id = self.store.create_manifest_pin_record(release_id).await?;
        let update = PinRecordUpdate::pinned(&added.cid, provider.name());
        if let Err(e) = self.store.update_pin_record(&pin_id, &update).await {
            update_best_effort(
                self.store.as_ref(),
                &pin_id,
                PinRecordUpdate::failed(Some(provider.name())),
            )
            .await;
            return Err(e.into());
        }

        tracing::info!(
            pin_id = %pin_id,
            cid = %added.cid,
            thumbnails = manifest.thumbnails.len(),
            "Manifest pinned"
        );

        Ok(ManifestOutcome {
            pin_id,
            cid: added.cid,
            thumbnail_count: manifest.thumbnails.len(),
        })
    }
}

/// Restrict an identifier to characters safe inside a file name.
fn file_safe(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
