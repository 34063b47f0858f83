//! Organization-logo pinning
//!
//! A single file: check the temp file, pick a provider, upload and pin, then
//! record the CID. Once the content is pinned the job succeeds even when the
//! final status update fails; a retry would only upload the logo again.

use std::io;
use std::sync::Arc;

use pinner_core::{OrganizationLogoPayload, PinRecordUpdate};
use pinner_indexer::PinRecordStore;
use pinner_storage::{AddedContent, PersistenceProvider, ProviderSelector};

use super::update_best_effort;
use crate::error::PipelineError;

/// Whether the indexer learned about a pinned logo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusSync {
    Synced,
    /// The logo is pinned but its record still needs manual reconciliation.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoPinOutcome {
    pub pin_id: String,
    pub cid: String,
    pub provider: String,
    pub status_sync: StatusSync,
}

pub struct OrganizationLogoOrchestrator {
    selector: Arc<ProviderSelector>,
    store: Arc<dyn PinRecordStore>,
}

impl OrganizationLogoOrchestrator {
    pub fn new(selector: Arc<ProviderSelector>, store: Arc<dyn PinRecordStore>) -> Self {
        Self { selector, store }
    }

    #[tracing::instrument(
        skip(self, payload),
        fields(organization_id = %payload.organization_id, pin_id = %payload.pin_id)
    )]
    pub async fn run(
        &self,
        payload: &OrganizationLogoPayload,
    ) -> Result<LogoPinOutcome, PipelineError> {
        let missing = match tokio::fs::try_exists(&payload.temp_path).await {
            Ok(true) => None,
            Ok(false) => Some(io::Error::new(io::ErrorKind::NotFound, "file does not exist")),
            Err(e) => Some(e),
        };
        if let Some(source) = missing {
            tracing::error!(
                path = %payload.temp_path.display(),
                error = %source,
                "Logo temp file is not available"
            );
            update_best_effort(
                self.store.as_ref(),
                &payload.pin_id,
                PinRecordUpdate::failed(None),
            )
            .await;
            return Err(PipelineError::FileSystem {
                path: payload.temp_path.clone(),
                source,
            });
        }

        let provider = match self.selector.select().await {
            Ok(provider) => provider,
            Err(e) => {
                tracing::error!(error = %e, "No pinning provider available for logo");
                update_best_effort(
                    self.store.as_ref(),
                    &payload.pin_id,
                    PinRecordUpdate::failed(None),
                )
                .await;
                return Err(e.into());
            }
        };

        let added = match add_and_pin(provider.as_ref(), payload).await {
            Ok(added) => added,
            Err(e) => {
                tracing::error!(provider = %provider.name(), error = %e, "Failed to pin logo");
                update_best_effort(
                    self.store.as_ref(),
                    &payload.pin_id,
                    PinRecordUpdate::failed(Some(provider.name())),
                )
                .await;
                return Err(e);
            }
        };

        let update = PinRecordUpdate::pinned(&added.cid, provider.name());
        let status_sync = match self.store.update_pin_record(&payload.pin_id, &update).await {
            Ok(()) => StatusSync::Synced,
            Err(e) => {
                tracing::error!(
                    cid = %added.cid,
                    error = %e,
                    "Logo pinned but its status update failed; reconcile the pin record manually"
                );
                StatusSync::Failed(e.to_string())
            }
        };

        tracing::info!(cid = %added.cid, provider = %provider.name(), "Organization logo pinned");

        Ok(LogoPinOutcome {
            pin_id: payload.pin_id.clone(),
            cid: added.cid,
            provider: provider.name().to_string(),
            status_sync,
        })
    }
}

async fn add_and_pin(
    provider: &dyn PersistenceProvider,
    payload: &OrganizationLogoPayload,
) -> Result<AddedContent, PipelineError> {
    let added = provider
        .add(&payload.temp_path, &payload.original_name)
        .await?;
    provider.pin(&added.cid, &payload.original_name).await?;
    Ok(added)
}
