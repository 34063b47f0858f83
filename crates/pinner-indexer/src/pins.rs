//! Pin-record endpoints of the indexer API.

use async_trait::async_trait;

use pinner_core::models::{CreatePinRecordsRequest, CreatePinRecordsResponse, NewPinRecord};
use pinner_core::{PinRecordType, PinRecordUpdate};

use crate::{IndexerClient, IndexerError, IndexerResult, PinRecordStore};

impl IndexerClient {
    /// `PATCH /pins/{id}` with the fields set on `update`.
    pub async fn update_pin_record(&self, id: &str, update: &PinRecordUpdate) -> IndexerResult<()> {
        let url = self.build_url(&format!("/pins/{}", urlencoding::encode(id)));
        let request = self.client.patch(&url).json(update);

        match self.send(request).await {
            Ok(_) => {
                tracing::debug!(
                    pin_id = %id,
                    status = %update.status,
                    "Pin record updated"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    pin_id = %id,
                    status = %update.status,
                    error_kind = e.kind(),
                    error = %e,
                    "Failed to update pin record"
                );
                Err(e)
            }
        }
    }

    /// `POST /pins` creating one MANIFEST record; returns the id the indexer assigned.
    pub async fn create_manifest_pin_record(&self, release_id: &str) -> IndexerResult<String> {
        let body = CreatePinRecordsRequest {
            pins: vec![NewPinRecord {
                release_id: release_id.to_string(),
                record_type: PinRecordType::Manifest,
            }],
        };
        let request = self.client.post(self.build_url("/pins")).json(&body);

        let response = self.send(request).await.map_err(|e| {
            tracing::error!(
                release_id = %release_id,
                error_kind = e.kind(),
                error = %e,
                "Failed to create manifest pin record"
            );
            e
        })?;

        let created: CreatePinRecordsResponse = response.json().await.map_err(|e| {
            IndexerError::InvalidResponse(format!("Failed to parse create response: {}", e))
        })?;

        let id = created.ids.into_iter().next().ok_or_else(|| {
            IndexerError::InvalidResponse(format!(
                "No pin record id returned for manifest of release {}",
                release_id
            ))
        })?;

        tracing::debug!(release_id = %release_id, pin_id = %id, "Manifest pin record created");
        Ok(id)
    }
}

#[async_trait]
impl PinRecordStore for IndexerClient {
    async fn update_pin_record(&self, id: &str, update: &PinRecordUpdate) -> IndexerResult<()> {
        IndexerClient::update_pin_record(self, id, update).await
    }

    async fn create_manifest_pin_record(&self, release_id: &str) -> IndexerResult<String> {
        IndexerClient::create_manifest_pin_record(self, release_id).await
    }
}
