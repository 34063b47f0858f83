use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Status of a pin record held by the indexer.
///
/// A record observed by the pipeline starts in `Pinning` and ends in exactly
/// one of `Pinned` or `Failed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum PinStatus {
    Pinning,
    Pinned,
    Failed,
}

impl Display for PinStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            PinStatus::Pinning => write!(f, "PINNING"),
            PinStatus::Pinned => write!(f, "PINNED"),
            PinStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Kind of artifact a pin record tracks. The pipeline only ever creates
/// manifest records; file records are created upstream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PinRecordType {
    Manifest,
}

/// Partial update body for `PATCH /pins/{id}`.
///
/// Unset optional fields are omitted from the JSON so the indexer leaves them
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinRecordUpdate {
    pub status: PinStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl PinRecordUpdate {
    /// Reset to in-flight, used before a retried job re-uploads its files.
    pub fn pinning() -> Self {
        Self {
            status: PinStatus::Pinning,
            cid: None,
            asset_hash: None,
            provider: None,
        }
    }

    pub fn pinned(cid: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            status: PinStatus::Pinned,
            cid: Some(cid.into()),
            asset_hash: None,
            provider: Some(provider.into()),
        }
    }

    /// Failed update. The provider name is recorded when it is known.
    pub fn failed(provider: Option<&str>) -> Self {
        Self {
            status: PinStatus::Failed,
            cid: None,
            asset_hash: None,
            provider: provider.map(str::to_string),
        }
    }

    pub fn with_asset_hash(mut self, asset_hash: impl Into<String>) -> Self {
        self.asset_hash = Some(asset_hash.into());
        self
    }
}

/// One entry of the `POST /pins` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPinRecord {
    pub release_id: String,
    #[serde(rename = "type")]
    pub record_type: PinRecordType,
}

/// `POST /pins` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePinRecordsRequest {
    pub pins: Vec<NewPinRecord>,
}

/// `POST /pins` response body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePinRecordsResponse {
    #[serde(default)]
    pub ids: Vec<String>,
}
