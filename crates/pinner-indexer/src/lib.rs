//! Status synchronization client for the pin-record indexer.
//!
//! The indexer is the system of record for pin records. This crate issues
//! partial updates (`PATCH /pins/{id}`) and manifest record creation
//! (`POST /pins`), classifying failures as network-level or application-level
//! before handing them back to the caller. Whether a failure is fatal is the
//! caller's decision.

pub mod pins;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

use pinner_core::{PinRecordUpdate, PinnerConfig};

/// Indexer client errors
#[derive(Debug, thiserror::Error)]
pub enum IndexerError {
    /// Connection refused, DNS failure or timeout: the request never got an answer.
    #[error("Indexer unreachable: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Indexer request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The indexer answered with a non-success status.
    #[error("Indexer returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid indexer response: {0}")]
    InvalidResponse(String),

    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl IndexerError {
    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            IndexerError::Network(err)
        } else {
            IndexerError::Request(err)
        }
    }

    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            IndexerError::Network(_) => "network",
            IndexerError::Request(_) => "request",
            IndexerError::Status { .. } => "http_status",
            IndexerError::InvalidResponse(_) => "invalid_response",
            IndexerError::Client(_) => "client",
        }
    }
}

pub type IndexerResult<T> = Result<T, IndexerError>;

/// Pin-record writes the orchestrators depend on.
#[async_trait]
pub trait PinRecordStore: Send + Sync {
    /// Partial update of one pin record.
    async fn update_pin_record(&self, id: &str, update: &PinRecordUpdate) -> IndexerResult<()>;

    /// Create a single MANIFEST pin record for `release_id` and return its id.
    async fn create_manifest_pin_record(&self, release_id: &str) -> IndexerResult<String>;
}

/// HTTP client for the indexer API.
#[derive(Clone, Debug)]
pub struct IndexerClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl IndexerClient {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> IndexerResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(IndexerError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn from_config(config: &PinnerConfig) -> IndexerResult<Self> {
        Self::new(
            &config.indexer_api_url,
            config.indexer_api_key.clone(),
            config.indexer_timeout(),
        )
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("X-API-Key", key.as_str()),
            None => request,
        }
    }

    /// Send a request and turn transport failures and non-success statuses into errors.
    async fn send(&self, request: RequestBuilder) -> IndexerResult<Response> {
        let response = self
            .apply_auth(request)
            .send()
            .await
            .map_err(IndexerError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(IndexerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}
