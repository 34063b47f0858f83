//! HTTP pinning-service provider.
//!
//! Uploads go to `POST {api_url}/pinning/pinFileToIPFS` as a multipart stream; the
//! service pins on upload, so `pin` only has to confirm the identifier is known.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use lru::LruCache;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio_util::io::ReaderStream;

use pinner_core::constants::PINATA_PROVIDER_NAME;
use pinner_core::PinnerConfig;

use crate::traits::{AddedContent, PersistenceProvider, ProviderError, ProviderResult};

/// Upper bound on identifiers remembered from `add`. Older entries fall back to
/// a pin list lookup.
const PRODUCED_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct PinataConfig {
    pub api_url: String,
    pub jwt: String,
    pub upload_timeout: Duration,
    pub pin_timeout: Duration,
    pub health_check_timeout: Duration,
}

impl PinataConfig {
    pub fn from_config(config: &PinnerConfig) -> Self {
        Self {
            api_url: config.pinata_api_url.clone(),
            jwt: config.pinata_jwt.clone(),
            upload_timeout: config.upload_timeout(),
            pin_timeout: config.pin_timeout(),
            health_check_timeout: config.health_check_timeout(),
        }
    }
}

impl Debug for PinataConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PinataConfig")
            .field("api_url", &self.api_url)
            .field("upload_timeout", &self.upload_timeout)
            .field("pin_timeout", &self.pin_timeout)
            .field("health_check_timeout", &self.health_check_timeout)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct PinFileResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

#[derive(Debug, Deserialize)]
struct PinListResponse {
    #[serde(default)]
    count: u64,
}

/// Pinning-service provider backed by an HTTP API.
pub struct PinataProvider {
    config: PinataConfig,
    http_client: Client,
    /// Identifiers recently returned by `add`.
    produced: Mutex<LruCache<String, ()>>,
}

impl Debug for PinataProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PinataProvider")
            .field("config", &self.config)
            .finish()
    }
}

impl PinataProvider {
    pub fn new(config: PinataConfig) -> ProviderResult<Self> {
        let capacity = NonZeroUsize::new(PRODUCED_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self::with_produced_capacity(config, capacity)
    }

    fn with_produced_capacity(
        config: PinataConfig,
        capacity: NonZeroUsize,
    ) -> ProviderResult<Self> {
        let http_client = Client::builder().build().map_err(|e| {
            ProviderError::ConfigError(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            config,
            http_client,
            produced: Mutex::new(LruCache::new(capacity)),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }

    fn remember(&self, cid: &str) {
        self.produced
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .put(cid.to_string(), ());
    }

    fn was_produced(&self, cid: &str) -> bool {
        self.produced
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(cid)
    }

    /// Ask the service whether it retains `cid`, for identifiers produced by
    /// another process.
    async fn backend_retains(&self, cid: &str) -> ProviderResult<bool> {
        let response = self
            .http_client
            .get(self.url("/data/pinList"))
            .bearer_auth(&self.config.jwt)
            .query(&[("cid", cid), ("status", "pinned")])
            .timeout(self.config.pin_timeout)
            .send()
            .await
            .map_err(|e| ProviderError::PinFailed(format!("Pin lookup request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::PinFailed(format!(
                "Pin lookup failed with status {}: {}",
                status, error_text
            )));
        }

        let body: PinListResponse = response.json().await.map_err(|e| {
            ProviderError::PinFailed(format!("Failed to parse pin lookup response: {}", e))
        })?;

        Ok(body.count > 0)
    }
}

#[async_trait]
impl PersistenceProvider for PinataProvider {
    fn name(&self) -> &str {
        PINATA_PROVIDER_NAME
    }

    async fn add(&self, file_path: &Path, filename: &str) -> ProviderResult<AddedContent> {
        let start = std::time::Instant::now();

        let file = tokio::fs::File::open(file_path).await.map_err(|e| {
            ProviderError::UploadFailed(format!("Failed to open {}: {}", file_path.display(), e))
        })?;
        let size_bytes = file.metadata().await?.len();

        // Hash the exact chunks handed to the transport.
        let hasher = Arc::new(Mutex::new(Sha256::new()));
        let stream_hasher = Arc::clone(&hasher);
        let stream = ReaderStream::new(file).inspect(move |chunk: &std::io::Result<Bytes>| {
            if let Ok(bytes) = chunk {
                stream_hasher
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .update(bytes);
            }
        });

        let part = Part::stream_with_length(Body::wrap_stream(stream), size_bytes)
            .file_name(filename.to_string());
        let metadata = serde_json::json!({ "name": filename }).to_string();
        let form = Form::new()
            .part("file", part)
            .text("pinataMetadata", metadata);

        let response = self
            .http_client
            .post(self.url("/pinning/pinFileToIPFS"))
            .bearer_auth(&self.config.jwt)
            .multipart(form)
            .timeout(self.config.upload_timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    filename = %filename,
                    size_bytes,
                    "Pinning service upload request failed"
                );
                ProviderError::UploadFailed(format!("Upload request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::UploadFailed(format!(
                "Pinning service returned {}: {}",
                status, error_text
            )));
        }

        let body: PinFileResponse = response.json().await.map_err(|e| {
            ProviderError::UploadFailed(format!("Failed to parse upload response: {}", e))
        })?;

        let content_hash = hex::encode(
            hasher
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
                .finalize(),
        );
        self.remember(&body.ipfs_hash);

        tracing::info!(
            cid = %body.ipfs_hash,
            filename = %filename,
            size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Pinning service upload successful"
        );

        Ok(AddedContent {
            cid: body.ipfs_hash,
            content_hash,
        })
    }

    async fn pin(&self, cid: &str, display_name: &str) -> ProviderResult<()> {
        if cid.trim().is_empty() {
            return Err(ProviderError::PinFailed(
                "Content identifier is empty".to_string(),
            ));
        }

        if self.was_produced(cid) {
            tracing::debug!(cid = %cid, name = %display_name, "Content pinned on upload");
            return Ok(());
        }

        if self.backend_retains(cid).await? {
            self.remember(cid);
            Ok(())
        } else {
            Err(ProviderError::PinFailed(format!(
                "Content identifier {} was not produced by this provider",
                cid
            )))
        }
    }

    async fn is_healthy(&self) -> bool {
        let result = self
            .http_client
            .get(self.url("/data/testAuthentication"))
            .bearer_auth(&self.config.jwt)
            .timeout(self.config.health_check_timeout)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!(
                    provider = PINATA_PROVIDER_NAME,
                    status = %response.status(),
                    "Provider health check rejected"
                );
                false
            }
            Err(e) => {
                tracing::warn!(
                    provider = PINATA_PROVIDER_NAME,
                    error = %e,
                    "Provider health check failed"
                );
                false
            }
        }
    }
}
