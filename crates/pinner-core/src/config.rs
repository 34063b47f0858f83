//! Configuration module
//!
//! Environment-driven settings for the pinning service provider, the indexer
//! client, and the job queue.

use std::env;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::time::Duration;

const PINATA_API_URL: &str = "https://api.pinata.cloud";
const UPLOAD_TIMEOUT_SECS: u64 = 300;
const PIN_TIMEOUT_SECS: u64 = 30;
const HEALTH_CHECK_TIMEOUT_SECS: u64 = 5;
const INDEXER_TIMEOUT_SECS: u64 = 30;
const WORKER_CONCURRENCY: usize = 5;
const JOB_MAX_ATTEMPTS: u32 = 3;
const JOB_BACKOFF_BASE_MS: u64 = 1000;
const JOB_TIMEOUT_SECS: u64 = 1800;

/// Log output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone)]
pub struct PinnerConfig {
    pub environment: String,
    pub log_format: LogFormat,
    // Pinning service provider
    pub pinata_api_url: String,
    pub pinata_jwt: String,
    pub upload_timeout_secs: u64,
    pub pin_timeout_secs: u64,
    pub health_check_timeout_secs: u64,
    // Indexer (system of record for pin records)
    pub indexer_api_url: String,
    pub indexer_api_key: Option<String>,
    pub indexer_timeout_secs: u64,
    // Job queue
    pub worker_concurrency: usize,
    pub job_max_attempts: u32,
    pub job_backoff_base_ms: u64,
    pub job_timeout_secs: u64,
    /// Directory where derived manifest files are written before upload.
    pub manifest_temp_dir: PathBuf,
}

impl Debug for PinnerConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PinnerConfig")
            .field("environment", &self.environment)
            .field("log_format", &self.log_format)
            .field("pinata_api_url", &self.pinata_api_url)
            .field("pinata_jwt", &"<redacted>")
            .field("upload_timeout_secs", &self.upload_timeout_secs)
            .field("pin_timeout_secs", &self.pin_timeout_secs)
            .field("health_check_timeout_secs", &self.health_check_timeout_secs)
            .field("indexer_api_url", &self.indexer_api_url)
            .field(
                "indexer_api_key",
                &self.indexer_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("indexer_timeout_secs", &self.indexer_timeout_secs)
            .field("worker_concurrency", &self.worker_concurrency)
            .field("job_max_attempts", &self.job_max_attempts)
            .field("job_backoff_base_ms", &self.job_backoff_base_ms)
            .field("job_timeout_secs", &self.job_timeout_secs)
            .field("manifest_temp_dir", &self.manifest_temp_dir)
            .finish()
    }
}

impl PinnerConfig {
    /// Load configuration from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let log_format = var("LOG_FORMAT").map(|v| v.to_lowercase());
        let log_format = match log_format.as_deref() {
            Some("json") => LogFormat::Json,
            Some("text") | None => LogFormat::Text,
            Some(other) => {
                return Err(anyhow::anyhow!(
                    "LOG_FORMAT must be 'text' or 'json', got '{}'",
                    other
                ))
            }
        };

        let pinata_jwt = var("PINATA_JWT")
            .ok_or_else(|| anyhow::anyhow!("PINATA_JWT environment variable is required"))?;

        let indexer_api_url = var("INDEXER_API_URL")
            .ok_or_else(|| anyhow::anyhow!("INDEXER_API_URL environment variable is required"))?;

        let config = Self {
            environment,
            log_format,
            pinata_api_url: var("PINATA_API_URL")
                .unwrap_or_else(|| PINATA_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            pinata_jwt,
            upload_timeout_secs: parse_or(&var, "UPLOAD_TIMEOUT_SECS", UPLOAD_TIMEOUT_SECS)?,
            pin_timeout_secs: parse_or(&var, "PIN_TIMEOUT_SECS", PIN_TIMEOUT_SECS)?,
            health_check_timeout_secs: parse_or(
                &var,
                "HEALTH_CHECK_TIMEOUT_SECS",
                HEALTH_CHECK_TIMEOUT_SECS,
            )?,
            indexer_api_url: indexer_api_url.trim_end_matches('/').to_string(),
            indexer_api_key: var("INDEXER_API_KEY"),
            indexer_timeout_secs: parse_or(&var, "INDEXER_TIMEOUT_SECS", INDEXER_TIMEOUT_SECS)?,
            worker_concurrency: parse_or(&var, "WORKER_CONCURRENCY", WORKER_CONCURRENCY)?,
            job_max_attempts: parse_or(&var, "JOB_MAX_ATTEMPTS", JOB_MAX_ATTEMPTS)?,
            job_backoff_base_ms: parse_or(&var, "JOB_BACKOFF_BASE_MS", JOB_BACKOFF_BASE_MS)?,
            job_timeout_secs: parse_or(&var, "JOB_TIMEOUT_SECS", JOB_TIMEOUT_SECS)?,
            manifest_temp_dir: var("MANIFEST_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
        };

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.pinata_jwt.trim().is_empty() {
            return Err(anyhow::anyhow!("PINATA_JWT must not be empty"));
        }

        if !self.indexer_api_url.starts_with("http://")
            && !self.indexer_api_url.starts_with("https://")
        {
            return Err(anyhow::anyhow!("INDEXER_API_URL must be an http(s) URL"));
        }

        if self.worker_concurrency == 0 {
            return Err(anyhow::anyhow!("WORKER_CONCURRENCY must be at least 1"));
        }

        if self.job_max_attempts == 0 {
            return Err(anyhow::anyhow!("JOB_MAX_ATTEMPTS must be at least 1"));
        }

        // Uploads carry data; control calls do not.
        if self.upload_timeout_secs < self.pin_timeout_secs {
            return Err(anyhow::anyhow!(
                "UPLOAD_TIMEOUT_SECS ({}) must not be shorter than PIN_TIMEOUT_SECS ({})",
                self.upload_timeout_secs,
                self.pin_timeout_secs
            ));
        }

        Ok(())
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }

    pub fn pin_timeout(&self) -> Duration {
        Duration::from_secs(self.pin_timeout_secs)
    }

    pub fn health_check_timeout(&self) -> Duration {
        Duration::from_secs(self.health_check_timeout_secs)
    }

    pub fn indexer_timeout(&self) -> Duration {
        Duration::from_secs(self.indexer_timeout_secs)
    }

    pub fn job_backoff_base(&self) -> Duration {
        Duration::from_millis(self.job_backoff_base_ms)
    }

    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> Result<T, anyhow::Error>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: '{}' ({})", key, raw, e)),
        None => Ok(default),
    }
}
