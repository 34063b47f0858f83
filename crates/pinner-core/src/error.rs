//! Error types module
//!
//! Payload validation errors. I/O-bearing crates define their own error enums
//! (`ProviderError`, `IndexerError`, `PipelineError`).

/// A job payload did not match the shape expected for its job type.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Malformed {job_type} payload: {source}")]
    Malformed {
        job_type: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Empty value for field: {0}")]
    EmptyField(String),
}
