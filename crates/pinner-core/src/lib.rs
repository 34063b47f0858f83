//! Pinner Core Library
//!
//! This crate provides the domain models, payload validation and configuration
//! shared by the storage, indexer and worker crates. Apart from reading the
//! environment it performs no I/O.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{LogFormat, PinnerConfig};
pub use error::ValidationError;
pub use models::{
    FileDescriptor, Job, JobPayload, JobType, Manifest, OrganizationLogoPayload, PinRecordType,
    PinRecordUpdate, PinStatus, ReleaseFilesPayload,
};
