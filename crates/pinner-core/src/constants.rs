//! Shared constants

/// Job type tag for the multi-file release pinning workflow.
pub const JOB_TYPE_RELEASE_FILES: &str = "pin-release-files";

/// Job type tag for the organization logo pinning workflow.
pub const JOB_TYPE_ORGANIZATION_LOGO: &str = "pin-organization-logo";

/// Name reported to the indexer for the HTTP pinning service provider.
pub const PINATA_PROVIDER_NAME: &str = "pinata";

/// Prefix of temporary manifest files written during release pinning.
pub const MANIFEST_FILE_PREFIX: &str = "manifest-";
