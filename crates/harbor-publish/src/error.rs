//! Error types for the publish pipeline
//!
//! One variant per failure kind. The binary maps each variant to its own
//! exit code; nothing in this crate terminates the process.

use thiserror::Error;

use harbor_core::CoreError;
use harbor_repo::RepoError;

#[derive(Debug, Error)]
pub enum PublishError {
    // ============ Validation Errors ============
    #[error("Version resolution failed: {0}")]
    VersionRangeViolation(#[source] CoreError),

    #[error("Chart file ({path}) not found")]
    ChartNotFound { path: String },

    #[error("Invalid chart: {message}")]
    ChartManifestInvalid { message: String },

    #[error("Either key_data or key_file must be specified when 'sign' is set to true")]
    MissingSigningKey,

    // ============ External Tool Errors ============
    #[error("Adding chart repository {name} ({url}) failed:\n{stderr}")]
    RepoAddFailed {
        name: String,
        url: String,
        stderr: String,
    },

    #[error("Retrieval of chart dependencies failed:\n{stderr}")]
    DependencyBuildFailed { stderr: String },

    #[error("Importing GPG key {key_file} failed:\n{stderr}")]
    GpgImportFailed { key_file: String, stderr: String },

    #[error("Unable to determine key ID after successful import: {message}")]
    KeyIdNotFound { message: String },

    #[error("Exporting secret key {key_id} for signing failed:\n{stderr}")]
    KeyExportFailed { key_id: String, stderr: String },

    #[error("Packaging of chart failed:\n{stderr}")]
    PackagingFailed { stderr: String },

    #[error("Packaged chart not found at {path}")]
    ArchiveMissing { path: String },

    #[error("Unable to inspect chart file {archive}: {message}")]
    InspectFailed { archive: String, message: String },

    #[error("Unable to parse version information from inspection of {archive}")]
    VersionUnresolvable { archive: String },

    // ============ Network Errors ============
    #[error("Invalid repository configuration: {0}")]
    Client(#[source] RepoError),

    #[error("Upload of chart file has failed: {message}")]
    UploadFailed { message: String },

    #[error("An error occurred while uploading the chart: {status} - {message}")]
    UploadRejected { status: u16, message: String },

    #[error("Unexpected upload response: {message}")]
    MalformedUploadResponse { message: String },

    #[error("An error occurred while uploading the chart: {message}")]
    ServerReportedError { message: String },

    #[error("Helm chart has not been saved (return value from server: saved={saved})")]
    NotPersisted { saved: String },

    #[error("Download of chart information failed: {message}")]
    PostUploadFetchFailed { message: String },

    #[error("Unexpected chart information: {message}")]
    MalformedChartMetadata { message: String },

    // ============ Consistency Errors ============
    #[error("Version mismatch in uploaded Helm chart. Got: {actual}, expected: {expected}")]
    VersionMismatch { expected: String, actual: String },

    // ============ IO Errors ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for publish operations
pub type Result<T> = std::result::Result<T, PublishError>;

impl From<CoreError> for PublishError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Io(e) => PublishError::Io(e),
            CoreError::InvalidChart { message } => PublishError::ChartManifestInvalid { message },
            CoreError::YamlParse(e) => PublishError::ChartManifestInvalid {
                message: e.to_string(),
            },
            CoreError::JsonParse(e) => PublishError::ChartManifestInvalid {
                message: e.to_string(),
            },
            range @ (CoreError::InvalidRange { .. }
            | CoreError::InvalidVersion { .. }
            | CoreError::RangeViolation { .. }) => PublishError::VersionRangeViolation(range),
        }
    }
}
