//! CLI error types with exit code handling
//!
//! Every failure of both steps ends up here, and `exit_code` is the single
//! place failure kinds are turned into process exit codes.

use miette::Diagnostic;
use thiserror::Error;

use harbor_publish::PublishError;

use crate::exit_codes;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// The request on stdin could not be read or parsed
    #[error("Invalid request: {message}")]
    #[diagnostic(
        code(harbor::cli::request),
        help("the step expects a JSON object with 'source' and 'params' on stdin")
    )]
    InvalidRequest { message: String },

    /// The `out` pipeline failed
    #[error(transparent)]
    #[diagnostic(code(harbor::cli::publish))]
    Publish(#[from] PublishError),

    /// Chart metadata could not be fetched on `in`
    #[error("Download of chart information failed: {message}")]
    #[diagnostic(code(harbor::cli::fetch))]
    FetchFailed { message: String },

    /// Chart metadata on `in` did not have the expected shape
    #[error("Unexpected chart information: {message}")]
    #[diagnostic(code(harbor::cli::metadata))]
    MalformedMetadata { message: String },

    /// Chart archive could not be downloaded on `in`
    #[error("Download of {url} failed: {message}")]
    #[diagnostic(code(harbor::cli::download))]
    DownloadFailed { url: String, message: String },

    /// Repository configuration rejected before any request was made
    #[error("Invalid repository configuration: {message}")]
    #[diagnostic(code(harbor::cli::config))]
    Config { message: String },

    /// IO error (destination not writable, stdin closed, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(harbor::cli::io))]
    Io { message: String },

    /// Internal error (runtime, unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(harbor::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidRequest { .. } => exit_codes::INVALID_REQUEST,
            CliError::Publish(err) => publish_exit_code(err),
            CliError::FetchFailed { .. } => exit_codes::POST_UPLOAD_FETCH_FAILED,
            CliError::MalformedMetadata { .. } => exit_codes::MALFORMED_CHART_METADATA,
            CliError::DownloadFailed { .. } => exit_codes::DOWNLOAD_FAILED,
            CliError::Config { .. } => exit_codes::CONFIG,
            CliError::Io { .. } => exit_codes::ERROR,
            CliError::Internal { .. } => exit_codes::INTERNAL,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

fn publish_exit_code(err: &PublishError) -> i32 {
    match err {
        PublishError::VersionRangeViolation(_) => exit_codes::VERSION_RANGE_VIOLATION,
        PublishError::ChartNotFound { .. } => exit_codes::CHART_NOT_FOUND,
        PublishError::ChartManifestInvalid { .. } => exit_codes::CHART_MANIFEST_INVALID,
        PublishError::MissingSigningKey => exit_codes::MISSING_SIGNING_KEY,
        PublishError::RepoAddFailed { .. } => exit_codes::REPO_ADD_FAILED,
        PublishError::DependencyBuildFailed { .. } => exit_codes::DEPENDENCY_BUILD_FAILED,
        PublishError::GpgImportFailed { .. } => exit_codes::GPG_IMPORT_FAILED,
        PublishError::KeyIdNotFound { .. } => exit_codes::KEY_ID_NOT_FOUND,
        PublishError::KeyExportFailed { .. } => exit_codes::KEY_EXPORT_FAILED,
        PublishError::PackagingFailed { .. } => exit_codes::PACKAGING_FAILED,
        PublishError::ArchiveMissing { .. } => exit_codes::ARCHIVE_MISSING,
        PublishError::InspectFailed { .. } => exit_codes::INSPECT_FAILED,
        PublishError::VersionUnresolvable { .. } => exit_codes::VERSION_UNRESOLVABLE,
        PublishError::Client(_) => exit_codes::CONFIG,
        PublishError::UploadFailed { .. } => exit_codes::UPLOAD_FAILED,
        PublishError::UploadRejected { status, .. } => exit_codes::upload_rejected(*status),
        PublishError::MalformedUploadResponse { .. } => exit_codes::MALFORMED_UPLOAD_RESPONSE,
        PublishError::ServerReportedError { .. } => exit_codes::SERVER_REPORTED_ERROR,
        PublishError::NotPersisted { .. } => exit_codes::NOT_PERSISTED,
        PublishError::PostUploadFetchFailed { .. } => exit_codes::POST_UPLOAD_FETCH_FAILED,
        PublishError::MalformedChartMetadata { .. } => exit_codes::MALFORMED_CHART_METADATA,
        PublishError::VersionMismatch { .. } => exit_codes::VERSION_MISMATCH,
        PublishError::Io(_) => exit_codes::ERROR,
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<harbor_core::CoreError> for CliError {
    fn from(err: harbor_core::CoreError) -> Self {
        CliError::invalid_request(err.to_string())
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(status: u16) -> CliError {
        CliError::from(PublishError::UploadRejected {
            status,
            message: "rejected".to_string(),
        })
    }

    #[test]
    fn test_upload_status_maps_into_reserved_band() {
        assert_eq!(rejected(409).exit_code(), 244);
        assert_eq!(rejected(502).exit_code(), 245);
        assert_ne!(rejected(502).exit_code(), exit_codes::INVALID_REQUEST);
        assert_ne!(rejected(203).exit_code(), exit_codes::VERSION_MISMATCH);
        for status in [256, 512] {
            assert_ne!(rejected(status).exit_code() & 0xff, exit_codes::SUCCESS);
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            CliError::from(PublishError::MissingSigningKey).exit_code(),
            exit_codes::MISSING_SIGNING_KEY
        );
        assert_eq!(
            CliError::from(PublishError::NotPersisted {
                saved: "false".to_string()
            })
            .exit_code(),
            163
        );
        assert_eq!(
            CliError::from(PublishError::KeyExportFailed {
                key_id: "0123456789ABCDEF".to_string(),
                stderr: String::new(),
            })
            .exit_code(),
            135
        );
        assert_eq!(CliError::invalid_request("eof").exit_code(), 100);
        assert_eq!(CliError::internal("runtime").exit_code(), exit_codes::INTERNAL);
    }

    #[test]
    fn test_failure_kinds_do_not_share_codes() {
        let client = harbor_repo::RepoError::InvalidRepositoryUrl {
            url: "not a url".to_string(),
            reason: "relative URL without a base".to_string(),
        };
        let codes = [
            CliError::from(PublishError::Client(client)).exit_code(),
            CliError::Io {
                message: "closed".to_string(),
            }
            .exit_code(),
            CliError::internal("runtime").exit_code(),
            CliError::invalid_request("eof").exit_code(),
        ];
        assert_eq!(codes, [exit_codes::CONFIG, exit_codes::ERROR, exit_codes::INTERNAL, 100]);
    }
}
