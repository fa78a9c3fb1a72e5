//! Post-upload verification
//!
//! Harbor is asked for the chart version that was just uploaded; its
//! metadata becomes the `out` response.

use harbor_core::Response;
use harbor_repo::{HarborClient, RepoError};

use crate::error::{PublishError, Result};

pub struct Verifier<'a> {
    client: &'a HarborClient,
}

impl<'a> Verifier<'a> {
    pub fn new(client: &'a HarborClient) -> Self {
        Self { client }
    }

    /// Fetch `version` back and confirm Harbor reports the same version
    pub async fn verify(&self, version: &str) -> Result<Response> {
        tracing::info!(
            "Fetching chart data from {}",
            self.client.chart_version_url(version)
        );

        let fetched = self
            .client
            .chart_metadata(version)
            .await
            .map_err(|err| match err {
                RepoError::InvalidResponse { message, .. } => {
                    PublishError::MalformedChartMetadata { message }
                }
                other => PublishError::PostUploadFetchFailed {
                    message: other.to_string(),
                },
            })?;

        let metadata = &fetched.chart.metadata;
        if metadata.version != version {
            return Err(PublishError::VersionMismatch {
                expected: version.to_string(),
                actual: metadata.version.clone(),
            });
        }

        tracing::info!(
            "Chart {} {} verified (digest {})",
            metadata.name,
            metadata.version,
            metadata.digest
        );
        Ok(Response::from_metadata(metadata))
    }
}
