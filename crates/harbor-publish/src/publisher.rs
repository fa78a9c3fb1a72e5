//! Chart upload

use harbor_repo::{ChartUpload, HarborClient, RepoError, UploadAck};

use crate::builder::PackagedChart;
use crate::error::{PublishError, Result};

pub struct Publisher<'a> {
    client: &'a HarborClient,
}

impl<'a> Publisher<'a> {
    pub fn new(client: &'a HarborClient) -> Self {
        Self { client }
    }

    /// Upload `chart` and check that Harbor persisted it
    pub async fn publish(
        &self,
        chart: &PackagedChart,
        name: &str,
        version: &str,
        force: bool,
    ) -> Result<()> {
        tracing::info!(
            "Uploading chart file {} (Name: {}, Version: {}) to {}",
            chart.archive.display(),
            name,
            version,
            self.client.charts_url()
        );
        if let Some(provenance) = &chart.provenance {
            tracing::info!("Attaching provenance file {}", provenance.display());
        }

        let upload = ChartUpload {
            chart: chart.archive.clone(),
            provenance: chart.provenance.clone(),
            force,
        };
        let ack = self.client.upload(&upload).await.map_err(upload_error)?;
        check_ack(&ack)?;

        tracing::info!("Helm chart has been uploaded.");
        Ok(())
    }
}

fn upload_error(err: RepoError) -> PublishError {
    match err {
        RepoError::HttpError { status, message } => PublishError::UploadRejected { status, message },
        RepoError::InvalidResponse { message, .. } => {
            PublishError::MalformedUploadResponse { message }
        }
        other => PublishError::UploadFailed {
            message: other.to_string(),
        },
    }
}

fn check_ack(ack: &UploadAck) -> Result<()> {
    if let Some(message) = ack.error_message() {
        return Err(PublishError::ServerReportedError { message });
    }
    if !ack.is_saved() {
        return Err(PublishError::NotPersisted {
            saved: ack.saved_display(),
        });
    }
    Ok(())
}
