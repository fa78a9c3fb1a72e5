//! In command - download a published chart version

use std::fs;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use harbor_core::{InRequest, Response};
use harbor_repo::{HarborClient, RepoError, compute_digest, digest_matches};

use crate::error::{CliError, Result};

/// Read the `in` request from `input` and write the chart files to `destination`
///
/// Writes `{basename}.tgz`, `{basename}.tgz.prov` (when Harbor has one) and
/// `{basename}.json` holding the chart metadata as Harbor returned it.
pub async fn run(input: impl Read, destination: &Path, timeout: Option<Duration>) -> Result<Response> {
    let request = InRequest::from_reader(input)?;
    let client = HarborClient::new(&request.source, timeout).map_err(|e| CliError::Config {
        message: e.to_string(),
    })?;

    tracing::info!(
        "Fetching chart data from {}",
        client.chart_version_url(&request.version.version)
    );
    let fetched = client
        .chart_metadata(&request.version.version)
        .await
        .map_err(|err| match err {
            RepoError::InvalidResponse { message, .. } => CliError::MalformedMetadata { message },
            other => CliError::FetchFailed {
                message: other.to_string(),
            },
        })?;
    let metadata = &fetched.chart.metadata;

    let basename = request
        .params
        .target_basename
        .clone()
        .unwrap_or_else(|| format!("{}-{}", metadata.name, metadata.version));
    fs::create_dir_all(destination)?;

    let archive_url = client.archive_url(&metadata.version);
    tracing::info!("Downloading {}", archive_url);
    let archive = client
        .download(&archive_url)
        .await
        .map_err(|e| download_failed(&archive_url, e))?;

    let digest = compute_digest(&archive);
    if !metadata.digest.is_empty() && !digest_matches(&metadata.digest, &digest) {
        tracing::warn!(
            "Digest mismatch for {}: Harbor reports {}, downloaded archive has {}",
            archive_url,
            metadata.digest,
            digest
        );
    }
    fs::write(destination.join(format!("{}.tgz", basename)), &archive)?;

    let provenance_url = client.provenance_url(&metadata.version);
    match client
        .download_optional(&provenance_url)
        .await
        .map_err(|e| download_failed(&provenance_url, e))?
    {
        Some(provenance) => {
            fs::write(destination.join(format!("{}.tgz.prov", basename)), provenance)?;
        }
        None => tracing::info!("No provenance file published for version {}", metadata.version),
    }

    fs::write(destination.join(format!("{}.json", basename)), &fetched.raw)?;
    tracing::info!("Chart {} written to {}", basename, destination.display());

    Ok(Response::from_metadata(metadata))
}

fn download_failed(url: &str, err: RepoError) -> CliError {
    CliError::DownloadFailed {
        url: url.to_string(),
        message: err.to_string(),
    }
}
