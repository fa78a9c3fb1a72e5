//! HTTP client for a Harbor project's chart repository

use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::credentials::Credentials;
use crate::error::{RepoError, Result};
use harbor_core::{RemoteChart, Source};

/// Files sent to the upload endpoint
#[derive(Debug, Clone)]
pub struct ChartUpload {
    /// Packaged chart archive, sent as form field `chart`
    pub chart: PathBuf,
    /// Provenance file, sent as form field `prov`
    pub provenance: Option<PathBuf>,
    /// Overwrite an existing version (`?force=true`)
    pub force: bool,
}

/// Body of a `201 Created` upload response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadAck {
    #[serde(default)]
    pub error: Option<serde_json::Value>,

    #[serde(default)]
    pub saved: Option<serde_json::Value>,
}

impl UploadAck {
    /// Error reported by the server despite the 201 status
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|error| match error {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// `saved` is strictly `true`
    pub fn is_saved(&self) -> bool {
        matches!(self.saved, Some(serde_json::Value::Bool(true)))
    }

    /// The raw `saved` value, for diagnostics
    pub fn saved_display(&self) -> String {
        self.saved
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "undefined".to_string())
    }
}

/// Chart metadata together with the raw body it was parsed from
#[derive(Debug, Clone)]
pub struct FetchedChart {
    pub chart: RemoteChart,
    pub raw: Vec<u8>,
}

/// Client for one chart of one Harbor project
pub struct HarborClient {
    client: reqwest::Client,
    server_url: String,
    project: String,
    chart_name: String,
    credentials: Option<Credentials>,
}

impl HarborClient {
    /// Create a client for the chart configured in `source`
    ///
    /// `timeout` bounds every request; `None` waits for the transport.
    pub fn new(source: &Source, timeout: Option<Duration>) -> Result<Self> {
        Url::parse(&source.server_url).map_err(|e| RepoError::InvalidRepositoryUrl {
            url: source.server_url.clone(),
            reason: e.to_string(),
        })?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| RepoError::NetworkError {
            message: e.to_string(),
        })?;

        Ok(Self {
            client,
            server_url: source.server_url.clone(),
            project: source.project.clone(),
            chart_name: source.chart_name.clone(),
            credentials: Credentials::from_source(source),
        })
    }

    /// `{server}api/chartrepo/{project}/charts`
    pub fn charts_url(&self) -> String {
        format!("{}api/chartrepo/{}/charts", self.server_url, self.project)
    }

    /// `{server}api/chartrepo/{project}/charts/{name}/{version}`
    pub fn chart_version_url(&self, version: &str) -> String {
        format!("{}/{}/{}", self.charts_url(), self.chart_name, version)
    }

    /// `{server}chartrepo/{project}/charts/{name}-{version}.tgz`
    pub fn archive_url(&self, version: &str) -> String {
        format!(
            "{}chartrepo/{}/charts/{}-{}.tgz",
            self.server_url, self.project, self.chart_name, version
        )
    }

    pub fn provenance_url(&self, version: &str) -> String {
        format!("{}.prov", self.archive_url(version))
    }

    /// Start a request with freshly built auth headers
    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        tracing::debug!("{} {}", method, url);
        let request = self.client.request(method, url);
        match &self.credentials {
            Some(credentials) => request.header(AUTHORIZATION, credentials.auth_header()),
            None => request,
        }
    }

    /// Upload a packaged chart
    ///
    /// Any status other than `201 Created` is returned as `RepoError::HttpError`.
    /// The acknowledgment is returned unchecked; interpreting `error`/`saved`
    /// is up to the caller.
    pub async fn upload(&self, upload: &ChartUpload) -> Result<UploadAck> {
        let url = self.charts_url();

        let mut form = Form::new().part("chart", file_part(&upload.chart).await?);
        if let Some(provenance) = &upload.provenance {
            form = form.part("prov", file_part(provenance).await?);
        }

        let mut request = self.request(Method::POST, &url).multipart(form);
        if upload.force {
            request = request.query(&[("force", "true")]);
        }

        let response = request.send().await?;
        let status = response.status();
        if status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Err(RepoError::HttpError {
                status: status.as_u16(),
                message: describe_failure(status, &body),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| RepoError::InvalidResponse {
            url,
            message: e.to_string(),
        })
    }

    /// Fetch the metadata of one chart version
    pub async fn chart_metadata(&self, version: &str) -> Result<FetchedChart> {
        let url = self.chart_version_url(version);
        let response = self.request(Method::GET, &url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RepoError::HttpError {
                status: status.as_u16(),
                message: describe_failure(status, &body),
            });
        }

        let raw = response.bytes().await?.to_vec();
        let chart = RemoteChart::from_slice(&raw).map_err(|e| RepoError::InvalidResponse {
            url,
            message: e.to_string(),
        })?;

        Ok(FetchedChart { chart, raw })
    }

    /// Download a file from the repository
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        self.download_optional(url)
            .await?
            .ok_or_else(|| RepoError::HttpError {
                status: StatusCode::NOT_FOUND.as_u16(),
                message: format!("{} not found", url),
            })
    }

    /// Download a file that may legitimately be absent (404 yields `None`)
    pub async fn download_optional(&self, url: &str) -> Result<Option<Vec<u8>>> {
        let response = self.request(Method::GET, url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RepoError::HttpError {
                status: status.as_u16(),
                message: describe_failure(status, &body),
            });
        }

        Ok(Some(response.bytes().await?.to_vec()))
    }
}

async fn file_part(path: &Path) -> Result<Part> {
    let data = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "chart.tgz".to_string());
    Ok(Part::bytes(data).file_name(file_name))
}

fn describe_failure(status: StatusCode, body: &str) -> String {
    let reason = status.canonical_reason().unwrap_or("Unknown status");
    let body = body.trim();
    if body.is_empty() {
        reason.to_string()
    } else {
        format!("{}: {}", reason, body)
    }
}
