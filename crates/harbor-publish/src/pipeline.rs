//! The `out` pipeline
//!
//! Resolve -> build (directories only) -> inspect -> upload -> verify.
//! The first failing stage ends the run with its own error.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use harbor_core::{OutRequest, Response, resolve_version};
use harbor_repo::HarborClient;

use crate::builder::{ChartBuilder, PackagedChart};
use crate::error::{PublishError, Result};
use crate::gpg::GpgCli;
use crate::helm::{HelmCli, parse_chart_version};
use crate::publisher::Publisher;
use crate::runner::{CommandRunner, ProcessRunner};
use crate::signing::KeySource;
use crate::verifier::Verifier;
use crate::workspace::Workspace;

/// Settings that come from the command line rather than the request
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Build root; relative request paths are resolved against it
    pub root: PathBuf,
    pub helm_bin: String,
    pub gpg_bin: String,
    pub gpgconf_bin: String,
    /// Bound on every subprocess and HTTP request
    pub timeout: Option<Duration>,
}

impl PublishConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            helm_bin: "helm".to_string(),
            gpg_bin: "gpg".to_string(),
            gpgconf_bin: "gpgconf".to_string(),
            timeout: None,
        }
    }
}

pub struct Pipeline {
    config: PublishConfig,
    helm: HelmCli,
    gpg: GpgCli,
}

impl Pipeline {
    /// Pipeline running the real `helm` and `gpg` binaries
    pub fn new(config: PublishConfig) -> Self {
        let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner::new(config.timeout));
        Self::with_runner(config, runner)
    }

    pub fn with_runner(config: PublishConfig, runner: Arc<dyn CommandRunner>) -> Self {
        let helm = HelmCli::new(runner.clone(), config.helm_bin.clone());
        let gpg = GpgCli::new(runner, config.gpg_bin.clone(), config.gpgconf_bin.clone());
        Self { config, helm, gpg }
    }

    pub async fn run(&self, request: &OutRequest) -> Result<Response> {
        let params = &request.params;
        let source = &request.source;

        let candidate = resolve_version(params, source, &self.config.root)?;
        if let Some(version) = &candidate {
            tracing::info!("Using version {}", version);
        }

        let client =
            HarborClient::new(source, self.config.timeout).map_err(PublishError::Client)?;

        let chart_path = OutRequest::resolve_path(&self.config.root, &params.chart);
        tracing::info!("Processing chart at \"{}\"...", chart_path.display());

        let mut workspace = None;
        let chart = if chart_path.is_dir() {
            let key = if params.sign {
                Some(KeySource::from_params(params, &self.config.root)?)
            } else {
                None
            };
            let ws = workspace.insert(Workspace::create()?);
            ChartBuilder::new(self.helm.clone(), self.gpg.clone())
                .build(&chart_path, params, candidate.as_deref(), key.as_ref(), ws)
                .await?
        } else if chart_path.is_file() {
            if params.sign {
                tracing::warn!("Chart is already packaged, ignoring 'sign'");
            }
            PackagedChart::from_archive(chart_path)
        } else {
            return Err(PublishError::ChartNotFound {
                path: chart_path.display().to_string(),
            });
        };

        let inspected = self.inspect(&chart.archive).await?;
        if let Some(candidate) = candidate.as_deref().filter(|c| *c != inspected) {
            tracing::warn!(
                "Packaged chart reports version {} (requested {}), publishing {}",
                inspected,
                candidate,
                inspected
            );
        }

        Publisher::new(&client)
            .publish(&chart, &source.chart_name, &inspected, params.force)
            .await?;
        let response = Verifier::new(&client).verify(&inspected).await?;

        if let Some(ws) = workspace {
            if let Err(e) = ws.close() {
                tracing::warn!("Failed to remove workspace: {}", e);
            }
        }

        Ok(response)
    }

    /// Version embedded in the archive, via `helm show chart`
    async fn inspect(&self, archive: &Path) -> Result<String> {
        let failed = |message: String| PublishError::InspectFailed {
            archive: archive.display().to_string(),
            message,
        };

        let output = self
            .helm
            .show_chart(archive)
            .await
            .map_err(|e| failed(e.to_string()))?;
        if !output.success() {
            return Err(failed(output.failure_text()));
        }

        parse_chart_version(&output.stdout).ok_or_else(|| PublishError::VersionUnresolvable {
            archive: archive.display().to_string(),
        })
    }
}
