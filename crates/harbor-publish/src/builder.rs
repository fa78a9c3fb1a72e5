//! Chart directory packaging
//!
//! Registers the chart's dependency repositories, fetches its dependencies,
//! imports the signing key when asked to, and runs `helm package` into the
//! run's workspace.

use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use url::Url;

use harbor_core::{ChartManifest, OutParams};

use crate::error::{PublishError, Result};
use crate::gpg::GpgCli;
use crate::helm::{HelmCli, PackageOptions};
use crate::runner::CommandOutput;
use crate::signing::{KeySource, SigningContext};
use crate::workspace::Workspace;

/// Legacy dependency list scanned for repository URLs
pub const REQUIREMENTS_FILE: &str = "requirements.yaml";

static REPOSITORY_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"https?://(www\.)?[-a-zA-Z0-9@:%._+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b[-a-zA-Z0-9()@:%_+.~#?&/=]*",
    )
    .expect("valid regex")
});

/// Archive produced by the build, with its provenance file when signed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedChart {
    pub archive: PathBuf,
    pub provenance: Option<PathBuf>,
}

impl PackagedChart {
    /// Wrap an archive, picking up `<archive>.prov` when it exists
    pub fn from_archive(archive: PathBuf) -> Self {
        let provenance = provenance_path(&archive);
        let provenance = provenance.is_file().then_some(provenance);
        Self {
            archive,
            provenance,
        }
    }
}

fn provenance_path(archive: &Path) -> PathBuf {
    let mut name = archive.as_os_str().to_os_string();
    name.push(".prov");
    PathBuf::from(name)
}

/// A chart repository to register before `helm dependency build`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRepository {
    pub name: String,
    pub url: String,
}

pub struct ChartBuilder {
    helm: HelmCli,
    gpg: GpgCli,
}

impl ChartBuilder {
    pub fn new(helm: HelmCli, gpg: GpgCli) -> Self {
        Self { helm, gpg }
    }

    /// Package `chart_dir` into `workspace`
    ///
    /// `key` is only consulted when `params.sign` is set. `version` is the
    /// resolved version, passed to `helm package --version` when present.
    pub async fn build(
        &self,
        chart_dir: &Path,
        params: &OutParams,
        version: Option<&str>,
        key: Option<&KeySource>,
        workspace: &Workspace,
    ) -> Result<PackagedChart> {
        let manifest =
            ChartManifest::load(chart_dir).map_err(|e| PublishError::ChartManifestInvalid {
                message: e.to_string(),
            })?;
        tracing::info!("Building chart {} from {}", manifest.name, chart_dir.display());

        let repositories = discover_repositories(chart_dir, &manifest)?;
        self.register_repositories(&repositories).await?;
        self.build_dependencies(chart_dir).await?;

        let signing = match (params.sign, key) {
            (true, Some(key)) => Some(
                SigningContext::acquire(key, params.key_passphrase.as_deref(), workspace, &self.gpg)
                    .await?,
            ),
            (true, None) => return Err(PublishError::MissingSigningKey),
            (false, _) => None,
        };

        let options = PackageOptions {
            chart_dir,
            destination: workspace.path(),
            version,
            app_version: params.app_version.as_deref(),
            sign: signing.as_ref().map(SigningContext::sign_options),
        };
        tracing::info!("Packaging chart...");
        let packaged = self.helm.package(&options).await;

        if let Some(signing) = signing {
            signing.close().await;
        }

        let output = packaged.map_err(|e| PublishError::PackagingFailed {
            stderr: e.to_string(),
        })?;
        log_output(&output);
        if !output.success() {
            return Err(PublishError::PackagingFailed {
                stderr: output.failure_text(),
            });
        }

        let archive = workspace.path().join(manifest.archive_name(version));
        if !archive.is_file() {
            return Err(PublishError::ArchiveMissing {
                path: archive.display().to_string(),
            });
        }
        let packaged = PackagedChart::from_archive(archive);
        tracing::info!("Chart packaged to {}", packaged.archive.display());
        Ok(packaged)
    }

    async fn register_repositories(&self, repositories: &[ChartRepository]) -> Result<()> {
        for repo in repositories {
            tracing::info!("Adding repo {} ({})...", repo.name, repo.url);
            let failed = |stderr: String| PublishError::RepoAddFailed {
                name: repo.name.clone(),
                url: repo.url.clone(),
                stderr,
            };
            let output = self
                .helm
                .repo_add(&repo.name, &repo.url)
                .await
                .map_err(|e| failed(e.to_string()))?;
            log_output(&output);
            if !output.success() {
                return Err(failed(output.failure_text()));
            }
        }
        Ok(())
    }

    async fn build_dependencies(&self, chart_dir: &Path) -> Result<()> {
        tracing::info!("Performing \"helm dependency build\"...");
        let output = self
            .helm
            .dependency_build(chart_dir)
            .await
            .map_err(|e| PublishError::DependencyBuildFailed {
                stderr: e.to_string(),
            })?;
        log_output(&output);
        if !output.success() {
            return Err(PublishError::DependencyBuildFailed {
                stderr: output.failure_text(),
            });
        }
        Ok(())
    }
}

fn log_output(output: &CommandOutput) {
    for line in output.stdout.lines().filter(|l| !l.trim().is_empty()) {
        tracing::debug!("{}", line);
    }
}

/// Repositories referenced by `requirements.yaml` and the manifest's
/// dependencies, in order of first appearance
pub fn discover_repositories(
    chart_dir: &Path,
    manifest: &ChartManifest,
) -> Result<Vec<ChartRepository>> {
    let mut urls = Vec::new();

    let requirements = chart_dir.join(REQUIREMENTS_FILE);
    if requirements.is_file() {
        tracing::info!("Found {}. Adding repositories...", REQUIREMENTS_FILE);
        let content = std::fs::read_to_string(&requirements)?;
        urls.extend(scan_repository_urls(&content));
    }
    urls.extend(manifest.http_repositories().map(String::from));

    let mut seen = HashSet::new();
    urls.retain(|url| seen.insert(url.clone()));

    Ok(name_repositories(urls))
}

/// First repository URL on each line
pub fn scan_repository_urls(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| REPOSITORY_URL.find(line))
        .map(|m| m.as_str().to_string())
        .collect()
}

fn name_repositories(urls: Vec<String>) -> Vec<ChartRepository> {
    let mut taken = HashSet::new();
    let mut repositories = Vec::new();

    for url in urls {
        let Some(label) = host_label(&url) else {
            tracing::warn!("Can't capture name from repo: {}", url);
            continue;
        };

        let mut name = label.clone();
        let mut n = 2;
        while !taken.insert(name.clone()) {
            name = format!("{}-{}", label, n);
            n += 1;
        }
        repositories.push(ChartRepository { name, url });
    }

    repositories
}

/// First DNS label of the URL host, skipping a leading `www`
fn host_label(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    host.split('.')
        .next()
        .filter(|label| !label.is_empty())
        .map(str::to_lowercase)
}
