//! Helm command line driver
//!
//! Builds argument vectors for the subcommands the pipeline needs and parses
//! the one piece of Helm output it relies on.

use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use crate::runner::{CommandOutput, CommandRunner, CommandSpec};

static VERSION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^version:\s*['"]?([^'"\s]+)['"]?\s*$"#).expect("valid regex"));

/// Signing flags for `helm package`
#[derive(Debug, Clone)]
pub struct SignOptions {
    pub key_id: String,
    pub keyring: PathBuf,
    pub passphrase_file: Option<PathBuf>,
}

/// Arguments for `helm package`
#[derive(Debug, Clone)]
pub struct PackageOptions<'a> {
    pub chart_dir: &'a Path,
    pub destination: &'a Path,
    pub version: Option<&'a str>,
    pub app_version: Option<&'a str>,
    pub sign: Option<SignOptions>,
}

#[derive(Clone)]
pub struct HelmCli {
    runner: Arc<dyn CommandRunner>,
    program: String,
}

impl HelmCli {
    pub fn new(runner: Arc<dyn CommandRunner>, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }

    fn command(&self) -> CommandSpec {
        CommandSpec::new(&self.program)
    }

    /// `helm repo add <name> <url>`
    pub async fn repo_add(&self, name: &str, url: &str) -> io::Result<CommandOutput> {
        let spec = self.command().args(["repo", "add", name, url]);
        self.runner.run(&spec).await
    }

    /// `helm dependency build <chart>`
    pub async fn dependency_build(&self, chart_dir: &Path) -> io::Result<CommandOutput> {
        let spec = self
            .command()
            .args(["dependency", "build"])
            .arg(chart_dir.display().to_string());
        self.runner.run(&spec).await
    }

    /// `helm package --destination <dir> [--sign ...] [--version] [--app-version] <chart>`
    pub async fn package(&self, options: &PackageOptions<'_>) -> io::Result<CommandOutput> {
        self.runner.run(&package_command(self.command(), options)).await
    }

    /// `helm show chart <archive>`
    pub async fn show_chart(&self, archive: &Path) -> io::Result<CommandOutput> {
        let spec = self
            .command()
            .args(["show", "chart"])
            .arg(archive.display().to_string());
        self.runner.run(&spec).await
    }
}

fn package_command(base: CommandSpec, options: &PackageOptions<'_>) -> CommandSpec {
    let mut spec = base
        .arg("package")
        .arg("--destination")
        .arg(options.destination.display().to_string());

    if let Some(sign) = &options.sign {
        spec = spec
            .arg("--sign")
            .arg("--key")
            .arg(&sign.key_id)
            .arg("--keyring")
            .arg(sign.keyring.display().to_string());
        if let Some(passphrase_file) = &sign.passphrase_file {
            spec = spec
                .arg("--passphrase-file")
                .arg(passphrase_file.display().to_string());
        }
    }
    if let Some(version) = options.version {
        spec = spec.arg("--version").arg(version);
    }
    if let Some(app_version) = options.app_version {
        spec = spec.arg("--app-version").arg(app_version);
    }

    spec.arg(options.chart_dir.display().to_string())
}

/// Extract the chart version from `helm show chart` output
pub fn parse_chart_version(output: &str) -> Option<String> {
    output
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .find_map(|line| VERSION_LINE.captures(line))
        .map(|caps| caps[1].to_string())
}
