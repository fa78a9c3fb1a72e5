//! Shared fixtures for pipeline tests: scripted `helm`/`gpg` and a fake Harbor

#![allow(dead_code)]

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use harbor_core::{ChartManifest, OutRequest};
use harbor_publish::{CommandOutput, CommandRunner, CommandSpec, Pipeline, PublishConfig};

pub const PROJECT: &str = "library";
pub const CHART: &str = "demo";
pub const KEY_ID: &str = "0123456789ABCDEF";

/// Stand-in for the `helm` and `gpg` binaries
///
/// `helm package` writes an archive whose content is the `helm show chart`
/// output for it, so inspection reports whatever was packaged.
#[derive(Default)]
pub struct FakeTools {
    calls: Mutex<Vec<CommandSpec>>,
    imported_keys: Mutex<Vec<String>>,
    keyring_present_at_package: Mutex<Option<bool>>,
    failures: Vec<(String, String)>,
    import_stderr: Option<String>,
}

impl FakeTools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every command whose rendered line contains `pattern` exit 1
    pub fn failing(mut self, pattern: &str, stderr: &str) -> Self {
        self.failures.push((pattern.to_string(), stderr.to_string()));
        self
    }

    /// Replace the diagnostics a successful `gpg --import` prints
    pub fn with_import_stderr(mut self, stderr: &str) -> Self {
        self.import_stderr = Some(stderr.to_string());
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Rendered command lines, e.g. `helm repo add charts https://...`
    pub fn lines(&self) -> Vec<String> {
        self.calls().iter().map(ToString::to_string).collect()
    }

    /// First recorded call whose rendered line contains `pattern`
    pub fn find(&self, pattern: &str) -> Option<CommandSpec> {
        self.calls()
            .into_iter()
            .find(|spec| spec.to_string().contains(pattern))
    }

    /// Content of each key file at the time `gpg --import` ran
    pub fn imported_keys(&self) -> Vec<String> {
        self.imported_keys.lock().unwrap().clone()
    }

    pub fn keyring_present_at_package(&self) -> Option<bool> {
        *self.keyring_present_at_package.lock().unwrap()
    }

    fn respond(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
        let line = spec.to_string();
        if let Some((_, stderr)) = self.failures.iter().find(|(p, _)| line.contains(p.as_str())) {
            return Ok(exit(1, "", stderr));
        }

        match (spec.program.as_str(), spec.args.first().map(String::as_str)) {
            ("gpg", _) if spec.args.iter().any(|a| a == "--export-secret-keys") => {
                let output = spec.flag_value("--output").unwrap_or_default();
                std::fs::write(output, b"\x95\x03\x98secret keyring")?;
                Ok(exit(0, "", ""))
            }
            ("gpg", _) => self.gpg_import(spec),
            ("gpgconf", _) => Ok(exit(0, "", "")),
            ("helm", Some("package")) => self.helm_package(spec),
            ("helm", Some("show")) => {
                let archive = spec.args.last().cloned().unwrap_or_default();
                match std::fs::read_to_string(&archive) {
                    Ok(content) => Ok(exit(0, &content, "")),
                    Err(_) => Ok(exit(1, "", &format!("Error: {}: no such file", archive))),
                }
            }
            ("helm", _) => Ok(exit(0, "", "")),
            (other, _) => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: command not found", other),
            )),
        }
    }

    fn gpg_import(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
        let key = spec.flag_value("--import").unwrap_or_default();
        let content = std::fs::read_to_string(key).unwrap_or_default();
        self.imported_keys.lock().unwrap().push(content);
        if let Some(stderr) = &self.import_stderr {
            return Ok(exit(0, "", stderr));
        }
        Ok(exit(
            0,
            "",
            &format!(
                "gpg: keybox created\ngpg: key {}: public key \"CI <ci@example.com>\" imported\ngpg: key {}: secret key imported\ngpg: Total number processed: 1\n",
                KEY_ID, KEY_ID
            ),
        ))
    }

    fn helm_package(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
        let destination = PathBuf::from(spec.flag_value("--destination").unwrap_or_default());
        let chart_dir = PathBuf::from(spec.args.last().cloned().unwrap_or_default());
        let manifest = ChartManifest::load(&chart_dir)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;

        let version = spec.flag_value("--version").unwrap_or(&manifest.version);
        let archive = destination.join(format!("{}-{}.tgz", manifest.name, version));
        std::fs::write(
            &archive,
            format!("apiVersion: v2\nname: {}\nversion: {}\n", manifest.name, version),
        )?;

        if spec.args.iter().any(|a| a == "--sign") {
            let present = spec
                .flag_value("--keyring")
                .is_some_and(|keyring| Path::new(keyring).is_file());
            *self.keyring_present_at_package.lock().unwrap() = Some(present);
            std::fs::write(format!("{}.prov", archive.display()), "-----BEGIN PGP SIGNED MESSAGE-----")?;
        }

        Ok(exit(
            0,
            &format!("Successfully packaged chart and saved it to: {}\n", archive.display()),
            "",
        ))
    }
}

fn exit(code: i32, stdout: &str, stderr: &str) -> CommandOutput {
    CommandOutput {
        code: Some(code),
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    }
}

/// Runner handle that can be shared with the pipeline and inspected afterwards
#[derive(Clone)]
pub struct SharedTools(pub Arc<FakeTools>);

#[async_trait]
impl CommandRunner for SharedTools {
    async fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
        self.0.calls.lock().unwrap().push(spec.clone());
        self.0.respond(spec)
    }
}

/// Build root holding a chart directory `chart/`
pub struct BuildRoot {
    pub dir: TempDir,
}

impl BuildRoot {
    pub fn with_chart(version: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let chart = dir.path().join("chart");
        std::fs::create_dir(&chart).unwrap();
        std::fs::write(
            chart.join("Chart.yaml"),
            format!(
                "apiVersion: v2\nname: {}\nversion: {}\ndescription: Demo chart\n",
                CHART, version
            ),
        )
        .unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }
}

pub fn pipeline(root: &BuildRoot, tools: &Arc<FakeTools>) -> Pipeline {
    Pipeline::with_runner(
        PublishConfig::new(root.path()),
        Arc::new(SharedTools(tools.clone())),
    )
}

/// `out` request against `server` with the given params
pub fn request(server: &MockServer, version_range: Option<&str>, params: serde_json::Value) -> OutRequest {
    let json = serde_json::json!({
        "source": {
            "server_url": server.uri(),
            "project": PROJECT,
            "chart_name": CHART,
            "version_range": version_range,
        },
        "params": params,
    });
    OutRequest::from_json(&json.to_string()).unwrap()
}

pub fn metadata_body(version: &str) -> serde_json::Value {
    serde_json::json!({
        "metadata": {
            "name": CHART,
            "version": version,
            "description": "Demo chart",
            "apiVersion": "v2",
            "appVersion": "1.16.0",
            "urls": [format!("charts/{}-{}.tgz", CHART, version)],
            "created": "2024-03-01T10:00:00.000000000Z",
            "digest": "2f1c8a7e4b0f6d3a9e5c1b7d8f0a2c4e6b8d0f1a3c5e7b9d1f3a5c7e9b1d3f5a"
        },
        "dependencies": [],
        "values": {},
        "files": {},
        "security": {"signature": {"signed": false, "prov_file": ""}}
    })
}

/// Harbor accepting any upload and reporting `version` back
pub async fn harbor(version: &str) -> MockServer {
    let server = MockServer::start().await;
    mount_upload(&server, ResponseTemplate::new(201).set_body_json(serde_json::json!({"saved": true}))).await;
    mount_metadata(&server, version, ResponseTemplate::new(200).set_body_json(metadata_body(version))).await;
    server
}

pub async fn mount_upload(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(format!("/api/chartrepo/{}/charts", PROJECT)))
        .respond_with(response)
        .mount(server)
        .await;
}

pub async fn mount_metadata(server: &MockServer, version: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/api/chartrepo/{}/charts/{}/{}", PROJECT, CHART, version)))
        .respond_with(response)
        .mount(server)
        .await;
}
