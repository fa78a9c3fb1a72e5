//! Chart definitions: the local `Chart.yaml` and Harbor's view of a chart

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CoreError, Result};

/// File name of the chart manifest inside a chart directory
pub const MANIFEST_FILE: &str = "Chart.yaml";

/// A chart's `Chart.yaml`
///
/// Only the fields the publish pipeline reads are modelled; everything else
/// is ignored on deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartManifest {
    #[serde(default)]
    pub api_version: Option<String>,

    pub name: String,

    /// Default version, used when the request does not supply one
    pub version: String,

    #[serde(default)]
    pub app_version: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Dependencies declared inline (apiVersion v2 charts)
    #[serde(default)]
    pub dependencies: Vec<ChartDependency>,
}

/// A dependency entry of a chart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartDependency {
    pub name: String,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub repository: Option<String>,
}

impl ChartManifest {
    /// Load `Chart.yaml` from a chart directory
    pub fn load<P: AsRef<Path>>(chart_dir: P) -> Result<Self> {
        let chart_dir = chart_dir.as_ref();
        let manifest = chart_dir.join(MANIFEST_FILE);
        if !manifest.is_file() {
            return Err(CoreError::InvalidChart {
                message: format!("{} not found in {}", MANIFEST_FILE, chart_dir.display()),
            });
        }

        let content = std::fs::read_to_string(&manifest)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let manifest: Self = serde_yaml::from_str(yaml)?;
        if manifest.name.trim().is_empty() {
            return Err(CoreError::InvalidChart {
                message: "name must not be empty".to_string(),
            });
        }
        Ok(manifest)
    }

    /// File name `helm package` gives the archive
    ///
    /// Uses `version` when the package step overrides it, otherwise the
    /// manifest's own version.
    pub fn archive_name(&self, version: Option<&str>) -> String {
        format!("{}-{}.tgz", self.name, version.unwrap_or(&self.version))
    }

    /// Repository URLs of the inline dependencies that are served over HTTP(S)
    pub fn http_repositories(&self) -> impl Iterator<Item = &str> {
        self.dependencies
            .iter()
            .filter_map(|dep| dep.repository.as_deref())
            .filter(|repo| repo.starts_with("http://") || repo.starts_with("https://"))
    }
}

/// Chart version details as returned by
/// `GET api/chartrepo/{project}/charts/{name}/{version}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteChart {
    pub metadata: RemoteChartMetadata,
}

/// The `metadata` block of Harbor's chart version details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteChartMetadata {
    pub name: String,

    pub version: String,

    #[serde(default)]
    pub app_version: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub created: Option<String>,

    #[serde(default)]
    pub digest: String,
}

impl RemoteChart {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_deserialize() {
        let yaml = r#"
apiVersion: v2
name: myapp
version: 0.3.1
appVersion: "2.4"
description: My application
home: https://example.com
"#;
        let manifest = ChartManifest::from_yaml(yaml).unwrap();
        assert_eq!(manifest.name, "myapp");
        assert_eq!(manifest.version, "0.3.1");
        assert_eq!(manifest.app_version.as_deref(), Some("2.4"));
        assert!(manifest.dependencies.is_empty());
    }

    #[test]
    fn test_archive_name() {
        let manifest = ChartManifest::from_yaml("name: myapp\nversion: 0.3.1\n").unwrap();
        assert_eq!(manifest.archive_name(None), "myapp-0.3.1.tgz");
        assert_eq!(manifest.archive_name(Some("1.2.0")), "myapp-1.2.0.tgz");
    }

    #[test]
    fn test_http_repositories() {
        let yaml = r#"
name: myapp
version: 1.0.0
dependencies:
  - name: redis
    version: ^17.0.0
    repository: https://charts.bitnami.com/bitnami
  - name: local
    version: 0.1.0
    repository: file://../local
  - name: aliased
    version: 1.0.0
    repository: "@stable"
  - name: bare
"#;
        let manifest = ChartManifest::from_yaml(yaml).unwrap();
        let repos: Vec<&str> = manifest.http_repositories().collect();
        assert_eq!(repos, vec!["https://charts.bitnami.com/bitnami"]);
    }

    #[test]
    fn test_manifest_requires_name() {
        assert!(ChartManifest::from_yaml("name: ''\nversion: 1.0.0\n").is_err());
        assert!(ChartManifest::from_yaml("version: 1.0.0\n").is_err());
    }

    #[test]
    fn test_load_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let err = ChartManifest::load(dir.path()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidChart { .. }));
    }

    #[test]
    fn test_load_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Chart.yaml"), "name: demo\nversion: 0.1.0\n").unwrap();
        let manifest = ChartManifest::load(dir.path()).unwrap();
        assert_eq!(manifest.name, "demo");
    }

    #[test]
    fn test_remote_chart_parse() {
        let body = br#"{
            "metadata": {
                "name": "demo",
                "version": "1.2.0",
                "appVersion": "3.1",
                "description": "Demo chart",
                "created": "2024-01-02T03:04:05Z",
                "digest": "d1e2",
                "urls": ["charts/demo-1.2.0.tgz"]
            },
            "security": {"signature": {"signed": false, "prov_file": ""}},
            "values": {}
        }"#;
        let chart = RemoteChart::from_slice(body).unwrap();
        assert_eq!(chart.metadata.version, "1.2.0");
        assert_eq!(chart.metadata.app_version.as_deref(), Some("3.1"));
        assert_eq!(chart.metadata.digest, "d1e2");
    }
}
