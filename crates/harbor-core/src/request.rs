//! Resource requests read from stdin
//!
//! Both requests share the same `source` block. `server_url` is normalized on
//! deserialization so that it always ends with a `/`.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// The `source` block of the resource configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct Source {
    /// Harbor base URL, always ending with `/`
    #[serde(deserialize_with = "normalize_server_url")]
    pub server_url: String,

    /// Harbor project that hosts the chart repository
    pub project: String,

    /// Chart name inside the project
    pub chart_name: String,

    /// Optional npm-style range every published version must satisfy
    #[serde(default)]
    pub version_range: Option<String>,

    #[serde(default)]
    pub basic_auth_username: Option<String>,

    #[serde(default)]
    pub basic_auth_password: Option<String>,
}

impl Source {
    /// Basic auth pair, present only when both parts are set and non-empty
    pub fn basic_auth(&self) -> Option<(&str, &str)> {
        match (
            self.basic_auth_username.as_deref(),
            self.basic_auth_password.as_deref(),
        ) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("server_url", &self.server_url)
            .field("project", &self.project)
            .field("chart_name", &self.chart_name)
            .field("version_range", &self.version_range)
            .field("basic_auth_username", &self.basic_auth_username)
            .field(
                "basic_auth_password",
                &self.basic_auth_password.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

fn normalize_server_url<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let mut url = String::deserialize(deserializer)?;
    if !url.ends_with('/') {
        url.push('/');
    }
    Ok(url)
}

/// Parameters of the `out` (publish) step
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct OutParams {
    /// Chart source directory or pre-built `.tgz`, relative to the build root
    pub chart: PathBuf,

    #[serde(default)]
    pub sign: bool,

    /// Inline ASCII-armored private key
    #[serde(default)]
    pub key_data: Option<String>,

    #[serde(default)]
    pub key_file: Option<PathBuf>,

    #[serde(default)]
    pub key_passphrase: Option<String>,

    #[serde(default)]
    pub app_version: Option<String>,

    #[serde(default)]
    pub version: Option<String>,

    /// File whose trimmed content overrides `version` when it exists
    #[serde(default)]
    pub version_file: Option<PathBuf>,

    /// Overwrite an existing chart version on the server
    #[serde(default)]
    pub force: bool,
}

impl fmt::Debug for OutParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutParams")
            .field("chart", &self.chart)
            .field("sign", &self.sign)
            .field("key_data", &self.key_data.as_ref().map(|_| "<redacted>"))
            .field("key_file", &self.key_file)
            .field(
                "key_passphrase",
                &self.key_passphrase.as_ref().map(|_| "<redacted>"),
            )
            .field("app_version", &self.app_version)
            .field("version", &self.version)
            .field("version_file", &self.version_file)
            .field("force", &self.force)
            .finish()
    }
}

/// Request of the `out` step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutRequest {
    pub source: Source,
    pub params: OutParams,
}

impl OutRequest {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Resolve a params path against the build root
    pub fn resolve_path(root: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        }
    }
}

/// A resource version as emitted by `check`/`out`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRef {
    pub version: String,

    #[serde(default)]
    pub digest: Option<String>,
}

/// Parameters of the `in` (fetch) step
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InParams {
    /// Base name for the files written to the destination
    #[serde(default)]
    pub target_basename: Option<String>,
}

/// Request of the `in` step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InRequest {
    pub source: Source,
    pub version: VersionRef,

    #[serde(default)]
    pub params: InParams,
}

impl InRequest {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }
}
