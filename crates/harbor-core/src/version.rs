//! Version resolution and npm-style version ranges
//!
//! `source.version_range` follows node-semver syntax: comparator sets joined
//! by `||`, comparators inside a set separated by whitespace and AND'd.
//! Hyphen ranges (`1.2.3 - 2.0.0`), x-ranges (`1.x`, `1.2.*`) and bare
//! versions (`1.2.3`, meaning exactly that version) are accepted. Each
//! comparator set is translated into a `semver::VersionReq`.

use semver::{Version, VersionReq};
use std::fmt;
use std::path::Path;

use crate::error::{CoreError, Result};
use crate::request::{OutParams, OutRequest, Source};

const OPERATORS: [&str; 7] = [">=", "<=", ">", "<", "=", "~", "^"];

/// A parsed version range
#[derive(Debug, Clone)]
pub struct VersionRange {
    raw: String,
    sets: Vec<VersionReq>,
}

impl VersionRange {
    pub fn parse(raw: &str) -> Result<Self> {
        let sets = raw
            .split("||")
            .map(|set| translate_set(set).map_err(|message| invalid_range(raw, message)))
            .map(|set| {
                set.and_then(|comparators| {
                    VersionReq::parse(&comparators.join(", "))
                        .map_err(|e| invalid_range(raw, e.to_string()))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            raw: raw.trim().to_string(),
            sets,
        })
    }

    /// Whether `version` falls into any comparator set
    pub fn matches(&self, version: &Version) -> bool {
        self.sets.iter().any(|req| req.matches(version))
    }

    /// Check a version string against the range
    pub fn check(&self, version: &str) -> Result<()> {
        let parsed = parse_version(version)?;
        if self.matches(&parsed) {
            Ok(())
        } else {
            Err(CoreError::RangeViolation {
                version: version.to_string(),
                range: self.raw.clone(),
            })
        }
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Parse a version, tolerating a leading `v`
pub fn parse_version(version: &str) -> Result<Version> {
    let trimmed = version.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(trimmed).map_err(|e| CoreError::InvalidVersion {
        version: version.to_string(),
        message: e.to_string(),
    })
}

fn invalid_range(raw: &str, message: impl Into<String>) -> CoreError {
    CoreError::InvalidRange {
        range: raw.trim().to_string(),
        message: message.into(),
    }
}

/// Translate one node-semver comparator set into `semver` comparators
fn translate_set(set: &str) -> std::result::Result<Vec<String>, String> {
    let set = set.trim();
    if set.is_empty() {
        return Ok(vec!["*".to_string()]);
    }

    if let Some((low, high)) = set.split_once(" - ") {
        let low = strip_wildcards(low.trim());
        let high = strip_wildcards(high.trim());
        if low.contains(char::is_whitespace) || high.contains(char::is_whitespace) {
            return Err(format!("malformed hyphen range '{}'", set));
        }
        let mut comparators = Vec::new();
        if !low.is_empty() {
            comparators.push(format!(">={}", low));
        }
        if !high.is_empty() {
            comparators.push(format!("<={}", high));
        }
        if comparators.is_empty() {
            comparators.push("*".to_string());
        }
        return Ok(comparators);
    }

    // Join a dangling operator with the version that follows it (">= 1.2.3")
    let mut tokens: Vec<String> = Vec::new();
    let mut pending: Option<&str> = None;
    for token in set.split_whitespace() {
        match pending.take() {
            Some(op) => tokens.push(format!("{}{}", op, token)),
            None if OPERATORS.contains(&token) => pending = Some(token),
            None => tokens.push(token.to_string()),
        }
    }
    if let Some(op) = pending {
        return Err(format!("operator '{}' without a version", op));
    }

    let mut comparators: Vec<String> = tokens
        .iter()
        .map(|token| translate_comparator(token))
        .collect();
    if comparators.len() > 1 {
        comparators.retain(|c| c != "*");
    }
    if comparators.is_empty() {
        comparators.push("*".to_string());
    }
    Ok(comparators)
}

fn translate_comparator(token: &str) -> String {
    let op = OPERATORS
        .iter()
        .find(|op| token.starts_with(**op))
        .copied()
        .unwrap_or("");
    let version = token[op.len()..].trim_start_matches('v');
    let version = strip_wildcards(version);

    if version.is_empty() {
        // "*", "x", ">=*" and friends match everything
        return "*".to_string();
    }

    // A bare version is an exact match in node-semver, not a caret requirement
    let op = if op.is_empty() { "=" } else { op };
    format!("{}{}", op, version)
}

/// Drop trailing wildcard components: `1.2.x` -> `1.2`, `*` -> ``
fn strip_wildcards(version: &str) -> String {
    let version = version.trim_start_matches('v');
    let parts: Vec<&str> = version
        .split('.')
        .take_while(|part| !matches!(*part, "x" | "X" | "*" | ""))
        .collect();
    parts.join(".")
}

/// Determine the version to package before any external tool runs
///
/// An existing `version_file` overrides `params.version`. When a candidate
/// exists and `source.version_range` is set, the candidate must satisfy it.
/// `Ok(None)` means the version is only known after inspecting the archive.
pub fn resolve_version(params: &OutParams, source: &Source, root: &Path) -> Result<Option<String>> {
    let mut version = params.version.clone();

    if let Some(version_file) = &params.version_file {
        let path = OutRequest::resolve_path(root, version_file);
        if path.is_file() {
            let content = std::fs::read_to_string(&path)?;
            tracing::info!("Read version from {}", path.display());
            version = Some(content.trim().to_string());
        } else {
            tracing::warn!(
                "version_file {} does not exist, ignoring it",
                path.display()
            );
        }
    }

    let version = version
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    if let (Some(candidate), Some(range)) = (&version, &source.version_range) {
        VersionRange::parse(range)?.check(candidate)?;
        tracing::info!("Version {} satisfies range {}", candidate, range);
    }

    Ok(version)
}
