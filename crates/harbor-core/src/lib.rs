//! Harbor Core - Core types for the Harbor chart resource
//!
//! This crate provides the data model shared by the `in` and `out` paths:
//! - `OutRequest` / `InRequest`: the JSON requests read from stdin
//! - `ChartManifest`: a chart's `Chart.yaml`
//! - `RemoteChart`: chart metadata as reported by Harbor
//! - `Response`: the JSON document written to stdout
//! - `VersionRange`: npm-style semantic version ranges
//! - `resolve_version`: picks the version to package before any tool runs

pub mod chart;
pub mod error;
pub mod request;
pub mod response;
pub mod version;

pub use chart::{ChartDependency, ChartManifest, RemoteChart, RemoteChartMetadata};
pub use error::{CoreError, Result};
pub use request::{InParams, InRequest, OutParams, OutRequest, Source, VersionRef};
pub use response::{MetadataField, Response, ResponseVersion};
pub use version::{VersionRange, resolve_version};
