//! Harbor Repository Client
//!
//! Talks to the chart repository API of a Harbor project:
//!
//! - **Upload**: `POST {server}api/chartrepo/{project}/charts` (multipart `chart` + `prov`)
//! - **Metadata**: `GET {server}api/chartrepo/{project}/charts/{name}/{version}`
//! - **Download**: `GET {server}chartrepo/{project}/charts/{name}-{version}.tgz[.prov]`
//!
//! ## Example
//!
//! ```rust,no_run
//! use harbor_core::OutRequest;
//! use harbor_repo::HarborClient;
//!
//! # async fn example(request: OutRequest) -> Result<(), Box<dyn std::error::Error>> {
//! let client = HarborClient::new(&request.source, None)?;
//! let fetched = client.chart_metadata("1.2.0").await?;
//! println!("digest: {}", fetched.chart.metadata.digest);
//! # Ok(())
//! # }
//! ```
//!
//! ## Security Notes
//!
//! - The `Authorization` header is built per request, never stored on the client
//! - Credentials are redacted from `Debug` output

pub mod client;
pub mod credentials;
pub mod digest;
pub mod error;

// Re-exports for convenience
pub use client::{ChartUpload, FetchedChart, HarborClient, UploadAck};
pub use credentials::Credentials;
pub use digest::{compute_digest, digest_matches};
pub use error::{RepoError, Result};
