//! Harbor Publish - the `out` pipeline of the Harbor chart resource
//!
//! Stages run strictly in order and the first failure ends the run:
//!
//! 1. **Version resolution** (`harbor_core::resolve_version`)
//! 2. **Chart build** when `params.chart` is a directory: repository
//!    registration, `helm dependency build`, optional key import and
//!    `helm package [--sign]`
//! 3. **Inspection** of the archive with `helm show chart`
//! 4. **Upload** to `api/chartrepo/{project}/charts`
//! 5. **Verification** of the uploaded version
//!
//! External tools are reached through the [`CommandRunner`] trait so the
//! pipeline can be driven without `helm` or `gpg` installed.

pub mod builder;
pub mod error;
pub mod gpg;
pub mod helm;
pub mod pipeline;
pub mod publisher;
pub mod runner;
pub mod signing;
pub mod verifier;
pub mod workspace;

pub use builder::{ChartBuilder, PackagedChart};
pub use error::{PublishError, Result};
pub use gpg::GpgCli;
pub use helm::HelmCli;
pub use pipeline::{Pipeline, PublishConfig};
pub use publisher::Publisher;
pub use runner::{CommandOutput, CommandRunner, CommandSpec, ProcessRunner};
pub use signing::{KeySource, SigningContext};
pub use verifier::Verifier;
pub use workspace::{Keyring, Workspace};
