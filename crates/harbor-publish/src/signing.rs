//! Signing key import
//!
//! A [`SigningContext`] owns the isolated keyring the key was imported into.
//! The keyring is deleted when the context is closed or dropped, whichever
//! comes first, so decrypted key material never outlives packaging.

use std::io;
use std::path::{Path, PathBuf};

use harbor_core::{OutParams, OutRequest};

use crate::error::{PublishError, Result};
use crate::gpg::{GpgCli, parse_key_id};
use crate::helm::SignOptions;
use crate::workspace::{Keyring, Workspace};

/// File name inline key material is written to inside the workspace
const INLINE_KEY_FILE: &str = "gpg-key.asc";
const PASSPHRASE_FILE: &str = "passphrase";

/// Where the private key comes from
#[derive(Clone, PartialEq, Eq)]
pub enum KeySource {
    /// `params.key_data`
    Inline(String),
    /// `params.key_file`, resolved against the build root
    File(PathBuf),
}

impl KeySource {
    /// Pick the key source from the request; `key_data` wins over `key_file`
    pub fn from_params(params: &OutParams, root: &Path) -> Result<Self> {
        let key_data = params.key_data.as_deref().filter(|data| !data.trim().is_empty());
        match (key_data, &params.key_file) {
            (Some(data), key_file) => {
                if key_file.is_some() {
                    tracing::warn!("Both key_data and key_file are set, using key_data");
                }
                Ok(KeySource::Inline(data.to_string()))
            }
            (None, Some(path)) => Ok(KeySource::File(OutRequest::resolve_path(root, path))),
            (None, None) => Err(PublishError::MissingSigningKey),
        }
    }

    /// Path of the key on disk, writing inline material into the workspace first
    pub fn materialize(&self, workspace: &Workspace) -> io::Result<PathBuf> {
        match self {
            KeySource::Inline(data) => workspace.write_private(INLINE_KEY_FILE, data),
            KeySource::File(path) => Ok(path.clone()),
        }
    }
}

impl std::fmt::Debug for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySource::Inline(_) => f.write_str("Inline(<redacted>)"),
            KeySource::File(path) => f.debug_tuple("File").field(path).finish(),
        }
    }
}

/// An imported signing key and the keyring holding it
#[derive(Debug)]
pub struct SigningContext {
    pub key_file: PathBuf,
    pub key_id: String,
    keyring: Keyring,
    passphrase_file: Option<PathBuf>,
    gpg: GpgCli,
}

impl SigningContext {
    /// Import the key into a fresh keyring and export it as a legacy keyring
    ///
    /// On failure the keyring is released before the error is returned.
    pub async fn acquire(
        source: &KeySource,
        passphrase: Option<&str>,
        workspace: &Workspace,
        gpg: &GpgCli,
    ) -> Result<Self> {
        let key_file = source.materialize(workspace)?;
        let keyring = Keyring::create()?;

        match import_key(&keyring, &key_file, passphrase, gpg).await {
            Ok((key_id, passphrase_file)) => {
                tracing::info!("GPG key imported successfully. Key ID: {}", key_id);
                Ok(Self {
                    key_file,
                    key_id,
                    keyring,
                    passphrase_file,
                    gpg: gpg.clone(),
                })
            }
            Err(err) => {
                release(keyring, gpg).await;
                Err(err)
            }
        }
    }

    pub fn keyring_home(&self) -> &Path {
        self.keyring.path()
    }

    /// Flags for `helm package --sign`
    pub fn sign_options(&self) -> SignOptions {
        SignOptions {
            key_id: self.key_id.clone(),
            keyring: self.keyring.secret_keyring(),
            passphrase_file: self.passphrase_file.clone(),
        }
    }

    /// Stop the keyring's agent and delete the keyring
    pub async fn close(self) {
        release(self.keyring, &self.gpg).await;
    }
}

async fn release(keyring: Keyring, gpg: &GpgCli) {
    match gpg.kill_agent(keyring.path()).await {
        Ok(output) if !output.success() => {
            tracing::warn!("Stopping gpg-agent failed: {}", output.failure_text());
        }
        Ok(_) => {}
        Err(e) => tracing::warn!("Stopping gpg-agent failed: {}", e),
    }
    if let Err(e) = keyring.close() {
        tracing::warn!("Failed to remove temporary GNUPGHOME: {}", e);
    }
}

async fn import_key(
    keyring: &Keyring,
    key_file: &Path,
    passphrase: Option<&str>,
    gpg: &GpgCli,
) -> Result<(String, Option<PathBuf>)> {
    tracing::info!("Importing GPG private key {}...", key_file.display());

    let import_failed = |stderr: String| PublishError::GpgImportFailed {
        key_file: key_file.display().to_string(),
        stderr,
    };

    let output = gpg
        .import(keyring.path(), key_file, passphrase)
        .await
        .map_err(|e| import_failed(e.to_string()))?;
    if !output.stdout.trim().is_empty() {
        tracing::debug!("gpg: {}", output.stdout.trim());
    }
    if !output.success() {
        return Err(import_failed(output.failure_text()));
    }

    let key_id = parse_key_id(&output.stderr).ok_or_else(|| PublishError::KeyIdNotFound {
        message: "no 'secret key imported' line in gpg output".to_string(),
    })?;

    export_key(keyring, &key_id, passphrase, gpg).await?;

    let passphrase_file = passphrase
        .map(|p| keyring.write_private(PASSPHRASE_FILE, p))
        .transpose()?;

    Ok((key_id, passphrase_file))
}

async fn export_key(
    keyring: &Keyring,
    key_id: &str,
    passphrase: Option<&str>,
    gpg: &GpgCli,
) -> Result<()> {
    let secret_keyring = keyring.secret_keyring();
    let export_failed = |stderr: String| PublishError::KeyExportFailed {
        key_id: key_id.to_string(),
        stderr,
    };

    let output = gpg
        .export_secret_keys(keyring.path(), key_id, &secret_keyring, passphrase)
        .await
        .map_err(|e| export_failed(e.to_string()))?;
    if !output.success() {
        return Err(export_failed(output.failure_text()));
    }
    if !secret_keyring.is_file() {
        return Err(export_failed(format!(
            "{} was not written",
            secret_keyring.display()
        )));
    }
    Ok(())
}
