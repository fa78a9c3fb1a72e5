//! Temporary directories owned by a single pipeline run
//!
//! Both directory types remove themselves when dropped, so every exit path
//! (success, error, panic) releases them. `close` surfaces removal errors.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const WORKSPACE_PREFIX: &str = "harbor-chart-";
const KEYRING_PREFIX: &str = "harbor-gpg-keyring-";

/// Packaging output directory
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn create() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix(WORKSPACE_PREFIX).tempdir()?;
        tracing::debug!("Created workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file readable only by the current user
    pub fn write_private(&self, name: &str, contents: &str) -> io::Result<PathBuf> {
        write_private(self.path(), name, contents)
    }

    pub fn close(self) -> io::Result<()> {
        let path = self.path().to_path_buf();
        self.dir.close()?;
        tracing::debug!("Removed workspace {}", path.display());
        Ok(())
    }
}

/// Isolated GNUPGHOME holding decrypted key material
#[derive(Debug)]
pub struct Keyring {
    dir: TempDir,
}

impl Keyring {
    pub fn create() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix(KEYRING_PREFIX).tempdir()?;
        tracing::info!("Using new empty temporary GNUPGHOME: {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Legacy secret keyring file handed to `helm package --keyring`
    ///
    /// Only exists once the imported key has been exported into it.
    pub fn secret_keyring(&self) -> PathBuf {
        self.path().join("secring.gpg")
    }

    pub fn write_private(&self, name: &str, contents: &str) -> io::Result<PathBuf> {
        write_private(self.path(), name, contents)
    }

    pub fn close(self) -> io::Result<()> {
        tracing::info!("Removing temporary GNUPGHOME {}", self.path().display());
        self.dir.close()
    }
}

fn write_private(dir: &Path, name: &str, contents: &str) -> io::Result<PathBuf> {
    let path = dir.join(name);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true).mode(0o600);
        io::Write::write_all(&mut options.open(&path)?, contents.as_bytes())?;
    }

    #[cfg(not(unix))]
    {
        std::fs::write(&path, contents)?;
    }

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_removed_on_close() {
        let workspace = Workspace::create().unwrap();
        let path = workspace.path().to_path_buf();
        assert!(path.is_dir());
        workspace.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_keyring_removed_on_drop() {
        let path = {
            let keyring = Keyring::create().unwrap();
            keyring.write_private("passphrase", "hunter2").unwrap();
            keyring.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_unique_directories() {
        let a = Keyring::create().unwrap();
        let b = Keyring::create().unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a.path().file_name().unwrap().to_string_lossy().starts_with(KEYRING_PREFIX));
    }

    #[cfg(unix)]
    #[test]
    fn test_private_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let workspace = Workspace::create().unwrap();
        let path = workspace.write_private("gpg-key.asc", "key material").unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "key material");
    }
}
