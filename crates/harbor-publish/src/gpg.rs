//! GnuPG command line driver

use regex::Regex;
use std::io;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use crate::runner::{CommandOutput, CommandRunner, CommandSpec};

static SECRET_KEY_IMPORTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^gpg: key ([^:\s]+): secret key imported\s*$").expect("valid regex")
});

#[derive(Clone)]
pub struct GpgCli {
    runner: Arc<dyn CommandRunner>,
    program: String,
    gpgconf: String,
}

impl GpgCli {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        program: impl Into<String>,
        gpgconf: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            program: program.into(),
            gpgconf: gpgconf.into(),
        }
    }

    /// `gpg --batch --homedir <home> --import <key>`
    ///
    /// With a passphrase, loopback pinentry reads it from stdin.
    pub async fn import(
        &self,
        home: &Path,
        key_file: &Path,
        passphrase: Option<&str>,
    ) -> io::Result<CommandOutput> {
        self.runner
            .run(&import_command(&self.program, home, key_file, passphrase))
            .await
    }

    /// `gpg --batch --homedir <home> --output <file> --export-secret-keys <key>`
    ///
    /// Writes a binary keyring in the legacy format `helm package --keyring`
    /// reads. GnuPG 2.1+ keeps no such file on its own.
    pub async fn export_secret_keys(
        &self,
        home: &Path,
        key_id: &str,
        output: &Path,
        passphrase: Option<&str>,
    ) -> io::Result<CommandOutput> {
        self.runner
            .run(&export_command(&self.program, home, key_id, output, passphrase))
            .await
    }

    /// `gpgconf --homedir <home> --kill gpg-agent`
    pub async fn kill_agent(&self, home: &Path) -> io::Result<CommandOutput> {
        let spec = CommandSpec::new(&self.gpgconf)
            .arg("--homedir")
            .arg(home.display().to_string())
            .args(["--kill", "gpg-agent"]);
        self.runner.run(&spec).await
    }
}

impl std::fmt::Debug for GpgCli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpgCli")
            .field("program", &self.program)
            .field("gpgconf", &self.gpgconf)
            .finish()
    }
}

fn base_command(program: &str, home: &Path, passphrase: Option<&str>) -> CommandSpec {
    let mut spec = CommandSpec::new(program)
        .arg("--batch")
        .arg("--homedir")
        .arg(home.display().to_string());

    if let Some(passphrase) = passphrase {
        spec = spec
            .args(["--pinentry-mode", "loopback", "--passphrase-fd", "0"])
            .stdin(passphrase);
    }
    spec
}

fn import_command(
    program: &str,
    home: &Path,
    key_file: &Path,
    passphrase: Option<&str>,
) -> CommandSpec {
    base_command(program, home, passphrase)
        .arg("--import")
        .arg(key_file.display().to_string())
}

fn export_command(
    program: &str,
    home: &Path,
    key_id: &str,
    output: &Path,
    passphrase: Option<&str>,
) -> CommandSpec {
    base_command(program, home, passphrase)
        .arg("--output")
        .arg(output.display().to_string())
        .arg("--export-secret-keys")
        .arg(key_id)
}

/// Key ID from the `gpg --import` diagnostics on stderr
pub fn parse_key_id(stderr: &str) -> Option<String> {
    stderr
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .find_map(|line| SECRET_KEY_IMPORTED.captures(line))
        .map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_id() {
        let stderr = "gpg: keybox '/tmp/k/pubring.kbx' created\n\
                      gpg: /tmp/k/trustdb.gpg: trustdb created\n\
                      gpg: key 4B0C2A1E9D3F7C55: public key \"CI <ci@example.com>\" imported\n\
                      gpg: key 4B0C2A1E9D3F7C55: secret key imported\n\
                      gpg: Total number processed: 1\n";
        assert_eq!(parse_key_id(stderr).as_deref(), Some("4B0C2A1E9D3F7C55"));
    }

    #[test]
    fn test_parse_key_id_crlf() {
        assert_eq!(
            parse_key_id("gpg: key ABCD1234: secret key imported\r\n").as_deref(),
            Some("ABCD1234")
        );
    }

    #[test]
    fn test_parse_key_id_public_only() {
        let stderr = "gpg: key 4B0C2A1E9D3F7C55: public key \"CI\" imported\n\
                      gpg: Total number processed: 1\n";
        assert!(parse_key_id(stderr).is_none());
    }

    #[test]
    fn test_import_command_without_passphrase() {
        let spec = import_command("gpg", Path::new("/tmp/k"), Path::new("/tmp/key.asc"), None);
        assert_eq!(
            spec.args,
            vec!["--batch", "--homedir", "/tmp/k", "--import", "/tmp/key.asc"]
        );
        assert!(spec.stdin.is_none());
    }

    #[test]
    fn test_import_command_with_passphrase() {
        let spec = import_command(
            "gpg",
            Path::new("/tmp/k"),
            Path::new("/tmp/key.asc"),
            Some("hunter2"),
        );
        assert_eq!(spec.flag_value("--pinentry-mode"), Some("loopback"));
        assert_eq!(spec.flag_value("--passphrase-fd"), Some("0"));
        assert_eq!(spec.stdin.as_deref(), Some("hunter2"));
        assert_eq!(spec.args.last().map(String::as_str), Some("/tmp/key.asc"));
    }

    #[test]
    fn test_export_command() {
        let spec = export_command(
            "gpg",
            Path::new("/tmp/k"),
            "4B0C2A1E9D3F7C55",
            Path::new("/tmp/k/secring.gpg"),
            Some("hunter2"),
        );
        assert_eq!(spec.flag_value("--output"), Some("/tmp/k/secring.gpg"));
        assert_eq!(spec.flag_value("--export-secret-keys"), Some("4B0C2A1E9D3F7C55"));
        assert_eq!(spec.flag_value("--pinentry-mode"), Some("loopback"));
        assert_eq!(spec.stdin.as_deref(), Some("hunter2"));
    }
}
