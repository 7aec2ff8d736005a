//! Resolution of the immutable materializer configuration.

use crate::constants;
use crate::models::config_file::ConfigFile;
use crate::models::known_hosts::KnownHostsEntry;
use crate::util::path::expand;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Everything the activators need to know about where artifacts live.
#[derive(Debug, Clone)]
pub struct MaterializerConfig {
    pub ssh_pubkey: PathBuf,
    pub ssh_cert: PathBuf,
    pub ssh_known_hosts: PathBuf,
    pub vault_token: PathBuf,
    pub vmware_cert: PathBuf,
    pub browser_cert: PathBuf,
    /// Parent for ephemeral cert/key directories; `None` = system temp dir.
    pub temp_dir: Option<PathBuf>,
    pub cert_authority: KnownHostsEntry,
    pub tool_timeout: Duration,
    /// Config file the values were read from, if any.
    pub source: Option<PathBuf>,
}

/// Values given on the command line (or via their env vars).
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub ssh_pubkey: Option<String>,
    pub ssh_cert: Option<String>,
    pub ssh_known_hosts: Option<String>,
    pub vault_token: Option<String>,
    pub vmware_cert: Option<String>,
    pub browser_cert: Option<String>,
    pub temp_dir: Option<String>,
    pub tool_timeout_secs: Option<u64>,
}

impl MaterializerConfig {
    /// Resolve from CLI overrides, then the config file, then defaults.
    ///
    /// `config_arg` names a file that must exist; without it the default
    /// location is read only if present.
    pub fn resolve(config_arg: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let source = match config_arg {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path().filter(|path| path.is_file()),
        };
        let file = match &source {
            Some(path) => load_file(path)?,
            None => ConfigFile::default(),
        };
        Ok(Self {
            source,
            ..Self::from_sources(&file, overrides)?
        })
    }

    pub fn from_sources(file: &ConfigFile, overrides: &Overrides) -> Result<Self> {
        let pick = |flag: &Option<String>, from_file: &Option<String>, default: &str| {
            expand(
                flag.as_deref()
                    .or(from_file.as_deref())
                    .unwrap_or(default),
            )
        };
        let paths = &file.paths;

        let cert_authority: KnownHostsEntry = match &file.ssh.cert_authority {
            Some(line) => line
                .parse::<KnownHostsEntry>()
                .with_context(|| format!("invalid [ssh] cert_authority: {}", line))?,
            None => constants::CERT_AUTHORITY
                .parse::<KnownHostsEntry>()
                .context("built-in trust anchor")?,
        };

        let timeout_secs = overrides
            .tool_timeout_secs
            .or(file.tools.timeout_secs)
            .unwrap_or(constants::DEFAULT_TOOL_TIMEOUT_SECS);
        if timeout_secs == 0 {
            anyhow::bail!("tool timeout must be at least one second");
        }

        Ok(Self {
            ssh_pubkey: pick(&overrides.ssh_pubkey, &paths.ssh_pubkey, constants::DEFAULT_SSH_PUBKEY),
            ssh_cert: pick(&overrides.ssh_cert, &paths.ssh_cert, constants::DEFAULT_SSH_CERT),
            ssh_known_hosts: pick(
                &overrides.ssh_known_hosts,
                &paths.ssh_known_hosts,
                constants::DEFAULT_SSH_KNOWN_HOSTS,
            ),
            vault_token: pick(&overrides.vault_token, &paths.vault_token, constants::DEFAULT_VAULT_TOKEN),
            vmware_cert: pick(&overrides.vmware_cert, &paths.vmware_cert, constants::DEFAULT_VMWARE_CERT),
            browser_cert: pick(
                &overrides.browser_cert,
                &paths.browser_cert,
                constants::DEFAULT_BROWSER_CERT,
            ),
            temp_dir: overrides
                .temp_dir
                .as_deref()
                .or(paths.temp_dir.as_deref())
                .map(expand),
            cert_authority,
            tool_timeout: Duration::from_secs(timeout_secs),
            source: None,
        })
    }

    /// Directory ephemeral cert/key pairs are created under.
    pub fn temp_root(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// `$XDG_CONFIG_HOME/prodaccess/config.toml` (or the platform equivalent).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(constants::CONFIG_DIR_NAME).join(constants::CONFIG_FILE_NAME))
}

pub fn load_file(path: &Path) -> Result<ConfigFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parse config {}", path.display()))
}

impl std::fmt::Display for MaterializerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            Some(path) => write!(f, "config {}", path.display()),
            None => write!(f, "built-in defaults"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config_file::{PathsSection, SshSection, ToolsSection};
    use tempfile::TempDir;

    #[test]
    fn test_flag_beats_file_beats_default() {
        let file = ConfigFile {
            paths: PathsSection {
                ssh_cert: Some("/from/file-cert.pub".into()),
                vault_token: Some("/from/file-token".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let overrides = Overrides {
            ssh_cert: Some("/from/flag-cert.pub".into()),
            ..Default::default()
        };
        let cfg = MaterializerConfig::from_sources(&file, &overrides).unwrap();
        assert_eq!(cfg.ssh_cert, PathBuf::from("/from/flag-cert.pub"));
        assert_eq!(cfg.vault_token, PathBuf::from("/from/file-token"));
        assert!(cfg.vmware_cert.ends_with("vmware-user.pfx"));
        assert_eq!(cfg.tool_timeout, Duration::from_secs(30));
        assert_eq!(cfg.cert_authority.to_string(), constants::CERT_AUTHORITY);
    }

    #[test]
    fn test_custom_cert_authority() {
        let file = ConfigFile {
            ssh: SshSection {
                cert_authority: Some("@cert-authority *.example.org ssh-ed25519 AAAAC3".into()),
            },
            ..Default::default()
        };
        let cfg = MaterializerConfig::from_sources(&file, &Overrides::default()).unwrap();
        assert_eq!(cfg.cert_authority.host_pattern, "*.example.org");
    }

    #[test]
    fn test_invalid_cert_authority_is_error() {
        let file = ConfigFile {
            ssh: SshSection {
                cert_authority: Some("not an anchor".into()),
            },
            ..Default::default()
        };
        assert!(MaterializerConfig::from_sources(&file, &Overrides::default()).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let file = ConfigFile {
            tools: ToolsSection {
                timeout_secs: Some(0),
            },
            ..Default::default()
        };
        assert!(MaterializerConfig::from_sources(&file, &Overrides::default()).is_err());
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(MaterializerConfig::resolve(Some(&missing), &Overrides::default()).is_err());
    }

    #[test]
    fn test_resolve_reads_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[paths]\nbrowser_cert = \"/srv/browser.pfx\"\n").unwrap();
        let cfg = MaterializerConfig::resolve(Some(&path), &Overrides::default()).unwrap();
        assert_eq!(cfg.browser_cert, PathBuf::from("/srv/browser.pfx"));
        assert_eq!(cfg.source.as_deref(), Some(path.as_path()));
        assert_eq!(cfg.to_string(), format!("config {}", path.display()));
    }

    #[test]
    fn test_display_without_file() {
        let cfg = MaterializerConfig::from_sources(&ConfigFile::default(), &Overrides::default())
            .unwrap();
        assert_eq!(cfg.to_string(), "built-in defaults");
    }
}
