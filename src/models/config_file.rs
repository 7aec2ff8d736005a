//! On-disk configuration file model.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub paths: PathsSection,
    #[serde(default)]
    pub ssh: SshSection,
    #[serde(default)]
    pub tools: ToolsSection,
}

/// Artifact locations. Values may use `~`, `$VAR` and `${VAR}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsSection {
    #[serde(default)]
    pub ssh_pubkey: Option<String>,
    #[serde(default)]
    pub ssh_cert: Option<String>,
    #[serde(default)]
    pub ssh_known_hosts: Option<String>,
    #[serde(default)]
    pub vault_token: Option<String>,
    #[serde(default)]
    pub vmware_cert: Option<String>,
    #[serde(default)]
    pub browser_cert: Option<String>,
    /// Where ephemeral cert/key pairs are written (default: system temp dir).
    #[serde(default)]
    pub temp_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SshSection {
    /// Full `@cert-authority` line replacing the built-in trust anchor.
    #[serde(default)]
    pub cert_authority: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsSection {
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let file: ConfigFile = toml::from_str(
            r#"
[paths]
ssh_cert = "~/.ssh/id_ed25519-cert.pub"
vault_token = "${XDG_RUNTIME_DIR}/vault-token"

[ssh]
cert_authority = "@cert-authority *.example.org ssh-ed25519 AAAAC3"

[tools]
timeout_secs = 5
"#,
        )
        .unwrap();
        assert_eq!(file.paths.ssh_cert.as_deref(), Some("~/.ssh/id_ed25519-cert.pub"));
        assert!(file.paths.ssh_pubkey.is_none());
        assert_eq!(file.tools.timeout_secs, Some(5));
        assert!(file.ssh.cert_authority.is_some());
    }

    #[test]
    fn test_parse_empty() {
        let file: ConfigFile = toml::from_str("").unwrap();
        assert!(file.paths.vault_token.is_none());
        assert!(file.tools.timeout_secs.is_none());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(toml::from_str::<ConfigFile>("[paths]\nsshcert = \"x\"\n").is_err());
    }
}
