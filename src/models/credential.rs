//! Credential material handed over by the authentication exchange.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

/// Downstream system a piece of material is installed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Consumer {
    Ssh,
    SecretStore,
    Kubernetes,
    Vmware,
    Browser,
}

impl Consumer {
    pub fn label(&self) -> &'static str {
        match self {
            Consumer::Ssh => "SSH",
            Consumer::SecretStore => "Vault",
            Consumer::Kubernetes => "Kubernetes",
            Consumer::Vmware => "VMware",
            Consumer::Browser => "Browser",
        }
    }

    /// Short name used for temp-file prefixes.
    pub fn slug(&self) -> &'static str {
        match self {
            Consumer::Ssh => "ssh",
            Consumer::SecretStore => "vault",
            Consumer::Kubernetes => "k8s",
            Consumer::Vmware => "vmware",
            Consumer::Browser => "browser",
        }
    }
}

impl fmt::Display for Consumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Signed OpenSSH certificate text.
#[derive(Clone, PartialEq, Eq)]
pub struct SshCertificate(String);

impl SshCertificate {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Certificate type field, e.g. `ecdsa-sha2-nistp521-cert-v01@openssh.com`.
    pub fn key_type(&self) -> Option<&str> {
        self.0.split_whitespace().next()
    }
}

impl fmt::Debug for SshCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SshCertificate")
            .field(&self.key_type().unwrap_or("<empty>"))
            .finish()
    }
}

/// Secret-store session token. Wiped from memory on drop.
pub struct SecretToken(Zeroizing<String>);

impl SecretToken {
    pub fn new(token: String) -> Self {
        Self(Zeroizing::new(token))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretToken(<redacted>)")
    }
}

/// PEM certificate and private key for one consumer.
pub struct ClientCertKeyPair {
    pub consumer: Consumer,
    certificate: Vec<u8>,
    private_key: Zeroizing<Vec<u8>>,
}

impl ClientCertKeyPair {
    pub fn new(consumer: Consumer, certificate: Vec<u8>, private_key: Vec<u8>) -> Self {
        Self {
            consumer,
            certificate,
            private_key: Zeroizing::new(private_key),
        }
    }

    pub fn certificate(&self) -> &[u8] {
        &self.certificate
    }

    pub fn private_key(&self) -> &[u8] {
        &self.private_key
    }
}

impl fmt::Debug for ClientCertKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCertKeyPair")
            .field("consumer", &self.consumer)
            .field("certificate_len", &self.certificate.len())
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Everything the authentication exchange returned, as one document.
///
/// Each field is optional; absent material means the consumer is left alone.
#[derive(Debug, Default)]
pub struct CredentialBundle {
    pub ssh_certificate: Option<SshCertificate>,
    pub vault_token: Option<SecretToken>,
    pub kubernetes: Option<ClientCertKeyPair>,
    pub vmware: Option<ClientCertKeyPair>,
    pub browser: Option<ClientCertKeyPair>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBundle {
    #[serde(default)]
    ssh_certificate: Option<String>,
    #[serde(default)]
    vault_token: Option<String>,
    #[serde(default)]
    kubernetes: Option<RawPair>,
    #[serde(default)]
    vmware: Option<RawPair>,
    #[serde(default)]
    browser: Option<RawPair>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPair {
    certificate: String,
    private_key: String,
}

impl RawPair {
    fn into_pair(self, consumer: Consumer) -> ClientCertKeyPair {
        ClientCertKeyPair::new(
            consumer,
            self.certificate.into_bytes(),
            self.private_key.into_bytes(),
        )
    }
}

impl CredentialBundle {
    /// Parse the JSON bundle format.
    pub fn from_json(data: &str) -> serde_json::Result<Self> {
        let raw: RawBundle = serde_json::from_str(data)?;
        Ok(Self {
            ssh_certificate: raw.ssh_certificate.map(SshCertificate::new),
            vault_token: raw.vault_token.map(SecretToken::new),
            kubernetes: raw.kubernetes.map(|p| p.into_pair(Consumer::Kubernetes)),
            vmware: raw.vmware.map(|p| p.into_pair(Consumer::Vmware)),
            browser: raw.browser.map(|p| p.into_pair(Consumer::Browser)),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.ssh_certificate.is_none()
            && self.vault_token.is_none()
            && self.kubernetes.is_none()
            && self.vmware.is_none()
            && self.browser.is_none()
    }
}
