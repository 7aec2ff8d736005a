//! SSH certificate installation, trust anchor, and agent reload.

use crate::constants;
use crate::core::config::MaterializerConfig;
use crate::core::report::{Activation, ActivationResult};
use crate::error::{ActivationError, Result};
use crate::models::credential::SshCertificate;
use crate::models::known_hosts::KnownHostsEntry;
use crate::util::command::{run_checked, CommandRunner};
use crate::util::fs as secure_fs;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownHostsUpdate {
    Appended,
    AlreadyPresent,
}

/// Read the public key whose certificate is being installed.
pub fn read_public_key(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| ActivationError::KeyRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Install `cert`, make sure the signing CA is trusted, and reload the key
/// into the running agent.
pub fn activate(
    config: &MaterializerConfig,
    runner: &dyn CommandRunner,
    cert: &SshCertificate,
) -> ActivationResult {
    read_public_key(&config.ssh_pubkey)?;

    secure_fs::write_secure(
        &config.ssh_cert,
        cert.as_str().as_bytes(),
        constants::OWNER_RW_MODE,
    )
    .map_err(|e| ActivationError::io("write SSH certificate", &config.ssh_cert, e))?;
    tracing::debug!(path = %config.ssh_cert.display(), "wrote SSH certificate");

    let mut warnings = Vec::new();

    match ensure_trust_anchor(&config.ssh_known_hosts, &config.cert_authority) {
        Ok(KnownHostsUpdate::Appended) => {
            tracing::info!("added server identity to SSH known hosts")
        }
        Ok(KnownHostsUpdate::AlreadyPresent) => {
            tracing::debug!("skipping SSH known hosts, already present")
        }
        Err(e) => {
            tracing::warn!("skipping SSH known hosts: {}", e);
            warnings.push(format!("known hosts not updated: {}", e));
        }
    }

    // OpenSSH only picks up a new certificate when the key is added again
    match private_key_path(&config.ssh_cert) {
        Some(key) => {
            if let Err(e) = run_checked(runner, constants::SSH_ADD, &[key.into_os_string()]) {
                tracing::warn!("could not reload key into SSH agent: {}", e);
                warnings.push(format!("agent not reloaded: {}", e));
            }
        }
        None => warnings.push(format!(
            "agent not reloaded: {} does not end in {}",
            config.ssh_cert.display(),
            constants::SSH_CERT_SUFFIX
        )),
    }

    Ok(Activation::Installed { warnings })
}

/// Append `entry` to the known_hosts file unless it is already there.
///
/// Existing lines are never rewritten. A missing or unreadable file is an
/// error for the caller to downgrade; this never creates the file.
pub fn ensure_trust_anchor(path: &Path, entry: &KnownHostsEntry) -> Result<KnownHostsUpdate> {
    let current = fs::read_to_string(path)
        .map_err(|e| ActivationError::io("read SSH known hosts", path, e))?;
    if entry.is_present_in(&current) {
        return Ok(KnownHostsUpdate::AlreadyPresent);
    }
    secure_fs::append_line(path, &current, &entry.to_string())
        .map_err(|e| ActivationError::io("append to SSH known hosts", path, e))?;
    Ok(KnownHostsUpdate::Appended)
}

/// `~/.ssh/id_ecdsa-cert.pub` -> `~/.ssh/id_ecdsa`.
pub fn private_key_path(cert: &Path) -> Option<PathBuf> {
    let s = cert.to_str()?;
    let stripped = s.strip_suffix(constants::SSH_CERT_SUFFIX)?;
    if stripped.is_empty() {
        return None;
    }
    Some(PathBuf::from(stripped))
}
