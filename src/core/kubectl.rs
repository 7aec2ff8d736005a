//! kubectl client certificate, embedded into the user's kubeconfig.

use crate::constants;
use crate::core::config::MaterializerConfig;
use crate::core::report::{Activation, ActivationResult};
use crate::error::ActivationError;
use crate::models::credential::ClientCertKeyPair;
use crate::util::command::{run_checked, CommandRunner};
use crate::util::tempfiles::ScopedTempFilePair;
use std::ffi::OsString;
use std::path::Path;

/// Store `pair` as the `dhtech` kubectl user with embedded certificates.
///
/// Skipped without touching the filesystem when kubectl is not installed.
pub fn activate(
    config: &MaterializerConfig,
    runner: &dyn CommandRunner,
    pair: &ClientCertKeyPair,
) -> ActivationResult {
    if runner.locate(constants::KUBECTL).is_none() {
        tracing::debug!("kubectl not on PATH, skipping Kubernetes credentials");
        return Ok(Activation::Skipped {
            reason: ActivationError::ToolNotFound {
                tool: constants::KUBECTL.to_string(),
            }
            .to_string(),
        });
    }

    let temp_root = config.temp_root();
    let files = ScopedTempFilePair::create(
        &temp_root,
        pair.consumer.slug(),
        pair.certificate(),
        pair.private_key(),
    )
    .map_err(|e| ActivationError::io("write ephemeral Kubernetes credentials", &temp_root, e))?;

    let args = set_credentials_args(files.cert_path(), files.key_path());
    let result = run_checked(runner, constants::KUBECTL, &args);

    let mut warnings = Vec::new();
    if let Err(e) = files.close() {
        warnings.push(ActivationError::Cleanup(e.to_string()).to_string());
    }
    result?;

    tracing::debug!(user = constants::KUBE_CREDENTIAL_NAME, "stored kubectl credentials");
    Ok(Activation::Installed { warnings })
}

fn set_credentials_args(cert: &Path, key: &Path) -> Vec<OsString> {
    let mut client_cert = OsString::from("--client-certificate=");
    client_cert.push(cert);
    let mut client_key = OsString::from("--client-key=");
    client_key.push(key);
    vec![
        "config".into(),
        "set-credentials".into(),
        constants::KUBE_CREDENTIAL_NAME.into(),
        "--embed-certs=true".into(),
        client_cert,
        client_key,
    ]
}
