use crate::constants;
use crate::core::config::MaterializerConfig;
use crate::core::report::{Activation, ActivationResult};
use crate::error::ActivationError;
use crate::models::credential::SecretToken;
use crate::util::fs as secure_fs;

/// Replace the Vault token file with `token`, readable by the owner only.
pub fn activate(config: &MaterializerConfig, token: &SecretToken) -> ActivationResult {
    let path = &config.vault_token;
    // drop the old file first so a group/world-readable leftover never survives
    secure_fs::remove_if_exists(path)
        .map_err(|e| ActivationError::io("remove old Vault token", path, e))?;
    secure_fs::write_secure(path, token.expose().as_bytes(), constants::TOKEN_FILE_MODE)
        .map_err(|e| ActivationError::io("write Vault token", path, e))?;
    tracing::debug!(path = %path.display(), "wrote Vault token");
    Ok(Activation::installed())
}
