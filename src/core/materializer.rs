//! Drives the per-consumer activators over one credential bundle.

use crate::core::config::MaterializerConfig;
use crate::core::report::{ActivationReport, ActivationResult, ConsumerOutcome};
use crate::core::{kubectl, pkcs12, ssh, vault_token};
use crate::models::credential::{
    ClientCertKeyPair, Consumer, CredentialBundle, SecretToken, SshCertificate,
};
use crate::util::command::CommandRunner;
use chrono::Utc;

/// Writes credential material where each downstream client expects it.
///
/// Activators are independent: a failure for one consumer is recorded and
/// the rest still run.
pub struct CredentialMaterializer {
    config: MaterializerConfig,
    runner: Box<dyn CommandRunner>,
}

impl CredentialMaterializer {
    pub fn new(config: MaterializerConfig, runner: Box<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    pub fn activate_ssh(&self, cert: &SshCertificate) -> ActivationResult {
        ssh::activate(&self.config, self.runner.as_ref(), cert)
    }

    pub fn activate_vault_token(&self, token: &SecretToken) -> ActivationResult {
        vault_token::activate(&self.config, token)
    }

    pub fn activate_kubernetes(&self, pair: &ClientCertKeyPair) -> ActivationResult {
        kubectl::activate(&self.config, self.runner.as_ref(), pair)
    }

    pub fn activate_vmware(&self, pair: &ClientCertKeyPair) -> ActivationResult {
        pkcs12::activate(&self.config, self.runner.as_ref(), pair, &self.config.vmware_cert)
    }

    pub fn activate_browser(&self, pair: &ClientCertKeyPair) -> ActivationResult {
        pkcs12::activate(&self.config, self.runner.as_ref(), pair, &self.config.browser_cert)
    }

    /// Run every activator whose material is present in `bundle`.
    pub fn activate_all(&self, bundle: &CredentialBundle) -> ActivationReport {
        let started_at = Utc::now();
        let mut outcomes = Vec::new();
        let mut record = |consumer: Consumer, result: ActivationResult| {
            match &result {
                Ok(activation) => tracing::info!(consumer = %consumer, ?activation, "activated"),
                Err(e) => tracing::warn!(consumer = %consumer, "activation failed: {}", e),
            }
            outcomes.push(ConsumerOutcome { consumer, result });
        };

        if let Some(cert) = &bundle.ssh_certificate {
            record(Consumer::Ssh, self.activate_ssh(cert));
        }
        if let Some(token) = &bundle.vault_token {
            record(Consumer::SecretStore, self.activate_vault_token(token));
        }
        if let Some(pair) = &bundle.kubernetes {
            record(Consumer::Kubernetes, self.activate_kubernetes(pair));
        }
        if let Some(pair) = &bundle.vmware {
            record(Consumer::Vmware, self.activate_vmware(pair));
        }
        if let Some(pair) = &bundle.browser {
            record(Consumer::Browser, self.activate_browser(pair));
        }

        ActivationReport {
            started_at,
            finished_at: Utc::now(),
            outcomes,
        }
    }
}
