//! CLI routing and command dispatch.

use crate::core::config::{MaterializerConfig, Overrides};
use crate::core::materializer::CredentialMaterializer;
use crate::util::command::SystemRunner;
use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub mod doctor;
pub mod install;
pub mod public_key;

/// Shared context passed to all command handlers.
pub struct CliContext {
    pub config: MaterializerConfig,
}

impl CliContext {
    pub fn runner(&self) -> SystemRunner {
        SystemRunner::new(self.config.tool_timeout)
    }

    pub fn materializer(&self) -> CredentialMaterializer {
        CredentialMaterializer::new(self.config.clone(), Box::new(self.runner()))
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "prodaccess",
    version,
    about = "Install short-lived production credentials for SSH, Vault, kubectl, VMware and the browser"
)]
pub struct Cli {
    /// Config file (default: ~/.config/prodaccess/config.toml if present)
    #[arg(long, global = true, value_name = "PATH", env = "PRODACCESS_CONFIG")]
    pub config: Option<PathBuf>,

    /// SSH public key to request signed
    #[arg(long, alias = "sshpubkey", global = true, value_name = "PATH", env = "PRODACCESS_SSH_PUBKEY")]
    pub ssh_pubkey: Option<String>,

    /// SSH certificate to write
    #[arg(long, alias = "sshcert", global = true, value_name = "PATH", env = "PRODACCESS_SSH_CERT")]
    pub ssh_cert: Option<String>,

    /// SSH known hosts file to use
    #[arg(long, alias = "sshknownhosts", global = true, value_name = "PATH", env = "PRODACCESS_SSH_KNOWN_HOSTS")]
    pub ssh_known_hosts: Option<String>,

    /// Path to Vault token to update
    #[arg(long, alias = "vault_token", global = true, value_name = "PATH", env = "PRODACCESS_VAULT_TOKEN")]
    pub vault_token: Option<String>,

    /// Path to store VMware user certificate
    #[arg(long, alias = "vmware_cert_path", global = true, value_name = "PATH", env = "PRODACCESS_VMWARE_CERT_PATH")]
    pub vmware_cert_path: Option<String>,

    /// Path to store browser user certificate
    #[arg(long, alias = "browser_cert_path", global = true, value_name = "PATH", env = "PRODACCESS_BROWSER_CERT_PATH")]
    pub browser_cert_path: Option<String>,

    /// Directory for ephemeral certificate/key files
    #[arg(long, global = true, value_name = "PATH", env = "PRODACCESS_TEMP_DIR")]
    pub temp_dir: Option<String>,

    /// Give up on an external tool after this many seconds
    #[arg(long, global = true, value_name = "SECS", env = "PRODACCESS_TOOL_TIMEOUT")]
    pub tool_timeout: Option<u64>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            ssh_pubkey: self.ssh_pubkey.clone(),
            ssh_cert: self.ssh_cert.clone(),
            ssh_known_hosts: self.ssh_known_hosts.clone(),
            vault_token: self.vault_token.clone(),
            vmware_cert: self.vmware_cert_path.clone(),
            browser_cert: self.browser_cert_path.clone(),
            temp_dir: self.temp_dir.clone(),
            tool_timeout_secs: self.tool_timeout,
        }
    }

    pub fn run(self) -> Result<()> {
        let config = MaterializerConfig::resolve(self.config.as_deref(), &self.overrides())?;
        tracing::debug!(?config, "resolved configuration");
        let ctx = CliContext { config };

        match self.command {
            Commands::Install(args) => install::run(&ctx, args),
            Commands::PublicKey => public_key::run(&ctx),
            Commands::Doctor(args) => doctor::run(&ctx, args),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install credential material returned by the signing service
    Install(install::InstallArgs),
    /// Print the SSH public key to send for signing
    PublicKey,
    /// Diagnose tools, keys and artifact permissions (safe, read-only)
    Doctor(doctor::DoctorArgs),
}

/// Log to stderr; `RUST_LOG` wins over `-v`.
pub fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose > 1)
        .init();
}
