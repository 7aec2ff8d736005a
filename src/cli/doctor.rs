//! Diagnostics for tools, keys, and installed credential artifacts.

use crate::cli::CliContext;
use crate::constants;
use crate::core::config::MaterializerConfig;
use crate::core::ssh;
use crate::util::command::CommandRunner;
use crate::util::{fs as secure_fs, privilege};
use anyhow::Result;
use clap::Args;
use std::fs;
use std::path::Path;

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Treat warnings as failures
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Pass,
    Info,
    Warn,
    Fail,
}

impl Level {
    fn tag(&self) -> &'static str {
        match self {
            Level::Pass => "[PASS]",
            Level::Info => "[INFO]",
            Level::Warn => "[WARN]",
            Level::Fail => "[FAIL]",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Check {
    pub level: Level,
    pub message: String,
}

fn check(level: Level, message: impl Into<String>) -> Check {
    Check {
        level,
        message: message.into(),
    }
}

pub fn run(ctx: &CliContext, args: DoctorArgs) -> Result<()> {
    println!("Doctor ({})", ctx.config);
    let results = checks(&ctx.config, &ctx.runner());

    let mut ok = 0u32;
    let mut warn = 0u32;
    let mut fail = 0u32;
    for c in &results {
        println!("  {} {}", c.level.tag(), c.message);
        match c.level {
            Level::Pass => ok += 1,
            Level::Warn => warn += 1,
            Level::Fail => fail += 1,
            Level::Info => {}
        }
    }

    println!();
    println!("Doctor summary: {} pass, {} warn, {} fail", ok, warn, fail);
    if fail > 0 || (args.strict && warn > 0) {
        std::process::exit(1);
    }
    Ok(())
}

/// Evaluate every diagnostic without printing.
pub fn checks(config: &MaterializerConfig, runner: &dyn CommandRunner) -> Vec<Check> {
    let mut out = Vec::new();

    if privilege::is_root() {
        out.push(check(
            Level::Warn,
            "running as root; credentials would be installed for root",
        ));
    }

    for (tool, required) in [
        (constants::SSH_ADD, true),
        (constants::OPENSSL, true),
        (constants::KUBECTL, false),
    ] {
        match runner.locate(tool) {
            Some(path) => out.push(check(Level::Pass, format!("{} available: {}", tool, path.display()))),
            None if required => out.push(check(Level::Fail, format!("{} not found on PATH", tool))),
            None => out.push(check(
                Level::Info,
                format!("{} not found on PATH (Kubernetes credentials will be skipped)", tool),
            )),
        }
    }

    match ssh::read_public_key(&config.ssh_pubkey) {
        Ok(_) => out.push(check(
            Level::Pass,
            format!("SSH public key readable: {}", config.ssh_pubkey.display()),
        )),
        Err(e) => out.push(check(Level::Fail, e.to_string())),
    }

    match ssh::private_key_path(&config.ssh_cert) {
        Some(key) if key.is_file() => out.push(check(
            Level::Pass,
            format!("SSH private key exists: {}", key.display()),
        )),
        Some(key) => out.push(check(
            Level::Warn,
            format!("SSH private key missing: {} (ssh-add will fail)", key.display()),
        )),
        None => out.push(check(
            Level::Warn,
            format!(
                "SSH certificate path {} does not end in {}; cannot derive private key",
                config.ssh_cert.display(),
                constants::SSH_CERT_SUFFIX
            ),
        )),
    }

    match fs::read_to_string(&config.ssh_known_hosts) {
        Ok(content) if config.cert_authority.is_present_in(&content) => out.push(check(
            Level::Pass,
            format!("trust anchor present in {}", config.ssh_known_hosts.display()),
        )),
        Ok(_) => out.push(check(
            Level::Info,
            format!(
                "trust anchor for {} not yet in {}",
                config.cert_authority.host_pattern,
                config.ssh_known_hosts.display()
            ),
        )),
        Err(e) => out.push(check(
            Level::Warn,
            format!(
                "cannot read {}: {} (trust anchor will not be installed)",
                config.ssh_known_hosts.display(),
                e
            ),
        )),
    }

    out.push(artifact_mode("SSH certificate", &config.ssh_cert, constants::OWNER_RW_MODE));
    out.push(artifact_mode("Vault token", &config.vault_token, constants::TOKEN_FILE_MODE));
    out.push(artifact_mode("VMware bundle", &config.vmware_cert, constants::OWNER_RW_MODE));
    out.push(artifact_mode("Browser bundle", &config.browser_cert, constants::OWNER_RW_MODE));

    out
}

fn artifact_mode(label: &str, path: &Path, expected: u32) -> Check {
    if !path.exists() {
        return check(Level::Info, format!("{} not installed: {}", label, path.display()));
    }
    match secure_fs::mode_of(path) {
        Some(mode) if mode & constants::GROUP_WORLD_BITS != 0 => check(
            Level::Warn,
            format!(
                "{} mode: {:04o} (expected {:04o}): {}",
                label,
                mode,
                expected,
                path.display()
            ),
        ),
        Some(mode) => check(Level::Pass, format!("{} mode ok: {:04o}", label, mode)),
        None => check(Level::Info, format!("{} exists: {}", label, path.display())),
    }
}
