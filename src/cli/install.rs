use crate::cli::CliContext;
use crate::core::report::{Activation, ActivationReport};
use crate::models::credential::{
    ClientCertKeyPair, Consumer, CredentialBundle, SecretToken, SshCertificate,
};
use anyhow::{bail, Context, Result};
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Table};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// JSON credential bundle from the signing service ("-" reads stdin)
    #[arg(
        long,
        value_name = "FILE",
        conflicts_with_all = [
            "ssh_cert_file", "vault_token_file", "kube_cert", "vmware_cert", "browser_cert"
        ]
    )]
    pub bundle: Option<PathBuf>,

    /// Signed SSH certificate
    #[arg(long, value_name = "FILE")]
    pub ssh_cert_file: Option<PathBuf>,

    /// Vault token
    #[arg(long, value_name = "FILE")]
    pub vault_token_file: Option<PathBuf>,

    /// Kubernetes client certificate (PEM)
    #[arg(long, value_name = "FILE", requires = "kube_key")]
    pub kube_cert: Option<PathBuf>,

    /// Kubernetes client key (PEM)
    #[arg(long, value_name = "FILE", requires = "kube_cert")]
    pub kube_key: Option<PathBuf>,

    /// VMware user certificate (PEM)
    #[arg(long, value_name = "FILE", requires = "vmware_key")]
    pub vmware_cert: Option<PathBuf>,

    /// VMware user key (PEM)
    #[arg(long, value_name = "FILE", requires = "vmware_cert")]
    pub vmware_key: Option<PathBuf>,

    /// Browser user certificate (PEM)
    #[arg(long, value_name = "FILE", requires = "browser_key")]
    pub browser_cert: Option<PathBuf>,

    /// Browser user key (PEM)
    #[arg(long, value_name = "FILE", requires = "browser_cert")]
    pub browser_key: Option<PathBuf>,

    /// Output format: text|json
    #[arg(long, default_value = "text")]
    pub format: String,
}

/// Install whatever material was supplied.
///
/// Per-consumer failures are reported but do not fail the command; only a
/// problem reading the input does.
pub fn run(ctx: &CliContext, args: InstallArgs) -> Result<()> {
    if args.format != "text" && args.format != "json" {
        bail!("invalid format: {} (use text|json)", args.format);
    }

    let bundle = load_bundle(&args)?;
    if bundle.is_empty() {
        bail!("no credential material given (use --bundle or the per-consumer file flags)");
    }

    let report = ctx.materializer().activate_all(&bundle);

    for (consumer, err) in report.failures() {
        eprintln!("error: {}: {}", consumer, err);
    }

    if args.format == "json" {
        let json = serde_json::to_string_pretty(&report.to_view()).context("serialize report")?;
        println!("{}", json);
    } else {
        print_table(&report);
    }
    Ok(())
}

fn load_bundle(args: &InstallArgs) -> Result<CredentialBundle> {
    if let Some(path) = &args.bundle {
        let data = read_secret_input(path)?;
        return CredentialBundle::from_json(&data)
            .with_context(|| format!("parse credential bundle {}", path.display()));
    }

    let pair = |consumer: Consumer, cert: &Option<PathBuf>, key: &Option<PathBuf>| -> Result<Option<ClientCertKeyPair>> {
        match (cert, key) {
            (Some(cert), Some(key)) => Ok(Some(ClientCertKeyPair::new(
                consumer,
                fs::read(cert).with_context(|| format!("read {}", cert.display()))?,
                fs::read(key).with_context(|| format!("read {}", key.display()))?,
            ))),
            _ => Ok(None),
        }
    };

    Ok(CredentialBundle {
        ssh_certificate: args
            .ssh_cert_file
            .as_deref()
            .map(|p| read_secret_input(p).map(|s| SshCertificate::new(s.as_str())))
            .transpose()?,
        vault_token: args
            .vault_token_file
            .as_deref()
            .map(|p| {
                read_secret_input(p)
                    .map(|s| SecretToken::new(s.trim_end_matches(['\r', '\n']).to_string()))
            })
            .transpose()?,
        kubernetes: pair(Consumer::Kubernetes, &args.kube_cert, &args.kube_key)?,
        vmware: pair(Consumer::Vmware, &args.vmware_cert, &args.vmware_key)?,
        browser: pair(Consumer::Browser, &args.browser_cert, &args.browser_key)?,
    })
}

fn read_secret_input(path: &Path) -> Result<Zeroizing<String>> {
    let mut buf = Zeroizing::new(String::new());
    if path == Path::new("-") {
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read from stdin")?;
    } else {
        fs::File::open(path)
            .and_then(|mut f| f.read_to_string(&mut buf))
            .with_context(|| format!("read {}", path.display()))?;
    }
    Ok(buf)
}

fn print_table(report: &ActivationReport) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Consumer").add_attribute(Attribute::Bold),
        Cell::new("Status").add_attribute(Attribute::Bold),
        Cell::new("Detail").add_attribute(Attribute::Bold),
    ]);

    for outcome in &report.outcomes {
        let (status, detail) = match &outcome.result {
            Ok(Activation::Installed { warnings }) if warnings.is_empty() => {
                ("installed", "-".to_string())
            }
            Ok(Activation::Installed { warnings }) => ("installed", warnings.join("; ")),
            Ok(Activation::Skipped { reason }) => ("skipped", reason.clone()),
            Err(e) => ("failed", e.to_string()),
        };
        table.add_row(vec![
            outcome.consumer.label().to_string(),
            status.to_string(),
            detail,
        ]);
    }

    println!("{}", table);
}
