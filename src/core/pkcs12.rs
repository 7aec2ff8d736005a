//! Password-less PKCS#12 bundles for clients that only take that format.
//!
//! VMware and the browser consume the same kind of archive; they differ only
//! in target path and label.

use crate::constants;
use crate::core::config::MaterializerConfig;
use crate::core::report::{Activation, ActivationResult};
use crate::error::{ActivationError, Result};
use crate::models::credential::ClientCertKeyPair;
use crate::util::command::{run_checked, CommandRunner};
use crate::util::fs as secure_fs;
use crate::util::tempfiles::ScopedTempFilePair;
use std::ffi::OsString;
use std::path::Path;

/// Export `pair` as a PKCS#12 archive at `target`.
///
/// On failure `target` is left absent. The ephemeral PEM inputs are removed
/// on every path.
pub fn activate(
    config: &MaterializerConfig,
    runner: &dyn CommandRunner,
    pair: &ClientCertKeyPair,
    target: &Path,
) -> ActivationResult {
    let label = pair.consumer.label();
    let temp_root = config.temp_root();
    let files = ScopedTempFilePair::create(
        &temp_root,
        pair.consumer.slug(),
        pair.certificate(),
        pair.private_key(),
    )
    .map_err(|e| ActivationError::io("write ephemeral certificate", &temp_root, e))?;

    let exported = export(runner, &files, target);

    let mut warnings = Vec::new();
    if let Err(e) = files.close() {
        warnings.push(ActivationError::Cleanup(e.to_string()).to_string());
    }
    if let Err(e) = &exported {
        tracing::warn!("failed to emit {} certificate: {}", label, e);
    }
    warnings.extend(exported?);

    tracing::debug!(path = %target.display(), "wrote {} certificate", label);
    Ok(Activation::Installed { warnings })
}

fn export(runner: &dyn CommandRunner, files: &ScopedTempFilePair, target: &Path) -> Result<Vec<String>> {
    secure_fs::remove_if_exists(target)
        .map_err(|e| ActivationError::io("remove old bundle", target, e))?;
    // the tool writes into a file that is already owner-only
    secure_fs::precreate(target, constants::OWNER_RW_MODE)
        .map_err(|e| ActivationError::io("create bundle", target, e))?;

    if let Err(e) = run_checked(runner, constants::OPENSSL, &export_args(files, target)) {
        if let Err(cleanup) = secure_fs::remove_if_exists(target) {
            tracing::warn!(
                path = %target.display(),
                "could not remove empty bundle after failed export: {}",
                cleanup
            );
        }
        return Err(e);
    }

    tighten_mode(target)
}

/// The tool may replace the pre-created file; check what actually landed.
fn tighten_mode(target: &Path) -> Result<Vec<String>> {
    match secure_fs::mode_of(target) {
        Some(mode) if mode & constants::GROUP_WORLD_BITS != 0 => {
            secure_fs::set_mode(target, constants::OWNER_RW_MODE)
                .map_err(|e| ActivationError::io("restrict bundle permissions", target, e))?;
            Ok(vec![format!(
                "{} was written with mode {:04o}, restricted to {:04o}",
                target.display(),
                mode,
                constants::OWNER_RW_MODE
            )])
        }
        _ => Ok(Vec::new()),
    }
}

fn export_args(files: &ScopedTempFilePair, target: &Path) -> Vec<OsString> {
    vec![
        "pkcs12".into(),
        "-export".into(),
        "-password".into(),
        "pass:".into(),
        "-in".into(),
        files.cert_path().into(),
        "-inkey".into(),
        files.key_path().into(),
        "-out".into(),
        target.into(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Overrides;
    use crate::models::config_file::ConfigFile;
    use crate::models::credential::Consumer;
    use crate::util::command::fake::FakeRunner;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct Fixture {
        _home: TempDir,
        temp: PathBuf,
        target: PathBuf,
        config: MaterializerConfig,
    }

    fn fixture() -> Fixture {
        let home = TempDir::new().unwrap();
        let temp = home.path().join("tmp");
        fs::create_dir(&temp).unwrap();
        let target = home.path().join("vmware-user.pfx");
        let overrides = Overrides {
            temp_dir: Some(temp.display().to_string()),
            vmware_cert: Some(target.display().to_string()),
            ..Default::default()
        };
        let config = MaterializerConfig::from_sources(&ConfigFile::default(), &overrides).unwrap();
        Fixture {
            _home: home,
            temp,
            target,
            config,
        }
    }

    fn pair() -> ClientCertKeyPair {
        ClientCertKeyPair::new(Consumer::Vmware, b"CERT PEM".to_vec(), b"KEY PEM".to_vec())
    }

    fn arg_after(args: &[OsString], flag: &str) -> PathBuf {
        let pos = args.iter().position(|a| a == flag).unwrap();
        PathBuf::from(&args[pos + 1])
    }

    /// Behaves like `openssl pkcs12 -export`: reads the inputs, writes -out.
    fn fake_openssl(out_mode: Option<u32>) -> FakeRunner {
        FakeRunner::new().on_run(move |_, args| {
            let cert = fs::read(arg_after(args, "-in")).unwrap();
            let key = fs::read(arg_after(args, "-inkey")).unwrap();
            let out = arg_after(args, "-out");
            fs::write(&out, [cert, key].concat()).unwrap();
            if let Some(mode) = out_mode {
                secure_fs::set_mode(&out, mode).unwrap();
            }
        })
    }

    #[test]
    fn test_export_success() {
        let f = fixture();
        fs::write(&f.target, "stale bundle").unwrap();
        let runner = fake_openssl(None);

        let result = activate(&f.config, &runner, &pair(), &f.target).unwrap();
        assert_eq!(result, Activation::installed());
        assert_eq!(fs::read(&f.target).unwrap(), b"CERT PEMKEY PEM");

        let calls = runner.calls_to(constants::OPENSSL);
        assert_eq!(calls.len(), 1);
        assert_eq!(&calls[0].args[..4], &["pkcs12", "-export", "-password", "pass:"]);
        assert_eq!(calls[0].args[9], f.target.display().to_string());
        assert_eq!(fs::read_dir(&f.temp).unwrap().count(), 0);
        #[cfg(unix)]
        assert_eq!(secure_fs::mode_of(&f.target), Some(0o600));
    }

    #[cfg(unix)]
    #[test]
    fn test_target_precreated_owner_only() {
        let f = fixture();
        let target = f.target.clone();
        let runner = FakeRunner::new().on_run(move |_, _| {
            assert_eq!(secure_fs::mode_of(&target), Some(0o600));
            assert_eq!(fs::metadata(&target).unwrap().len(), 0);
        });
        activate(&f.config, &runner, &pair(), &f.target).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_widened_mode_is_restricted() {
        let f = fixture();
        let runner = fake_openssl(Some(0o644));
        let result = activate(&f.config, &runner, &pair(), &f.target).unwrap();
        match result {
            Activation::Installed { warnings } => {
                assert_eq!(warnings.len(), 1);
                assert!(warnings[0].contains("0644"));
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(secure_fs::mode_of(&f.target), Some(0o600));
    }

    #[test]
    fn test_tool_failure_reports_stderr_and_cleans_up() {
        let f = fixture();
        let runner = FakeRunner::new().exit(constants::OPENSSL, 1, "unable to load certificate");

        let err = activate(&f.config, &runner, &pair(), &f.target).unwrap_err();
        match &err {
            ActivationError::ToolExecution { stderr, .. } => {
                assert!(stderr.contains("unable to load certificate"))
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(err.to_string().contains("unable to load certificate"));
        assert!(!f.target.exists());
        assert_eq!(fs::read_dir(&f.temp).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_tool_error_survives_failed_bundle_removal() {
        let f = fixture();
        let parent = f.target.parent().unwrap().to_path_buf();
        let locked = parent.clone();
        let runner = FakeRunner::new()
            .exit(constants::OPENSSL, 1, "unable to load certificate")
            .on_run(move |_, _| secure_fs::set_mode(&locked, 0o500).unwrap());
        let err = activate(&f.config, &runner, &pair(), &f.target).unwrap_err();
        secure_fs::set_mode(&parent, 0o700).unwrap();

        assert_eq!(err.kind(), "tool_execution");
        assert!(err.to_string().contains("unable to load certificate"));
        assert_eq!(fs::read_dir(&f.temp).unwrap().count(), 0);
    }

    #[test]
    fn test_tool_not_startable_cleans_up() {
        let f = fixture();
        let runner = FakeRunner::new().respond(
            constants::OPENSSL,
            Err(ActivationError::ToolExecution {
                tool: constants::OPENSSL.into(),
                reason: "could not be started: No such file or directory".into(),
                stdout: String::new(),
                stderr: String::new(),
            }),
        );
        let err = activate(&f.config, &runner, &pair(), &f.target).unwrap_err();
        assert_eq!(err.kind(), "tool_execution");
        assert!(!f.target.exists());
        assert_eq!(fs::read_dir(&f.temp).unwrap().count(), 0);
    }

    #[test]
    fn test_unwritable_target_cleans_up() {
        let f = fixture();
        let target = f.temp.join("no-such-dir").join("bundle.pfx");
        let runner = FakeRunner::new();
        let err = activate(&f.config, &runner, &pair(), &target).unwrap_err();
        assert_eq!(err.kind(), "io");
        assert!(runner.calls.borrow().is_empty());
        assert_eq!(fs::read_dir(&f.temp).unwrap().count(), 0);
    }
}
