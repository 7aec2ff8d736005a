//! Ephemeral on-disk copies of a certificate and private key.

use crate::constants;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

/// A certificate and key written to a private (0700) temp directory.
///
/// The directory and both files are removed when the pair is dropped, on
/// every exit path. Call [`ScopedTempFilePair::close`] to observe removal
/// errors instead of ignoring them.
pub struct ScopedTempFilePair {
    dir: TempDir,
    cert: PathBuf,
    key: PathBuf,
}

impl ScopedTempFilePair {
    /// Write `cert` and `key` into a fresh directory under `base`.
    pub fn create(base: &Path, label: &str, cert: &[u8], key: &[u8]) -> io::Result<Self> {
        let prefix = format!("{}{}-", constants::TEMP_PREFIX, label);
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);
        #[cfg(unix)]
        builder.permissions(fs::Permissions::from_mode(constants::PRIVATE_DIR_MODE));
        let dir = builder.tempdir_in(base)?;
        let cert_path = dir.path().join("cert.pem");
        let key_path = dir.path().join("key.pem");
        write_private(&cert_path, cert)?;
        write_private(&key_path, key)?;
        Ok(Self {
            dir,
            cert: cert_path,
            key: key_path,
        })
    }

    pub fn cert_path(&self) -> &Path {
        &self.cert
    }

    pub fn key_path(&self) -> &Path {
        &self.key
    }

    /// Remove both files and their directory, reporting failure.
    pub fn close(self) -> io::Result<()> {
        self.dir.close()
    }
}

fn write_private(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut opts = OpenOptions::new();
    opts.write(true).create_new(true);
    #[cfg(unix)]
    opts.mode(constants::OWNER_RW_MODE);
    let mut file = opts.open(path)?;
    file.write_all(data)?;
    file.sync_all()
}
