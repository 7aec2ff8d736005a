//! Permission-aware file writes for credential artifacts.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

/// Write `data` to `path` with `mode`, replacing any existing file.
///
/// The bytes go to a temp file in the same directory that already carries
/// `mode`, which is then renamed over the target, so readers see either the
/// old file or the complete new one.
pub fn write_secure(path: &Path, data: &[u8], mode: u32) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".prodaccess-")
        .tempfile_in(parent)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;

    #[cfg(unix)]
    tmp.as_file()
        .set_permissions(fs::Permissions::from_mode(mode))?;

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Remove `path`, treating an already-missing file as success.
pub fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Create an empty file at `path` with `mode`; fails if it already exists.
pub fn precreate(path: &Path, mode: u32) -> io::Result<()> {
    let mut opts = OpenOptions::new();
    opts.write(true).create_new(true);
    #[cfg(unix)]
    opts.mode(mode);
    opts.open(path)?;
    // umask can only narrow the requested mode; pin it exactly
    set_mode(path, mode)
}

/// Append `line` to an existing file, newline-terminated.
///
/// `current` is the content already read from the file; when it does not
/// end in a newline one is inserted first so the new line stays separate.
pub fn append_line(path: &Path, current: &str, line: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().append(true).open(path)?;
    let mut buf = String::with_capacity(line.len() + 2);
    if !current.is_empty() && !current.ends_with('\n') {
        buf.push('\n');
    }
    buf.push_str(line);
    buf.push('\n');
    file.write_all(buf.as_bytes())?;
    file.flush()
}

pub fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    #[cfg(unix)]
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    #[cfg(not(unix))]
    let _ = (path, mode);
    Ok(())
}

/// Permission bits of `path`.
#[cfg(unix)]
pub fn mode_of(path: &Path) -> Option<u32> {
    fs::metadata(path)
        .ok()
        .map(|m| m.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
pub fn mode_of(_path: &Path) -> Option<u32> {
    None
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_secure_roundtrip_and_mode() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("id_ecdsa-cert.pub");
        write_secure(&path, b"ssh-ecdsa-cert-v01 AAAA user@host", 0o600).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"ssh-ecdsa-cert-v01 AAAA user@host");
        assert_eq!(mode_of(&path), Some(0o600));
    }

    #[test]
    fn test_write_secure_replaces_wider_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token");
        fs::write(&path, "old-token-that-is-longer").unwrap();
        set_mode(&path, 0o644).unwrap();

        write_secure(&path, b"new", 0o400).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert_eq!(mode_of(&path), Some(0o400));
    }

    #[test]
    fn test_write_secure_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cert");
        write_secure(&path, b"x", 0o600).unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("cert")]);
    }

    #[test]
    fn test_remove_if_exists_missing_ok() {
        let dir = TempDir::new().unwrap();
        assert!(remove_if_exists(&dir.path().join("nope")).is_ok());
    }

    #[test]
    fn test_precreate_mode_and_exclusive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bundle.pfx");
        precreate(&path, 0o600).unwrap();
        assert_eq!(mode_of(&path), Some(0o600));
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
        assert!(precreate(&path, 0o600).is_err());
    }

    #[test]
    fn test_append_line_adds_separator() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("known_hosts");
        fs::write(&path, "host1 ssh-ed25519 AAAA").unwrap();
        append_line(&path, "host1 ssh-ed25519 AAAA", "@cert-authority x").unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "host1 ssh-ed25519 AAAA\n@cert-authority x\n"
        );
    }
}
