//! Error types for credential activation.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for activator operations.
pub type Result<T> = std::result::Result<T, ActivationError>;

/// Why a single consumer could not be activated.
///
/// None of these escalate past the activator that produced them; the
/// orchestrator records them in the report and moves on.
#[derive(Error, Debug)]
pub enum ActivationError {
    /// SSH public key missing or unreadable
    #[error("cannot read SSH public key {}: {source}", .path.display())]
    KeyRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Filesystem read/write/remove failure
    #[error("{action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Required executable absent from PATH
    #[error("{tool} not found on PATH")]
    ToolNotFound { tool: String },

    /// Tool could not be started, exited non-zero, or timed out
    #[error("{tool} {reason}{}", diagnostics(.stdout, .stderr))]
    ToolExecution {
        tool: String,
        reason: String,
        stdout: String,
        stderr: String,
    },

    /// Ephemeral file removal failed
    #[error("cleanup failed: {0}")]
    Cleanup(String),
}

impl ActivationError {
    pub fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Short, stable name of the error kind (used in JSON reports).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::KeyRead { .. } => "key_read",
            Self::Io { .. } => "io",
            Self::ToolNotFound { .. } => "tool_not_found",
            Self::ToolExecution { .. } => "tool_execution",
            Self::Cleanup(_) => "cleanup",
        }
    }
}

fn diagnostics(stdout: &str, stderr: &str) -> String {
    let stdout = stdout.trim();
    let stderr = stderr.trim();
    match (stdout.is_empty(), stderr.is_empty()) {
        (true, true) => String::new(),
        (false, true) => format!(": {}", stdout),
        (true, false) => format!(": {}", stderr),
        (false, false) => format!(": {} {}", stdout, stderr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_execution_display_includes_stderr() {
        let err = ActivationError::ToolExecution {
            tool: "openssl".into(),
            reason: "exited with status 1".into(),
            stdout: String::new(),
            stderr: "unable to load certificate\n".into(),
        };
        assert_eq!(
            err.to_string(),
            "openssl exited with status 1: unable to load certificate"
        );
        assert_eq!(err.kind(), "tool_execution");
    }

    #[test]
    fn test_tool_execution_display_without_output() {
        let err = ActivationError::ToolExecution {
            tool: "ssh-add".into(),
            reason: "timed out after 1s".into(),
            stdout: " \n".into(),
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "ssh-add timed out after 1s");
    }

    #[test]
    fn test_io_display_names_path() {
        let err = ActivationError::io(
            "write",
            Path::new("/tmp/x"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "write /tmp/x: denied");
        assert_eq!(err.kind(), "io");
    }
}
