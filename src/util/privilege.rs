//! Process-level hardening and identity checks.

use crate::constants;
use nix::sys::stat::{umask, Mode};

/// Check if the current process is running as root (euid 0).
pub fn is_root() -> bool {
    nix::unistd::geteuid().is_root()
}

/// Make every file this process (or a tool it spawns) creates owner-only
/// by default. Returns the previous umask bits.
pub fn restrict_umask() -> u32 {
    let previous = umask(Mode::from_bits_truncate(constants::PROCESS_UMASK as _));
    previous.bits() as u32
}
