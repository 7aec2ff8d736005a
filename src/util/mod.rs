//! Utility modules for filesystem, process, and path handling.

pub mod command;
pub mod fs;
pub mod path;
pub mod privilege;
pub mod tempfiles;
