//! Data structures.

pub mod config_file;
pub mod credential;
pub mod known_hosts;
