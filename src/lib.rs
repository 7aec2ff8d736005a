//! Short-lived credential installation.
//!
//! Takes credential material issued after an out-of-band login and writes it
//! where each client expects it: an SSH certificate plus CA trust anchor, a
//! Vault token, an embedded kubectl user, and PKCS#12 bundles for VMware and
//! the browser.
//!
//! ## Modules
//! - `cli` — Command-line handlers
//! - `core` — Activators, configuration, reporting
//! - `models` — Credential material and config file structures
//! - `util` — Secure file writes, temp files, external tools

pub mod cli;
pub mod constants;
pub mod core;
pub mod error;
pub mod models;
pub mod util;
