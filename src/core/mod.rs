//! Credential activation: configuration, per-consumer activators, reporting.

pub mod config;
pub mod kubectl;
pub mod materializer;
pub mod pkcs12;
pub mod report;
pub mod ssh;
pub mod vault_token;
