//! `@cert-authority` trust anchor lines for known_hosts.

use anyhow::{bail, Result};
use std::fmt;
use std::str::FromStr;

const MARKER: &str = "@cert-authority";

/// A known_hosts directive trusting `public_key` to sign hosts matching
/// `host_pattern`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownHostsEntry {
    pub host_pattern: String,
    pub key_type: String,
    pub public_key: String,
    pub comment: Option<String>,
}

impl KnownHostsEntry {
    /// Whether `content` already carries this exact line.
    pub fn is_present_in(&self, content: &str) -> bool {
        content.contains(&self.to_string())
    }
}

impl FromStr for KnownHostsEntry {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut fields = s.split_whitespace();
        if fields.next() != Some(MARKER) {
            bail!("trust anchor must start with {}", MARKER);
        }
        let (host_pattern, key_type, public_key) =
            match (fields.next(), fields.next(), fields.next()) {
                (Some(h), Some(t), Some(k)) => (h, t, k),
                _ => bail!("trust anchor needs a host pattern, key type and public key"),
            };
        let comment: Vec<&str> = fields.collect();
        Ok(Self {
            host_pattern: host_pattern.to_string(),
            key_type: key_type.to_string(),
            public_key: public_key.to_string(),
            comment: if comment.is_empty() {
                None
            } else {
                Some(comment.join(" "))
            },
        })
    }
}

impl fmt::Display for KnownHostsEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            MARKER, self.host_pattern, self.key_type, self.public_key
        )?;
        if let Some(comment) = &self.comment {
            write!(f, " {}", comment)?;
        }
        Ok(())
    }
}
