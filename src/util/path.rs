//! Home-directory and environment expansion for configured paths.

use std::env;
use std::path::PathBuf;

/// Expand `~`, `$VAR` and `${VAR}` in a configured path.
///
/// Unset variables expand to the empty string, matching shell behaviour.
pub fn expand(raw: &str) -> PathBuf {
    expand_with(raw, |name| env::var(name).ok(), dirs::home_dir)
}

fn expand_with<F, H>(raw: &str, lookup: F, home: H) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
    H: Fn() -> Option<PathBuf>,
{
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    if rest == "~" || rest.starts_with("~/") {
        if let Some(h) = home() {
            out.push_str(&h.to_string_lossy());
            rest = &rest[1..];
        }
    }

    let mut chars = rest.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        let tail = &rest[i + 1..];
        let (name, consumed) = if let Some(braced) = tail.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => {
                    out.push(c);
                    continue;
                }
            }
        } else {
            let len = tail
                .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
                .unwrap_or(tail.len());
            (&tail[..len], len)
        };
        if name.is_empty() {
            out.push(c);
            continue;
        }
        if let Some(value) = lookup(name) {
            out.push_str(&value);
        }
        let end = i + 1 + consumed;
        while chars.next_if(|&(j, _)| j < end).is_some() {}
    }
    PathBuf::from(out)
}
