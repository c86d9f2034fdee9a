//! Host denylist matching for opaque cross-origin storage.

use serde::{Deserialize, Serialize};

/// Hosts whose responses are routed as network-only pass-through.
///
/// Entries are compared case-insensitively and match:
/// - the exact host (`media.example.com`)
/// - any subdomain of the entry (`example-cdn.net` matches `pub-1.example-cdn.net`)
/// - a `*` glob (`*.r2.dev`, `pub-*.example.net`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostDenylist {
    hosts: Vec<String>,
    patterns: Vec<String>,
}

impl HostDenylist {
    /// Create an empty denylist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from configuration entries.
    pub fn from_entries<S: AsRef<str>>(entries: &[S]) -> Self {
        entries
            .iter()
            .fold(Self::new(), |list, entry| list.deny(entry.as_ref()))
    }

    /// Add an entry.
    pub fn deny(mut self, entry: &str) -> Self {
        let entry = entry.trim().trim_end_matches('.').to_lowercase();
        if entry.is_empty() {
            return self;
        }
        if entry.contains('*') {
            self.patterns.push(entry);
        } else {
            self.hosts.push(entry);
        }
        self
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty() && self.patterns.is_empty()
    }

    /// Check if a host is denylisted.
    pub fn matches(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_lowercase();

        self.hosts.iter().any(|entry| is_same_or_subdomain(&host, entry))
            || self.patterns.iter().any(|pattern| matches_pattern(&host, pattern))
    }
}

fn is_same_or_subdomain(host: &str, entry: &str) -> bool {
    host == entry
        || host
            .strip_suffix(entry)
            .is_some_and(|rest| rest.ends_with('.'))
}

fn matches_pattern(host: &str, pattern: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();

    if parts.len() == 2 {
        let (prefix, suffix) = (parts[0], parts[1]);
        return host.len() >= prefix.len() + suffix.len()
            && host.starts_with(prefix)
            && host.ends_with(suffix);
    }

    // Several wildcards: each literal piece must appear in order.
    let mut rest = host;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            match rest.strip_prefix(part) {
                Some(r) => rest = r,
                None => return false,
            }
        } else if i == parts.len() - 1 {
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(pos) => rest = &rest[pos + part.len()..],
                None => return false,
            }
        }
    }
    true
}
