//! Caching strategies and per-request cache status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a routed request is satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Straight to network, response returned as-is, no store interaction.
    Passthrough,
    /// Network only; failures surface as opaque-response failures.
    OpaquePassthrough,
    /// Always network; the store is never read or written.
    NetworkOnly,
    /// Network, falling back to the stored response on failure.
    NetworkFirst,
    /// Network with transport caching disabled; no store interaction.
    NetworkNoStore,
    /// Stored response if present, otherwise network and store.
    CacheFirst,
}

impl Strategy {
    /// Stable name used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passthrough => "passthrough",
            Self::OpaquePassthrough => "opaque-passthrough",
            Self::NetworkOnly => "network-only",
            Self::NetworkFirst => "network-first",
            Self::NetworkNoStore => "network-no-store",
            Self::CacheFirst => "cache-first",
        }
    }

    /// Whether this strategy ever reads or writes the store.
    pub fn uses_store(&self) -> bool {
        matches!(self, Self::NetworkFirst | Self::CacheFirst)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a routed response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Served from the store without touching the network.
    Hit,
    /// Store consulted or written, response came from the network.
    Miss,
    /// Store not involved.
    Bypass,
    /// Network failed; served the stored response instead.
    Fallback,
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hit => write!(f, "HIT"),
            Self::Miss => write!(f, "MISS"),
            Self::Bypass => write!(f, "BYPASS"),
            Self::Fallback => write!(f, "FALLBACK"),
        }
    }
}
