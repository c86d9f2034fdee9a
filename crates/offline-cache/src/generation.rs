//! Cache generation identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of a cache generation.
///
/// One generation is active at a time. Changing it on deployment causes every
/// other generation to be evicted on activation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationId(String);

impl GenerationId {
    /// Create a generation ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the generation ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the name can be used as a file stem.
    pub fn is_path_safe(&self) -> bool {
        !self.0.is_empty()
            && self.0 != "."
            && self.0 != ".."
            && !self
                .0
                .chars()
                .any(|c| matches!(c, '/' | '\\' | ':' | '\0') || c.is_control())
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GenerationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for GenerationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_safety() {
        assert!(GenerationId::new("shop-v3").is_path_safe());
        assert!(GenerationId::new("shop.v3").is_path_safe());
        assert!(!GenerationId::new("").is_path_safe());
        assert!(!GenerationId::new("..").is_path_safe());
        assert!(!GenerationId::new("a/b").is_path_safe());
        assert!(!GenerationId::new("a\\b").is_path_safe());
    }
}
