//! Router configuration.

use http::Uri;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How path patterns are compared against a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathMatch {
    /// The path starts with the pattern.
    #[default]
    Prefix,
    /// The path contains the pattern anywhere.
    Contains,
}

/// Configuration for a router instance.
///
/// Field names are snake_case; the camelCase spellings used by browser-side
/// manifests (`generationId`, `seedUrls`, ...) are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Name of the active cache generation.
    #[serde(alias = "generationId")]
    pub generation_id: String,

    /// URLs pre-populated during install.
    #[serde(alias = "seedUrls")]
    pub seed_urls: Vec<String>,

    /// Hosts whose responses are opaque and never cached.
    /// Entries match exactly, as a parent domain, or as `*` globs.
    #[serde(alias = "opaqueHostDenylist")]
    pub opaque_host_denylist: Vec<String>,

    /// Path patterns that are always fetched from the network.
    #[serde(alias = "dynamicPathPrefixes")]
    pub dynamic_path_prefixes: Vec<String>,

    /// Path patterns for media assets.
    #[serde(alias = "mediaPathPrefixes")]
    pub media_path_prefixes: Vec<String>,

    /// File extensions for media assets (without the dot).
    #[serde(alias = "mediaExtensions")]
    pub media_extensions: Vec<String>,

    /// URL substrings that mark a request as a document.
    #[serde(alias = "documentUrlMarkers")]
    pub document_url_markers: Vec<String>,

    /// Origin used to resolve relative URLs.
    pub origin: String,

    /// Comparison used for path patterns.
    #[serde(alias = "pathMatch")]
    pub path_match: PathMatch,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            generation_id: "offline-v1".to_string(),
            seed_urls: vec!["/".to_string(), "/index.html".to_string()],
            opaque_host_denylist: strings(&["*.r2.dev", "pub-3484fb4b3c5748cd80420365c258aaaa*"]),
            dynamic_path_prefixes: strings(&[
                "/api/",
                "/users/",
                "/videos/",
                "/wallet/",
                "/commerce/",
                "/comments/",
            ]),
            media_path_prefixes: strings(&["/media/", "/avatars/"]),
            media_extensions: strings(&["jpg", "jpeg", "png", "gif", "webp", "mp4", "webm", "svg"]),
            document_url_markers: strings(&[".html"]),
            origin: "http://localhost".to_string(),
            path_match: PathMatch::Prefix,
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

impl RouterConfig {
    /// Create a default configuration for a generation.
    pub fn new(generation_id: impl Into<String>) -> Self {
        Self {
            generation_id: generation_id.into(),
            ..Default::default()
        }
    }

    /// Set the origin.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Replace the seed URLs.
    pub fn with_seed_urls(mut self, urls: &[&str]) -> Self {
        self.seed_urls = strings(urls);
        self
    }

    /// Add a host to the opaque denylist.
    pub fn deny_opaque_host(mut self, host: impl Into<String>) -> Self {
        self.opaque_host_denylist.push(host.into());
        self
    }

    /// Add a dynamic path pattern.
    pub fn with_dynamic_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.dynamic_path_prefixes.push(prefix.into());
        self
    }

    /// Add a media path pattern.
    pub fn with_media_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.media_path_prefixes.push(prefix.into());
        self
    }

    /// Add a document URL marker.
    pub fn with_document_marker(mut self, marker: impl Into<String>) -> Self {
        self.document_url_markers.push(marker.into());
        self
    }

    /// Set the path comparison mode.
    pub fn with_path_match(mut self, mode: PathMatch) -> Self {
        self.path_match = mode;
        self
    }

    /// Parse the origin into a URI with scheme and authority.
    pub fn origin_uri(&self) -> Result<Uri, ConfigError> {
        let uri: Uri = self
            .origin
            .parse()
            .map_err(|_| ConfigError::InvalidOrigin(self.origin.clone()))?;

        match (uri.scheme_str(), uri.authority()) {
            (Some("http" | "https"), Some(_)) => Ok(uri),
            _ => Err(ConfigError::InvalidOrigin(self.origin.clone())),
        }
    }

    /// Media extensions, lowercased and without leading dots.
    pub fn normalized_media_extensions(&self) -> Vec<String> {
        self.media_extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect()
    }

    /// Check the configuration for errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generation_id.trim().is_empty() {
            return Err(ConfigError::EmptyGeneration);
        }

        self.origin_uri()?;

        for url in &self.seed_urls {
            crate::request::parse_url(url)?;
        }

        for host in &self.opaque_host_denylist {
            if host.trim().is_empty() || host.contains('/') {
                return Err(ConfigError::InvalidPattern(host.clone()));
            }
        }

        Ok(())
    }
}
