//! CLI configuration.

use anyhow::{Context, Result};
use offline_core::RouterConfig;
use offline_observability::LogFormat;
use serde::{Deserialize, Serialize};

/// Config file names searched for, in order, from the working directory upwards.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["offline.toml", ".offline.toml", "offline.json"];

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Router configuration.
    #[serde(default)]
    pub router: RouterConfig,

    /// Store configuration.
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::parse(path, &content)
    }

    /// Parse config content, choosing the format from the file name.
    pub fn parse(path: &str, content: &str) -> Result<Self> {
        if path.ends_with(".json") {
            serde_json::from_str(content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(content).with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }
}

/// Cache store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding one JSON file per generation.
    #[serde(default = "default_store_dir")]
    pub dir: String,
}

fn default_store_dir() -> String {
    ".offline/cache".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: default_store_dir(),
        }
    }
}

/// Diagnostic logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,

    /// Output format for diagnostic logs.
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

fn default_filter() -> String {
    "warn".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Human
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            format: default_log_format(),
        }
    }
}

/// Generate a default offline.toml config file.
pub fn generate_default_config(generation: &str, origin: &str) -> String {
    format!(
        r#"# Offline request router configuration

[router]
generation_id = "{generation}"
origin = "{origin}"
seed_urls = ["/", "/index.html"]

# Hosts serving opaque cross-origin responses; never cached.
opaque_host_denylist = ["*.r2.dev", "pub-3484fb4b3c5748cd80420365c258aaaa*"]

# Always fetched from the network.
dynamic_path_prefixes = ["/api/", "/users/", "/videos/", "/wallet/", "/commerce/", "/comments/"]

# Fetched with transport caching disabled.
media_path_prefixes = ["/media/", "/avatars/"]
media_extensions = ["jpg", "jpeg", "png", "gif", "webp", "mp4", "webm", "svg"]

# Network-first documents.
document_url_markers = [".html"]

# "prefix" or "contains"
path_match = "prefix"

[store]
dir = ".offline/cache"

[logging]
filter = "warn"
format = "human"
"#,
        generation = generation,
        origin = origin
    )
}
