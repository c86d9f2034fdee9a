//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use offline_cache::FsCacheStorage;
use offline_router::{CacheRouter, ReqwestTransport};

use crate::config::{CliConfig, CONFIG_FILE_NAMES};
use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// Where the configuration was loaded from, if a file was found.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = if let Some(path) = config_path {
            (CliConfig::load(path)?, Some(PathBuf::from(path)))
        } else {
            match Self::find_config(&cwd) {
                Some((config, path)) => (config, Some(path)),
                None => (CliConfig::default(), None),
            }
        };

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Find config file in directory tree.
    fn find_config(start: &Path) -> Option<(CliConfig, PathBuf)> {
        let mut current = start.to_path_buf();
        loop {
            for name in &CONFIG_FILE_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    if let Ok(config) = CliConfig::load(config_path.to_str()?) {
                        return Some((config, config_path));
                    }
                }
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Install the diagnostic `tracing` subscriber.
    pub fn init_tracing(&self) -> Result<()> {
        let filter = if self.output.is_verbose() {
            "offline_router=debug,offline_cache=debug,info"
        } else {
            self.config.logging.filter.as_str()
        };

        offline_observability::init_tracing(self.config.logging.format, filter)?;
        Ok(())
    }

    /// The store directory, from an override or the configuration.
    pub fn store_dir(&self, override_dir: Option<&str>) -> PathBuf {
        self.resolve_path(override_dir.unwrap_or(&self.config.store.dir))
    }

    /// Open the filesystem store.
    pub fn storage(&self, override_dir: Option<&str>) -> Arc<FsCacheStorage> {
        Arc::new(FsCacheStorage::new(self.store_dir(override_dir)))
    }

    /// Build a router over the filesystem store and the HTTP transport.
    pub fn router(&self, override_dir: Option<&str>) -> Result<CacheRouter> {
        let origin = self.config.router.origin_uri()?;
        let transport = ReqwestTransport::new()?.with_origin(origin);

        let router = CacheRouter::new(
            self.config.router.clone(),
            self.storage(override_dir),
            Arc::new(transport),
        )
        .context("Invalid router configuration")?;

        Ok(router)
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        if PathBuf::from(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.cwd.join(path)
        }
    }
}
