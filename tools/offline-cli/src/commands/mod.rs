//! CLI command implementations.

pub mod activate;
pub mod classify;
pub mod config;
pub mod fetch;
pub mod install;
pub mod store;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use offline_core::{Destination, Method, Request};
use offline_observability::{LogFormat, LogLevel, LoggingObserver, RouterMetrics, StructuredLogger};
use offline_router::CacheRouter;

use crate::context::Context;

/// Arguments for the classify command.
#[derive(Args)]
pub struct ClassifyArgs {
    /// URLs to classify (relative URLs resolve against the configured origin).
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Request method.
    #[arg(short, long, default_value = "GET")]
    pub method: String,

    /// Treat the requests as top-level document navigations.
    #[arg(short, long)]
    pub document: bool,
}

/// Arguments for the install command.
#[derive(Args)]
pub struct InstallArgs {
    /// Store directory (overrides the config).
    #[arg(short, long)]
    pub store: Option<String>,

    /// Extra seed URLs, added to the configured ones.
    #[arg(short, long = "url")]
    pub urls: Vec<String>,

    /// Activate right after installing.
    #[arg(long)]
    pub activate: bool,
}

/// Arguments for the activate command.
#[derive(Args)]
pub struct ActivateArgs {
    /// Store directory (overrides the config).
    #[arg(short, long)]
    pub store: Option<String>,

    /// Skip confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the fetch command.
#[derive(Args)]
pub struct FetchArgs {
    /// URL to fetch (relative URLs resolve against the configured origin).
    pub url: String,

    /// Request method.
    #[arg(short, long, default_value = "GET")]
    pub method: String,

    /// Treat the request as a top-level document navigation.
    #[arg(short, long)]
    pub document: bool,

    /// Store directory (overrides the config).
    #[arg(short, long)]
    pub store: Option<String>,

    /// Print response headers.
    #[arg(short = 'i', long)]
    pub headers: bool,

    /// Write the response body to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Arguments for the store command.
#[derive(Args)]
pub struct StoreArgs {
    #[command(subcommand)]
    pub command: Option<StoreCommand>,

    /// Store directory (overrides the config).
    #[arg(short, long, global = true)]
    pub store: Option<String>,
}

#[derive(Subcommand)]
pub enum StoreCommand {
    /// List generations.
    List,
    /// List the entries of a generation.
    Show {
        /// Generation (default: the configured one).
        generation: Option<String>,
    },
    /// Delete one generation, or every generation.
    Purge {
        /// Generation to delete (default: all).
        generation: Option<String>,
        /// Skip confirmation.
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Generation id to start with.
        #[arg(short, long, default_value = "offline-v1")]
        generation: String,
        /// Origin used to resolve relative URLs.
        #[arg(short, long, default_value = "http://localhost")]
        origin: String,
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}

/// Parse a method name given on the command line.
pub fn parse_method(method: &str) -> Result<Method> {
    Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
        .with_context(|| format!("Invalid HTTP method: {}", method))
}

/// Build a request from command-line arguments.
pub fn build_request(url: &str, method: &str, document: bool) -> Result<Request> {
    let request = Request::new(parse_method(method)?, url)?;
    Ok(if document {
        request.with_destination(Destination::Document)
    } else {
        request
    })
}

/// Build a router with metrics attached, plus event logging in verbose mode.
pub fn observed_router(ctx: &Context, store: Option<&str>) -> Result<(CacheRouter, Arc<RouterMetrics>)> {
    let metrics = Arc::new(RouterMetrics::new());
    let mut router = ctx.router(store)?.with_observer(metrics.clone());

    if ctx.output.is_verbose() && !ctx.output.is_json() {
        let logger = StructuredLogger::new("offline")
            .with_generation(router.generation().as_str())
            .with_format(LogFormat::Human)
            .with_min_level(LogLevel::Debug);
        router = router.with_observer(Arc::new(LoggingObserver::new(logger)));
    }

    Ok((router, metrics))
}
