//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};
use offline_router::RoutingTable;

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, CliConfig, CONFIG_FILE_NAMES};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx).await,
        ConfigCommand::Init {
            generation,
            origin,
            force,
        } => init_config(&generation, &origin, force, ctx).await,
        ConfigCommand::Validate => validate_config(ctx).await,
    }
}

async fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    let router = &ctx.config.router;
    ctx.output.info("");
    ctx.output.info("[router]");
    ctx.output.kv("generation_id", &router.generation_id);
    ctx.output.kv("origin", &router.origin);
    ctx.output.kv("seed_urls", &router.seed_urls.join(", "));
    ctx.output.kv("opaque_host_denylist", &router.opaque_host_denylist.join(", "));
    ctx.output.kv("dynamic_path_prefixes", &router.dynamic_path_prefixes.join(", "));
    ctx.output.kv("media_path_prefixes", &router.media_path_prefixes.join(", "));
    ctx.output.kv("media_extensions", &router.media_extensions.join(", "));
    ctx.output.kv("document_url_markers", &router.document_url_markers.join(", "));
    ctx.output.kv("path_match", &format!("{:?}", router.path_match).to_lowercase());

    ctx.output.info("");
    ctx.output.info("[store]");
    ctx.output.kv("dir", &ctx.config.store.dir);

    ctx.output.info("");
    ctx.output.info("[logging]");
    ctx.output.kv("filter", &ctx.config.logging.filter);
    ctx.output.kv("format", &format!("{:?}", ctx.config.logging.format).to_lowercase());

    Ok(())
}

async fn init_config(generation: &str, origin: &str, force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join(CONFIG_FILE_NAMES[0]);

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let content = generate_default_config(generation, origin);

    // Refuse to write a file that would not load back.
    let parsed = CliConfig::parse(CONFIG_FILE_NAMES[0], &content)?;
    parsed.router.validate()?;

    fs::write(&config_path, content)?;

    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}

async fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    let router = &ctx.config.router;

    if let Err(e) = RoutingTable::from_config(router) {
        errors.push(format!("router: {}", e));
    }

    if !offline_cache::GenerationId::new(router.generation_id.clone()).is_path_safe() {
        errors.push(format!(
            "router.generation_id '{}' cannot be used as a store file name",
            router.generation_id
        ));
    }

    if router.seed_urls.is_empty() {
        warnings.push("router.seed_urls is empty; install will cache nothing".to_string());
    }

    for (i, prefix) in router.dynamic_path_prefixes.iter().enumerate() {
        if !prefix.starts_with('/') {
            warnings.push(format!(
                "router.dynamic_path_prefixes[{}] '{}' does not start with '/'",
                i, prefix
            ));
        }
    }

    for (i, prefix) in router.media_path_prefixes.iter().enumerate() {
        if !prefix.starts_with('/') {
            warnings.push(format!(
                "router.media_path_prefixes[{}] '{}' does not start with '/'",
                i, prefix
            ));
        }
    }

    if router.document_url_markers.iter().all(|m| m.is_empty()) {
        warnings.push(
            "router.document_url_markers is empty; only navigations are network-first".to_string(),
        );
    }

    if errors.is_empty() && warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &errors {
        ctx.output.error(&format!("Error: {}", error));
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}
