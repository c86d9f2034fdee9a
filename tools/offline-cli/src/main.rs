//! Offline CLI - Command line tool for the offline request router.
//!
//! Commands:
//! - `offline classify` - Show which rule and strategy a URL is routed by
//! - `offline install` - Seed the cache store for the configured generation
//! - `offline activate` - Evict stale generations
//! - `offline fetch` - Route one request through the full policy
//! - `offline store` - Inspect and purge the cache store
//! - `offline config` - Manage configuration

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{ActivateArgs, ClassifyArgs, ConfigArgs, FetchArgs, InstallArgs, StoreArgs};

/// Offline CLI - Seed, inspect and exercise the offline request router
#[derive(Parser)]
#[command(name = "offline")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the routing rule and strategy for URLs
    Classify(ClassifyArgs),

    /// Seed the cache store for the configured generation
    Install(InstallArgs),

    /// Evict every generation other than the configured one
    Activate(ActivateArgs),

    /// Route a single request through the cache policy
    Fetch(FetchArgs),

    /// Inspect or purge the cache store
    Store(StoreArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let output = output::Output::new(cli.verbose, cli.json);

    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    if let Err(e) = ctx.init_tracing() {
        ctx.output.warn(&format!("Tracing disabled: {}", e));
    }

    let result = match cli.command {
        Commands::Classify(args) => commands::classify::run(args, &ctx).await,
        Commands::Install(args) => commands::install::run(args, &ctx).await,
        Commands::Activate(args) => commands::activate::run(args, &ctx).await,
        Commands::Fetch(args) => commands::fetch::run(args, &ctx).await,
        Commands::Store(args) => commands::store::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
