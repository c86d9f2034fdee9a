//! Evict stale generations.

use anyhow::Result;
use dialoguer::Confirm;
use offline_cache::CacheStorage;

use super::{observed_router, ActivateArgs};
use crate::context::Context;

/// Run the activate command.
pub async fn run(args: ActivateArgs, ctx: &Context) -> Result<()> {
    let storage = ctx.storage(args.store.as_deref());
    let (router, metrics) = observed_router(ctx, args.store.as_deref())?;

    ctx.output.header(&format!("Activating {}", router.generation()));

    let stale: Vec<_> = storage
        .generations()
        .await?
        .into_iter()
        .filter(|g| g != router.generation())
        .collect();

    if stale.is_empty() {
        ctx.output.info("No stale generations.");
    } else {
        ctx.output.info("Generations to evict:");
        for generation in &stale {
            ctx.output.list_item(generation.as_str());
        }

        if !args.yes && !ctx.output.is_json() {
            let confirmed = Confirm::new()
                .with_prompt("Evict these generations?")
                .default(true)
                .interact()?;

            if !confirmed {
                ctx.output.warn("Activation cancelled");
                return Ok(());
            }
        }
    }

    // Activation needs an installed router; an empty install only opens the generation.
    router.install_urls::<&str>(&[]).await?;
    let report = router.activate().await?;

    ctx.output.debug(&metrics.snapshot().to_summary());

    if ctx.output.is_json() {
        ctx.output.json(&report);
        return Ok(());
    }

    ctx.output.success(&format!(
        "Activated {} ({} generation(s) evicted)",
        report.generation,
        report.evicted.len()
    ));

    Ok(())
}
