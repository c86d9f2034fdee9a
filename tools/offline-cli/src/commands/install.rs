//! Seed the cache store.

use std::sync::Arc;

use anyhow::Result;
use indicatif::ProgressBar;
use offline_core::{RouterEvent, RouterObserver};
use offline_router::{ActivateReport, InstallReport};
use serde::Serialize;

use super::{observed_router, InstallArgs};
use crate::context::Context;

/// Advances a progress bar as seeds settle.
struct SeedProgress {
    bar: ProgressBar,
}

impl RouterObserver for SeedProgress {
    fn on_event(&self, event: &RouterEvent) {
        match event {
            RouterEvent::SeedCached { url } => {
                self.bar.set_message(url.clone());
                self.bar.inc(1);
            }
            RouterEvent::SeedFailed { url, .. } => {
                self.bar.set_message(format!("{} (failed)", url));
                self.bar.inc(1);
            }
            _ => {}
        }
    }
}

#[derive(Serialize)]
struct InstallOutput {
    install: InstallReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    activate: Option<ActivateReport>,
}

/// Run the install command.
pub async fn run(args: InstallArgs, ctx: &Context) -> Result<()> {
    let mut seeds = ctx.config.router.seed_urls.clone();
    for url in args.urls {
        if !seeds.contains(&url) {
            seeds.push(url);
        }
    }

    let (router, metrics) = observed_router(ctx, args.store.as_deref())?;
    let store_dir = ctx.store_dir(args.store.as_deref());

    ctx.output.header(&format!("Installing {}", router.generation()));
    ctx.output.kv("Store", &store_dir.display().to_string());
    ctx.output.kv("Origin", &ctx.config.router.origin);

    let bar = ctx.output.progress(seeds.len() as u64, "seeding");
    let router = router.with_observer(Arc::new(SeedProgress { bar: bar.clone() }));

    let report = router.install_urls(&seeds).await?;
    bar.finish_and_clear();

    for url in &report.cached {
        ctx.output.list_item(url);
    }
    for failure in &report.failed {
        ctx.output.warn(&format!("{}: {}", failure.url, failure.reason));
    }

    if report.is_complete() {
        ctx.output.success(&format!(
            "Cached {} seed(s) in {}",
            report.cached.len(),
            report.generation
        ));
    } else {
        ctx.output.warn(&format!(
            "Cached {} of {} seed(s) in {}",
            report.cached.len(),
            seeds.len(),
            report.generation
        ));
    }

    let activation = if args.activate {
        let activation = router.activate().await?;
        for generation in &activation.evicted {
            ctx.output.list_item(&format!("evicted {}", generation));
        }
        ctx.output.success(&format!("Activated {}", activation.generation));
        Some(activation)
    } else {
        ctx.output
            .info("Run `offline activate` to evict older generations.");
        None
    };

    ctx.output.debug(&metrics.snapshot().to_summary());

    if ctx.output.is_json() {
        ctx.output.json(&InstallOutput {
            install: report,
            activate: activation,
        });
    }

    Ok(())
}
