//! Route one request through the cache policy.

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::{Context as _, Result};
use offline_core::{CacheStatus, Strategy};
use serde::Serialize;

use super::{build_request, observed_router, FetchArgs};
use crate::context::Context;
use crate::output::{cache_badge, format_bytes, strategy_badge};

#[derive(Serialize)]
struct FetchOutput {
    request_id: String,
    url: String,
    status: u16,
    rule: &'static str,
    strategy: Strategy,
    cache_status: CacheStatus,
    headers: BTreeMap<String, String>,
    body_bytes: usize,
}

/// Run the fetch command.
pub async fn run(args: FetchArgs, ctx: &Context) -> Result<()> {
    let (router, metrics) = observed_router(ctx, args.store.as_deref())?;
    let request = build_request(&args.url, &args.method, args.document)?;

    let spinner = ctx.output.spinner(&format!("{} {}", request.method, args.url));
    let result = router.route(request).await;
    router.wait_until_idle().await;
    spinner.finish_and_clear();

    let outcome = result?;
    let response = &outcome.response;

    ctx.output.debug(&metrics.snapshot().to_summary());

    let headers: BTreeMap<String, String> = response
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    if ctx.output.is_json() {
        ctx.output.json(&FetchOutput {
            request_id: outcome.request_id.to_string(),
            url: response.url.clone().unwrap_or_else(|| args.url.clone()),
            status: response.status.as_u16(),
            rule: outcome.rule,
            strategy: outcome.strategy,
            cache_status: outcome.cache_status,
            headers,
            body_bytes: response.body.len(),
        });
        return Ok(());
    }

    ctx.output.kv("Status", &response.status.to_string());
    ctx.output.kv("Rule", outcome.rule);
    ctx.output.kv("Strategy", &strategy_badge(outcome.strategy));
    ctx.output.kv("Cache", &cache_badge(outcome.cache_status));
    ctx.output.kv("Size", &format_bytes(response.body.len() as u64));
    ctx.output.debug(&format!("request id {}", outcome.request_id));

    if args.headers {
        ctx.output.header("Headers");
        for (name, value) in &headers {
            ctx.output.kv(name, value);
        }
    }

    match args.output {
        Some(path) => {
            let path = ctx.resolve_path(&path);
            std::fs::write(&path, &response.body)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            ctx.output.success(&format!("Saved body to {}", path.display()));
        }
        None => {
            println!();
            std::io::stdout().write_all(&response.body)?;
            println!();
        }
    }

    Ok(())
}
