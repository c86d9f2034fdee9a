//! Show how URLs are routed.

use anyhow::Result;
use offline_core::Strategy;
use offline_router::RoutingTable;
use serde::Serialize;

use super::{build_request, ClassifyArgs};
use crate::context::Context;
use crate::output::strategy_badge;

#[derive(Debug, Serialize)]
struct Classification {
    url: String,
    method: String,
    rule: &'static str,
    strategy: Strategy,
    uses_store: bool,
}

/// Run the classify command.
pub async fn run(args: ClassifyArgs, ctx: &Context) -> Result<()> {
    let table = RoutingTable::from_config(&ctx.config.router)?;
    let origin = ctx.config.router.origin_uri()?;

    let mut results = Vec::with_capacity(args.urls.len());
    for url in &args.urls {
        let request = build_request(url, &args.method, args.document)?.resolve(&origin)?;
        let rule = table.classify(&request);

        results.push(Classification {
            url: request.url_string(),
            method: request.method.to_string(),
            rule: rule.name(),
            strategy: rule.strategy,
            uses_store: rule.strategy.uses_store(),
        });

        ctx.output.debug(&format!("{} -> {}", request.key(), rule.name()));
    }

    if ctx.output.is_json() {
        ctx.output.json(&results);
        return Ok(());
    }

    ctx.output.table_row(&["METHOD", "RULE", "STRATEGY", "URL"], &[7, 15, 20, 50]);
    for result in &results {
        ctx.output.table_row(
            &[&result.method, result.rule, &strategy_badge(result.strategy), &result.url],
            &[7, 15, 20, 50],
        );
    }

    Ok(())
}
