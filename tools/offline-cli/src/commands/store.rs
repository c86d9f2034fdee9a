//! Inspect and purge the cache store.

use anyhow::{bail, Result};
use dialoguer::Confirm;
use offline_cache::{CacheStorage, FsCacheStorage, GenerationId};
use serde::Serialize;

use super::{StoreArgs, StoreCommand};
use crate::context::Context;
use crate::output::{format_bytes, format_duration};

#[derive(Debug, Serialize)]
struct GenerationInfo {
    generation: GenerationId,
    entries: usize,
    current: bool,
}

#[derive(Debug, Serialize)]
struct EntryInfo {
    key: String,
    status: u16,
    bytes: usize,
    age_secs: i64,
}

/// Run the store command.
pub async fn run(args: StoreArgs, ctx: &Context) -> Result<()> {
    let storage = ctx.storage(args.store.as_deref());
    let current = GenerationId::new(ctx.config.router.generation_id.clone());

    match args.command {
        Some(StoreCommand::List) | None => list_generations(&storage, &current, ctx).await,
        Some(StoreCommand::Show { generation }) => {
            let generation = generation.map(GenerationId::new).unwrap_or(current);
            show_generation(&storage, &generation, ctx).await
        }
        Some(StoreCommand::Purge { generation, yes }) => {
            purge(&storage, generation.map(GenerationId::new), yes, ctx).await
        }
    }
}

async fn list_generations(
    storage: &FsCacheStorage,
    current: &GenerationId,
    ctx: &Context,
) -> Result<()> {
    ctx.output.header(&format!("Generations in {}", storage.root().display()));

    let mut generations = Vec::new();
    for generation in storage.generations().await? {
        let entries = storage.keys(&generation).await?.len();
        generations.push(GenerationInfo {
            current: &generation == current,
            generation,
            entries,
        });
    }

    if ctx.output.is_json() {
        ctx.output.json(&generations);
        return Ok(());
    }

    if generations.is_empty() {
        ctx.output.info("Store is empty.");
        ctx.output.info("Run `offline install` to seed it.");
        return Ok(());
    }

    ctx.output.table_row(&["GENERATION", "ENTRIES", ""], &[30, 8, 10]);
    for info in &generations {
        let marker = if info.current { "(current)" } else { "" };
        ctx.output.table_row(
            &[info.generation.as_str(), &info.entries.to_string(), marker],
            &[30, 8, 10],
        );
    }

    Ok(())
}

async fn show_generation(
    storage: &FsCacheStorage,
    generation: &GenerationId,
    ctx: &Context,
) -> Result<()> {
    if !storage.has(generation).await? {
        bail!("Generation '{}' not found", generation);
    }

    let mut entries = Vec::new();
    for key in storage.keys(generation).await? {
        if let Some(cached) = storage.match_entry(generation, &key).await? {
            entries.push(EntryInfo {
                key: key.to_string(),
                status: cached.status,
                bytes: cached.body.len(),
                age_secs: cached.age_secs(),
            });
        }
    }

    if ctx.output.is_json() {
        ctx.output.json(&entries);
        return Ok(());
    }

    ctx.output.header(&format!("Entries in {}", generation));

    if entries.is_empty() {
        ctx.output.info("No entries.");
        return Ok(());
    }

    ctx.output.table_row(&["STATUS", "SIZE", "AGE", "KEY"], &[6, 10, 8, 60]);
    for entry in &entries {
        ctx.output.table_row(
            &[
                &entry.status.to_string(),
                &format_bytes(entry.bytes as u64),
                &format_duration(entry.age_secs as u64),
                &entry.key,
            ],
            &[6, 10, 8, 60],
        );
    }

    let total: usize = entries.iter().map(|e| e.bytes).sum();
    ctx.output.info("");
    ctx.output.info(&format!(
        "Total: {} entr{} ({})",
        entries.len(),
        if entries.len() == 1 { "y" } else { "ies" },
        format_bytes(total as u64)
    ));

    Ok(())
}

async fn purge(
    storage: &FsCacheStorage,
    generation: Option<GenerationId>,
    yes: bool,
    ctx: &Context,
) -> Result<()> {
    let targets = match generation {
        Some(generation) => vec![generation],
        None => storage.generations().await?,
    };

    if targets.is_empty() {
        ctx.output.info("Nothing to purge.");
        return Ok(());
    }

    if !yes && !ctx.output.is_json() {
        let names: Vec<&str> = targets.iter().map(GenerationId::as_str).collect();
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete {}?", names.join(", ")))
            .default(false)
            .interact()?;

        if !confirmed {
            ctx.output.warn("Purge cancelled");
            return Ok(());
        }
    }

    let mut deleted = Vec::new();
    for generation in targets {
        if storage.delete_generation(&generation).await? {
            ctx.output.list_item(&format!("deleted {}", generation));
            deleted.push(generation);
        } else {
            ctx.output.warn(&format!("Generation '{}' not found", generation));
        }
    }

    if ctx.output.is_json() {
        ctx.output.json(&deleted);
        return Ok(());
    }

    ctx.output.success(&format!("Purged {} generation(s)", deleted.len()));

    Ok(())
}
