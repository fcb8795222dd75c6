use std::path::Path;

use anyhow::{Context, Result};
use craftmap_engine::{ExploreBudget, Explorer};
use craftmap_store::{ItemStore, write_snapshot};
use craftmap_upstream::{ClientConfig, CombineClient};

pub(crate) async fn explore(
    store_path: &Path,
    client_config: ClientConfig,
    budget: ExploreBudget,
) -> Result<()> {
    let store = ItemStore::open(store_path)
        .with_context(|| format!("Failed to open item store at {}", store_path.display()))?;
    let client = CombineClient::new(client_config).context("Failed to build combine client")?;
    tracing::info!(
        endpoint = %client.endpoint(),
        max_successes = budget.max_successes,
        max_attempts = budget.max_attempts,
        "Starting exploration"
    );

    let mut explorer =
        Explorer::new(store, client, budget).context("Failed to hydrate working set")?;
    let report = explorer.run().await?;

    let total = explorer.store().total_entry_count()?;
    println!(
        "successes: {}, attempts: {}, entries: {total}",
        report.successes, report.attempts
    );
    Ok(())
}

pub(crate) fn export(store_path: &Path, out: &Path) -> Result<()> {
    let store = open_existing_store(store_path)?;
    let written = write_snapshot(&store, out)
        .with_context(|| format!("Failed to export snapshot to {}", out.display()))?;
    tracing::info!(path = %out.display(), entries = written, "Exported snapshot");
    println!("{written}");
    Ok(())
}

pub(crate) fn count(store_path: &Path) -> Result<()> {
    let store = open_existing_store(store_path)?;
    println!("{}", store.total_entry_count()?);
    Ok(())
}

/// Read-side commands never create or bootstrap a store.
fn open_existing_store(path: &Path) -> Result<ItemStore> {
    ItemStore::open_existing(path)
        .with_context(|| format!("Failed to open item store at {}", path.display()))
}
