//! Flat JSON snapshot of the items table.
//!
//! The layout matches what the game keeps in browser local storage, so a
//! snapshot can be loaded straight into a client:
//!
//! ```json
//! {"elements":[{"text":"Water","emoji":"💧","discovered":false}]}
//! ```
//!
//! `discovered` carries the entry's `isNew` flag.

use std::path::Path;

use anyhow::Context;
use craftmap_types::Entry;
use serde::{Deserialize, Serialize};

use crate::atomic_write::{AtomicWriteOptions, atomic_write_with_options};
use crate::error::StoreResult;
use crate::item_store::ItemStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotItem {
    pub text: String,
    pub emoji: String,
    pub discovered: bool,
}

impl From<Entry> for SnapshotItem {
    fn from(entry: Entry) -> Self {
        Self {
            text: entry.name,
            emoji: entry.glyph,
            discovered: entry.is_new,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemsSnapshot {
    pub elements: Vec<SnapshotItem>,
}

impl ItemsSnapshot {
    pub fn from_store(store: &ItemStore) -> StoreResult<Self> {
        let elements = store
            .all_entries()?
            .into_iter()
            .map(SnapshotItem::from)
            .collect();
        Ok(Self { elements })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Minified JSON.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Dump every entry in `store` to `path`. Returns the number of entries written.
pub fn write_snapshot(store: &ItemStore, path: impl AsRef<Path>) -> StoreResult<usize> {
    let path = path.as_ref();
    let snapshot = ItemsSnapshot::from_store(store)?;
    let bytes = snapshot
        .to_json()
        .context("Failed to serialize items snapshot")?;

    atomic_write_with_options(
        path,
        &bytes,
        AtomicWriteOptions {
            sync_all: true,
            dir_sync: true,
        },
    )
    .with_context(|| format!("Failed to write snapshot to {}", path.display()))?;

    tracing::info!(path = %path.display(), entries = snapshot.len(), "Wrote items snapshot");
    Ok(snapshot.len())
}
