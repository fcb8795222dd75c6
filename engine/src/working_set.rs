//! In-memory mirror of every entry name known to the store.

use std::collections::HashMap;

use craftmap_store::{ItemStore, StoreResult};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SampleError {
    #[error("need at least 2 entries to draw a pair, have {population}")]
    InsufficientPopulation { population: usize },
}

/// Name → glyph map plus an insertion-ordered key list for indexed sampling.
///
/// Entries are only ever added or overwritten, so `names` holds every key of
/// `glyphs` exactly once.
#[derive(Debug, Default, Clone)]
pub struct WorkingSet {
    glyphs: HashMap<String, String>,
    names: Vec<String>,
}

impl WorkingSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate from a full store scan. Called once at startup.
    pub fn hydrate(store: &ItemStore) -> StoreResult<Self> {
        let mut set = Self::new();
        let mut loaded: Vec<(String, String)> = store.load_all_entries()?.into_iter().collect();
        // HashMap order is random; keep hydration reproducible.
        loaded.sort_unstable();
        for (name, glyph) in loaded {
            set.observe(name, glyph);
        }
        tracing::info!(entries = set.len(), "Hydrated working set");
        Ok(set)
    }

    /// Insert `name`, or overwrite its glyph if already present.
    pub fn observe(&mut self, name: impl Into<String>, glyph: impl Into<String>) {
        let name = name.into();
        if !self.glyphs.contains_key(&name) {
            self.names.push(name.clone());
        }
        self.glyphs.insert(name, glyph.into());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.glyphs.contains_key(name)
    }

    #[must_use]
    pub fn glyph(&self, name: &str) -> Option<&str> {
        self.glyphs.get(name).map(String::as_str)
    }

    /// Name at `index` in insertion order.
    #[must_use]
    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Two different names, each pair of distinct positions equally likely.
    pub fn sample_two_distinct(&self) -> Result<(&str, &str), SampleError> {
        let population = self.names.len();
        if population < 2 {
            return Err(SampleError::InsufficientPopulation { population });
        }
        let first = rand::random_range(0..population);
        // Draw from the remaining n-1 slots and skip over `first`.
        let mut second = rand::random_range(0..population - 1);
        if second >= first {
            second += 1;
        }
        Ok((&self.names[first], &self.names[second]))
    }
}
