use std::path::PathBuf;

use craftmap_types::OrderedPair;
use thiserror::Error;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The ordered pair already has a recorded outcome.
    ///
    /// Callers are expected to check [`crate::ItemStore::combination_exists`]
    /// first, so seeing this means the check was skipped or raced.
    #[error("combination {pair} is already recorded")]
    DuplicateCombination { pair: OrderedPair },

    /// A combination referenced an entry that has not been written yet.
    #[error("combination {pair} = {result} references an entry that does not exist")]
    MissingEntry { pair: OrderedPair, result: String },

    /// A read-only open found no initialized store at `path`.
    #[error("no item store at {}", path.display())]
    NotInitialized { path: PathBuf },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateCombination { .. })
    }
}
