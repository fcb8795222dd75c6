//! The exploration loop.
//!
//! Each iteration draws an ordered pair, skips it if the store already has
//! an outcome, otherwise asks the combine API and records the answer. Writes
//! go entry first so the combination's foreign key always resolves:
//!
//! ```text
//! select ─► exists? ──yes──────────────────────────────┐
//!              │no                                      │
//!              ▼                                        ▼
//!           combine ─► upsert entry ─► observe ─► insert combination ─► attempts += 1, pace
//! ```

use std::fmt;
use std::time::Duration;

use craftmap_store::{ItemStore, StoreError};
use craftmap_types::OrderedPair;
use craftmap_upstream::{CombineClient, CombineError};
use thiserror::Error;

use crate::selector::{PairSelector, UniformPairs};
use crate::working_set::{SampleError, WorkingSet};

pub const DEFAULT_MAX_SUCCESSES: u64 = 500_000;
pub const DEFAULT_MAX_ATTEMPTS: u64 = 2_500_000;
pub const DEFAULT_PACING: Duration = Duration::from_millis(50);

/// Termination bounds and pacing for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExploreBudget {
    pub max_successes: u64,
    pub max_attempts: u64,
    /// Sleep after every attempt, explored or not.
    pub pacing: Duration,
}

impl Default for ExploreBudget {
    fn default() -> Self {
        Self {
            max_successes: DEFAULT_MAX_SUCCESSES,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            pacing: DEFAULT_PACING,
        }
    }
}

/// Why a run stopped early without failing.
#[derive(Debug)]
pub enum AbortReason {
    Sample(SampleError),
    ExistenceCheck(StoreError),
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sample(e) => write!(f, "cannot draw a pair: {e}"),
            Self::ExistenceCheck(e) => write!(f, "existence check failed: {e}"),
        }
    }
}

#[derive(Debug)]
pub enum ExploreState {
    /// A budget counter reached its bound.
    Exhausted,
    Aborted(AbortReason),
}

impl ExploreState {
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

#[derive(Debug)]
pub struct ExploreReport {
    pub state: ExploreState,
    pub successes: u64,
    pub attempts: u64,
}

/// Conditions that end the run with a non-zero exit.
#[derive(Debug, Error)]
pub enum ExploreError {
    #[error("combine API failed for {pair}: {source}")]
    Upstream {
        pair: OrderedPair,
        #[source]
        source: CombineError,
    },

    #[error("failed to record {pair}: {source}")]
    Write {
        pair: OrderedPair,
        #[source]
        source: StoreError,
    },
}

/// Owns the store, the working set and the client for the length of a run.
pub struct Explorer<S = UniformPairs> {
    store: ItemStore,
    working_set: WorkingSet,
    client: CombineClient,
    selector: S,
    budget: ExploreBudget,
}

impl Explorer<UniformPairs> {
    /// Hydrate the working set from `store` and prepare a uniform-sampling run.
    pub fn new(
        store: ItemStore,
        client: CombineClient,
        budget: ExploreBudget,
    ) -> Result<Self, StoreError> {
        Self::with_selector(store, client, budget, UniformPairs)
    }
}

impl<S: PairSelector> Explorer<S> {
    pub fn with_selector(
        store: ItemStore,
        client: CombineClient,
        budget: ExploreBudget,
        selector: S,
    ) -> Result<Self, StoreError> {
        let working_set = WorkingSet::hydrate(&store)?;
        Ok(Self {
            store,
            working_set,
            client,
            selector,
            budget,
        })
    }

    #[must_use]
    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    #[must_use]
    pub fn working_set(&self) -> &WorkingSet {
        &self.working_set
    }

    #[must_use]
    pub fn into_store(self) -> ItemStore {
        self.store
    }

    /// Run until a budget bound is hit or no further pair can be tried.
    pub async fn run(&mut self) -> Result<ExploreReport, ExploreError> {
        let mut successes: u64 = 0;
        let mut attempts: u64 = 0;

        let state = loop {
            if successes >= self.budget.max_successes || attempts >= self.budget.max_attempts {
                break ExploreState::Exhausted;
            }

            let pair = match self.selector.select(&self.working_set) {
                Ok(pair) => pair,
                Err(e) => break ExploreState::Aborted(AbortReason::Sample(e)),
            };

            let explored = match self.store.combination_exists(&pair) {
                Ok(explored) => explored,
                Err(e) => break ExploreState::Aborted(AbortReason::ExistenceCheck(e)),
            };

            if explored {
                tracing::trace!(pair = %pair, "Already explored");
            } else if self.explore_pair(&pair).await? {
                successes += 1;
            }

            attempts += 1;
            tokio::time::sleep(self.budget.pacing).await;
        };

        match &state {
            ExploreState::Exhausted => {
                tracing::info!(successes, attempts, "Exploration budget exhausted");
            }
            ExploreState::Aborted(reason) => {
                tracing::error!(successes, attempts, %reason, "Exploration aborted");
            }
        }

        Ok(ExploreReport {
            state,
            successes,
            attempts,
        })
    }

    /// Combine one unexplored pair and record it. `Ok(false)` means skipped.
    async fn explore_pair(&mut self, pair: &OrderedPair) -> Result<bool, ExploreError> {
        let discovery = match self.client.combine(pair).await {
            Ok(discovery) => discovery,
            Err(e) if e.is_fatal() => {
                return Err(ExploreError::Upstream {
                    pair: pair.clone(),
                    source: e,
                });
            }
            Err(e) => {
                tracing::warn!(pair = %pair, error = %e, "Skipping attempt");
                return Ok(false);
            }
        };

        let write_err = |source| ExploreError::Write {
            pair: pair.clone(),
            source,
        };

        self.store
            .upsert_entry(&discovery.result, &discovery.emoji, discovery.is_new)
            .map_err(write_err)?;
        self.working_set
            .observe(discovery.result.as_str(), discovery.emoji.as_str());
        self.store
            .insert_combination(pair, &discovery.result)
            .map_err(write_err)?;

        tracing::debug!(
            pair = %pair,
            result = %discovery.result,
            glyph = %discovery.emoji,
            is_new = discovery.is_new,
            "Recorded combination"
        );
        Ok(true)
    }
}
