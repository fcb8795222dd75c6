//! Exploration engine: the working set cache, pair selection and the run loop.
//!
//! Everything runs on one task. The [`Explorer`] owns the store, the cache and
//! the client, so the "check then write" sequence for a pair can never
//! interleave with another writer in this process.

mod explorer;
mod selector;
mod working_set;

pub use explorer::{
    AbortReason, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_SUCCESSES, DEFAULT_PACING, ExploreBudget,
    ExploreError, ExploreReport, ExploreState, Explorer,
};
pub use selector::{PairSelector, ScriptedPairs, UniformPairs};
pub use working_set::{SampleError, WorkingSet};
