use craftmap_types::OrderedPair;

use crate::working_set::{SampleError, WorkingSet};

/// Chooses the next ordered pair to try.
///
/// Implementations keep no memory of earlier draws; re-drawing an explored
/// pair is caught by the store's existence check.
pub trait PairSelector {
    fn select(&mut self, working_set: &WorkingSet) -> Result<OrderedPair, SampleError>;
}

/// Uniform draw of two distinct known names.
#[derive(Debug, Default, Clone, Copy)]
pub struct UniformPairs;

impl PairSelector for UniformPairs {
    fn select(&mut self, working_set: &WorkingSet) -> Result<OrderedPair, SampleError> {
        let (first, second) = working_set.sample_two_distinct()?;
        Ok(OrderedPair::new(first, second))
    }
}

/// Replays a fixed list of pairs, then reports an empty population.
///
/// Useful for driving the loop deterministically.
#[derive(Debug, Default, Clone)]
pub struct ScriptedPairs {
    pairs: std::collections::VecDeque<OrderedPair>,
}

impl ScriptedPairs {
    pub fn new(pairs: impl IntoIterator<Item = OrderedPair>) -> Self {
        Self {
            pairs: pairs.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.pairs.len()
    }
}

impl PairSelector for ScriptedPairs {
    fn select(&mut self, _working_set: &WorkingSet) -> Result<OrderedPair, SampleError> {
        self.pairs
            .pop_front()
            .ok_or(SampleError::InsufficientPopulation { population: 0 })
    }
}
