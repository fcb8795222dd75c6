//! Core domain types for craftmap.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Entries
// ============================================================================

/// Primordial entries written when a store is created for the first time.
///
/// Every other entry is reachable from these four by repeated combination.
pub const SEED_ENTRIES: [(&str, &str); 4] = [
    ("Water", "💧"),
    ("Fire", "🔥"),
    ("Wind", "🌬️"),
    ("Earth", "🌍"),
];

/// One discovered element of the crafting universe, keyed by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub glyph: String,
    /// True when this entry's first-ever production anywhere was ours.
    pub is_new: bool,
}

impl Entry {
    #[must_use]
    pub fn new(name: impl Into<String>, glyph: impl Into<String>, is_new: bool) -> Self {
        Self {
            name: name.into(),
            glyph: glyph.into(),
            is_new,
        }
    }

    /// The seed entries as values.
    #[must_use]
    pub fn seeds() -> Vec<Self> {
        SEED_ENTRIES
            .iter()
            .map(|(name, glyph)| Self::new(*name, *glyph, false))
            .collect()
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.glyph, self.name)
    }
}

// ============================================================================
// Ordered Pairs & Combinations
// ============================================================================

/// Two entry names in combination order.
///
/// `(A, B)` and `(B, A)` are different keys: the store records each
/// independently and nothing here assumes the upstream is commutative.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderedPair {
    first: String,
    second: String,
}

impl OrderedPair {
    #[must_use]
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }

    #[must_use]
    pub fn first(&self) -> &str {
        &self.first
    }

    #[must_use]
    pub fn second(&self) -> &str {
        &self.second
    }

    /// The same two names in the opposite order.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            first: self.second.clone(),
            second: self.first.clone(),
        }
    }
}

impl fmt::Display for OrderedPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {}", self.first, self.second)
    }
}

/// A recorded exploration outcome: `pair` produced `result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Combination {
    pub pair: OrderedPair,
    pub result: String,
}

impl Combination {
    #[must_use]
    pub fn new(pair: OrderedPair, result: impl Into<String>) -> Self {
        Self {
            pair,
            result: result.into(),
        }
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.pair, self.result)
    }
}

// ============================================================================
// Upstream Results
// ============================================================================

/// Body of a successful combine response.
///
/// Wire format: `{ "result": string, "emoji": string, "isNew": bool }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discovery {
    pub result: String,
    pub emoji: String,
    #[serde(rename = "isNew")]
    pub is_new: bool,
}

impl Discovery {
    /// The entry this discovery should be persisted as.
    #[must_use]
    pub fn to_entry(&self) -> Entry {
        Entry::new(self.result.clone(), self.emoji.clone(), self.is_new)
    }
}
