//! Durable storage for the crafting universe.
//!
//! Two SQLite tables back everything craftmap knows:
//!
//! ```text
//! items(name PK, emoji, isNew)
//!   ^        ^         ^
//!   |        |         |
//! combinations(id, firstItem, secondItem, resultItem)
//!              UNIQUE(firstItem, secondItem)
//! ```
//!
//! The exploration engine is the only writer. The read-side queries
//! ([`ItemStore::search_entries`], [`ItemStore::recipes_for`], ...) and the
//! snapshot [`export`] exist for browse and dump tooling and never write.
//!
//! # Write Ordering
//!
//! A combination row references its result entry through a foreign key, so
//! callers must [`ItemStore::upsert_entry`] the result before
//! [`ItemStore::insert_combination`]. Getting this wrong is reported as
//! [`StoreError::MissingEntry`], not silently repaired.

mod atomic_write;
mod error;
pub mod export;
mod item_store;
mod sqlite_util;

pub use atomic_write::{AtomicWriteOptions, atomic_write_with_options};
pub use error::{StoreError, StoreResult};
pub use export::{ItemsSnapshot, SnapshotItem, write_snapshot};
pub use item_store::{ItemStore, Recipe, SearchPage};
