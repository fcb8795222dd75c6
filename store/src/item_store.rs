//! Item Store - Persistent storage for discovered entries and combinations.
//!
//! Entries are upserted (the upstream may report a new glyph or `isNew` flag
//! for a name we already hold). Combinations are insert-only: each ordered
//! pair is explored at most once, ever.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use craftmap_types::{Combination, Entry, OrderedPair};
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{StoreError, StoreResult};
use crate::sqlite_util::{
    PRAGMAS, Violation, constraint_violation, is_fresh, open_db, open_db_read_only,
};

/// A combination that produces some entry, with both ingredients resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub first: Entry,
    pub second: Entry,
    pub result: String,
}

/// One page of a name search.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub entries: Vec<Entry>,
    /// True when the query hit `limit` and more matches may exist.
    pub limited: bool,
}

/// Persistent store for entries and ordered-pair combinations.
pub struct ItemStore {
    db: Connection,
}

impl ItemStore {
    const SCHEMA: &'static str = r"
        CREATE TABLE items (
            name TEXT PRIMARY KEY,
            emoji TEXT NOT NULL,
            isNew BOOLEAN NOT NULL
        );

        CREATE TABLE combinations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            firstItem TEXT NOT NULL,
            secondItem TEXT NOT NULL,
            resultItem TEXT NOT NULL,
            UNIQUE(firstItem, secondItem),
            FOREIGN KEY (firstItem) REFERENCES items(name),
            FOREIGN KEY (secondItem) REFERENCES items(name),
            FOREIGN KEY (resultItem) REFERENCES items(name)
        );

        CREATE INDEX idx_combinations_result
        ON combinations(resultItem);
    ";

    /// Open the store at `path`, bootstrapping it if it was never initialized.
    ///
    /// Bootstrapping creates both tables and writes the seed entries in a
    /// single transaction. An existing store is opened as-is.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let fresh = is_fresh(path);
        tracing::debug!(path = %path.display(), fresh, "Opening item store");

        let db = open_db(path)?;
        Self::initialize(db, fresh)
    }

    /// Open an already initialized store for reading only.
    ///
    /// Never creates, bootstraps or changes the file, journal mode included.
    /// A missing or empty file is [`StoreError::NotInitialized`].
    pub fn open_existing(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if is_fresh(path) {
            return Err(StoreError::NotInitialized {
                path: path.to_path_buf(),
            });
        }
        tracing::debug!(path = %path.display(), "Opening item store read-only");

        let db = open_db_read_only(path)?;
        Ok(Self { db })
    }

    /// Open an in-memory store (for testing). Always bootstrapped.
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Connection::open_in_memory().context("Failed to open in-memory item store")?;
        Self::initialize(db, true)
    }

    fn initialize(mut db: Connection, fresh: bool) -> StoreResult<Self> {
        db.execute_batch(PRAGMAS)
            .context("Failed to set item store pragmas")?;

        if fresh {
            Self::bootstrap(&mut db)?;
        }
        Ok(Self { db })
    }

    fn bootstrap(db: &mut Connection) -> StoreResult<()> {
        let tx = db
            .transaction()
            .context("Failed to start bootstrap transaction")?;

        tx.execute_batch(Self::SCHEMA)
            .context("Failed to create item store schema")?;
        tracing::info!("Created items and combinations tables");

        for seed in Entry::seeds() {
            tx.execute(
                "INSERT INTO items (name, emoji, isNew) VALUES (?1, ?2, ?3)",
                params![seed.name, seed.glyph, seed.is_new],
            )
            .with_context(|| format!("Failed to insert seed entry: {}", seed.name))?;
        }

        tx.commit()
            .context("Failed to commit bootstrap transaction")?;
        tracing::info!("Inserted seed entries");
        Ok(())
    }

    /// Full scan of entry name -> glyph, used to hydrate the working set.
    pub fn load_all_entries(&self) -> StoreResult<HashMap<String, String>> {
        let mut stmt = self
            .db
            .prepare("SELECT name, emoji FROM items")
            .context("Failed to prepare entry scan")?;

        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .context("Failed to scan entries")?;

        let mut entries = HashMap::new();
        for row in rows {
            let (name, glyph): (String, String) = row.context("Failed to read entry row")?;
            entries.insert(name, glyph);
        }
        Ok(entries)
    }

    /// Insert an entry, or refresh the glyph and `isNew` flag of an existing one.
    ///
    /// The name is never rewritten. Repeating a call with the same arguments
    /// leaves the row unchanged.
    pub fn upsert_entry(&mut self, name: &str, glyph: &str, is_new: bool) -> StoreResult<()> {
        tracing::debug!(name, glyph, is_new, "Upserting entry");
        self.db
            .execute(
                "INSERT INTO items (name, emoji, isNew) VALUES (?1, ?2, ?3)
                 ON CONFLICT(name) DO UPDATE SET emoji = excluded.emoji, isNew = excluded.isNew",
                params![name, glyph, is_new],
            )
            .with_context(|| format!("Failed to upsert entry: {name}"))?;
        Ok(())
    }

    /// Whether this exact ordered pair already has a recorded outcome.
    pub fn combination_exists(&self, pair: &OrderedPair) -> StoreResult<bool> {
        let found = self
            .db
            .query_row(
                "SELECT 1 FROM combinations WHERE firstItem = ?1 AND secondItem = ?2",
                params![pair.first(), pair.second()],
                |_| Ok(()),
            )
            .optional()
            .with_context(|| format!("Failed to look up combination: {pair}"))?;
        Ok(found.is_some())
    }

    /// Record the outcome of an ordered pair. Insert-only.
    ///
    /// Fails with [`StoreError::DuplicateCombination`] if the pair is already
    /// recorded and [`StoreError::MissingEntry`] if any referenced entry is
    /// absent.
    pub fn insert_combination(&mut self, pair: &OrderedPair, result: &str) -> StoreResult<()> {
        tracing::debug!(
            first = pair.first(),
            second = pair.second(),
            result,
            "Inserting combination"
        );
        let outcome = self.db.execute(
            "INSERT INTO combinations (firstItem, secondItem, resultItem) VALUES (?1, ?2, ?3)",
            params![pair.first(), pair.second(), result],
        );

        match outcome {
            Ok(_) => Ok(()),
            Err(err) => Err(match constraint_violation(&err) {
                Some(Violation::Unique) => StoreError::DuplicateCombination { pair: pair.clone() },
                Some(Violation::ForeignKey) => StoreError::MissingEntry {
                    pair: pair.clone(),
                    result: result.to_string(),
                },
                Some(Violation::Other) | None => anyhow::Error::new(err)
                    .context(format!("Failed to insert combination: {pair}"))
                    .into(),
            }),
        }
    }

    pub fn total_entry_count(&self) -> StoreResult<u64> {
        let count: i64 = self
            .db
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))
            .context("Failed to count entries")?;
        Ok(count as u64)
    }

    pub fn total_combination_count(&self) -> StoreResult<u64> {
        let count: i64 = self
            .db
            .query_row("SELECT COUNT(*) FROM combinations", [], |row| row.get(0))
            .context("Failed to count combinations")?;
        Ok(count as u64)
    }

    pub fn get_entry(&self, name: &str) -> StoreResult<Option<Entry>> {
        let entry = self
            .db
            .query_row(
                "SELECT name, emoji, isNew FROM items WHERE name = ?1",
                [name],
                |row| entry_at(row, 0),
            )
            .optional()
            .with_context(|| format!("Failed to load entry: {name}"))?;
        Ok(entry)
    }

    /// Every entry, in insertion order.
    pub fn all_entries(&self) -> StoreResult<Vec<Entry>> {
        let mut stmt = self
            .db
            .prepare("SELECT name, emoji, isNew FROM items ORDER BY rowid ASC")
            .context("Failed to prepare entry listing")?;

        let entries = stmt
            .query_map([], |row| {
                entry_at(row, 0)
            })
            .context("Failed to list entries")?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read entry row")?;
        Ok(entries)
    }

    /// Case-insensitive substring search on entry names.
    ///
    /// `%` and `_` in `query` match literally.
    pub fn search_entries(&self, query: &str, limit: usize) -> StoreResult<SearchPage> {
        if limit == 0 {
            return Ok(SearchPage::default());
        }

        let pattern = format!("%{}%", escape_like(query));
        let mut stmt = self
            .db
            .prepare(
                "SELECT name, emoji, isNew FROM items
                 WHERE name LIKE ?1 ESCAPE '\\'
                 ORDER BY name ASC
                 LIMIT ?2",
            )
            .context("Failed to prepare search query")?;

        let entries = stmt
            .query_map(params![pattern, limit as i64], |row| {
                entry_at(row, 0)
            })
            .context("Failed to execute search query")?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read search result")?;

        let limited = entries.len() == limit;
        Ok(SearchPage { entries, limited })
    }

    /// Every recorded combination that produced `result`.
    pub fn recipes_for(&self, result: &str) -> StoreResult<Vec<Recipe>> {
        let mut stmt = self
            .db
            .prepare(
                "SELECT a.name, a.emoji, a.isNew, b.name, b.emoji, b.isNew
                 FROM combinations c
                 JOIN items a ON c.firstItem = a.name
                 JOIN items b ON c.secondItem = b.name
                 WHERE c.resultItem = ?1
                 ORDER BY c.id ASC",
            )
            .context("Failed to prepare recipe query")?;

        let recipes = stmt
            .query_map([result], |row| {
                Ok(Recipe {
                    first: entry_at(row, 0)?,
                    second: entry_at(row, 3)?,
                    result: result.to_string(),
                })
            })
            .with_context(|| format!("Failed to query recipes for {result}"))?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read recipe row")?;
        Ok(recipes)
    }

    /// Every recorded combination, oldest first.
    pub fn all_combinations(&self) -> StoreResult<Vec<Combination>> {
        let mut stmt = self
            .db
            .prepare(
                "SELECT firstItem, secondItem, resultItem FROM combinations ORDER BY id ASC",
            )
            .context("Failed to prepare combination listing")?;

        let combos = stmt
            .query_map([], |row| {
                let pair = OrderedPair::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?);
                Ok(Combination::new(pair, row.get::<_, String>(2)?))
            })
            .context("Failed to list combinations")?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read combination row")?;
        Ok(combos)
    }
}

/// Read an entry from three consecutive columns starting at `offset`.
fn entry_at(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Entry> {
    Ok(Entry::new(
        row.get::<_, String>(offset)?,
        row.get::<_, String>(offset + 1)?,
        row.get(offset + 2)?,
    ))
}

fn escape_like(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
