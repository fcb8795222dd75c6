//! Shared SQLite helpers for the item store.

use anyhow::{Context, Result};
use rusqlite::{Connection, ErrorCode, OpenFlags, ffi};
use std::path::Path;

/// Connection pragmas applied to every store connection.
///
/// Foreign keys are off by default in SQLite; the combinations table relies
/// on them to reject rows whose entries were never written.
pub(crate) const PRAGMAS: &str =
    "PRAGMA journal_mode=WAL; PRAGMA synchronous=FULL; PRAGMA foreign_keys=ON;";

/// Open a SQLite database at `path`, creating the parent directory if needed.
pub(crate) fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    Connection::open(path).with_context(|| format!("Failed to open database at {}", path.display()))
}

/// Open an existing database without write access. Never creates the file.
pub(crate) fn open_db_read_only(path: &Path) -> Result<Connection> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("Failed to open database read-only at {}", path.display()))
}

/// Whether `path` names a database that has never been initialized.
///
/// A zero-length file counts as fresh: SQLite writes the header lazily, so a
/// process that died between creating the file and creating the schema leaves
/// one behind.
pub(crate) fn is_fresh(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) => meta.len() == 0,
        Err(_) => true,
    }
}

/// Which constraint a failed statement violated, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Violation {
    Unique,
    ForeignKey,
    Other,
}

pub(crate) fn constraint_violation(err: &rusqlite::Error) -> Option<Violation> {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            Some(match e.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    Violation::Unique
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Violation::ForeignKey,
                _ => Violation::Other,
            })
        }
        _ => None,
    }
}
