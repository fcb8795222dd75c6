//! Atomic file write helpers.
//!
//! Temp file in the destination directory, then rename over the target. On
//! Windows the rename fails when the target exists, so the old file is moved
//! aside to `.bak` first and restored if the second rename fails too.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct AtomicWriteOptions {
    /// When true, `sync_all()` is called on the temp file before persisting.
    pub sync_all: bool,
    /// When true, best-effort `sync_all()` on the parent directory after the
    /// rename. Errors are logged, never returned.
    pub dir_sync: bool,
}

impl Default for AtomicWriteOptions {
    fn default() -> Self {
        Self {
            sync_all: true,
            dir_sync: false,
        }
    }
}

pub fn atomic_write_with_options(
    path: impl AsRef<Path>,
    bytes: &[u8],
    options: AtomicWriteOptions,
) -> std::io::Result<()> {
    let path = path.as_ref();
    let parent = parent_dir(path);

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    if options.sync_all {
        tmp.as_file().sync_all()?;
    }

    if let Err(err) = tmp.persist(path) {
        if !path.exists() {
            return Err(err.error);
        }

        let backup_path = path.with_extension("bak");
        let _ = std::fs::remove_file(&backup_path);
        std::fs::rename(path, &backup_path)?;

        if let Err(rename_err) = err.file.persist(path) {
            let _ = std::fs::rename(&backup_path, path);
            return Err(rename_err.error);
        }
        if let Err(e) = std::fs::remove_file(&backup_path) {
            tracing::warn!(
                path = %backup_path.display(),
                "Failed to remove .bak after atomic write: {e}"
            );
        }
    }

    if options.dir_sync {
        best_effort_sync_dir(parent);
    }

    Ok(())
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn best_effort_sync_dir(dir: &Path) {
    #[cfg(unix)]
    {
        if let Err(e) = std::fs::File::open(dir).and_then(|d| d.sync_all()) {
            debug!(path = %dir.display(), "Directory sync_all failed (best-effort): {e}");
        }
    }

    #[cfg(not(unix))]
    {
        debug!(path = %dir.display(), "Directory sync skipped on this platform");
    }
}
