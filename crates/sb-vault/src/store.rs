//! Atomic per-note writes.
//!
//! Content is written to a temp file in the destination directory and
//! persisted via rename, so an interrupted run leaves every note either
//! in its pre-run or fully-migrated state, never truncated. Transient
//! IO failures (e.g. a briefly locked file) are retried once.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use tracing::warn;

use sb_core::OrganizerError;

const RETRY_DELAY: Duration = Duration::from_millis(50);

/// Run an IO operation, retrying once after a short delay.
pub fn retry_once<T>(mut op: impl FnMut() -> std::io::Result<T>) -> std::io::Result<T> {
    op().or_else(|first| {
        warn!(error = %first, "io operation failed, retrying once");
        std::thread::sleep(RETRY_DELAY);
        op()
    })
}

/// Atomically write `content` to `path` (temp file + rename in the
/// target directory), creating parent directories as needed.
///
/// # Errors
///
/// Returns [`OrganizerError::Io`] after one retry.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), OrganizerError> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = dir {
        std::fs::create_dir_all(dir)?;
    }
    let dir = dir.unwrap_or_else(|| Path::new("."));

    retry_once(|| {
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    })?;
    Ok(())
}

/// Remove the old copy of a migrated note, retrying once.
///
/// # Errors
///
/// Returns [`OrganizerError::Io`] after one retry.
pub fn remove_old(path: &Path) -> Result<(), OrganizerError> {
    retry_once(|| std::fs::remove_file(path))?;
    Ok(())
}
