//! Single-instance guard over a checkpoint slot
//!
//! Two pumps sharing one checkpoint file would race on the token. The pump
//! takes an exclusive advisory lock (fd-lock) on `<checkpoint>.lock` for the
//! lifetime of the run.

use super::ResumeError;
use fd_lock::RwLock;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Held exclusive lock; released when dropped (the descriptor closes)
pub struct PumpLock {
    _lock: RwLock<File>,
    path: PathBuf,
}

impl PumpLock {
    /// Try to take the lock guarding `checkpoint_path` without blocking
    ///
    /// Returns [`ResumeError::LockError`] immediately if another process holds it.
    pub fn try_acquire(checkpoint_path: &Path) -> Result<Self, ResumeError> {
        if let Some(parent) = checkpoint_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ResumeError::IoError(e.to_string()))?;
        }

        let lock_path = checkpoint_path.with_extension("lock");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| ResumeError::LockError(format!("Failed to open lock file: {e}")))?;

        let mut lock = RwLock::new(file);
        let guard = lock.try_write().map_err(|e| {
            ResumeError::LockError(format!(
                "{} is held by another pump: {e}",
                lock_path.display()
            ))
        })?;
        // Keep the OS lock past the guard; it goes away with the descriptor.
        std::mem::forget(guard);

        debug!(path = %lock_path.display(), "Acquired pump lock");
        Ok(Self {
            _lock: lock,
            path: lock_path,
        })
    }

    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
