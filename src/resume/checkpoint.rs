//! Single-slot checkpoint persistence
//!
//! One file per stream holds the raw resumption token, no framing. The file is
//! always replaced whole through a temp file + rename so a crash never leaves a
//! truncated token behind.

use super::ResumeError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Upper bound on a checkpoint file; tokens are short opaque cursors
pub const MAX_CHECKPOINT_FILE_SIZE: u64 = 64 * 1024;

/// Durable resumption-token store rooted at a checkpoint directory
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    /// Create a store rooted at `dir`. The directory is created lazily on write.
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the checkpoint files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Checkpoint file for a stream, e.g. `get_mta_siem_logs_checkpoint` for `MTA`
    pub fn path_for(&self, stream: &str) -> PathBuf {
        self.dir
            .join(format!("get_{}_siem_logs_checkpoint", stream.to_lowercase()))
    }

    /// Read the stored token. `Ok(None)` means start from the beginning of history.
    ///
    /// An empty file is treated as absent.
    pub fn read(&self, stream: &str) -> Result<Option<String>, ResumeError> {
        let path = self.path_for(stream);

        let metadata = match std::fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(stream, "No checkpoint found, starting from the beginning");
                return Ok(None);
            }
            Err(e) => {
                return Err(ResumeError::IoError(format!(
                    "Failed to stat checkpoint {}: {e}",
                    path.display()
                )))
            }
        };

        if metadata.len() > MAX_CHECKPOINT_FILE_SIZE {
            return Err(ResumeError::CheckpointTooLarge {
                size: metadata.len(),
                max: MAX_CHECKPOINT_FILE_SIZE,
            });
        }

        let token = std::fs::read_to_string(&path).map_err(|e| {
            ResumeError::IoError(format!("Failed to read checkpoint {}: {e}", path.display()))
        })?;

        if token.is_empty() {
            debug!(stream, path = %path.display(), "Checkpoint file is empty");
            return Ok(None);
        }

        debug!(stream, path = %path.display(), "Loaded checkpoint");
        Ok(Some(token))
    }

    /// Replace the stored token for `stream` with `token`
    pub fn write(&self, stream: &str, token: &str) -> Result<(), ResumeError> {
        if token.is_empty() {
            return Err(ResumeError::EmptyToken(stream.to_string()));
        }

        let path = self.path_for(stream);
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            ResumeError::IoError(format!(
                "Failed to create checkpoint directory {}: {e}",
                self.dir.display()
            ))
        })?;

        let mut temp_file = tempfile::NamedTempFile::new_in(&self.dir)
            .map_err(|e| ResumeError::IoError(format!("Failed to create temp file: {e}")))?;

        temp_file
            .write_all(token.as_bytes())
            .map_err(|e| ResumeError::IoError(format!("Failed to write to temp file: {e}")))?;
        temp_file
            .flush()
            .map_err(|e| ResumeError::IoError(format!("Failed to flush temp file: {e}")))?;
        temp_file
            .as_file()
            .sync_all()
            .map_err(|e| ResumeError::IoError(format!("Failed to sync temp file: {e}")))?;

        temp_file
            .persist(&path)
            .map_err(|e| ResumeError::IoError(format!("Failed to persist temp file: {e}")))?;

        // Make the rename itself durable
        if let Ok(dir) = std::fs::File::open(&self.dir) {
            let _ = dir.sync_all();
        }

        info!(stream, path = %path.display(), "Checkpoint advanced");
        Ok(())
    }

    /// Delete the checkpoint for `stream`. Returns whether a file was removed.
    pub fn delete(&self, stream: &str) -> Result<bool, ResumeError> {
        let path = self.path_for(stream);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!(stream, path = %path.display(), "Checkpoint deleted");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ResumeError::IoError(format!(
                "Failed to delete checkpoint {}: {e}",
                path.display()
            ))),
        }
    }
}
