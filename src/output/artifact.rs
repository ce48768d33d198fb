//! Durable artifact writes
//!
//! A failed write here is fatal for the run: the checkpoint is only advanced
//! after the artifact is on disk, so a half-written file must never be
//! followed by a checkpoint write.

use super::{ArtifactName, OutputError, OutputResult};
use bytes::Bytes;
use chrono::FixedOffset;
use futures_util::{Stream, StreamExt};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Result of a completed artifact write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenArtifact {
    /// Where the artifact landed
    pub path: PathBuf,
    /// Bytes written
    pub bytes: u64,
}

/// Writes artifacts into `<root>/<YYYYMMDD>/<filename>`
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    root: PathBuf,
    utc_offset: FixedOffset,
}

impl ArtifactWriter {
    /// Create a writer under `root`; modification times are computed at `utc_offset`
    pub fn new<P: Into<PathBuf>>(root: P, utc_offset: FixedOffset) -> Self {
        Self {
            root: root.into(),
            utc_offset,
        }
    }

    /// Log root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the log root if it is missing
    pub fn ensure_root(&self) -> OutputResult<()> {
        std::fs::create_dir_all(&self.root).map_err(|e| {
            OutputError::IoError(format!(
                "Failed to create log directory {}: {e}",
                self.root.display()
            ))
        })
    }

    /// Stream a binary payload to disk chunk by chunk
    pub async fn write_stream<S, E>(&self, name: &ArtifactName, mut body: S) -> OutputResult<WrittenArtifact>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: Display,
    {
        let path = self.prepare(name).await?;
        let mut file = create(&path).await?;
        let mut bytes = 0u64;

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| {
                OutputError::BodyError(format!("{} after {bytes} bytes: {e}", name.file_name()))
            })?;
            file.write_all(&chunk).await.map_err(|e| io_error(&path, e))?;
            bytes += chunk.len() as u64;
        }

        self.finish(name, &path, file, bytes).await
    }

    /// Write a decoded text payload
    pub async fn write_text(&self, name: &ArtifactName, text: &str) -> OutputResult<WrittenArtifact> {
        let path = self.prepare(name).await?;
        let mut file = create(&path).await?;
        file.write_all(text.as_bytes())
            .await
            .map_err(|e| io_error(&path, e))?;

        self.finish(name, &path, file, text.len() as u64).await
    }

    async fn prepare(&self, name: &ArtifactName) -> OutputResult<PathBuf> {
        let dir = name.partition_dir(&self.root);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_error(&dir, e))?;
        Ok(name.path_in(&self.root))
    }

    async fn finish(
        &self,
        name: &ArtifactName,
        path: &Path,
        mut file: tokio::fs::File,
        bytes: u64,
    ) -> OutputResult<WrittenArtifact> {
        file.flush().await.map_err(|e| io_error(path, e))?;
        file.sync_all().await.map_err(|e| io_error(path, e))?;

        let mtime = name.modified_time(self.utc_offset)?;
        let std_file = file.into_std().await;
        std_file
            .set_modified(mtime)
            .map_err(|e| OutputError::IoError(format!("Failed to set mtime on {}: {e}", path.display())))?;
        debug!(path = %path.display(), date = %name.date(), "Pinned artifact modification time");

        info!(path = %path.display(), bytes, "Artifact written");
        Ok(WrittenArtifact {
            path: path.to_path_buf(),
            bytes,
        })
    }
}

async fn create(path: &Path) -> OutputResult<tokio::fs::File> {
    tokio::fs::File::create(path)
        .await
        .map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, e: std::io::Error) -> OutputError {
    OutputError::IoError(format!("Error writing file {}: {e}", path.display()))
}
