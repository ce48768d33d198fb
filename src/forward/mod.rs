//! Decompression and syslog forwarding
//!
//! Forwarding is best effort. A failure here is logged by the pump and never
//! stops ingestion: by the time an artifact is forwarded its checkpoint has
//! already advanced, so a failed artifact is not retried.
//!
//! A record the sink refuses is counted and skipped; the remaining lines and
//! files of the artifact are still sent.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::metrics;

pub mod archive;
pub mod syslog;

pub use syslog::UdpSyslogSink;

/// Forwarding errors
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    /// Archive could not be opened or extracted
    #[error("archive error: {0}")]
    ArchiveError(String),

    /// Plaintext log file could not be read
    #[error("read error: {0}")]
    ReadError(String),

    /// Sink refused a record
    #[error("sink error: {0}")]
    SinkError(String),
}

/// Result type for forwarding operations
pub type ForwardResult<T> = Result<T, ForwardError>;

/// Destination for forwarded log lines
///
/// Contract: open at startup (constructor), [`LineSink::close`] once at shutdown.
#[async_trait]
pub trait LineSink: Send + Sync {
    /// Emit one log line as one record
    async fn send_line(&self, line: &str) -> ForwardResult<()>;

    /// Flush and release the sink
    async fn close(&self) -> ForwardResult<()> {
        Ok(())
    }
}

/// Counts for one forwarded artifact
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardReport {
    /// Plaintext files forwarded
    pub files: usize,
    /// Lines sent
    pub lines: u64,
    /// Lines the sink refused
    pub failed: u64,
}

/// Extracts archives and replays their lines into a [`LineSink`]
#[derive(Clone)]
pub struct Forwarder {
    sink: Arc<dyn LineSink>,
}

impl Forwarder {
    /// Create a forwarder over `sink`
    pub fn new(sink: Arc<dyn LineSink>) -> Self {
        Self { sink }
    }

    /// Forward an artifact
    ///
    /// Compressed artifacts are extracted next to themselves and each extracted
    /// file is forwarded in archive order; plain artifacts are forwarded directly.
    pub async fn forward(&self, artifact: &Path, compressed: bool) -> ForwardResult<ForwardReport> {
        let files = if compressed {
            let archive_path = artifact.to_path_buf();
            let dest: PathBuf = artifact
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            tokio::task::spawn_blocking(move || archive::extract_all(&archive_path, &dest))
                .await
                .map_err(|e| ForwardError::ArchiveError(format!("extraction task failed: {e}")))??
        } else {
            vec![artifact.to_path_buf()]
        };

        let mut report = ForwardReport::default();
        for file in &files {
            let (sent, failed) = self.forward_file(file).await?;
            report.lines += sent;
            report.failed += failed;
            report.files += 1;
        }

        metrics::record_lines_forwarded(report.lines);
        info!(
            artifact = %artifact.display(),
            files = report.files,
            lines = report.lines,
            failed = report.failed,
            "Syslog output completed"
        );
        Ok(report)
    }

    /// Send every line of a plaintext file, in order, one record per line
    ///
    /// Returns `(sent, failed)`. Only an unreadable file is an error.
    pub async fn forward_file(&self, path: &Path) -> ForwardResult<(u64, u64)> {
        let raw = tokio::fs::read(path)
            .await
            .map_err(|e| ForwardError::ReadError(format!("{}: {e}", path.display())))?;
        let text = String::from_utf8_lossy(&raw);

        let mut sent = 0u64;
        let mut failed = 0u64;
        for (index, line) in split_lines(&text).enumerate() {
            match self.sink.send_line(line).await {
                Ok(()) => sent += 1,
                Err(e) => {
                    failed += 1;
                    metrics::record_line_send_failure();
                    debug!(
                        path = %path.display(),
                        line = index + 1,
                        error = %e,
                        "Syslog record dropped"
                    );
                }
            }
        }

        if failed > 0 {
            warn!(path = %path.display(), sent, failed, "Some syslog records could not be sent");
        }
        debug!(path = %path.display(), lines = sent, "Forwarded file");
        Ok((sent, failed))
    }
}

/// Split text into lines on `\n`, `\r\n` or a bare `\r`
///
/// A trailing terminator does not produce an extra empty line.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        match rest.find(['\r', '\n']) {
            Some(end) => {
                let line = &rest[..end];
                let skip = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[end + skip..];
                Some(line)
            }
            None => {
                let line = rest;
                rest = "";
                Some(line)
            }
        }
    })
}
