//! Resume capability for the ingestion pump
//!
//! Provides the single-slot checkpoint store (atomic replace) and the
//! advisory lock that keeps a second pump away from the same slot.

pub mod checkpoint;
pub mod lock;

pub use checkpoint::{CheckpointStore, MAX_CHECKPOINT_FILE_SIZE};
pub use lock::PumpLock;

/// Errors related to checkpoint persistence
#[derive(Debug, thiserror::Error)]
pub enum ResumeError {
    /// Checkpoint file too large to be a resumption token
    #[error("checkpoint file too large: {size} bytes (max: {max} bytes)")]
    CheckpointTooLarge {
        /// Actual file size
        size: u64,
        /// Maximum allowed size
        max: u64,
    },

    /// Refused to store an empty token
    #[error("refusing to store empty checkpoint token for stream {0}")]
    EmptyToken(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Lock error
    #[error("lock error: {0}")]
    LockError(String),
}
