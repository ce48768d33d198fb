//! Artifact output: naming, date partitioning and durable writes

pub mod artifact;
pub mod path;

pub use artifact::{ArtifactWriter, WrittenArtifact};
pub use path::{ArtifactName, DATE_TOKEN_LEN};

/// Artifact output errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// Content-Disposition header could not yield a usable filename
    #[error("invalid artifact filename: {0}")]
    InvalidFileName(String),

    /// Filename does not carry a YYYYMMDD date token
    #[error("invalid date token in {file_name}: {reason}")]
    InvalidDate {
        /// Offending filename
        file_name: String,
        /// Why the token was rejected
        reason: String,
    },

    /// Payload stream failed mid-download
    #[error("payload stream error: {0}")]
    BodyError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
