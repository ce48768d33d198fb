//! CLI error types and exit codes

use crate::fetcher::ApiError;
use crate::forward::ForwardError;
use crate::output::OutputError;
use crate::pump::{PumpError, StopReason};
use crate::resume::ResumeError;
use crate::settings::SettingsError;

/// Clean shutdown
pub const EXIT_OK: i32 = 0;
/// Anything not classified below
pub const EXIT_FAILURE: i32 = 1;
/// Settings could not be loaded
pub const EXIT_CONFIG: i32 = 2;
/// Base URL discovery failed
pub const EXIT_DISCOVERY: i32 = 3;
/// Checkpoint I/O failed (including lock contention)
pub const EXIT_CHECKPOINT: i32 = 4;
/// Artifact I/O failed
pub const EXIT_ARTIFACT: i32 = 5;
/// Fetch loop stopped and no restart was configured
pub const EXIT_LOOP_STOPPED: i32 = 6;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Settings error
    #[error("settings error: {0}")]
    SettingsError(#[from] SettingsError),

    /// Fatal pump error
    #[error("pump error: {0}")]
    PumpError(#[from] PumpError),

    /// Checkpoint error outside the pump
    #[error("checkpoint error: {0}")]
    ResumeError(#[from] ResumeError),

    /// Artifact directory error outside the pump
    #[error("output error: {0}")]
    OutputError(#[from] OutputError),

    /// API client error outside the pump
    #[error("api error: {0}")]
    ApiError(#[from] ApiError),

    /// Syslog sink could not be set up
    #[error("forward error: {0}")]
    ForwardError(#[from] ForwardError),

    /// The fetch loop stopped and restarts are disabled
    #[error("fetch loop stopped: {0}")]
    LoopStopped(StopReason),
}

impl CliError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::SettingsError(_) => EXIT_CONFIG,
            CliError::PumpError(PumpError::Discovery { .. }) => EXIT_DISCOVERY,
            CliError::PumpError(PumpError::Checkpoint(_)) | CliError::ResumeError(_) => {
                EXIT_CHECKPOINT
            }
            CliError::PumpError(PumpError::Artifact(_)) | CliError::OutputError(_) => {
                EXIT_ARTIFACT
            }
            CliError::ApiError(ApiError::Discovery(_)) => EXIT_DISCOVERY,
            CliError::ApiError(_) | CliError::ForwardError(_) => EXIT_FAILURE,
            CliError::LoopStopped(_) => EXIT_LOOP_STOPPED,
        }
    }
}
