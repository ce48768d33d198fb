//! Ingestion pump: the pagination and retry state machine
//!
//! # Overview
//!
//! One run discovers the API base URL, then loops:
//!
//! 1. Read the checkpoint (absent = start of history)
//! 2. Request a batch carrying stream type, compression flag and token
//! 3. On HTTP 429 pause per [`rate_limit::RateLimitGovernor`], then classify anyway
//! 4. Branch on content type ([`classify::ResponseClass`]):
//!    - JSON: no more logs, pause [`config::IDLE_BACKOFF`] and poll again
//!    - octet-stream: write the artifact, advance the checkpoint, forward
//!    - anything else: log every header and stop the loop
//!
//! # Ordering
//!
//! The checkpoint is written only after the artifact is durably on disk, and
//! before it is forwarded. Forwarding failures are logged and the loop moves
//! on, so an artifact whose forwarding fails is not forwarded again. This
//! favors liveness over per-artifact delivery.
//!
//! # Error Handling
//!
//! - Fatal ([`PumpError`]): discovery, checkpoint I/O, artifact I/O
//! - Loop-stopping ([`StopReason`]): unexpected content type, transport failure
//! - Recoverable (logged, loop continues): 429, no logs, naming and forwarding failures

pub mod classify;
pub mod config;
pub mod context;
pub mod executor;
pub mod pacer;
pub mod rate_limit;

pub use context::StreamContext;
pub use executor::{IngestionPump, IterationOutcome, StopReason};
pub use pacer::{Pacer, ShutdownAwarePacer};
pub use rate_limit::RateLimitGovernor;

use crate::output::OutputError;
use crate::resume::ResumeError;

/// Fatal pump errors; each one ends the process
#[derive(Debug, thiserror::Error)]
pub enum PumpError {
    /// Base URL discovery failed
    #[error("error discovering base url for {account}: {reason}")]
    Discovery {
        /// Account that was looked up
        account: String,
        /// Underlying failure
        reason: String,
    },

    /// Checkpoint could not be read or written
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] ResumeError),

    /// Artifact could not be written
    #[error("artifact error: {0}")]
    Artifact(#[from] OutputError),
}
