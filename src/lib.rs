//! # SIEM Log Pump Library
//!
//! Pulls paginated SIEM audit logs from a log-export API, stores each batch as
//! a date-partitioned file, tracks progress with a durable continuation token
//! and optionally replays every log line to a syslog collector.
//!
//! ## Features
//!
//! - **Resumable**: the continuation token survives restarts and crashes
//! - **Rate-Limit Aware**: HTTP 429 responses pause the pump using the
//!   `X-RateLimit-Reset` header
//! - **Date Partitions**: artifacts land in `<root>/<YYYYMMDD>/<file name>`
//! - **Syslog Forwarding**: archives are extracted and replayed line by line
//!
//! ## Quick Start
//!
//! ```no_run
//! use siem_log_pump::fetcher::shared_resources::build_http_client;
//! use siem_log_pump::fetcher::{Credentials, MimecastHttpClient};
//! use siem_log_pump::pump::{IngestionPump, ShutdownAwarePacer, StreamContext};
//! use siem_log_pump::shutdown::ShutdownCoordinator;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = Credentials {
//!     access_key: "access".to_string(),
//!     secret_key: "c2VjcmV0".to_string(),
//!     app_id: "app".to_string(),
//!     app_key: "key".to_string(),
//! };
//! let client = build_http_client(Duration::from_secs(120))?;
//! let api = Arc::new(MimecastHttpClient::new(client, "https://api.mimecast.com", credentials));
//!
//! let context = StreamContext::new("siem@example.com", "/var/lib/siem", "/var/log/siem")
//!     .with_compression(true);
//! let shutdown = ShutdownCoordinator::shared();
//! let pacer = Arc::new(ShutdownAwarePacer::new(shutdown.clone()));
//!
//! let pump = IngestionPump::new(context, api, None, pacer, shutdown);
//! let reason = pump.run().await?;
//! println!("stopped: {reason}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`fetcher`] - Remote API seam and its signed HTTP implementation
//! - [`resume`] - Checkpoint store and single-instance lock
//! - [`output`] - Artifact naming and date-partitioned writer
//! - [`forward`] - Archive extraction and syslog forwarding
//! - [`pump`] - Pagination state machine and rate-limit governor
//! - [`settings`] - TOML settings
//! - [`cli`] - Command tree and exit codes

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Command line interface
pub mod cli;

/// Remote log-export API
pub mod fetcher;

/// Decompression and syslog forwarding
pub mod forward;

/// Prometheus metrics
pub mod metrics;

/// Artifact naming and writing
pub mod output;

/// Ingestion pump
pub mod pump;

/// Checkpoint persistence
pub mod resume;

/// Settings file
pub mod settings;

/// Graceful shutdown
pub mod shutdown;
