//! Ingestion pump executor

use reqwest::header::CONTENT_DISPOSITION;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::classify::{classify, describe_headers, is_rate_limited, ResponseClass};
use super::{Pacer, PumpError, RateLimitGovernor, StreamContext};
use crate::fetcher::{BatchRequest, BatchResponse, LogExportApi, TOKEN_HEADER};
use crate::forward::Forwarder;
use crate::metrics;
use crate::output::{ArtifactName, ArtifactWriter, OutputError};
use crate::resume::CheckpointStore;
use crate::shutdown::SharedShutdown;

/// Why the fetch loop ended without a fatal error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Shutdown was requested
    Shutdown,
    /// The API answered with a content type the pump does not understand
    UnexpectedResponse {
        /// HTTP status
        status: u16,
        /// Content type, if any
        content_type: Option<String>,
    },
    /// No usable response was received
    Transport(String),
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Shutdown => write!(f, "shutdown requested"),
            StopReason::UnexpectedResponse {
                status,
                content_type,
            } => write!(
                f,
                "unexpected response (HTTP {status}, content type {})",
                content_type.as_deref().unwrap_or("<none>")
            ),
            StopReason::Transport(reason) => write!(f, "request failed: {reason}"),
        }
    }
}

/// Outcome of one fetch iteration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterationOutcome {
    /// Request the next batch
    Continue,
    /// Leave the fetch loop
    Stop(StopReason),
}

/// Drives one stream end to end: request, classify, persist, forward
pub struct IngestionPump {
    context: StreamContext,
    api: Arc<dyn LogExportApi>,
    checkpoints: CheckpointStore,
    writer: ArtifactWriter,
    forwarder: Option<Forwarder>,
    governor: RateLimitGovernor,
    pacer: Arc<dyn Pacer>,
    shutdown: SharedShutdown,
}

impl IngestionPump {
    /// Create a pump for `context`
    ///
    /// `forwarder` is `None` when syslog output is disabled.
    pub fn new(
        context: StreamContext,
        api: Arc<dyn LogExportApi>,
        forwarder: Option<Forwarder>,
        pacer: Arc<dyn Pacer>,
        shutdown: SharedShutdown,
    ) -> Self {
        let checkpoints = CheckpointStore::new(&context.checkpoint_dir);
        let writer = ArtifactWriter::new(&context.log_root, context.utc_offset);
        let governor = RateLimitGovernor::new(context.idle_backoff);
        Self {
            context,
            api,
            checkpoints,
            writer,
            forwarder,
            governor,
            pacer,
            shutdown,
        }
    }

    /// Stream configuration
    pub fn context(&self) -> &StreamContext {
        &self.context
    }

    /// Checkpoint store used by this pump
    pub fn checkpoints(&self) -> &CheckpointStore {
        &self.checkpoints
    }

    /// Resolve the API base URL; failure is fatal
    pub async fn discover(&self) -> Result<String, PumpError> {
        let base_url = self
            .api
            .discover_base_url(&self.context.account)
            .await
            .map_err(|e| {
                error!(
                    account = %self.context.account,
                    error = %e,
                    "Error discovering base url, check the authentication settings"
                );
                PumpError::Discovery {
                    account: self.context.account.clone(),
                    reason: e.to_string(),
                }
            })?;
        info!(base_url = %base_url, "Discovered API base URL");
        Ok(base_url)
    }

    /// Run discovery and the fetch loop, restarting after a stop if configured
    pub async fn run(&self) -> Result<StopReason, PumpError> {
        loop {
            if self.shutdown.is_shutdown_requested() {
                return Ok(StopReason::Shutdown);
            }

            let base_url = self.discover().await?;
            let reason = self.run_loop(&base_url).await?;

            if reason == StopReason::Shutdown || !self.context.restart_on_stop {
                return Ok(reason);
            }

            warn!(
                reason = %reason,
                delay_secs = self.context.restart_delay.as_secs(),
                "Fetch loop stopped, restarting from discovery"
            );
            if !self.pacer.pause(self.context.restart_delay).await {
                return Ok(StopReason::Shutdown);
            }
        }
    }

    /// Fetch batches from `base_url` until an iteration says stop
    pub async fn run_loop(&self, base_url: &str) -> Result<StopReason, PumpError> {
        info!(stream = %self.context.stream_type, "Getting log data");
        loop {
            match self.fetch_once(base_url).await? {
                IterationOutcome::Continue => debug!("Getting additional SIEM logs"),
                IterationOutcome::Stop(reason) => {
                    info!(reason = %reason, "Fetch loop stopped");
                    return Ok(reason);
                }
            }
        }
    }

    /// One request/classify/act cycle
    pub async fn fetch_once(&self, base_url: &str) -> Result<IterationOutcome, PumpError> {
        if self.shutdown.is_shutdown_requested() {
            return Ok(IterationOutcome::Stop(StopReason::Shutdown));
        }

        let stream = &self.context.stream_type;
        let request = BatchRequest {
            stream_type: stream.clone(),
            compress: self.context.compression,
            token: self.checkpoints.read(stream)?,
        };

        let response = match self.api.post_batch(base_url, &request).await {
            Ok(response) => response,
            Err(e) => {
                error!(stream = %stream, error = %e, "Log batch request failed");
                metrics::record_batch("transport_error");
                return Ok(IterationOutcome::Stop(StopReason::Transport(e.to_string())));
            }
        };

        if is_rate_limited(response.status) {
            let backoff = self.governor.compute_backoff(&response.headers);
            warn!(backoff_secs = backoff.as_secs_f64(), "Rate limit hit, sleeping");
            metrics::record_rate_limited(backoff);
            if !self.pacer.pause(backoff).await {
                return Ok(IterationOutcome::Stop(StopReason::Shutdown));
            }
        }

        let class = classify(&response);
        metrics::record_batch(class.label());

        match class {
            ResponseClass::NoMoreLogs => {
                info!(
                    rest_secs = self.context.idle_backoff.as_secs(),
                    "No more SIEM logs available, resting"
                );
                Ok(self.rest().await)
            }
            ResponseClass::Payload => self.process_payload(response).await,
            ResponseClass::Unexpected { content_type } => {
                error!(
                    status = response.status,
                    content_type = ?content_type,
                    "Unexpected response"
                );
                for header in describe_headers(&response.headers) {
                    error!("{header}");
                }
                Ok(IterationOutcome::Stop(StopReason::UnexpectedResponse {
                    status: response.status,
                    content_type,
                }))
            }
        }
    }

    /// Persist, checkpoint, then forward one payload
    async fn process_payload(&self, response: BatchResponse) -> Result<IterationOutcome, PumpError> {
        let named = response
            .header(CONTENT_DISPOSITION.as_str())
            .ok_or_else(|| OutputError::InvalidFileName("missing Content-Disposition".to_string()))
            .and_then(ArtifactName::from_content_disposition);
        let name = match named {
            Ok(name) => name,
            Err(e) => {
                error!(error = %e, "Cannot name downloaded log file, skipping batch");
                return Ok(self.rest().await);
            }
        };
        let token = response.header(TOKEN_HEADER).map(str::to_string);

        let written = if self.context.compression {
            // Archive bytes must land exactly as sent for extraction
            self.writer.write_stream(&name, response.body).await?
        } else {
            let raw = response
                .into_bytes()
                .await
                .map_err(|e| OutputError::BodyError(format!("{}: {e}", name.file_name())))?;
            self.writer
                .write_text(&name, &String::from_utf8_lossy(&raw))
                .await?
        };
        metrics::record_artifact_bytes(written.bytes);

        let Some(token) = token.filter(|t| !t.is_empty()) else {
            error!(
                artifact = %written.path.display(),
                header = TOKEN_HEADER,
                "Response carried no resumption token, checkpoint not advanced"
            );
            return Ok(self.rest().await);
        };
        self.checkpoints.write(&self.context.stream_type, &token)?;

        if let Some(forwarder) = &self.forwarder {
            info!(artifact = %written.path.display(), "Loading file for syslog output");
            if let Err(e) = forwarder
                .forward(&written.path, self.context.compression)
                .await
            {
                metrics::record_forward_failure();
                error!(
                    artifact = %name,
                    error = %e,
                    "Unexpected error writing to syslog"
                );
            }
        }

        Ok(IterationOutcome::Continue)
    }

    async fn rest(&self) -> IterationOutcome {
        if self.pacer.pause(self.context.idle_backoff).await {
            IterationOutcome::Continue
        } else {
            IterationOutcome::Stop(StopReason::Shutdown)
        }
    }
}
