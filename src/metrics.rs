//! Pump observability metrics
//!
//! Counters and histograms go through the `metrics` facade, so recording is a
//! no-op until [`init_metrics`] installs the Prometheus exporter.
//!
//! ## Metrics
//!
//! - `siem_batches_total{outcome}` - classified batch responses
//! - `siem_request_duration_seconds` - batch request latency
//! - `siem_rate_limited_total` / `siem_rate_limit_backoff_seconds`
//! - `siem_artifact_bytes_total` - bytes persisted to the log root
//! - `siem_lines_forwarded_total` / `siem_forward_failures_total`
//! - `siem_syslog_send_failures_total` - records the collector socket refused

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{debug, info};

static METRICS_INITIALIZED: OnceCell<SocketAddr> = OnceCell::new();

/// Install the Prometheus exporter on `addr`
///
/// Must be called from within a Tokio runtime. Idempotent: later calls are
/// ignored once an exporter is running.
pub fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(existing) = METRICS_INITIALIZED.get() {
        debug!(%existing, "Metrics already initialized, skipping");
        return Ok(());
    }

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        "siem_batches_total",
        Unit::Count,
        "Batch responses by classified outcome"
    );
    describe_histogram!(
        "siem_request_duration_seconds",
        Unit::Seconds,
        "Batch request duration in seconds"
    );
    describe_counter!(
        "siem_rate_limited_total",
        Unit::Count,
        "HTTP 429 responses received"
    );
    describe_histogram!(
        "siem_rate_limit_backoff_seconds",
        Unit::Seconds,
        "Backoff applied after a 429 response"
    );
    describe_counter!(
        "siem_artifact_bytes_total",
        Unit::Bytes,
        "Bytes written to the log root"
    );
    describe_counter!(
        "siem_lines_forwarded_total",
        Unit::Count,
        "Log lines sent to the syslog collector"
    );
    describe_counter!(
        "siem_forward_failures_total",
        Unit::Count,
        "Artifacts whose forwarding failed"
    );
    describe_counter!(
        "siem_syslog_send_failures_total",
        Unit::Count,
        "Syslog records that could not be sent"
    );

    let _ = METRICS_INITIALIZED.set(addr);
    info!("Metrics system initialized on {}", addr);
    Ok(())
}

/// Record a batch request; `status` is `None` when no response arrived
pub fn record_request(duration: Duration, status: Option<u16>) {
    let status = status.map_or_else(|| "transport_error".to_string(), |s| s.to_string());
    histogram!("siem_request_duration_seconds", "status" => status).record(duration.as_secs_f64());
}

/// Record the classified outcome of one pump iteration
pub fn record_batch(outcome: &'static str) {
    counter!("siem_batches_total", "outcome" => outcome).increment(1);
}

/// Record a 429 and the backoff applied
pub fn record_rate_limited(backoff: Duration) {
    counter!("siem_rate_limited_total").increment(1);
    histogram!("siem_rate_limit_backoff_seconds").record(backoff.as_secs_f64());
}

/// Record bytes persisted for one artifact
pub fn record_artifact_bytes(bytes: u64) {
    counter!("siem_artifact_bytes_total").increment(bytes);
}

/// Record lines forwarded to syslog
pub fn record_lines_forwarded(lines: u64) {
    counter!("siem_lines_forwarded_total").increment(lines);
}

/// Record an artifact that could not be forwarded
pub fn record_forward_failure() {
    counter!("siem_forward_failures_total").increment(1);
}

/// Record one syslog record the sink refused
pub fn record_line_send_failure() {
    counter!("siem_syslog_send_failures_total").increment(1);
}
