//! Diagnostics emitted through tracing

use std::io::Write;
use std::sync::{Arc, Mutex};

use siem_log_pump::fetcher::BatchResponse;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use crate::support::{headers, no_more_logs, Harness, BASE_URL};

/// Collects formatted log output in memory
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn capture(filter: &str) -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}

#[test]
fn test_default_filter_directive_is_valid() {
    assert!(EnvFilter::try_new("siem_log_pump=info").is_ok());
}

#[test]
fn test_json_format_renders_fields() {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new("info"))
        .with_writer(logs.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        tracing::info!(stream = "MTA", "Getting log data");
    });

    let line = logs.text();
    let parsed: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
    assert_eq!(parsed["fields"]["message"], "Getting log data");
    assert_eq!(parsed["fields"]["stream"], "MTA");
}

#[tokio::test]
async fn test_unexpected_response_logs_every_header() {
    let (logs, _guard) = capture("siem_log_pump=info");
    let response = BatchResponse::from_bytes(
        502,
        headers(&[("content-type", "text/html"), ("x-upstream", "gateway-7")]),
        "<html>bad gateway</html>",
    );
    let harness = Harness::new(vec![Ok(response)]);
    let pump = harness.pump(harness.context());

    pump.run_loop(BASE_URL).await.unwrap();

    let text = logs.text();
    assert!(text.contains("Unexpected response"));
    assert!(text.contains("content-type: text/html"));
    assert!(text.contains("x-upstream: gateway-7"));
}

#[tokio::test]
async fn test_idle_rest_is_logged() {
    let (logs, _guard) = capture("siem_log_pump=info");
    let harness = Harness::new(vec![Ok(no_more_logs())]);
    let pump = harness.pump(harness.context());

    pump.fetch_once(BASE_URL).await.unwrap();

    assert!(logs.text().contains("No more SIEM logs available"));
}

#[test]
fn test_env_filter_parsing() {
    assert!(EnvFilter::try_new("siem_log_pump::fetcher=debug,siem_log_pump=info").is_ok());
    assert!(EnvFilter::try_new("warn,siem_log_pump=trace").is_ok());
    assert!(EnvFilter::try_new("siem_log_pump=notalevel").is_err());
}
