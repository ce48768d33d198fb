//! End-to-end behavior of the ingestion pump against a scripted API

use std::sync::Arc;
use std::time::Duration;

use siem_log_pump::fetcher::ApiError;
use siem_log_pump::pump::{IterationOutcome, PumpError, StopReason};
use siem_log_pump::resume::CheckpointStore;

use crate::support::{
    headers, no_more_logs, payload, transport_error, FailingSink, Harness, RecordingSink,
    ScriptedApi,
};

const IDLE: Duration = Duration::from_secs(60);

#[tokio::test]
async fn test_first_request_carries_no_token() {
    let harness = Harness::new(vec![Ok(no_more_logs())]);
    let pump = harness.pump(harness.context());

    let outcome = pump.fetch_once(crate::support::BASE_URL).await.unwrap();

    assert_eq!(outcome, IterationOutcome::Continue);
    let requests = harness.api.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].stream_type, "MTA");
    assert!(!requests[0].compress);
    assert_eq!(requests[0].token, None);
}

#[tokio::test]
async fn test_stored_token_is_sent_and_replaced() {
    let harness = Harness::new(vec![Ok(payload(
        "MTA_receipt_20240115.log",
        Some("tok-2"),
        "line one\nline two\n",
    ))]);
    let store = CheckpointStore::new(harness.checkpoint_dir());
    store.write("MTA", "tok-1").unwrap();

    let pump = harness.pump(harness.context());
    let outcome = pump.fetch_once(crate::support::BASE_URL).await.unwrap();

    assert_eq!(outcome, IterationOutcome::Continue);
    assert_eq!(harness.api.tokens_sent(), vec![Some("tok-1".to_string())]);
    assert_eq!(store.read("MTA").unwrap(), Some("tok-2".to_string()));
    assert!(harness.pacer.pauses().is_empty());
}

#[tokio::test]
async fn test_each_request_resumes_from_previous_payload() {
    let harness = Harness::new(vec![
        Ok(payload("MTA_a_20240115.log", Some("tok-1"), "a\n")),
        Ok(payload("MTA_b_20240116.log", Some("tok-2"), "b\n")),
    ]);
    let pump = harness.pump(harness.context());

    let reason = pump.run_loop(crate::support::BASE_URL).await.unwrap();

    assert_eq!(reason, StopReason::Shutdown);
    assert_eq!(
        harness.api.tokens_sent(),
        vec![None, Some("tok-1".to_string()), Some("tok-2".to_string())]
    );
    let store = CheckpointStore::new(harness.checkpoint_dir());
    assert_eq!(store.read("MTA").unwrap(), Some("tok-2".to_string()));
    assert!(harness.log_root().join("20240115/MTA_a_20240115.log").exists());
    assert!(harness.log_root().join("20240116/MTA_b_20240116.log").exists());
}

#[tokio::test]
async fn test_no_more_logs_rests_then_continues() {
    let harness = Harness::new(vec![Ok(no_more_logs())]);
    let pump = harness.pump(harness.context());

    let outcome = pump.fetch_once(crate::support::BASE_URL).await.unwrap();

    assert_eq!(outcome, IterationOutcome::Continue);
    assert_eq!(harness.pacer.pauses(), vec![IDLE]);
    assert!(!harness.log_root().exists());
    let store = CheckpointStore::new(harness.checkpoint_dir());
    assert_eq!(store.read("MTA").unwrap(), None);
}

#[tokio::test]
async fn test_idle_backoff_is_configurable() {
    let harness = Harness::new(vec![Ok(no_more_logs())]);
    let pump = harness.pump(harness.context().with_idle_backoff(Duration::from_secs(5)));

    pump.fetch_once(crate::support::BASE_URL).await.unwrap();

    assert_eq!(harness.pacer.pauses(), vec![Duration::from_secs(5)]);
}

#[tokio::test]
async fn test_unexpected_content_type_stops_loop() {
    let response = siem_log_pump::fetcher::BatchResponse::from_bytes(
        500,
        headers(&[("content-type", "text/plain"), ("x-request-id", "abc")]),
        "internal error",
    );
    let harness = Harness::new(vec![Ok(response)]);
    let store = CheckpointStore::new(harness.checkpoint_dir());
    store.write("MTA", "tok-1").unwrap();
    let pump = harness.pump(harness.context());

    let reason = pump.run_loop(crate::support::BASE_URL).await.unwrap();

    assert_eq!(
        reason,
        StopReason::UnexpectedResponse {
            status: 500,
            content_type: Some("text/plain".to_string()),
        }
    );
    assert_eq!(store.read("MTA").unwrap(), Some("tok-1".to_string()));
    assert_eq!(harness.api.requests().len(), 1);
}

#[tokio::test]
async fn test_transport_failure_stops_loop() {
    let harness = Harness::new(vec![transport_error("connection reset")]);
    let pump = harness.pump(harness.context());

    let reason = pump.run_loop(crate::support::BASE_URL).await.unwrap();

    assert!(matches!(reason, StopReason::Transport(ref r) if r.contains("connection reset")));
}

#[tokio::test]
async fn test_rejected_credentials_stop_loop() {
    let harness = Harness::new(vec![Err(ApiError::Unauthorized { status: 401 })]);
    let pump = harness.pump(harness.context());

    let reason = pump.run_loop(crate::support::BASE_URL).await.unwrap();

    assert!(matches!(reason, StopReason::Transport(_)));
}

#[tokio::test]
async fn test_missing_content_disposition_skips_batch() {
    let response = siem_log_pump::fetcher::BatchResponse::from_bytes(
        200,
        headers(&[
            ("content-type", "application/octet-stream"),
            ("mc-siem-token", "tok-9"),
        ]),
        "orphan\n",
    );
    let harness = Harness::new(vec![Ok(response)]);
    let pump = harness.pump(harness.context());

    let outcome = pump.fetch_once(crate::support::BASE_URL).await.unwrap();

    assert_eq!(outcome, IterationOutcome::Continue);
    assert_eq!(harness.pacer.pauses(), vec![IDLE]);
    let store = CheckpointStore::new(harness.checkpoint_dir());
    assert_eq!(store.read("MTA").unwrap(), None);
}

#[tokio::test]
async fn test_undated_filename_skips_batch() {
    let harness = Harness::new(vec![Ok(payload("MTA_receipt.log", Some("tok-1"), "x\n"))]);
    let pump = harness.pump(harness.context());

    let outcome = pump.fetch_once(crate::support::BASE_URL).await.unwrap();

    assert_eq!(outcome, IterationOutcome::Continue);
    let store = CheckpointStore::new(harness.checkpoint_dir());
    assert_eq!(store.read("MTA").unwrap(), None);
}

#[tokio::test]
async fn test_missing_token_keeps_previous_checkpoint() {
    let harness = Harness::new(vec![Ok(payload("MTA_x_20240115.log", None, "data\n"))]);
    let store = CheckpointStore::new(harness.checkpoint_dir());
    store.write("MTA", "tok-1").unwrap();
    let pump = harness.pump(harness.context());

    let outcome = pump.fetch_once(crate::support::BASE_URL).await.unwrap();

    assert_eq!(outcome, IterationOutcome::Continue);
    assert!(harness.log_root().join("20240115/MTA_x_20240115.log").exists());
    assert_eq!(store.read("MTA").unwrap(), Some("tok-1".to_string()));
    assert_eq!(harness.pacer.pauses(), vec![IDLE]);
}

#[tokio::test]
async fn test_forward_failure_does_not_stop_or_rewind() {
    let harness = Harness::new(vec![Ok(payload(
        "MTA_x_20240115.log",
        Some("tok-2"),
        "data\n",
    ))]);
    let pump = harness.pump_forwarding(harness.context().with_syslog(true), Arc::new(FailingSink));

    let outcome = pump.fetch_once(crate::support::BASE_URL).await.unwrap();

    assert_eq!(outcome, IterationOutcome::Continue);
    let store = CheckpointStore::new(harness.checkpoint_dir());
    assert_eq!(store.read("MTA").unwrap(), Some("tok-2".to_string()));
}

#[tokio::test]
async fn test_malformed_archive_does_not_stop_or_rewind() {
    let harness = Harness::new(vec![Ok(payload(
        "MTA_archive_20240115.zip",
        Some("tok-2"),
        "definitely not a zip",
    ))]);
    let sink = Arc::new(RecordingSink::default());
    let context = harness.context().with_compression(true).with_syslog(true);
    let pump = harness.pump_forwarding(context, sink.clone());

    let outcome = pump.fetch_once(crate::support::BASE_URL).await.unwrap();

    assert_eq!(outcome, IterationOutcome::Continue);
    let store = CheckpointStore::new(harness.checkpoint_dir());
    assert_eq!(store.read("MTA").unwrap(), Some("tok-2".to_string()));
    assert!(harness
        .log_root()
        .join("20240115/MTA_archive_20240115.zip")
        .exists());
    assert!(sink.lines().is_empty());
}

#[tokio::test]
async fn test_plain_payload_is_forwarded_line_by_line() {
    let harness = Harness::new(vec![Ok(payload(
        "MTA_x_20240115.log",
        Some("tok-2"),
        "first\n\nthird\n",
    ))]);
    let sink = Arc::new(RecordingSink::default());
    let pump = harness.pump_forwarding(harness.context().with_syslog(true), sink.clone());

    pump.fetch_once(crate::support::BASE_URL).await.unwrap();

    assert_eq!(sink.lines(), vec!["first", "", "third"]);
}

#[tokio::test]
async fn test_compressed_payload_is_extracted_and_forwarded() {
    let archive = crate::support::zip_archive(&[
        ("receipt_1.log", "r1\nr2\n"),
        ("receipt_2.log", "r3\n"),
    ]);
    let harness = Harness::new(vec![Ok(payload(
        "MTA_archive_20240115.zip",
        Some("tok-2"),
        archive,
    ))]);
    let sink = Arc::new(RecordingSink::default());
    let context = harness.context().with_compression(true).with_syslog(true);
    let pump = harness.pump_forwarding(context, sink.clone());

    let outcome = pump.fetch_once(crate::support::BASE_URL).await.unwrap();

    assert_eq!(outcome, IterationOutcome::Continue);
    assert!(harness.api.requests()[0].compress);
    assert_eq!(sink.lines(), vec!["r1", "r2", "r3"]);
    let partition = harness.log_root().join("20240115");
    assert!(partition.join("MTA_archive_20240115.zip").exists());
    assert!(partition.join("receipt_1.log").exists());
}

#[tokio::test]
async fn test_shutdown_before_iteration_sends_nothing() {
    let harness = Harness::new(vec![Ok(no_more_logs())]);
    harness.shutdown.request_shutdown();
    let pump = harness.pump(harness.context());

    let outcome = pump.fetch_once(crate::support::BASE_URL).await.unwrap();

    assert_eq!(outcome, IterationOutcome::Stop(StopReason::Shutdown));
    assert!(harness.api.requests().is_empty());
}

#[tokio::test]
async fn test_discovery_failure_is_fatal() {
    let shutdown = siem_log_pump::shutdown::ShutdownCoordinator::shared();
    let api = ScriptedApi::new(shutdown.clone(), vec![])
        .with_discovery(Err(ApiError::Discovery("no region".to_string())));
    let harness = Harness::with_api(shutdown, api);
    let pump = harness.pump(harness.context());

    let result = pump.run().await;

    assert!(matches!(result, Err(PumpError::Discovery { ref account, .. }) if account == crate::support::ACCOUNT));
    assert!(harness.api.requests().is_empty());
}

#[tokio::test]
async fn test_stop_without_restart_is_returned() {
    let harness = Harness::new(vec![transport_error("refused")]);
    let pump = harness.pump(harness.context());

    let reason = pump.run().await.unwrap();

    assert!(matches!(reason, StopReason::Transport(_)));
    assert_eq!(harness.api.discovery_calls(), 1);
}

#[tokio::test]
async fn test_supervisor_restarts_from_discovery() {
    let harness = Harness::new(vec![transport_error("refused"), Ok(no_more_logs())]);
    let context = harness
        .context()
        .with_restart(true, Duration::from_secs(5));
    let pump = harness.pump(context);

    let reason = pump.run().await.unwrap();

    assert_eq!(reason, StopReason::Shutdown);
    assert_eq!(harness.api.discovery_calls(), 2);
    let pauses = harness.pacer.pauses();
    assert_eq!(pauses[0], Duration::from_secs(5));
    assert_eq!(pauses[1], IDLE);
}

#[tokio::test]
async fn test_unreadable_checkpoint_is_fatal() {
    let harness = Harness::new(vec![Ok(no_more_logs())]);
    // A regular file where the checkpoint directory should be
    std::fs::write(harness.checkpoint_dir(), b"not a directory").unwrap();
    let pump = harness.pump(harness.context());

    let result = pump.fetch_once(crate::support::BASE_URL).await;

    assert!(matches!(result, Err(PumpError::Checkpoint(_))));
    assert!(harness.api.requests().is_empty());
}

#[tokio::test]
async fn test_artifact_write_failure_is_fatal_and_keeps_checkpoint() {
    let harness = Harness::new(vec![Ok(payload(
        "MTA_x_20240115.log",
        Some("tok-2"),
        "data\n",
    ))]);
    std::fs::write(harness.log_root(), b"not a directory").unwrap();
    let store = CheckpointStore::new(harness.checkpoint_dir());
    store.write("MTA", "tok-1").unwrap();
    let pump = harness.pump(harness.context());

    let result = pump.fetch_once(crate::support::BASE_URL).await;

    assert!(matches!(result, Err(PumpError::Artifact(_))));
    assert_eq!(store.read("MTA").unwrap(), Some("tok-1".to_string()));
}
