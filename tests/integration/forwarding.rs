//! Syslog forwarding over a real UDP socket

use std::sync::Arc;
use std::time::Duration;

use siem_log_pump::forward::{Forwarder, LineSink, UdpSyslogSink};
use tempfile::TempDir;
use tokio::net::UdpSocket;

use crate::support::zip_archive;

async fn receive(socket: &UdpSocket, count: usize) -> Vec<String> {
    let mut buf = [0u8; 2048];
    let mut received = Vec::new();
    for _ in 0..count {
        let len = tokio::time::timeout(Duration::from_secs(2), socket.recv(&mut buf))
            .await
            .expect("timed out waiting for datagram")
            .unwrap();
        received.push(String::from_utf8_lossy(&buf[..len]).into_owned());
    }
    received
}

#[tokio::test]
async fn test_archive_lines_reach_collector_in_order() {
    let collector = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = collector.local_addr().unwrap().port();
    let sink = Arc::new(UdpSyslogSink::connect("127.0.0.1", port).await.unwrap());

    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("MTA_archive_20240115.zip");
    std::fs::write(
        &archive,
        zip_archive(&[("a.log", "alpha\nbeta\n"), ("b.log", "gamma\n")]),
    )
    .unwrap();

    let forwarder = Forwarder::new(sink.clone());
    let report = forwarder.forward(&archive, true).await.unwrap();

    assert_eq!(report.files, 2);
    assert_eq!(report.lines, 3);
    assert_eq!(
        receive(&collector, 3).await,
        vec!["<14>alpha", "<14>beta", "<14>gamma"]
    );
    sink.close().await.unwrap();
}

#[tokio::test]
async fn test_localhost_name_resolves() {
    let collector = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = collector.local_addr().unwrap().port();

    let sink = UdpSyslogSink::connect("localhost", port).await;

    assert!(sink.is_ok());
}

#[tokio::test]
async fn test_unresolvable_collector_is_an_error() {
    let result = UdpSyslogSink::connect("collector.invalid", 514).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_corrupt_archive_is_reported() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("MTA_archive_20240115.zip");
    std::fs::write(&archive, b"definitely not a zip").unwrap();

    let forwarder = Forwarder::new(Arc::new(crate::support::RecordingSink::default()));
    let result = forwarder.forward(&archive, true).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_collector_down_still_attempts_every_line() {
    let port = {
        let gone = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        gone.local_addr().unwrap().port()
    };
    let sink = Arc::new(UdpSyslogSink::connect("127.0.0.1", port).await.unwrap());

    let temp = TempDir::new().unwrap();
    let log = temp.path().join("MTA_x_20240115.log");
    std::fs::write(&log, "l1\nl2\nl3\nl4\nl5\n").unwrap();

    let report = Forwarder::new(sink).forward(&log, false).await.unwrap();

    assert_eq!(report.files, 1);
    assert_eq!(report.lines + report.failed, 5);
    assert_eq!(report.failed, 0);
}

#[tokio::test]
async fn test_bare_carriage_returns_split_records() {
    let collector = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = collector.local_addr().unwrap().port();
    let sink = Arc::new(UdpSyslogSink::connect("127.0.0.1", port).await.unwrap());

    let temp = TempDir::new().unwrap();
    let log = temp.path().join("MTA_x_20240115.log");
    std::fs::write(&log, "one\rtwo\r\nthree").unwrap();

    let report = Forwarder::new(sink).forward(&log, false).await.unwrap();

    assert_eq!(report.lines, 3);
    assert_eq!(
        receive(&collector, 3).await,
        vec!["<14>one", "<14>two", "<14>three"]
    );
}
