//! UDP syslog sink
//!
//! Each line goes out as a single datagram `<14>{line}` (facility user,
//! severity informational). No other framing is added; in particular there is
//! no trailing NUL after the message.
//!
//! The socket is left unconnected and every record is sent with `send_to`, so
//! an ICMP port-unreachable from a collector that is down does not surface as
//! `ECONNREFUSED` on later sends.

use super::{ForwardError, ForwardResult, LineSink};
use async_trait::async_trait;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::{debug, info};

/// PRI for facility `user` (1) and severity `info` (6)
pub const SYSLOG_PRIORITY: u8 = 14;

/// Format one syslog record
pub fn format_record(line: &str) -> String {
    format!("<{SYSLOG_PRIORITY}>{line}")
}

/// Fire-and-forget syslog over UDP
pub struct UdpSyslogSink {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpSyslogSink {
    /// Resolve `server:port` and bind a local socket for it
    ///
    /// Nothing is sent here; an absent collector only shows up as lost datagrams.
    pub async fn connect(server: &str, port: u16) -> ForwardResult<Self> {
        let target = tokio::net::lookup_host((server, port))
            .await
            .map_err(|e| ForwardError::SinkError(format!("cannot resolve {server}:{port}: {e}")))?
            .next()
            .ok_or_else(|| ForwardError::SinkError(format!("no address for {server}:{port}")))?;

        let local: SocketAddr = if target.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|e| ForwardError::SinkError(format!("cannot bind UDP socket: {e}")))?;

        info!(%target, "Syslog sink ready");
        Ok(Self { socket, target })
    }

    /// Collector address
    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

#[async_trait]
impl LineSink for UdpSyslogSink {
    async fn send_line(&self, line: &str) -> ForwardResult<()> {
        self.socket
            .send_to(format_record(line).as_bytes(), self.target)
            .await
            .map_err(|e| ForwardError::SinkError(format!("send to {} failed: {e}", self.target)))?;
        Ok(())
    }

    async fn close(&self) -> ForwardResult<()> {
        debug!(target = %self.target, "Syslog sink closed");
        Ok(())
    }
}
