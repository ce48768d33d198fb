//! `run` and `discover` commands

use std::sync::Arc;
use tracing::{info, warn};

use super::CliError;
use crate::fetcher::shared_resources::build_http_client;
use crate::fetcher::{LogExportApi, MimecastHttpClient};
use crate::forward::{Forwarder, LineSink, UdpSyslogSink};
use crate::output::ArtifactWriter;
use crate::pump::{IngestionPump, PumpError, ShutdownAwarePacer, StopReason, StreamContext};
use crate::resume::{CheckpointStore, PumpLock, ResumeError};
use crate::settings::Settings;
use crate::shutdown::SharedShutdown;

/// Build the HTTP API client from settings
pub fn build_api(settings: &Settings) -> Result<MimecastHttpClient, CliError> {
    let client = build_http_client(settings.request_timeout())?;
    Ok(MimecastHttpClient::new(
        client,
        settings.authentication.discovery_url.clone(),
        settings.credentials(),
    ))
}

/// Create the log root and checkpoint directory if missing
pub fn init_directories(context: &StreamContext) -> Result<(), CliError> {
    ArtifactWriter::new(&context.log_root, context.utc_offset).ensure_root()?;
    std::fs::create_dir_all(&context.checkpoint_dir).map_err(|e| {
        ResumeError::IoError(format!(
            "failed to create checkpoint directory {}: {e}",
            context.checkpoint_dir.display()
        ))
    })?;
    Ok(())
}

/// Pull logs until shutdown, or until the loop stops with restarts disabled
pub async fn execute_run(settings: &Settings, shutdown: SharedShutdown) -> Result<(), CliError> {
    let context = settings.stream_context()?;
    init_directories(&context)?;

    let store = CheckpointStore::new(&context.checkpoint_dir);
    let _lock = PumpLock::try_acquire(&store.path_for(&context.stream_type))?;

    let api = Arc::new(build_api(settings)?);

    let sink = if context.syslog_enabled {
        let sink =
            UdpSyslogSink::connect(&settings.syslog.syslog_server, settings.syslog.syslog_port)
                .await?;
        info!(target_addr = %sink.target(), "Forwarding to syslog");
        Some(Arc::new(sink))
    } else {
        None
    };
    let forwarder = sink.as_ref().map(|sink| Forwarder::new(sink.clone()));

    info!(
        stream = %context.stream_type,
        log_root = %context.log_root.display(),
        compression = context.compression,
        "Starting SIEM log pump"
    );

    let pacer = Arc::new(ShutdownAwarePacer::new(shutdown.clone()));
    let pump = IngestionPump::new(context, api, forwarder, pacer, shutdown);
    let result = pump.run().await;

    if let Some(sink) = sink {
        if let Err(e) = sink.close().await {
            warn!(error = %e, "Failed to close syslog sink");
        }
    }

    match result? {
        StopReason::Shutdown => {
            info!("Shutdown complete");
            Ok(())
        }
        reason => Err(CliError::LoopStopped(reason)),
    }
}

/// Print the API base URL for the configured account
pub async fn execute_discover(settings: &Settings) -> Result<(), CliError> {
    let api = build_api(settings)?;
    let account = &settings.authentication.email_address;
    let base_url = api
        .discover_base_url(account)
        .await
        .map_err(|e| PumpError::Discovery {
            account: account.clone(),
            reason: e.to_string(),
        })?;
    println!("{base_url}");
    Ok(())
}
