//! # Vehicle Link Runtime
//!
//! Runs the command engine against channel transports.
//!
//! ```text
//!   stdin (NDJSON MobileRequest)
//!        │
//!        ▼
//!   RequestListener ──► CommandEngine ──► ChannelDispatch ──► simulated HMI
//!                            ▲                                     │
//!                            └──────── ReplyListener ◄─────────────┘
//!                            │
//!                            ▼
//!   ChannelSink ──► stdout (JSON MobileResponse)
//! ```
//!
//! ## Startup Sequence
//!
//! 1. Telemetry from `VL_*` environment variables
//! 2. Engine configuration from the environment
//! 3. Listeners, timeout sweeper and simulated HMI
//! 4. Read stdin until EOF or Ctrl+C, then drain pending fan-outs

mod hmi;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use vl_command_engine::adapters::FsFileStorage;
use vl_command_engine::ipc::handler::channel::{self, ChannelDispatch, ChannelSink};
use vl_command_engine::ipc::{ReplyListener, RequestListener};
use vl_command_engine::{
    timeout_sweeper, ApplicationInfo, CommandEngine, ConnectionKey, EngineConfig, MobileRequest,
    MobileResponse,
};
use vl_telemetry::TelemetryConfig;

/// Capacity of the bounded request and reply channels
const CHANNEL_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = TelemetryConfig::for_component("runtime");
    vl_telemetry::init_telemetry(&telemetry).context("failed to initialise telemetry")?;

    let config = EngineConfig::from_env().context("invalid engine configuration")?;
    info!(
        reply_timeout_ms = config.reply_timeout_ms,
        max_pending_fan_outs = config.max_pending_fan_outs,
        storage_root = %config.storage.root.display(),
        "Starting Vehicle Link runtime"
    );

    let (call_tx, call_rx) = mpsc::unbounded_channel();
    let (response_tx, response_rx) = mpsc::unbounded_channel();
    let (reply_tx, reply_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (request_tx, request_rx) = mpsc::channel(CHANNEL_CAPACITY);

    let engine = Arc::new(
        CommandEngine::new(
            config.clone(),
            Arc::new(ChannelDispatch(call_tx)),
            Arc::new(ChannelSink(response_tx)),
            Arc::new(FsFileStorage::from_config(&config.storage)),
        )
        .context("failed to create command engine")?,
    );

    let tasks = [
        tokio::spawn(hmi::run(call_rx, reply_tx)),
        tokio::spawn(ReplyListener::new(engine.clone(), channel::receiver(reply_rx)).run()),
    ];
    let request_listener = tokio::spawn(
        RequestListener::new(engine.clone(), channel::receiver(request_rx)).run(),
    );
    let sweeper = tokio::spawn(timeout_sweeper(engine.clone(), config.sweep_interval()));
    let writer = tokio::spawn(write_responses(response_rx));

    tokio::select! {
        result = read_requests(engine.clone(), request_tx) => {
            result.context("failed to read requests")?;
            info!("Input closed");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
        }
    }

    // The request channel is closed by now; let queued requests through
    if let Err(e) = request_listener.await {
        error!(error = %e, "Request listener failed");
    }
    drain(&engine, config.reply_timeout() + config.sweep_interval()).await;
    match vl_telemetry::encode_metrics() {
        Ok(metrics) => debug!(%metrics, "Final metrics"),
        Err(e) => warn!(error = %e, "Failed to encode metrics"),
    }
    sweeper.abort();
    for task in &tasks {
        task.abort();
    }
    // The writer stops once the last engine handle releases the response sink
    drop(engine);
    if let Err(e) = writer.await {
        error!(error = %e, "Response writer failed");
    }
    info!("Vehicle Link runtime stopped");
    Ok(())
}

/// Forward stdin lines to the engine, registering unknown connections on sight.
async fn read_requests(
    engine: Arc<CommandEngine>,
    requests: mpsc::Sender<MobileRequest>,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let request: MobileRequest = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Skipping malformed request line");
                continue;
            }
        };
        ensure_registered(&engine, request.connection_key);
        if requests.send(request).await.is_err() {
            break;
        }
    }
    Ok(())
}

fn ensure_registered(engine: &CommandEngine, connection_key: ConnectionKey) {
    if engine.application(connection_key).is_some() {
        return;
    }
    let mut info = ApplicationInfo::new(
        format!("app-{connection_key}"),
        format!("Application {connection_key}"),
    );
    info.allow_navigation = true;
    engine.register_application(connection_key, info);
}

/// One JSON line per response until every sender is gone.
async fn write_responses(mut responses: mpsc::UnboundedReceiver<MobileResponse>) {
    let mut stdout = tokio::io::stdout();
    while let Some(response) = responses.recv().await {
        let line = match serde_json::to_string(&response) {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "Failed to encode response");
                continue;
            }
        };
        let written = async {
            stdout.write_all(line.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await
        };
        if let Err(e) = written.await {
            error!(error = %e, "Failed to write response");
            break;
        }
    }
}

/// Wait for in-flight fan-outs to finish, bounded by `limit`.
async fn drain(engine: &CommandEngine, limit: Duration) {
    let step = Duration::from_millis(10);
    let mut waited = Duration::ZERO;
    while engine.pending_fan_outs() > 0 && waited < limit {
        tokio::time::sleep(step).await;
        waited += step;
    }
    if engine.pending_fan_outs() > 0 {
        warn!(
            pending = engine.pending_fan_outs(),
            "Stopping with fan-outs still pending"
        );
    }
}
