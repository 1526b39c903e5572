//! Simulated HMI: answers every subsystem call.

use tokio::sync::mpsc;
use tracing::{debug, info};
use vl_command_engine::{HmiReply, HmiRequest, ResultCode};

/// Reply to each call with `SUCCESS` until either channel closes.
pub async fn run(mut calls: mpsc::UnboundedReceiver<HmiRequest>, replies: mpsc::Sender<HmiReply>) {
    while let Some(call) = calls.recv().await {
        let function = call.function();
        debug!(
            correlation_id = %call.correlation_id,
            function = %function,
            "HMI call received"
        );
        let reply = HmiReply::new(call.correlation_id, function, ResultCode::Success);
        if replies.send(reply).await.is_err() {
            break;
        }
    }
    info!("Simulated HMI stopped");
}
