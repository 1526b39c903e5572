//! Listener loops bridging transports to the engine.

use crate::ipc::requests::{HmiRequest, MobileRequest};
use crate::ipc::responses::{HmiReply, MobileResponse};
use crate::ports::inbound::CommandEngineApi;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Source of HMI replies
#[async_trait]
pub trait ReplyReceiver: Send + Sync {
    /// Receive next reply (blocks until available)
    async fn receive(&self) -> Result<HmiReply, IpcError>;
}

/// Source of application requests
#[async_trait]
pub trait RequestReceiver: Send + Sync {
    /// Receive next request (blocks until available)
    async fn receive(&self) -> Result<MobileRequest, IpcError>;
}

/// IPC error types
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    #[error("channel closed")]
    ChannelClosed,
    #[error("receive failed: {0}")]
    ReceiveFailed(String),
}

/// Feeds HMI replies into the engine
pub struct ReplyListener {
    engine: Arc<dyn CommandEngineApi>,
    receiver: Arc<dyn ReplyReceiver>,
}

impl ReplyListener {
    pub fn new(engine: Arc<dyn CommandEngineApi>, receiver: Arc<dyn ReplyReceiver>) -> Self {
        Self { engine, receiver }
    }

    /// Run the listener loop
    pub async fn run(self) {
        loop {
            match self.receiver.receive().await {
                Ok(reply) => {
                    debug!(
                        correlation_id = %reply.correlation_id,
                        function = %reply.function,
                        result_code = %reply.result_code,
                        "Received HMI reply"
                    );
                    self.engine.deliver_subsystem_reply(reply);
                }
                Err(IpcError::ChannelClosed) => {
                    warn!("HMI reply channel closed, stopping listener");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "Error receiving HMI reply");
                }
            }
        }
    }
}

/// Feeds application requests into the engine
pub struct RequestListener {
    engine: Arc<dyn CommandEngineApi>,
    receiver: Arc<dyn RequestReceiver>,
}

impl RequestListener {
    pub fn new(engine: Arc<dyn CommandEngineApi>, receiver: Arc<dyn RequestReceiver>) -> Self {
        Self { engine, receiver }
    }

    /// Run the listener loop
    pub async fn run(self) {
        loop {
            match self.receiver.receive().await {
                Ok(request) => self.engine.submit_application_request(request),
                Err(IpcError::ChannelClosed) => {
                    warn!("Application request channel closed, stopping listener");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "Error receiving application request");
                }
            }
        }
    }
}

/// In-memory channel transports
pub mod channel {
    use super::*;
    use crate::ports::outbound::{ApplicationSink, DispatchError, SubsystemDispatch};

    pub struct ChannelReceiver<T>(pub mpsc::Receiver<T>);

    #[async_trait]
    impl ReplyReceiver for tokio::sync::Mutex<ChannelReceiver<HmiReply>> {
        async fn receive(&self) -> Result<HmiReply, IpcError> {
            let mut guard = self.lock().await;
            guard.0.recv().await.ok_or(IpcError::ChannelClosed)
        }
    }

    #[async_trait]
    impl RequestReceiver for tokio::sync::Mutex<ChannelReceiver<MobileRequest>> {
        async fn receive(&self) -> Result<MobileRequest, IpcError> {
            let mut guard = self.lock().await;
            guard.0.recv().await.ok_or(IpcError::ChannelClosed)
        }
    }

    /// HMI calls pushed onto an unbounded channel; sending never blocks.
    pub struct ChannelDispatch(pub mpsc::UnboundedSender<HmiRequest>);

    impl SubsystemDispatch for ChannelDispatch {
        fn send(&self, request: HmiRequest) -> Result<(), DispatchError> {
            self.0.send(request).map_err(|_| DispatchError::ChannelClosed)
        }
    }

    /// Application responses pushed onto an unbounded channel
    pub struct ChannelSink(pub mpsc::UnboundedSender<MobileResponse>);

    impl ApplicationSink for ChannelSink {
        fn send_response(&self, response: MobileResponse) -> Result<(), DispatchError> {
            self.0.send(response).map_err(|_| DispatchError::ChannelClosed)
        }
    }

    /// Wrap a bounded receiver for use by a listener
    pub fn receiver<T>(rx: mpsc::Receiver<T>) -> Arc<tokio::sync::Mutex<ChannelReceiver<T>>> {
        Arc::new(tokio::sync::Mutex::new(ChannelReceiver(rx)))
    }
}
