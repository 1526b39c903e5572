//! # Channel Transport
//!
//! The engine behind its listeners, fed by channels the way the runtime
//! wires it: requests and replies arrive on bounded channels, calls and
//! responses leave on unbounded ones.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::mpsc;
    use tokio::time::timeout;

    use vl_command_engine::adapters::InMemoryFileStorage;
    use vl_command_engine::ipc::handler::channel::{self, ChannelDispatch, ChannelSink};
    use vl_command_engine::ipc::{ReplyListener, RequestListener};
    use vl_command_engine::{
        timeout_sweeper, ApplicationInfo, CommandEngine, EngineConfig, HmiReply, HmiRequest,
        MobileRequest, MobileResponse, ResultCode,
    };

    use crate::integration::fixture::{add_command, delete_command, APP};

    const WAIT: Duration = Duration::from_secs(5);

    struct Wiring {
        engine: Arc<CommandEngine>,
        requests: mpsc::Sender<MobileRequest>,
        calls: mpsc::UnboundedReceiver<HmiRequest>,
        replies: mpsc::Sender<HmiReply>,
        responses: mpsc::UnboundedReceiver<MobileResponse>,
    }

    fn wire(config: EngineConfig) -> Wiring {
        let (call_tx, calls) = mpsc::unbounded_channel();
        let (response_tx, responses) = mpsc::unbounded_channel();
        let (replies, reply_rx) = mpsc::channel(16);
        let (requests, request_rx) = mpsc::channel(16);

        let engine = Arc::new(
            CommandEngine::new(
                config,
                Arc::new(ChannelDispatch(call_tx)),
                Arc::new(ChannelSink(response_tx)),
                Arc::new(InMemoryFileStorage::new()),
            )
            .unwrap(),
        );
        engine.register_application(APP, ApplicationInfo::new("app", "App"));

        tokio::spawn(ReplyListener::new(engine.clone(), channel::receiver(reply_rx)).run());
        tokio::spawn(RequestListener::new(engine.clone(), channel::receiver(request_rx)).run());

        Wiring {
            engine,
            requests,
            calls,
            replies,
            responses,
        }
    }

    async fn next_call(calls: &mut mpsc::UnboundedReceiver<HmiRequest>) -> HmiRequest {
        timeout(WAIT, calls.recv()).await.unwrap().unwrap()
    }

    async fn next_response(responses: &mut mpsc::UnboundedReceiver<MobileResponse>) -> MobileResponse {
        timeout(WAIT, responses.recv()).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_add_then_delete_over_channels() {
        let mut w = wire(EngineConfig::default());

        w.requests
            .send(MobileRequest::new(APP, 1, add_command(3, true, true)))
            .await
            .unwrap();
        let first = next_call(&mut w.calls).await;
        let second = next_call(&mut w.calls).await;
        // Answer in reverse order of dispatch
        for call in [&second, &first] {
            w.replies
                .send(HmiReply::new(call.correlation_id, call.function(), ResultCode::Success))
                .await
                .unwrap();
        }
        let response = next_response(&mut w.responses).await;
        assert_eq!(response.correlation_id, 1);
        assert!(response.success);

        w.requests
            .send(MobileRequest::new(APP, 2, delete_command(3)))
            .await
            .unwrap();
        for _ in 0..2 {
            let call = next_call(&mut w.calls).await;
            w.replies
                .send(HmiReply::new(call.correlation_id, call.function(), ResultCode::Success))
                .await
                .unwrap();
        }
        let response = next_response(&mut w.responses).await;
        assert_eq!(response.correlation_id, 2);
        assert!(response.success);
        assert!(w.engine.application(APP).unwrap().lock().command(3).is_none());
        assert_eq!(w.engine.pending_fan_outs(), 0);
    }

    #[tokio::test]
    async fn test_silent_hmi_times_out() {
        let mut w = wire(EngineConfig {
            reply_timeout_ms: 20,
            sweep_interval_ms: 5,
            ..Default::default()
        });
        let sweeper = tokio::spawn(timeout_sweeper(
            w.engine.clone(),
            w.engine.config().sweep_interval(),
        ));

        w.requests
            .send(MobileRequest::new(APP, 9, add_command(4, true, false)))
            .await
            .unwrap();
        let call = next_call(&mut w.calls).await;

        let response = next_response(&mut w.responses).await;
        assert_eq!(response.correlation_id, 9);
        assert!(!response.success);
        assert_eq!(response.result_code, ResultCode::TimedOut);
        assert!(!w.engine.application(APP).unwrap().lock().is_reserved(4));

        // The reply that finally shows up is dropped
        w.replies
            .send(HmiReply::new(call.correlation_id, call.function(), ResultCode::Success))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(w.responses.try_recv().is_err());
        sweeper.abort();
    }
}
