//! Engine wired to recording adapters.

use std::sync::Arc;

use vl_command_engine::adapters::{InMemoryFileStorage, RecordingDispatch, RecordingSink};
use vl_command_engine::domain::{MenuParams, SharedApplication};
use vl_command_engine::ipc::{AddCommandParams, DeleteCommandParams, MobilePayload};
use vl_command_engine::{
    ApplicationInfo, CommandEngine, ConnectionKey, EngineConfig, HmiReply, HmiRequest,
    MobileRequest, MobileResponse, ResultCode,
};

pub const APP: ConnectionKey = ConnectionKey(7);

pub struct Fixture {
    pub engine: Arc<CommandEngine>,
    pub dispatch: Arc<RecordingDispatch>,
    pub sink: Arc<RecordingSink>,
    pub storage: Arc<InMemoryFileStorage>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        vl_telemetry::init_test_logging();
        let dispatch = Arc::new(RecordingDispatch::new());
        let sink = Arc::new(RecordingSink::new());
        let storage = Arc::new(InMemoryFileStorage::new());
        let engine = CommandEngine::new(config, dispatch.clone(), sink.clone(), storage.clone())
            .expect("default config is valid");

        let mut info = ApplicationInfo::new("nav-app", "Navigator");
        info.allow_navigation = true;
        engine.register_application(APP, info);

        Self {
            engine: Arc::new(engine),
            dispatch,
            sink,
            storage,
        }
    }

    pub fn app(&self) -> SharedApplication {
        self.engine.application(APP).expect("application registered")
    }

    pub fn submit(&self, correlation_id: u32, payload: MobilePayload) {
        self.engine
            .submit_application_request(MobileRequest::new(APP, correlation_id, payload));
    }

    /// Calls sent since the last take.
    pub fn calls(&self) -> Vec<HmiRequest> {
        self.dispatch.take()
    }

    pub fn reply(&self, call: &HmiRequest, code: ResultCode) {
        self.engine
            .deliver_subsystem_reply(HmiReply::new(call.correlation_id, call.function(), code));
    }

    /// Exactly one response since the last take.
    pub fn single_response(&self) -> MobileResponse {
        let mut responses = self.sink.take();
        assert_eq!(responses.len(), 1, "expected one response: {responses:?}");
        responses.remove(0)
    }

    /// Add a command and confirm every call it sends.
    pub fn add_confirmed(&self, correlation_id: u32, cmd_id: u32) {
        self.submit(correlation_id, add_command(cmd_id, true, true));
        for call in self.calls() {
            self.reply(&call, ResultCode::Success);
        }
        assert!(self.single_response().success);
    }
}

pub fn add_command(cmd_id: u32, menu: bool, vr: bool) -> MobilePayload {
    MobilePayload::AddCommand(AddCommandParams {
        cmd_id: Some(cmd_id),
        menu_params: menu.then(|| MenuParams {
            parent_id: None,
            position: None,
            menu_name: format!("Command {cmd_id}"),
        }),
        vr_commands: vr.then(|| vec![format!("command {cmd_id}")]),
        cmd_icon: None,
    })
}

pub fn delete_command(cmd_id: u32) -> MobilePayload {
    MobilePayload::DeleteCommand(DeleteCommandParams {
        cmd_id: Some(cmd_id),
    })
}
