//! Command engine service - wires registry, correlation table and commands.
//!
//! Lock order: an application mutex may be held while the correlation table
//! is touched, never the reverse. Table critical sections never call out.

use crate::commands::{self, Command, CommandContext, Dispatch, PendingCommand};
use crate::domain::application::ApplicationInfo;
use crate::domain::config::{ConfigError, EngineConfig};
use crate::domain::correlation::CorrelationId;
use crate::domain::entities::ConnectionKey;
use crate::domain::fanout::{CommandOwner, FanOutRecord};
use crate::domain::reducer::Outcome;
use crate::domain::registry::{ApplicationRegistry, SharedApplication};
use crate::domain::result::ResultCode;
use crate::domain::subsystem::{Subsystem, SubsystemAvailability};
use crate::domain::table::{CorrelationTable, RegisterError};
use crate::error::EngineError;
use crate::ipc::requests::{HmiPayload, HmiRequest, MobileRequest};
use crate::ipc::responses::{HmiReply, MobileResponse};
use crate::ports::inbound::CommandEngineApi;
use crate::ports::outbound::{ApplicationSink, FileStorage, SubsystemDispatch};
use crate::router;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use vl_telemetry::metrics::{
    FAN_OUTS_ABANDONED, FAN_OUT_DURATION, FAN_OUT_TIMEOUTS, PENDING_FAN_OUTS, REQUESTS_RECEIVED,
    REQUESTS_REJECTED, RESPONSES_SENT, SUBSYSTEM_CALLS,
};

/// Engine counters
#[derive(Debug, Default)]
pub struct EngineStats {
    pub requests_received: AtomicU64,
    /// Requests answered without any subsystem call because they failed checks
    pub requests_rejected: AtomicU64,
    pub responses_sent: AtomicU64,
    pub replies_received: AtomicU64,
    pub fan_outs_dispatched: AtomicU64,
    /// Calls the transport refused
    pub dispatch_failures: AtomicU64,
    /// Fan-outs completed through `force_timeout`
    pub timeouts: AtomicU64,
    /// Fan-outs dropped without a response
    pub abandoned: AtomicU64,
}

impl EngineStats {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// What happened to a request while its application was locked
enum Admission {
    Rejected(EngineError),
    Answered(Outcome),
    Dispatched {
        id: CorrelationId,
        calls: Vec<HmiPayload>,
    },
}

/// Command correlation and completion engine
pub struct CommandEngine {
    config: EngineConfig,
    registry: ApplicationRegistry,
    table: CorrelationTable<PendingCommand>,
    availability: SubsystemAvailability,
    dispatch: Arc<dyn SubsystemDispatch>,
    sink: Arc<dyn ApplicationSink>,
    storage: Arc<dyn FileStorage>,
    stats: EngineStats,
}

impl CommandEngine {
    pub fn new(
        config: EngineConfig,
        dispatch: Arc<dyn SubsystemDispatch>,
        sink: Arc<dyn ApplicationSink>,
        storage: Arc<dyn FileStorage>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            registry: ApplicationRegistry::new(),
            table: CorrelationTable::new(),
            availability: SubsystemAvailability::new(),
            dispatch,
            sink,
            storage,
            stats: EngineStats::default(),
        })
    }

    // =========================================================================
    // SESSIONS AND HMI STATE
    // =========================================================================

    pub fn register_application(
        &self,
        connection_key: ConnectionKey,
        info: ApplicationInfo,
    ) -> SharedApplication {
        self.registry.register(connection_key, info)
    }

    pub fn application(&self, connection_key: ConnectionKey) -> Option<SharedApplication> {
        self.registry.get(connection_key)
    }

    /// Drop the application and every fan-out owed to it. Nothing is answered.
    pub fn disconnect_application(&self, connection_key: ConnectionKey) {
        let removed = self.registry.unregister(connection_key).is_some();
        let abandoned = self.table.abandon_owner(connection_key);
        for (id, record) in &abandoned {
            debug!(
                correlation_id = %id,
                function = %record.owner().function,
                "Fan-out abandoned"
            );
            FAN_OUTS_ABANDONED.inc();
            EngineStats::bump(&self.stats.abandoned);
        }
        self.update_pending_gauge();
        info!(
            connection_key = %connection_key,
            registered = removed,
            abandoned = abandoned.len(),
            "Application disconnected"
        );
    }

    pub fn set_subsystem_available(&self, subsystem: Subsystem, available: bool) {
        info!(subsystem = %subsystem, available, "Subsystem availability changed");
        self.availability.set_available(subsystem, available);
    }

    pub fn is_subsystem_available(&self, subsystem: Subsystem) -> bool {
        self.availability.is_available(subsystem)
    }

    // =========================================================================
    // REQUEST PATH
    // =========================================================================

    /// Validate, dispatch and, for fan-outs, register before the first call leaves.
    pub fn submit_application_request(&self, request: MobileRequest) {
        let MobileRequest {
            connection_key,
            correlation_id,
            payload,
        } = request;
        let function = payload.function();
        let owner = CommandOwner {
            connection_key,
            app_correlation_id: correlation_id,
            function,
        };

        vl_telemetry::metric_inc!(REQUESTS_RECEIVED, &[function.as_str()]);
        EngineStats::bump(&self.stats.requests_received);
        debug!(
            connection_key = %connection_key,
            correlation_id,
            function = %function,
            "Application request received"
        );

        let Some(shared) = self.registry.get(connection_key) else {
            self.reject(&owner, EngineError::ApplicationNotRegistered { connection_key });
            return;
        };

        let admission = self.admit(&shared, owner, commands::from_payload(payload));
        match admission {
            Admission::Rejected(err) => self.reject(&owner, err),
            Admission::Answered(outcome) => self.respond(&owner, outcome),
            Admission::Dispatched { id, calls } => self.send_calls(id, calls),
        }
    }

    fn admit(
        &self,
        shared: &SharedApplication,
        owner: CommandOwner,
        mut command: Box<dyn Command>,
    ) -> Admission {
        let ctx = CommandContext {
            availability: &self.availability,
            storage: self.storage.as_ref(),
        };
        let mut app = shared.lock();

        if let Err(err) = command.validate(&app, &ctx) {
            return Admission::Rejected(err);
        }
        if command.may_fan_out() && self.table.len() >= self.config.max_pending_fan_outs {
            return Admission::Rejected(EngineError::validation(
                ResultCode::TooManyPendingRequests,
                format!(
                    "{} fan-outs already pending",
                    self.config.max_pending_fan_outs
                ),
            ));
        }

        let (calls, pending) = match command.dispatch(&mut app, &ctx) {
            Dispatch::Immediate(outcome) => return Admission::Answered(outcome),
            Dispatch::FanOut { calls, pending } => (calls, pending),
        };

        let id = self.table.mint();
        let mut record = FanOutRecord::new(owner, pending, self.config.reply_timeout());
        for call in &calls {
            record.address(call.function());
        }

        if let Err(RegisterError { id, record }) = self.table.register(id, record) {
            error!(
                correlation_id = %id,
                function = %owner.function,
                "Minted correlation id is already live"
            );
            let (_, pending, _) = record.into_parts();
            pending.release(&mut app);
            return Admission::Rejected(EngineError::DuplicateCorrelation { id });
        }

        EngineStats::bump(&self.stats.fan_outs_dispatched);
        info!(
            connection_key = %owner.connection_key,
            correlation_id = %id,
            function = %owner.function,
            calls = calls.len(),
            "Fan-out dispatched"
        );
        Admission::Dispatched { id, calls }
    }

    fn send_calls(&self, id: CorrelationId, calls: Vec<HmiPayload>) {
        self.update_pending_gauge();
        for payload in calls {
            let function = payload.function();
            vl_telemetry::metric_inc!(SUBSYSTEM_CALLS, &[function.as_str()]);

            if let Err(e) = self.dispatch.send(HmiRequest::new(id, payload)) {
                error!(
                    correlation_id = %id,
                    function = %function,
                    error = %e,
                    "Failed to send subsystem call"
                );
                EngineStats::bump(&self.stats.dispatch_failures);
                let mut reply = HmiReply::new(id, function, ResultCode::GenericError);
                reply.info = Some(e.to_string());
                self.deliver_subsystem_reply(reply);
            }
        }
    }

    // =========================================================================
    // REPLY PATH
    // =========================================================================

    pub fn deliver_subsystem_reply(&self, reply: HmiReply) {
        EngineStats::bump(&self.stats.replies_received);
        if let Some(record) = router::deliver(&self.table, &reply) {
            self.finalize(record);
        }
    }

    /// Complete every subsystem still pending under `id` with `TIMED_OUT`.
    pub fn force_timeout(&self, id: CorrelationId) {
        let Some(functions) = self.table.pending_functions(id) else {
            debug!(correlation_id = %id, "Timeout for unknown correlation id ignored");
            return;
        };
        warn!(
            correlation_id = %id,
            pending = ?functions,
            "Fan-out timed out"
        );
        FAN_OUT_TIMEOUTS.inc();
        EngineStats::bump(&self.stats.timeouts);
        for function in functions {
            self.deliver_subsystem_reply(HmiReply::timed_out(id, function));
        }
    }

    /// Time out every fan-out past its deadline. Returns how many were due.
    pub fn expire_overdue(&self) -> usize {
        let overdue = self.table.overdue(Instant::now());
        for id in &overdue {
            self.force_timeout(*id);
        }
        overdue.len()
    }

    fn finalize(&self, record: FanOutRecord<PendingCommand>) {
        FAN_OUT_DURATION.observe(record.age().as_secs_f64());
        self.update_pending_gauge();
        let (owner, pending, slots) = record.into_parts();

        let Some(shared) = self.registry.get(owner.connection_key) else {
            warn!(
                connection_key = %owner.connection_key,
                function = %owner.function,
                "Fan-out completed after its application left"
            );
            FAN_OUTS_ABANDONED.inc();
            EngineStats::bump(&self.stats.abandoned);
            return;
        };

        let outcome = {
            let mut app = shared.lock();
            pending.complete(&slots, &mut app)
        };
        self.respond(&owner, outcome);
    }

    // =========================================================================
    // RESPONSES
    // =========================================================================

    fn reject(&self, owner: &CommandOwner, err: EngineError) {
        let code = err.result_code();
        vl_telemetry::metric_inc!(
            REQUESTS_REJECTED,
            &[owner.function.as_str(), code.as_str()]
        );
        EngineStats::bump(&self.stats.requests_rejected);
        debug!(
            connection_key = %owner.connection_key,
            function = %owner.function,
            error = %err,
            "Request rejected"
        );
        let mut outcome = Outcome::failure(code);
        outcome.info = err.info();
        self.respond(owner, outcome);
    }

    fn respond(&self, owner: &CommandOwner, outcome: Outcome) {
        let response = MobileResponse::from_outcome(owner, outcome);
        vl_telemetry::metric_inc!(
            RESPONSES_SENT,
            &[owner.function.as_str(), response.result_code.as_str()]
        );
        EngineStats::bump(&self.stats.responses_sent);
        info!(
            connection_key = %owner.connection_key,
            correlation_id = owner.app_correlation_id,
            function = %owner.function,
            success = response.success,
            result_code = %response.result_code,
            "Responding to application"
        );
        if let Err(e) = self.sink.send_response(response) {
            error!(
                connection_key = %owner.connection_key,
                error = %e,
                "Failed to deliver response"
            );
        }
    }

    fn update_pending_gauge(&self) {
        PENDING_FAN_OUTS.set(self.table.len() as f64);
    }

    // =========================================================================
    // INTROSPECTION
    // =========================================================================

    pub fn pending_fan_outs(&self) -> usize {
        self.table.len()
    }

    pub fn table(&self) -> &CorrelationTable<PendingCommand> {
        &self.table
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl CommandEngineApi for CommandEngine {
    fn submit_application_request(&self, request: MobileRequest) {
        CommandEngine::submit_application_request(self, request)
    }

    fn deliver_subsystem_reply(&self, reply: HmiReply) {
        CommandEngine::deliver_subsystem_reply(self, reply)
    }

    fn force_timeout(&self, id: CorrelationId) {
        CommandEngine::force_timeout(self, id)
    }

    fn disconnect_application(&self, connection_key: ConnectionKey) {
        CommandEngine::disconnect_application(self, connection_key)
    }
}

/// Background task timing out overdue fan-outs
pub async fn timeout_sweeper(engine: Arc<CommandEngine>, interval: Duration) {
    let mut sweep_interval = tokio::time::interval(interval);
    sweep_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        sweep_interval.tick().await;
        let expired = engine.expire_overdue();
        if expired > 0 {
            debug!(expired, "Timed out overdue fan-outs");
        }
    }
}
