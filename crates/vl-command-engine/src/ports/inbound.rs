//! Driving Ports (API - inbound)
//!
//! What the transport, the HMI reply path and the timer call into.

use crate::domain::correlation::CorrelationId;
use crate::domain::entities::ConnectionKey;
use crate::ipc::requests::MobileRequest;
use crate::ipc::responses::HmiReply;

/// Command engine entry points.
///
/// None of these return errors: every failure either becomes the single
/// response owed to an application or is absorbed and logged.
pub trait CommandEngineApi: Send + Sync {
    /// Handle one parsed application request
    fn submit_application_request(&self, request: MobileRequest);

    /// Handle one parsed subsystem reply
    fn deliver_subsystem_reply(&self, reply: HmiReply);

    /// Inject `TIMED_OUT` for every subsystem still pending under `id`
    fn force_timeout(&self, id: CorrelationId);

    /// Session teardown: drop the application and everything in flight for it,
    /// without responding
    fn disconnect_application(&self, connection_key: ConnectionKey);
}
