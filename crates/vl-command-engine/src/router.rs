//! Event Router - sends each subsystem reply to the component that owns its
//! completion.
//!
//! | Reply function | Route |
//! |---|---|
//! | `UI.SetGlobalProperties`, `TTS.SetGlobalProperties` | owning request |
//! | `UI.AddCommand`, `VR.AddCommand` | owning request |
//! | `UI.DeleteCommand`, `VR.DeleteCommand` | DeleteCommand response reader |
//!
//! Routing never fails: unknown ids, duplicates and unexpected functions are
//! logged, counted and dropped without touching any pending record.

use crate::commands::{DeleteCommandResponse, PendingCommand};
use crate::domain::fanout::FanOutRecord;
use crate::domain::subsystem::HmiFunction;
use crate::domain::table::{CorrelationTable, ReplyOutcome};
use crate::error::{EngineError, EngineResult};
use crate::ipc::responses::HmiReply;
use tracing::{debug, warn};
use vl_telemetry::metrics::SUBSYSTEM_REPLIES;

/// Who completes a fan-out for a given reply function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyRoute {
    /// The request that dispatched the call reduces its own replies
    OwningRequest,
    /// A response-only reader holds the completion logic
    DeleteCommandReader,
}

pub fn route_for(function: HmiFunction) -> ReplyRoute {
    match function {
        HmiFunction::UiDeleteCommand | HmiFunction::VrDeleteCommand => {
            ReplyRoute::DeleteCommandReader
        }
        HmiFunction::UiSetGlobalProperties
        | HmiFunction::TtsSetGlobalProperties
        | HmiFunction::UiAddCommand
        | HmiFunction::VrAddCommand => ReplyRoute::OwningRequest,
    }
}

/// Deliver one reply. Returns the record when this reply completed it.
pub(crate) fn deliver(
    table: &CorrelationTable<PendingCommand>,
    reply: &HmiReply,
) -> Option<FanOutRecord<PendingCommand>> {
    let routed = match route_for(reply.function) {
        ReplyRoute::OwningRequest => record_for_owner(table, reply),
        ReplyRoute::DeleteCommandReader => DeleteCommandResponse::on_reply(table, reply),
    };

    match routed {
        Ok(Some(record)) => {
            vl_telemetry::metric_inc!(SUBSYSTEM_REPLIES, &["completed"]);
            Some(record)
        }
        Ok(None) => {
            vl_telemetry::metric_inc!(SUBSYSTEM_REPLIES, &["pending"]);
            None
        }
        Err(e) => {
            absorb(reply, &e);
            None
        }
    }
}

fn record_for_owner(
    table: &CorrelationTable<PendingCommand>,
    reply: &HmiReply,
) -> EngineResult<Option<FanOutRecord<PendingCommand>>> {
    match table.record_reply(reply.correlation_id, reply.function, reply.result_code)? {
        ReplyOutcome::Completed(record) => Ok(Some(record)),
        ReplyOutcome::StillPending { outstanding } => {
            debug!(
                correlation_id = %reply.correlation_id,
                function = %reply.function,
                outstanding,
                "Reply recorded, fan-out still pending"
            );
            Ok(None)
        }
    }
}

fn absorb(reply: &HmiReply, err: &EngineError) {
    let disposition = match err {
        EngineError::UnknownCorrelation { .. } => {
            debug!(
                correlation_id = %reply.correlation_id,
                function = %reply.function,
                "Reply for unknown or expired correlation id"
            );
            "unknown"
        }
        EngineError::DuplicateReply { .. } => {
            warn!(
                correlation_id = %reply.correlation_id,
                function = %reply.function,
                "Duplicate reply ignored"
            );
            "duplicate"
        }
        _ => {
            warn!(
                correlation_id = %reply.correlation_id,
                function = %reply.function,
                error = %err,
                "Unexpected reply ignored"
            );
            "unexpected"
        }
    };
    vl_telemetry::metric_inc!(SUBSYSTEM_REPLIES, &[disposition]);
}
