//! DeleteCommand: the request only dispatches; completion belongs to the
//! response reader.
//!
//! The request leaves a chain in the correlation table holding the command
//! id. UI and VR replies go through [`DeleteCommandResponse`], which decides
//! when the catalogue entry may go.

use super::{Command, CommandContext, Dispatch, PendingCommand};
use crate::domain::application::Application;
use crate::domain::correlation::CorrelationId;
use crate::domain::fanout::{FanOutRecord, ReplySlots};
use crate::domain::reducer::{reduce_all_confirm, Outcome, SlotClass};
use crate::domain::result::ResultCode;
use crate::domain::subsystem::MobileFunction;
use crate::domain::table::{CorrelationTable, ReplyOutcome};
use crate::error::{EngineError, EngineResult};
use crate::ipc::requests::{DeleteCommandCall, DeleteCommandParams, HmiPayload};
use crate::ipc::responses::HmiReply;
use tracing::debug;

pub struct DeleteCommand {
    params: DeleteCommandParams,
}

impl DeleteCommand {
    pub fn new(params: DeleteCommandParams) -> Self {
        Self { params }
    }
}

impl Command for DeleteCommand {
    fn function(&self) -> MobileFunction {
        MobileFunction::DeleteCommand
    }

    fn validate(&mut self, app: &Application, _ctx: &CommandContext<'_>) -> EngineResult<()> {
        let cmd_id = self
            .params
            .cmd_id
            .ok_or_else(|| EngineError::validation(ResultCode::InvalidData, "cmd_id is required"))?;
        if app.command(cmd_id).is_none() {
            return Err(EngineError::validation(
                ResultCode::InvalidId,
                format!("Command {cmd_id} does not exist"),
            ));
        }
        if app.is_reserved(cmd_id) {
            return Err(EngineError::validation(
                ResultCode::InUse,
                format!("Command {cmd_id} is being changed by another request"),
            ));
        }
        Ok(())
    }

    fn dispatch(self: Box<Self>, app: &mut Application, _ctx: &CommandContext<'_>) -> Dispatch {
        let entry = match self.params.cmd_id.and_then(|id| app.command(id)) {
            Some(entry) => entry,
            None => return Dispatch::Immediate(Outcome::failure(ResultCode::InvalidId)),
        };
        let cmd_id = entry.cmd_id;
        let call = || DeleteCommandCall {
            app_id: app.app_id().to_string(),
            cmd_id,
        };

        let mut calls = Vec::with_capacity(2);
        if entry.has_menu() {
            calls.push(HmiPayload::UiDeleteCommand(call()));
        }
        if entry.has_vr() {
            calls.push(HmiPayload::VrDeleteCommand(call()));
        }

        if calls.is_empty() {
            app.remove_command(cmd_id);
            app.update_hash();
            return Dispatch::Immediate(Outcome::success());
        }

        app.reserve_command(cmd_id);
        Dispatch::FanOut {
            calls,
            pending: PendingCommand::DeleteCommandChain(DeleteChain { cmd_id }),
        }
    }
}

/// What a DeleteCommand request leaves behind for its replies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteChain {
    pub cmd_id: u32,
}

impl DeleteChain {
    /// Drop each capability its subsystem confirmed; the entry goes with the last one.
    pub fn complete(self, slots: &ReplySlots, app: &mut Application) -> Outcome {
        let ui = SlotClass::from(slots.ui);
        let vr = SlotClass::from(slots.vr);
        let outcome = reduce_all_confirm([ui, vr]);
        app.release_command(self.cmd_id);

        let Some(entry) = app.command_mut(self.cmd_id) else {
            return outcome;
        };
        let mut changed = false;
        if ui == SlotClass::Success {
            changed |= entry.menu_params.take().is_some();
        }
        if vr == SlotClass::Success {
            changed |= entry.vr_commands.take().is_some();
        }
        let emptied = !entry.has_menu() && !entry.has_vr();
        if emptied {
            app.remove_command(self.cmd_id);
            changed = true;
        } else if changed {
            debug!(cmd_id = self.cmd_id, "DeleteCommand partially confirmed");
        }
        if changed {
            app.update_hash();
        }
        outcome
    }

    pub fn release(self, app: &mut Application) {
        app.release_command(self.cmd_id);
    }
}

/// Response-only reader for `UI.DeleteCommand` and `VR.DeleteCommand`.
pub struct DeleteCommandResponse;

impl DeleteCommandResponse {
    /// Record one reply against its chain.
    ///
    /// `Ok(Some(record))` hands over a completed chain. A reply with no
    /// chain is discarded silently; replies still missing give `Ok(None)`.
    pub fn on_reply(
        table: &CorrelationTable<PendingCommand>,
        reply: &HmiReply,
    ) -> EngineResult<Option<FanOutRecord<PendingCommand>>> {
        if !chain_exists(table, reply.correlation_id) {
            debug!(
                correlation_id = %reply.correlation_id,
                function = %reply.function,
                "No DeleteCommand chain, reply discarded"
            );
            return Ok(None);
        }

        match table.record_reply(reply.correlation_id, reply.function, reply.result_code)? {
            ReplyOutcome::Completed(record) => Ok(Some(record)),
            ReplyOutcome::StillPending { outstanding } => {
                debug!(
                    correlation_id = %reply.correlation_id,
                    function = %reply.function,
                    outstanding,
                    "DeleteCommand chain waiting for more replies"
                );
                Ok(None)
            }
        }
    }
}

fn chain_exists(table: &CorrelationTable<PendingCommand>, id: CorrelationId) -> bool {
    table
        .lookup(id)
        .is_some_and(|record| matches!(record.payload(), PendingCommand::DeleteCommandChain(_)))
}
