//! Commands: per-function validation, dispatch and reduction.
//!
//! ```text
//!   MobileRequest
//!        │
//!        ▼
//!   ┌─────────┐  Err   ┌──────────┐
//!   │validate │───────►│ Rejected │  (no subsystem call)
//!   └────┬────┘        └──────────┘
//!        ▼
//!   ┌─────────┐  Immediate(outcome)  ┌───────────┐
//!   │dispatch │─────────────────────►│ Responded │
//!   └────┬────┘                      └───────────┘
//!        │ FanOut { calls, pending }        ▲
//!        ▼                                  │
//!   ┌──────────────────┐  last reply  ┌─────┴────┐
//!   │ CorrelationTable │─────────────►│ complete │  reduce + finalize
//!   └──────────────────┘              └──────────┘
//! ```
//!
//! Commands only see the application they act on and the collaborators in
//! [`CommandContext`]. Registration, sending and responding are the
//! engine's job.

pub mod add_command;
pub mod delete_command;
pub mod put_file;
pub mod set_global_properties;

use crate::domain::application::Application;
use crate::domain::fanout::ReplySlots;
use crate::domain::reducer::Outcome;
use crate::domain::subsystem::{MobileFunction, SubsystemAvailability};
use crate::error::EngineResult;
use crate::ipc::requests::{HmiPayload, MobilePayload};
use crate::ports::outbound::FileStorage;
use std::fmt;

pub use add_command::{AddCommand, AwaitingAddCommand};
pub use delete_command::{DeleteChain, DeleteCommand, DeleteCommandResponse};
pub use put_file::PutFile;
pub use set_global_properties::{AwaitingGlobalProperties, SetGlobalProperties};

/// Collaborators a command may consult
#[derive(Clone, Copy)]
pub struct CommandContext<'a> {
    pub availability: &'a SubsystemAvailability,
    pub storage: &'a dyn FileStorage,
}

/// Result of dispatching a validated command
#[derive(Debug)]
pub enum Dispatch {
    /// Terminal outcome known now; nothing was sent
    Immediate(Outcome),
    /// One call per addressed subsystem, completed later by `pending`
    FanOut {
        calls: Vec<HmiPayload>,
        pending: PendingCommand,
    },
}

/// One application command
pub trait Command: Send {
    fn function(&self) -> MobileFunction;

    /// Whether dispatch can produce a fan-out
    fn may_fan_out(&self) -> bool {
        true
    }

    /// Structural and state checks. Runs with the application locked; may
    /// stash derived data for `dispatch`.
    fn validate(&mut self, app: &Application, ctx: &CommandContext<'_>) -> EngineResult<()>;

    /// Build subsystem calls or answer immediately
    fn dispatch(self: Box<Self>, app: &mut Application, ctx: &CommandContext<'_>) -> Dispatch;
}

/// Reduction and gated state change of a fan-out that owns its completion
pub trait AwaitingReplies: Send + Sync + fmt::Debug {
    fn reduce(&self, slots: &ReplySlots) -> Outcome;

    /// Apply state changes allowed by `outcome`
    fn finalize(self: Box<Self>, slots: &ReplySlots, outcome: &Outcome, app: &mut Application);

    /// Undo reservations when the fan-out never got registered
    fn release(self: Box<Self>, _app: &mut Application) {}
}

/// What a fan-out record carries until its last reply
#[derive(Debug)]
pub enum PendingCommand {
    Awaiting(Box<dyn AwaitingReplies>),
    /// Completed by the response-only DeleteCommand reader
    DeleteCommandChain(DeleteChain),
}

impl PendingCommand {
    pub fn complete(self, slots: &ReplySlots, app: &mut Application) -> Outcome {
        match self {
            Self::Awaiting(awaiting) => {
                let outcome = awaiting.reduce(slots);
                awaiting.finalize(slots, &outcome, app);
                outcome
            }
            Self::DeleteCommandChain(chain) => chain.complete(slots, app),
        }
    }

    pub fn release(self, app: &mut Application) {
        match self {
            Self::Awaiting(awaiting) => awaiting.release(app),
            Self::DeleteCommandChain(chain) => chain.release(app),
        }
    }
}

/// Build the command for a parsed request
pub fn from_payload(payload: MobilePayload) -> Box<dyn Command> {
    match payload {
        MobilePayload::SetGlobalProperties(params) => Box::new(SetGlobalProperties::new(params)),
        MobilePayload::AddCommand(params) => Box::new(AddCommand::new(params)),
        MobilePayload::DeleteCommand(params) => Box::new(DeleteCommand::new(params)),
        MobilePayload::PutFile(params) => Box::new(PutFile::new(params)),
    }
}
