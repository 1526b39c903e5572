//! # Vehicle Link Command Engine
//!
//! Correlates application requests with the HMI subsystem calls they fan out
//! to, and turns the subsystem replies into exactly one response per request.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                          COMMAND ENGINE                              │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │  MobileRequest ──► validate ──► dispatch ──┬──► Immediate response   │
//! │                                            │                         │
//! │                                            ▼                         │
//! │                             ┌──────────────────────────┐             │
//! │                             │    Correlation Table     │             │
//! │                             │ id → Fan-Out Record      │             │
//! │                             └─────────────┬────────────┘             │
//! │                                           │ register, then send      │
//! │                                           ▼                          │
//! │                                   SubsystemDispatch ───► UI/VR/TTS   │
//! │                                                                      │
//! │  HmiReply ──► Event Router ──► record_reply ──► (last) reduce        │
//! │                 │                                   │                │
//! │                 └► DeleteCommand reader             ▼                │
//! │                                              finalize + respond      │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Registered before the first call leaves | `service::CommandEngine::admit` |
//! | Outstanding never below zero, slots written once | `domain::fanout::FanOutRecord::record` |
//! | Exactly one finalizer per record | `domain::table::CorrelationTable::record_reply` |
//! | Unknown ids never mutate records | `router::deliver` |
//! | Result independent of reply order | `domain::reducer` |
//! | A capability goes only once its subsystem confirmed | `commands::delete_command::DeleteChain::complete` |
//!
//! ## Usage
//!
//! ```ignore
//! use vl_command_engine::{CommandEngine, EngineConfig};
//!
//! let engine = CommandEngine::new(EngineConfig::from_env()?, dispatch, sink, storage)?;
//! engine.register_application(key, info);
//! engine.submit_application_request(request);
//! engine.deliver_subsystem_reply(reply);
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod commands;
pub mod domain;
pub mod error;
pub mod ipc;
pub mod ports;
pub mod router;
pub mod service;

pub use domain::{
    Application, ApplicationInfo, ConnectionKey, CorrelationId, EngineConfig, HmiFunction,
    MobileFunction, Outcome, ResultCode, Subsystem,
};
pub use error::{EngineError, EngineResult};
pub use ipc::{HmiReply, HmiRequest, MobileRequest, MobileResponse};
pub use ports::{ApplicationSink, CommandEngineApi, FileStorage, SubsystemDispatch};
pub use service::{timeout_sweeper, CommandEngine, EngineStats};
