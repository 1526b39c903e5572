//! Ports Layer - Hexagonal Architecture
//!
//! - `inbound`: what callers drive (requests, replies, timeouts)
//! - `outbound`: what the engine drives (HMI dispatch, application sink, storage)

pub mod inbound;
pub mod outbound;

pub use inbound::CommandEngineApi;
pub use outbound::{ApplicationSink, DispatchError, FileStorage, StorageError, SubsystemDispatch};
