//! Error types for the command engine.
//!
//! Every variant maps to the result code an application would see. Reply-time
//! anomalies (`DuplicateReply`, `UnknownCorrelation`, `UnexpectedReply`) are
//! absorbed by the router and never reach an application.

use crate::domain::correlation::CorrelationId;
use crate::domain::entities::ConnectionKey;
use crate::domain::result::ResultCode;
use crate::domain::subsystem::HmiFunction;
use crate::ports::outbound::{DispatchError, StorageError};
use thiserror::Error;

/// Command engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed or missing fields, or a request the current state forbids
    #[error("Validation failed ({code}): {reason}")]
    Validation { code: ResultCode, reason: String },

    /// No active session for the connection
    #[error("Application not registered: connection {connection_key}")]
    ApplicationNotRegistered { connection_key: ConnectionKey },

    /// Identity minting handed out a live identity
    #[error("Correlation id {id} is already registered")]
    DuplicateCorrelation { id: CorrelationId },

    /// Second reply for a subsystem that already answered
    #[error("Duplicate reply {function} for correlation id {id}")]
    DuplicateReply {
        id: CorrelationId,
        function: HmiFunction,
    },

    /// Reply for an id with no live record
    #[error("Unknown correlation id {id}")]
    UnknownCorrelation { id: CorrelationId },

    /// Reply from a subsystem the record never addressed
    #[error("Unexpected reply {function} for correlation id {id}")]
    UnexpectedReply {
        id: CorrelationId,
        function: HmiFunction,
    },

    /// A subsystem reported an error code
    #[error("Subsystem call {function} failed with {code}")]
    SubsystemFailure {
        function: HmiFunction,
        code: ResultCode,
    },

    /// Persistence collaborator failed during an upload
    #[error("Storage failure: {0}")]
    Storage(#[from] StorageError),

    /// A subsystem call could not be handed to the transport
    #[error("Dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),
}

impl EngineError {
    /// Shorthand for a validation failure
    pub fn validation(code: ResultCode, reason: impl Into<String>) -> Self {
        Self::Validation {
            code,
            reason: reason.into(),
        }
    }

    /// Result code surfaced to the application
    pub fn result_code(&self) -> ResultCode {
        match self {
            Self::Validation { code, .. } => *code,
            Self::ApplicationNotRegistered { .. } => ResultCode::ApplicationNotRegistered,
            Self::SubsystemFailure { code, .. } => *code,
            Self::Storage(e) => e.result_code(),
            Self::DuplicateCorrelation { .. }
            | Self::DuplicateReply { .. }
            | Self::UnknownCorrelation { .. }
            | Self::UnexpectedReply { .. }
            | Self::Dispatch(_) => ResultCode::GenericError,
        }
    }

    /// Human-readable note for the response `info` field
    pub fn info(&self) -> Option<String> {
        match self {
            Self::Validation { reason, .. } => Some(reason.clone()),
            Self::Storage(e) => Some(e.to_string()),
            _ => None,
        }
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
