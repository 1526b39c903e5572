//! Driven Ports (outbound dependencies)
//!
//! The engine never touches a transport or a filesystem directly. Calls are
//! synchronous and must not block on a reply: replies come back through
//! `CommandEngineApi::deliver_subsystem_reply`.

use crate::domain::result::ResultCode;
use crate::domain::subsystem::Subsystem;
use crate::ipc::requests::HmiRequest;
use crate::ipc::responses::MobileResponse;
use thiserror::Error;

/// Hands subsystem calls to the HMI transport.
pub trait SubsystemDispatch: Send + Sync {
    /// Send one call. The correlation id is already registered.
    fn send(&self, request: HmiRequest) -> Result<(), DispatchError>;
}

/// Delivers terminal responses to applications.
pub trait ApplicationSink: Send + Sync {
    fn send_response(&self, response: MobileResponse) -> Result<(), DispatchError>;
}

/// Persists uploaded file chunks.
pub trait FileStorage: Send + Sync {
    /// Write `data` at `offset` into `path`, inside the area owned by `owner`.
    fn save(&self, owner: &str, data: &[u8], path: &str, offset: u64) -> Result<(), StorageError>;
}

/// Transport errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("channel closed")]
    ChannelClosed,
    #[error("subsystem unavailable: {0}")]
    SubsystemUnavailable(Subsystem),
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Persistence errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("not enough storage space")]
    OutOfSpace,
    #[error("i/o error: {0}")]
    Io(String),
}

impl StorageError {
    /// Result code returned to the uploading application
    pub fn result_code(&self) -> ResultCode {
        match self {
            Self::InvalidData(_) => ResultCode::InvalidData,
            Self::OutOfSpace => ResultCode::OutOfMemory,
            Self::Io(_) => ResultCode::GenericError,
        }
    }
}
