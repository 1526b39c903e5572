//! Outbound application responses and inbound HMI replies.

use crate::domain::correlation::CorrelationId;
use crate::domain::entities::ConnectionKey;
use crate::domain::fanout::CommandOwner;
use crate::domain::reducer::Outcome;
use crate::domain::result::ResultCode;
use crate::domain::subsystem::{HmiFunction, MobileFunction};
use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// Terminal response to an application request. Exactly one per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MobileResponse {
    pub connection_key: ConnectionKey,
    /// Application's own correlation id
    pub correlation_id: u32,
    pub function: MobileFunction,
    pub success: bool,
    pub result_code: ResultCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

impl MobileResponse {
    pub fn from_outcome(owner: &CommandOwner, outcome: Outcome) -> Self {
        Self {
            connection_key: owner.connection_key,
            correlation_id: owner.app_correlation_id,
            function: owner.function,
            success: outcome.success,
            result_code: outcome.result_code,
            info: outcome.info,
        }
    }
}

/// Reply from an HMI subsystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HmiReply {
    pub correlation_id: CorrelationId,
    pub function: HmiFunction,
    pub result_code: ResultCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

impl HmiReply {
    pub fn new(correlation_id: CorrelationId, function: HmiFunction, result_code: ResultCode) -> Self {
        Self {
            correlation_id,
            function,
            result_code,
            info: None,
        }
    }

    /// Synthetic reply for a subsystem that never answered
    pub fn timed_out(correlation_id: CorrelationId, function: HmiFunction) -> Self {
        Self::new(correlation_id, function, ResultCode::TimedOut)
    }

    /// `Ok` for success-class codes
    pub fn check(&self) -> EngineResult<()> {
        if self.result_code.is_success() {
            Ok(())
        } else {
            Err(EngineError::SubsystemFailure {
                function: self.function,
                code: self.result_code,
            })
        }
    }
}
