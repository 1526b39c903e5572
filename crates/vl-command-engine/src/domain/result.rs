//! Result codes shared by application responses and subsystem replies.
//!
//! Numeric values follow the mobile API result enumeration. Severity is
//! a total order: success, then warnings, then every failure ranked by its
//! numeric value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result code carried by subsystem replies and application responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum ResultCode {
    Success = 0,
    UnsupportedRequest = 1,
    UnsupportedResource = 2,
    Disallowed = 3,
    Rejected = 4,
    Aborted = 5,
    Ignored = 6,
    Retry = 7,
    InUse = 8,
    DataNotAvailable = 9,
    TimedOut = 10,
    InvalidData = 11,
    CharLimitExceeded = 12,
    InvalidId = 13,
    DuplicateName = 14,
    ApplicationNotRegistered = 15,
    WrongLanguage = 16,
    OutOfMemory = 17,
    TooManyPendingRequests = 18,
    Warnings = 21,
    GenericError = 22,
}

impl ResultCode {
    /// Numeric value on the wire
    pub fn code(self) -> u8 {
        self as u8
    }

    /// True for codes that mean the request took effect
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success | Self::Warnings)
    }

    /// (class, code) key: success < warnings < failures by code
    fn rank(self) -> (u8, u8) {
        let class = match self {
            Self::Success => 0,
            Self::Warnings => 1,
            _ => 2,
        };
        (class, self.code())
    }

    /// The more severe of two codes. Commutative and associative.
    pub fn worst(self, other: Self) -> Self {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::UnsupportedRequest => "UNSUPPORTED_REQUEST",
            Self::UnsupportedResource => "UNSUPPORTED_RESOURCE",
            Self::Disallowed => "DISALLOWED",
            Self::Rejected => "REJECTED",
            Self::Aborted => "ABORTED",
            Self::Ignored => "IGNORED",
            Self::Retry => "RETRY",
            Self::InUse => "IN_USE",
            Self::DataNotAvailable => "DATA_NOT_AVAILABLE",
            Self::TimedOut => "TIMED_OUT",
            Self::InvalidData => "INVALID_DATA",
            Self::CharLimitExceeded => "CHAR_LIMIT_EXCEEDED",
            Self::InvalidId => "INVALID_ID",
            Self::DuplicateName => "DUPLICATE_NAME",
            Self::ApplicationNotRegistered => "APPLICATION_NOT_REGISTERED",
            Self::WrongLanguage => "WRONG_LANGUAGE",
            Self::OutOfMemory => "OUT_OF_MEMORY",
            Self::TooManyPendingRequests => "TOO_MANY_PENDING_REQUESTS",
            Self::Warnings => "WARNINGS",
            Self::GenericError => "GENERIC_ERROR",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
