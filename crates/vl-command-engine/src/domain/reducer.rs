//! Result Reducer - combines subsystem results into one application outcome.
//!
//! Reducers are pure and total. Each slot is first classified, then a
//! per-command rule maps the classification set to exactly one outcome.
//! Nothing depends on arrival order.
//!
//! ## Primary + optional secondary
//!
//! | primary \ secondary | NotAddressed | Success | Unsupported | Failed(c2) |
//! |---|---|---|---|---|
//! | NotAddressed / Unsupported | F, UNSUPPORTED_RESOURCE | F, UNSUPPORTED_RESOURCE | F, UNSUPPORTED_RESOURCE | F, worst(UNSUPPORTED_RESOURCE, c2) |
//! | Success | T, SUCCESS | T, SUCCESS | T, WARNINGS + note | F, c2 |
//! | Failed(c1) | F, c1 | F, c1 | F, worst(c1, UNSUPPORTED_RESOURCE) | F, worst(c1, c2) |
//!
//! ## All must confirm
//!
//! No slot addressed: F, UNSUPPORTED_RESOURCE. Every addressed slot
//! succeeded: T, SUCCESS. Otherwise: F, worst failure.

use crate::domain::fanout::ReplySlot;
use crate::domain::result::ResultCode;
use serde::{Deserialize, Serialize};

/// Note attached when the secondary could not speak a prompt
pub const UNSUPPORTED_PROMPT_NOTE: &str = "Unsupported phoneme type sent in a prompt";

/// Application-visible outcome of a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub success: bool,
    pub result_code: ResultCode,
    pub info: Option<String>,
}

impl Outcome {
    pub fn success() -> Self {
        Self {
            success: true,
            result_code: ResultCode::Success,
            info: None,
        }
    }

    /// Successful, with a warning-class code and a note
    pub fn warning(info: impl Into<String>) -> Self {
        Self {
            success: true,
            result_code: ResultCode::Warnings,
            info: Some(info.into()),
        }
    }

    pub fn failure(result_code: ResultCode) -> Self {
        Self {
            success: false,
            result_code,
            info: None,
        }
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }
}

/// Classification of one subsystem slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotClass {
    NotAddressed,
    Success,
    /// The subsystem cannot handle (part of) the request
    Unsupported,
    Failed(ResultCode),
}

impl From<ReplySlot> for SlotClass {
    fn from(slot: ReplySlot) -> Self {
        match slot {
            ReplySlot::NotAddressed => Self::NotAddressed,
            // A slot still waiting at reduce time never answered
            ReplySlot::Pending => Self::Failed(ResultCode::TimedOut),
            ReplySlot::Responded(code) if code.is_success() => Self::Success,
            ReplySlot::Responded(ResultCode::UnsupportedResource) => Self::Unsupported,
            ReplySlot::Responded(code) => Self::Failed(code),
        }
    }
}

/// Primary subsystem must succeed; the secondary may be absent or unsupported.
pub fn reduce_primary_with_optional(primary: SlotClass, secondary: SlotClass) -> Outcome {
    use SlotClass::*;
    const UNSUPPORTED: ResultCode = ResultCode::UnsupportedResource;

    match (primary, secondary) {
        (Success, NotAddressed | Success) => Outcome::success(),
        (Success, Unsupported) => Outcome::warning(UNSUPPORTED_PROMPT_NOTE),
        (Success, Failed(c2)) => Outcome::failure(c2),

        (NotAddressed | Unsupported, NotAddressed | Success | Unsupported) => {
            Outcome::failure(UNSUPPORTED)
        }
        (NotAddressed | Unsupported, Failed(c2)) => Outcome::failure(UNSUPPORTED.worst(c2)),

        (Failed(c1), NotAddressed | Success) => Outcome::failure(c1),
        (Failed(c1), Unsupported) => Outcome::failure(c1.worst(UNSUPPORTED)),
        (Failed(c1), Failed(c2)) => Outcome::failure(c1.worst(c2)),
    }
}

/// Every addressed subsystem must confirm.
pub fn reduce_all_confirm(slots: impl IntoIterator<Item = SlotClass>) -> Outcome {
    let mut addressed = 0usize;
    let mut worst: Option<ResultCode> = None;

    for class in slots {
        let failure = match class {
            SlotClass::NotAddressed => continue,
            SlotClass::Success => None,
            SlotClass::Unsupported => Some(ResultCode::UnsupportedResource),
            SlotClass::Failed(code) => Some(code),
        };
        addressed += 1;
        if let Some(code) = failure {
            worst = Some(worst.map_or(code, |w| w.worst(code)));
        }
    }

    if addressed == 0 {
        return Outcome::failure(ResultCode::UnsupportedResource)
            .with_info("No subsystem was addressed");
    }
    match worst {
        None => Outcome::success(),
        Some(code) => Outcome::failure(code),
    }
}
