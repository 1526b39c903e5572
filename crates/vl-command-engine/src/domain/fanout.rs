//! Fan-Out Record: one application command split into subsystem calls.
//!
//! The record knows which subsystems were addressed (and through which
//! function), how many replies are still outstanding, and the result each
//! subsystem reported. Slots are written at most once.

use crate::domain::entities::ConnectionKey;
use crate::domain::result::ResultCode;
use crate::domain::subsystem::{HmiFunction, MobileFunction, Subsystem};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// State of one subsystem within a fan-out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySlot {
    /// The command never called this subsystem
    NotAddressed,
    /// Called, reply not yet seen
    Pending,
    /// Reply recorded
    Responded(ResultCode),
}

impl ReplySlot {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Snapshot of all subsystem slots, handed to reducers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplySlots {
    pub ui: ReplySlot,
    pub vr: ReplySlot,
    pub tts: ReplySlot,
}

impl ReplySlots {
    pub fn get(&self, subsystem: Subsystem) -> ReplySlot {
        match subsystem {
            Subsystem::Ui => self.ui,
            Subsystem::Vr => self.vr,
            Subsystem::Tts => self.tts,
        }
    }
}

impl Default for ReplySlots {
    fn default() -> Self {
        Self {
            ui: ReplySlot::NotAddressed,
            vr: ReplySlot::NotAddressed,
            tts: ReplySlot::NotAddressed,
        }
    }
}

/// Who is owed the terminal response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandOwner {
    pub connection_key: ConnectionKey,
    /// Correlation id as seen by the application
    pub app_correlation_id: u32,
    pub function: MobileFunction,
}

/// Why a reply could not be recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotError {
    AlreadyResponded,
    NotAddressed,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    function: HmiFunction,
    state: ReplySlot,
}

/// In-flight fan-out, owned by the correlation table until it completes.
#[derive(Debug)]
pub struct FanOutRecord<P> {
    owner: CommandOwner,
    payload: P,
    slots: BTreeMap<Subsystem, Slot>,
    outstanding: usize,
    created_at: Instant,
    timeout: Duration,
}

impl<P> FanOutRecord<P> {
    pub fn new(owner: CommandOwner, payload: P, timeout: Duration) -> Self {
        Self {
            owner,
            payload,
            slots: BTreeMap::new(),
            outstanding: 0,
            created_at: Instant::now(),
            timeout,
        }
    }

    /// Expect a reply from `function`'s subsystem.
    ///
    /// Returns false if that subsystem is already addressed; one call per
    /// subsystem per fan-out.
    pub fn address(&mut self, function: HmiFunction) -> bool {
        let subsystem = function.subsystem();
        if self.slots.contains_key(&subsystem) {
            return false;
        }
        self.slots.insert(
            subsystem,
            Slot {
                function,
                state: ReplySlot::Pending,
            },
        );
        self.outstanding += 1;
        true
    }

    /// Record a reply and return how many remain outstanding.
    pub(crate) fn record(
        &mut self,
        function: HmiFunction,
        code: ResultCode,
    ) -> Result<usize, SlotError> {
        let slot = match self.slots.get_mut(&function.subsystem()) {
            Some(slot) if slot.function == function => slot,
            _ => return Err(SlotError::NotAddressed),
        };
        if !slot.state.is_pending() {
            return Err(SlotError::AlreadyResponded);
        }
        slot.state = ReplySlot::Responded(code);
        // outstanding > 0 whenever a pending slot exists
        self.outstanding -= 1;
        Ok(self.outstanding)
    }

    pub fn slot(&self, subsystem: Subsystem) -> ReplySlot {
        self.slots
            .get(&subsystem)
            .map(|s| s.state)
            .unwrap_or(ReplySlot::NotAddressed)
    }

    pub fn slots(&self) -> ReplySlots {
        ReplySlots {
            ui: self.slot(Subsystem::Ui),
            vr: self.slot(Subsystem::Vr),
            tts: self.slot(Subsystem::Tts),
        }
    }

    /// Functions whose replies have not arrived yet
    pub fn pending_functions(&self) -> Vec<HmiFunction> {
        self.slots
            .values()
            .filter(|s| s.state.is_pending())
            .map(|s| s.function)
            .collect()
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Number of subsystems addressed
    pub fn dispatched(&self) -> usize {
        self.slots.len()
    }

    pub fn responded(&self) -> usize {
        self.slots.len() - self.outstanding
    }

    pub fn owner(&self) -> &CommandOwner {
        &self.owner
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    pub fn is_overdue(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) > self.timeout
    }

    pub fn into_parts(self) -> (CommandOwner, P, ReplySlots) {
        let slots = self.slots();
        (self.owner, self.payload, slots)
    }
}
