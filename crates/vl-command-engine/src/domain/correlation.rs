//! Correlation identity for HMI subsystem calls.
//!
//! Identities are plain integers on the HMI wire. Every call of one fan-out
//! shares the same identity; the function carried by a reply tells the
//! subsystems apart.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Correlation ID linking an outbound subsystem call to its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(u32);

impl CorrelationId {
    /// Wrap a raw identity received from the transport
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw integer
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for CorrelationId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<CorrelationId> for u32 {
    fn from(id: CorrelationId) -> Self {
        id.0
    }
}

/// Monotonic source of correlation IDs.
///
/// Wraps around at `u32::MAX` and never yields zero. Liveness is checked by
/// the correlation table, not here.
#[derive(Debug)]
pub struct CorrelationIdGenerator {
    next: AtomicU32,
}

impl CorrelationIdGenerator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Start the sequence at `first` (zero is skipped).
    pub fn starting_at(first: u32) -> Self {
        Self {
            next: AtomicU32::new(first),
        }
    }

    /// Take the next identity in sequence
    pub fn next_id(&self) -> CorrelationId {
        loop {
            let raw = self.next.fetch_add(1, Ordering::Relaxed);
            if raw != 0 {
                return CorrelationId(raw);
            }
        }
    }
}

impl Default for CorrelationIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
