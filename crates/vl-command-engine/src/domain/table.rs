//! Correlation Table - in-flight fan-outs addressed by correlation identity.
//!
//! Flow:
//! 1. Engine mints a `CorrelationId` and builds a `FanOutRecord`
//! 2. Engine calls `register()` before any subsystem call leaves
//! 3. Each reply goes through `record_reply()`
//! 4. The reply that brings `outstanding` to zero receives the record back
//!    as `ReplyOutcome::Completed`; the record is gone from the table in the
//!    same critical section, so exactly one caller ever finalizes it
//!
//! No method calls back into the table while holding a shard guard.

use crate::domain::correlation::{CorrelationId, CorrelationIdGenerator};
use crate::domain::entities::ConnectionKey;
use crate::domain::fanout::{FanOutRecord, SlotError};
use crate::domain::result::ResultCode;
use crate::domain::subsystem::HmiFunction;
use crate::error::{EngineError, EngineResult};
use dashmap::mapref::entry::Entry;
use dashmap::mapref::one::Ref;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, warn};

/// What a recorded reply did to its record
#[derive(Debug)]
pub enum ReplyOutcome<P> {
    /// Replies are still missing; the caller must not act further
    StillPending { outstanding: usize },
    /// This reply was the last one; the caller now owns the record
    Completed(FanOutRecord<P>),
}

/// `register` was given a live identity
#[derive(Debug)]
pub struct RegisterError<P> {
    pub id: CorrelationId,
    pub record: FanOutRecord<P>,
}

impl<P> From<RegisterError<P>> for EngineError {
    fn from(err: RegisterError<P>) -> Self {
        EngineError::DuplicateCorrelation { id: err.id }
    }
}

/// Statistics for the correlation table
#[derive(Debug, Default)]
pub struct TableStats {
    /// Records registered
    pub total_registered: AtomicU64,
    /// Records handed out as completed
    pub total_completed: AtomicU64,
    /// Replies ignored because the slot had already answered
    pub total_duplicate_replies: AtomicU64,
    /// Replies for ids with no live record
    pub total_unknown_replies: AtomicU64,
    /// Replies from subsystems the record never addressed
    pub total_unexpected_replies: AtomicU64,
    /// Records discarded without completion
    pub total_removed: AtomicU64,
}

/// Process-wide map from correlation identity to fan-out record.
#[derive(Debug)]
pub struct CorrelationTable<P> {
    records: DashMap<CorrelationId, FanOutRecord<P>>,
    ids: CorrelationIdGenerator,
    stats: TableStats,
}

impl<P> CorrelationTable<P> {
    pub fn new() -> Self {
        Self::with_generator(CorrelationIdGenerator::new())
    }

    pub fn with_generator(ids: CorrelationIdGenerator) -> Self {
        Self {
            records: DashMap::new(),
            ids,
            stats: TableStats::default(),
        }
    }

    /// Next identity that is not currently live.
    pub fn mint(&self) -> CorrelationId {
        loop {
            let id = self.ids.next_id();
            if !self.records.contains_key(&id) {
                return id;
            }
        }
    }

    /// Register a record under `id`.
    ///
    /// A live `id` fails with the record handed back untouched.
    pub fn register(
        &self,
        id: CorrelationId,
        record: FanOutRecord<P>,
    ) -> Result<(), RegisterError<P>> {
        match self.records.entry(id) {
            Entry::Occupied(_) => Err(RegisterError { id, record }),
            Entry::Vacant(slot) => {
                debug!(
                    correlation_id = %id,
                    function = %record.owner().function,
                    outstanding = record.outstanding(),
                    "Registered fan-out record"
                );
                slot.insert(record);
                self.stats.total_registered.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
        }
    }

    /// Read access to a live record.
    ///
    /// The guard locks a shard; drop it before calling other table methods.
    pub fn lookup(&self, id: CorrelationId) -> Option<Ref<'_, CorrelationId, FanOutRecord<P>>> {
        self.records.get(&id)
    }

    /// Record a subsystem reply: mark the slot, decrement, and remove the
    /// record if nothing is outstanding, all under the shard lock.
    pub fn record_reply(
        &self,
        id: CorrelationId,
        function: HmiFunction,
        code: ResultCode,
    ) -> EngineResult<ReplyOutcome<P>> {
        let mut verdict = None;
        let removed = self.records.remove_if_mut(&id, |_, record| {
            let result = record.record(function, code);
            let complete = matches!(result, Ok(0));
            verdict = Some(result);
            complete
        });

        match (removed, verdict) {
            (Some((_, record)), _) => {
                self.stats.total_completed.fetch_add(1, Ordering::Relaxed);
                Ok(ReplyOutcome::Completed(record))
            }
            (None, Some(Ok(outstanding))) => Ok(ReplyOutcome::StillPending { outstanding }),
            (None, Some(Err(SlotError::AlreadyResponded))) => {
                self.stats
                    .total_duplicate_replies
                    .fetch_add(1, Ordering::Relaxed);
                Err(EngineError::DuplicateReply { id, function })
            }
            (None, Some(Err(SlotError::NotAddressed))) => {
                self.stats
                    .total_unexpected_replies
                    .fetch_add(1, Ordering::Relaxed);
                Err(EngineError::UnexpectedReply { id, function })
            }
            (None, None) => {
                self.stats
                    .total_unknown_replies
                    .fetch_add(1, Ordering::Relaxed);
                Err(EngineError::UnknownCorrelation { id })
            }
        }
    }

    /// Remove a record without completing it. Unknown ids are a no-op.
    pub fn remove(&self, id: CorrelationId) -> Option<FanOutRecord<P>> {
        let removed = self.records.remove(&id).map(|(_, record)| record);
        if removed.is_some() {
            self.stats.total_removed.fetch_add(1, Ordering::Relaxed);
        }
        removed
    }

    /// Remove every record owed to `connection_key`.
    pub fn abandon_owner(
        &self,
        connection_key: ConnectionKey,
    ) -> Vec<(CorrelationId, FanOutRecord<P>)> {
        let ids: Vec<CorrelationId> = self
            .records
            .iter()
            .filter(|entry| entry.value().owner().connection_key == connection_key)
            .map(|entry| *entry.key())
            .collect();

        let abandoned: Vec<_> = ids
            .into_iter()
            .filter_map(|id| self.remove(id).map(|record| (id, record)))
            .collect();

        if !abandoned.is_empty() {
            warn!(
                connection_key = %connection_key,
                count = abandoned.len(),
                "Abandoned fan-out records"
            );
        }
        abandoned
    }

    /// Identities of records past their deadline
    pub fn overdue(&self, now: Instant) -> Vec<CorrelationId> {
        self.records
            .iter()
            .filter(|entry| entry.value().is_overdue(now))
            .map(|entry| *entry.key())
            .collect()
    }

    /// Functions still awaited by a record, if it is live
    pub fn pending_functions(&self, id: CorrelationId) -> Option<Vec<HmiFunction>> {
        self.records.get(&id).map(|r| r.pending_functions())
    }

    pub fn contains(&self, id: CorrelationId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stats(&self) -> &TableStats {
        &self.stats
    }
}

impl<P> Default for CorrelationTable<P> {
    fn default() -> Self {
        Self::new()
    }
}
