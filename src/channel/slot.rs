use std::sync::Arc;

use crate::aggregator::ReleaseHandle;
use crate::EventKind;

/// Reusable event cell of the ingestion ring.
///
/// Written by exactly one producer per lap, read by every worker, cleared by the reclaimer.
#[derive(Debug, Default)]
pub(crate) struct EventSlot {
    pub(crate) key: Option<Arc<str>>,
    /// Partition hash of `key`, computed once by the producer
    pub(crate) key_hash: u64,
    /// `None` while the slot is clear
    pub(crate) kind: Option<EventKind>,
    pub(crate) amount: u64,
    pub(crate) timestamp_ms: u64,
    pub(crate) completion: Option<ReleaseHandle>,
}

impl EventSlot {
    pub(crate) fn set_ledger(
        &mut self,
        key: Arc<str>,
        key_hash: u64,
        kind: EventKind,
        amount: u64,
        timestamp_ms: u64,
    ) {
        self.key = Some(key);
        self.key_hash = key_hash;
        self.kind = Some(kind);
        self.amount = amount;
        self.timestamp_ms = timestamp_ms;
        self.completion = None;
    }

    pub(crate) fn set_release(
        &mut self,
        key: Arc<str>,
        key_hash: u64,
        timestamp_ms: u64,
        completion: ReleaseHandle,
    ) {
        self.key = Some(key);
        self.key_hash = key_hash;
        self.kind = Some(EventKind::Release);
        self.amount = 0;
        self.timestamp_ms = timestamp_ms;
        self.completion = Some(completion);
    }

    pub(crate) fn set_release_all(
        &mut self,
        timestamp_ms: u64,
    ) {
        self.key = None;
        self.key_hash = 0;
        self.kind = Some(EventKind::ReleaseAll);
        self.amount = 0;
        self.timestamp_ms = timestamp_ms;
        self.completion = None;
    }

    /// Drops the key and any completion handle nobody answered.
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    #[cfg(test)]
    pub(crate) fn is_clear(&self) -> bool {
        self.kind.is_none() && self.key.is_none() && self.completion.is_none()
    }
}
