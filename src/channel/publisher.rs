use std::sync::Arc;

use super::Halted;
use super::RingBuffer;
use crate::aggregator::partition_hash;
use crate::aggregator::ReleaseHandle;
use crate::utils::time::timestamp_millis;
use crate::EventKind;

/// Producer side of the ingestion ring.
///
/// User calls and the release scheduler publish through the same handle, so scheduled
/// flushes are ordered with user events like any other event.
#[derive(Clone)]
pub(crate) struct Publisher {
    ring: Arc<RingBuffer>,
}

impl Publisher {
    pub(crate) fn new(ring: Arc<RingBuffer>) -> Self {
        Self { ring }
    }

    pub(crate) fn publish_ledger(
        &self,
        key: &str,
        kind: EventKind,
        amount: u64,
    ) -> Result<u64, Halted> {
        debug_assert!(kind.is_ledger());
        let key: Arc<str> = Arc::from(key);
        let key_hash = partition_hash(&key);
        let timestamp_ms = timestamp_millis();
        self.ring
            .publish(move |slot| slot.set_ledger(key, key_hash, kind, amount, timestamp_ms))
    }

    pub(crate) fn publish_release(
        &self,
        key: &str,
        completion: ReleaseHandle,
    ) -> Result<u64, Halted> {
        let key: Arc<str> = Arc::from(key);
        let key_hash = partition_hash(&key);
        let timestamp_ms = timestamp_millis();
        self.ring
            .publish(move |slot| slot.set_release(key, key_hash, timestamp_ms, completion))
    }

    pub(crate) fn publish_release_all(&self) -> Result<u64, Halted> {
        let timestamp_ms = timestamp_millis();
        self.ring
            .publish(move |slot| slot.set_release_all(timestamp_ms))
    }
}
