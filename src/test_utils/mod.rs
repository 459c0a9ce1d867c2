//! Helpers shared by the unit tests of every module.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::aggregator::partition_hash;
use crate::aggregator::Partition;
use crate::aggregator::ReleaseHandle;
use crate::channel::EventSlot;
use crate::EventKind;
use crate::ReleaseListener;
use crate::ReleaseResult;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    env_logger::init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for unit test.");
}

/// Records every release a listener receives.
#[derive(Clone, Default)]
pub struct ReleaseCollector {
    releases: Arc<Mutex<Vec<ReleaseResult>>>,
}

impl ReleaseCollector {
    pub fn listener(&self) -> Arc<dyn ReleaseListener> {
        let releases = self.releases.clone();
        Arc::new(move |release: &ReleaseResult| releases.lock().push(release.clone()))
    }

    pub fn releases(&self) -> Vec<ReleaseResult> {
        self.releases.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.releases.lock().len()
    }

    pub fn for_key(
        &self,
        key: &str,
    ) -> Vec<ReleaseResult> {
        self.releases
            .lock()
            .iter()
            .filter(|release| release.key() == key)
            .cloned()
            .collect()
    }
}

pub(crate) fn ledger_slot(
    key: &str,
    kind: EventKind,
    amount: u64,
) -> EventSlot {
    let mut slot = EventSlot::default();
    slot.set_ledger(Arc::from(key), partition_hash(key), kind, amount, 0);
    slot
}

pub(crate) fn credit_slot(
    key: &str,
    amount: u64,
) -> EventSlot {
    ledger_slot(key, EventKind::Credit, amount)
}

pub(crate) fn debit_slot(
    key: &str,
    amount: u64,
) -> EventSlot {
    ledger_slot(key, EventKind::Debit, amount)
}

pub(crate) fn release_slot(key: &str) -> (EventSlot, oneshot::Receiver<Option<ReleaseResult>>) {
    let (handle, receiver) = ReleaseHandle::new();
    let mut slot = EventSlot::default();
    slot.set_release(Arc::from(key), partition_hash(key), 0, handle);
    (slot, receiver)
}

pub(crate) fn release_all_slot() -> EventSlot {
    let mut slot = EventSlot::default();
    slot.set_release_all(0);
    slot
}

/// First `{prefix}-{n}` key owned by `worker` among `count` workers.
pub(crate) fn key_owned_by(
    prefix: &str,
    worker: usize,
    count: usize,
) -> String {
    (0..)
        .map(|n| format!("{}-{}", prefix, n))
        .find(|key| Partition::owner_of(partition_hash(key), count) == worker)
        .unwrap_or_default()
}
