use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

/// Cursor into the ring, padded to its own cache line.
///
/// Consumer cursors hold the next sequence the consumer will read, so every sequence
/// below the value has been fully handled.
#[repr(align(64))]
#[derive(Debug, Default)]
pub(crate) struct Sequence {
    value: AtomicU64,
}

impl Sequence {
    pub(crate) fn new(initial: u64) -> Self {
        Self {
            value: AtomicU64::new(initial),
        }
    }

    pub(crate) fn get(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }

    pub(crate) fn set(
        &self,
        value: u64,
    ) {
        self.value.store(value, Ordering::Release);
    }

    /// Hands out the current value and moves the cursor past it.
    pub(crate) fn claim_next(&self) -> u64 {
        self.value.fetch_add(1, Ordering::AcqRel)
    }
}
