use std::sync::Arc;

use tracing::info;

use crate::channel::Halted;
use crate::channel::RingBuffer;

/// Final consumer of the ring: clears slots every worker has passed and hands them back
/// to producers.
pub(crate) struct SlotReclaimer {
    ring: Arc<RingBuffer>,
}

impl SlotReclaimer {
    pub(crate) fn new(ring: Arc<RingBuffer>) -> Self {
        Self { ring }
    }

    pub(crate) fn run(self) {
        info!("[Reclaimer] started");
        let mut next = self.ring.reclaimed();
        loop {
            let end = match self.ring.wait_for_workers(next) {
                Ok(end) => end,
                Err(Halted) => break,
            };

            for sequence in next..end {
                // SAFETY: every worker cursor is at `end` or beyond and producers wait for
                // the reclaimed cursor, so nothing else touches these slots.
                unsafe { self.ring.clear(sequence) };
            }
            next = end;
            self.ring.advance_reclaimed(next);
        }
        info!("[Reclaimer] stopped at sequence {}", next);
    }
}
