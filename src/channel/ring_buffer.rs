use std::cell::UnsafeCell;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use super::wait_strategy_for;
use super::Backoff;
use super::EventSlot;
use super::Halted;
use super::Sequence;
use super::WaitStrategy;
use crate::PerformanceMode;

/// Pre-allocated multi-producer, multicast ring.
///
/// Sequence `s` lives in slot `s & mask`. A slot is published for sequence `s` once its
/// availability word reads `s + 1`, so a word left over from an earlier lap never looks
/// published.
pub(crate) struct RingBuffer {
    slots: Box<[UnsafeCell<EventSlot>]>,
    published: Box<[AtomicU64]>,
    mask: u64,
    capacity: u64,
    /// Next sequence handed to a producer
    claimed: Sequence,
    /// One cursor per worker
    worker_cursors: Box<[Sequence]>,
    /// Producers may write sequence `s` only once `s < reclaimed + capacity`
    reclaimed: Sequence,
    /// Workers waiting on producers
    publish_wait: Box<dyn WaitStrategy>,
    /// Reclaimer waiting on workers
    progress_wait: Box<dyn WaitStrategy>,
    halted: AtomicBool,
    /// Producers between their halt check and their availability store
    in_flight: AtomicUsize,
}

// SAFETY: Slot access is coordinated by the cursors. A producer writes a slot only between
// claiming its sequence and flagging it published, after the reclaimer released the previous
// lap. Workers only read published slots below the reclaimer's bound, and the reclaimer
// mutates a slot only after every worker cursor moved past it.
unsafe impl Sync for RingBuffer {}

impl RingBuffer {
    /// `capacity` must be a power of two and `worker_count` positive; both are enforced by
    /// configuration validation.
    pub(crate) fn new(
        capacity: usize,
        worker_count: usize,
        mode: PerformanceMode,
    ) -> Self {
        debug_assert!(capacity.is_power_of_two());
        debug_assert!(worker_count > 0);

        Self {
            slots: (0..capacity)
                .map(|_| UnsafeCell::new(EventSlot::default()))
                .collect(),
            published: (0..capacity).map(|_| AtomicU64::new(0)).collect(),
            mask: capacity as u64 - 1,
            capacity: capacity as u64,
            claimed: Sequence::new(0),
            worker_cursors: (0..worker_count).map(|_| Sequence::new(0)).collect(),
            reclaimed: Sequence::new(0),
            publish_wait: wait_strategy_for(mode),
            progress_wait: wait_strategy_for(mode),
            halted: AtomicBool::new(false),
            in_flight: AtomicUsize::new(0),
        }
    }

    #[inline]
    fn index(
        &self,
        sequence: u64,
    ) -> usize {
        (sequence & self.mask) as usize
    }

    pub(crate) fn capacity(&self) -> u64 {
        self.capacity
    }

    pub(crate) fn worker_count(&self) -> usize {
        self.worker_cursors.len()
    }

    /// Claims the next sequence, waits for its slot to be free, fills it with `write` and
    /// publishes it.
    ///
    /// Waiting on a full ring is the channel's backpressure. It only ends early when the
    /// ring is halted, in which case nothing is written.
    pub(crate) fn publish<F>(
        &self,
        write: F,
    ) -> Result<u64, Halted>
    where
        F: FnOnce(&mut EventSlot),
    {
        let _in_flight = InFlight::enter(&self.in_flight);
        // pairs with the SeqCst store in `halt`: either this producer sees the flag or
        // `wait_for_in_flight` sees this producer
        if self.halted.load(Ordering::SeqCst) {
            return Err(Halted);
        }

        let sequence = self.claimed.claim_next();
        let mut backoff = Backoff::new();
        while sequence >= self.reclaimed.get() + self.capacity {
            if self.is_halted() {
                return Err(Halted);
            }
            backoff.snooze();
        }

        let index = self.index(sequence);
        // SAFETY: `sequence` was claimed by this producer alone, and the reclaimer cursor
        // is past `sequence - capacity`, so no consumer still references this slot.
        unsafe { write(&mut *self.slots[index].get()) };
        self.published[index].store(sequence + 1, Ordering::Release);
        self.publish_wait.signal_all();

        Ok(sequence)
    }

    /// Exclusive end of the contiguous published run starting at `next`.
    pub(crate) fn published_end(
        &self,
        next: u64,
    ) -> u64 {
        let claimed = self.claimed.get();
        let mut sequence = next;
        while sequence < claimed
            && self.published[self.index(sequence)].load(Ordering::Acquire) == sequence + 1
        {
            sequence += 1;
        }
        sequence
    }

    /// Cursor of the slowest worker.
    pub(crate) fn slowest_worker(&self) -> u64 {
        self.worker_cursors
            .iter()
            .map(Sequence::get)
            .min()
            .unwrap_or(0)
    }

    /// Waits until sequences past `next` are published; returns the exclusive end.
    pub(crate) fn wait_for_published(
        &self,
        next: u64,
    ) -> Result<u64, Halted> {
        self.publish_wait
            .wait_for(next, &|| self.published_end(next), &self.halted)
    }

    /// Waits until every worker moved past `next`; returns the exclusive end.
    pub(crate) fn wait_for_workers(
        &self,
        next: u64,
    ) -> Result<u64, Halted> {
        self.progress_wait
            .wait_for(next, &|| self.slowest_worker(), &self.halted)
    }

    pub(crate) fn worker_cursor(
        &self,
        worker: usize,
    ) -> u64 {
        self.worker_cursors[worker].get()
    }

    /// Records that `worker` is done with every sequence below `next`.
    pub(crate) fn advance_worker(
        &self,
        worker: usize,
        next: u64,
    ) {
        self.worker_cursors[worker].set(next);
        self.progress_wait.signal_all();
    }

    pub(crate) fn reclaimed(&self) -> u64 {
        self.reclaimed.get()
    }

    /// Frees every slot below `next` for producers.
    pub(crate) fn advance_reclaimed(
        &self,
        next: u64,
    ) {
        self.reclaimed.set(next);
    }

    pub(crate) fn claimed(&self) -> u64 {
        self.claimed.get()
    }

    /// Read access to a published slot.
    ///
    /// # Safety
    /// `sequence` must be published and the calling consumer's cursor must still be at or
    /// below it, which keeps the reclaimer and the next producer away from the slot.
    pub(crate) unsafe fn slot(
        &self,
        sequence: u64,
    ) -> &EventSlot {
        &*self.slots[self.index(sequence)].get()
    }

    /// Clears a slot every worker has passed.
    ///
    /// # Safety
    /// Every worker cursor must be past `sequence` and the reclaimed cursor must not be,
    /// so neither consumers nor producers touch the slot concurrently.
    pub(crate) unsafe fn clear(
        &self,
        sequence: u64,
    ) {
        (*self.slots[self.index(sequence)].get()).clear();
    }

    /// Clears every published slot the reclaimer has not recycled yet, dropping any
    /// completion handle still attached, and returns how many there were.
    ///
    /// # Safety
    /// No consumer thread may be running. Call it after [`RingBuffer::wait_for_in_flight`]
    /// so that no late producer publishes behind it.
    pub(crate) unsafe fn discard_remaining(&self) -> usize {
        let claimed = self.claimed();
        let mut discarded = 0;
        for sequence in self.reclaimed()..claimed {
            let index = self.index(sequence);
            if self.published[index].load(Ordering::Acquire) == sequence + 1 {
                (*self.slots[index].get()).clear();
                discarded += 1;
            }
        }
        discarded
    }

    /// Wakes every waiting consumer and makes them return once they run dry.
    pub(crate) fn halt(&self) {
        self.halted.store(true, Ordering::SeqCst);
        self.publish_wait.signal_all();
        self.progress_wait.signal_all();
    }

    pub(crate) fn is_halted(&self) -> bool {
        self.halted.load(Ordering::Acquire)
    }

    /// Producers currently inside `publish`.
    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Waits for every producer that entered `publish` before [`RingBuffer::halt`] to
    /// finish. Once it returns no slot can become published anymore, which makes
    /// `discard_remaining` final.
    pub(crate) fn wait_for_in_flight(&self) {
        debug_assert!(self.is_halted());
        let mut backoff = Backoff::new();
        while self.in_flight() > 0 {
            backoff.snooze();
        }
    }
}

/// Counts a producer as in flight until dropped, whichever way `publish` returns.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
