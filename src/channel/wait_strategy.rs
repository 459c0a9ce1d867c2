//! How consumers wait for a cursor to move.
//!
//! A consumer hands the strategy a closure reporting how far it may read. The strategy
//! returns once that bound passes the consumer's next sequence, or reports [`Halted`] when
//! the channel is being torn down and nothing is left to read.

use std::hint;
use std::sync::atomic::fence;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::thread;

use parking_lot::Condvar;
use parking_lot::Mutex;

use super::Halted;
use crate::constants::PARK_TIMEOUT;
use crate::constants::SPIN_LIMIT;
use crate::PerformanceMode;

pub(crate) trait WaitStrategy: Send + Sync {
    /// Blocks until `available()` exceeds `next` and returns that bound.
    fn wait_for(
        &self,
        next: u64,
        available: &dyn Fn() -> u64,
        halted: &AtomicBool,
    ) -> Result<u64, Halted>;

    /// Wakes waiters after the cursor they depend on moved.
    fn signal_all(&self);
}

pub(crate) fn wait_strategy_for(mode: PerformanceMode) -> Box<dyn WaitStrategy> {
    match mode {
        PerformanceMode::Standard => Box::new(BlockingWaitStrategy::default()),
        PerformanceMode::Maximum => Box::new(YieldingWaitStrategy),
    }
}

/// Parks idle consumers on a condition variable.
#[derive(Debug, Default)]
pub(crate) struct BlockingWaitStrategy {
    mutex: Mutex<()>,
    condvar: Condvar,
    waiters: AtomicUsize,
}

impl WaitStrategy for BlockingWaitStrategy {
    fn wait_for(
        &self,
        next: u64,
        available: &dyn Fn() -> u64,
        halted: &AtomicBool,
    ) -> Result<u64, Halted> {
        let end = available();
        if end > next {
            return Ok(end);
        }

        let mut guard = self.mutex.lock();
        self.waiters.fetch_add(1, Ordering::SeqCst);
        // Pairs with the fence in `signal_all`: either the signaller sees this waiter or
        // the check below sees the signaller's progress.
        fence(Ordering::SeqCst);

        let result = loop {
            let end = available();
            if end > next {
                break Ok(end);
            }
            if halted.load(Ordering::Acquire) {
                break Err(Halted);
            }
            self.condvar.wait_for(&mut guard, PARK_TIMEOUT);
        };

        self.waiters.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn signal_all(&self) {
        fence(Ordering::SeqCst);
        if self.waiters.load(Ordering::SeqCst) > 0 {
            let _guard = self.mutex.lock();
            self.condvar.notify_all();
        }
    }
}

/// Busy-polls with a short spin phase followed by `yield_now`.
#[derive(Debug, Default)]
pub(crate) struct YieldingWaitStrategy;

impl WaitStrategy for YieldingWaitStrategy {
    fn wait_for(
        &self,
        next: u64,
        available: &dyn Fn() -> u64,
        halted: &AtomicBool,
    ) -> Result<u64, Halted> {
        let mut backoff = Backoff::new();
        loop {
            let end = available();
            if end > next {
                return Ok(end);
            }
            if halted.load(Ordering::Acquire) {
                return Err(Halted);
            }
            backoff.snooze();
        }
    }

    fn signal_all(&self) {}
}

/// Exponential spin that degrades into yielding the time slice.
#[derive(Debug, Default)]
pub(crate) struct Backoff {
    step: u32,
}

impl Backoff {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn snooze(&mut self) {
        if self.step <= SPIN_LIMIT {
            for _ in 0..(1u32 << self.step) {
                hint::spin_loop();
            }
            self.step += 1;
        } else {
            thread::yield_now();
        }
    }

    #[cfg(test)]
    pub(crate) fn is_yielding(&self) -> bool {
        self.step > SPIN_LIMIT
    }
}
