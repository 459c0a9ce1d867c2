use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

/// Diagnostics a worker publishes after every batch it consumes.
///
/// Written by the owning worker only; any thread may read them.
#[derive(Debug, Default)]
pub(crate) struct WorkerStats {
    resident_keys: AtomicUsize,
    pending_events: AtomicUsize,
    releases: AtomicU64,
    processed: AtomicU64,
}

impl WorkerStats {
    pub(crate) fn publish(
        &self,
        resident_keys: usize,
        pending_events: usize,
        releases: u64,
        processed: u64,
    ) {
        self.resident_keys.store(resident_keys, Ordering::Relaxed);
        self.pending_events.store(pending_events, Ordering::Relaxed);
        self.releases.store(releases, Ordering::Relaxed);
        self.processed.store(processed, Ordering::Release);
    }

    pub(crate) fn snapshot(
        &self,
        worker: usize,
    ) -> WorkerSnapshot {
        let processed = self.processed.load(Ordering::Acquire);
        WorkerSnapshot {
            worker,
            resident_keys: self.resident_keys.load(Ordering::Relaxed),
            pending_events: self.pending_events.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
            processed,
        }
    }
}

/// Point-in-time view of one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSnapshot {
    pub worker: usize,
    /// Keys with state currently held by the worker
    pub resident_keys: usize,
    /// Applied events not released yet
    pub pending_events: usize,
    /// Non-empty releases so far
    pub releases: u64,
    /// Ring sequences consumed so far
    pub processed: u64,
}
