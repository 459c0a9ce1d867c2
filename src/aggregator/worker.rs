//! Partition worker.
//!
//! A worker observes every sequence of the ingestion ring, keeps the events whose key hash
//! it owns and ignores the rest. Balance loading, release and listener calls all run inline
//! on the worker thread before it moves to the next sequence.

use std::panic;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::trace;

use super::release_policy::ReleasePolicy;
use super::KeyState;
use super::Partition;
use super::ReleaseDispatcher;
use super::WorkerStats;
use crate::channel::EventSlot;
use crate::channel::Halted;
use crate::channel::RingBuffer;
use crate::errors::LoaderError;
use crate::metrics::WorkerMetrics;
use crate::metrics::LOADER_FAILURES_METRIC;
use crate::metrics::REJECTED_EVENTS_METRIC;
use crate::utils::panic::panic_message;
use crate::BalanceLoader;
use crate::EventKind;
use crate::EvictionPolicy;
use crate::ReleaseResult;
use crate::WorkerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReleaseReason {
    /// Inline policy check after an applied event
    Threshold,
    /// Single-key RELEASE event
    Explicit,
    /// RELEASE_ALL event, scheduled or user issued
    Flush,
}

impl ReleaseReason {
    fn as_str(self) -> &'static str {
        match self {
            ReleaseReason::Threshold => "threshold",
            ReleaseReason::Explicit => "explicit",
            ReleaseReason::Flush => "flush",
        }
    }
}

pub(crate) struct LedgerWorker {
    partition: Partition,
    states: FxHashMap<Arc<str>, KeyState>,
    policy: Box<dyn ReleasePolicy>,
    loader: Option<Arc<dyn BalanceLoader>>,
    default_balance: i64,
    eviction: EvictionPolicy,
    dispatcher: ReleaseDispatcher,
    /// Applied events not released yet, over all keys
    pending_events: usize,
    releases: u64,
    stats: Arc<WorkerStats>,
    metrics: WorkerMetrics,
}

impl LedgerWorker {
    pub(crate) fn new(
        partition: Partition,
        config: &WorkerConfig,
        policy: Box<dyn ReleasePolicy>,
        loader: Option<Arc<dyn BalanceLoader>>,
        dispatcher: ReleaseDispatcher,
    ) -> Self {
        Self {
            partition,
            states: FxHashMap::default(),
            policy,
            loader,
            default_balance: config.default_balance,
            eviction: config.eviction_policy,
            dispatcher,
            pending_events: 0,
            releases: 0,
            stats: Arc::new(WorkerStats::default()),
            metrics: WorkerMetrics::new(partition.index()),
        }
    }

    pub(crate) fn index(&self) -> usize {
        self.partition.index()
    }

    pub(crate) fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Consumes the ring until it is halted and drained.
    pub(crate) fn run(
        mut self,
        ring: Arc<RingBuffer>,
    ) {
        let index = self.index();
        info!("[Worker-{}] started", index);

        let mut next = ring.worker_cursor(index);
        loop {
            let end = match ring.wait_for_published(next) {
                Ok(end) => end,
                Err(Halted) => break,
            };

            while next < end {
                // SAFETY: `next` is published and this worker's cursor has not moved past it,
                // so the reclaimer cannot recycle the slot while it is read.
                let slot = unsafe { ring.slot(next) };
                self.on_event(slot);
                next += 1;
            }

            ring.advance_worker(index, next);
            self.publish_stats(next);
        }

        info!(
            "[Worker-{}] stopped at sequence {} with {} resident keys",
            index,
            next,
            self.states.len()
        );
    }

    /// Handles one ring event.
    pub(crate) fn on_event(
        &mut self,
        slot: &EventSlot,
    ) {
        let Some(kind) = slot.kind else {
            return;
        };

        if kind == EventKind::ReleaseAll {
            self.release_all();
            return;
        }

        let Some(key) = slot.key.as_ref() else {
            return;
        };
        if !self.partition.owns(slot.key_hash) {
            return;
        }

        match kind {
            EventKind::Credit | EventKind::Debit => {
                self.apply(key, kind, slot.amount, slot.timestamp_ms)
            }
            EventKind::Release => {
                let result = self.release_key(key, ReleaseReason::Explicit);
                if let Some(completion) = &slot.completion {
                    if !completion.fulfill(result) {
                        debug!(key = &**key, "release caller stopped waiting");
                    }
                }
            }
            EventKind::ReleaseAll => {}
        }
    }

    fn apply(
        &mut self,
        key: &Arc<str>,
        kind: EventKind,
        amount: u64,
        timestamp_ms: u64,
    ) {
        let state = self
            .states
            .entry(Arc::clone(key))
            .or_insert_with(|| KeyState::new(Arc::clone(key)));

        if !state.is_initialized() {
            match load_balance(self.loader.as_deref(), self.default_balance, key) {
                Ok(balance) => {
                    trace!(key = &**key, balance, "key initialized");
                    state.initialize(balance);
                }
                Err(e) => {
                    error!("[Worker-{}] {} event rejected: {}", self.partition.index(), kind, e);
                    LOADER_FAILURES_METRIC.inc();
                    // uninitialized state never holds pending events
                    self.states.remove(&**key);
                    return;
                }
            }
        }

        let sequence = match state.apply(kind, amount, timestamp_ms) {
            Ok(sequence) => sequence,
            Err(e) => {
                error!("[Worker-{}] event rejected: {}", self.partition.index(), e);
                REJECTED_EVENTS_METRIC.inc();
                return;
            }
        };
        let pending = state.pending_count();
        self.pending_events += 1;
        self.metrics.events_applied.inc();
        trace!(key = &**key, sequence, %kind, amount, "event applied");

        if self.policy.should_release_inline(pending) {
            self.release_key(key, ReleaseReason::Threshold);
        }
    }

    /// Releases one key.
    ///
    /// Unknown or empty keys yield `None` and leave no state behind.
    pub(crate) fn release_key(
        &mut self,
        key: &str,
        reason: ReleaseReason,
    ) -> Option<ReleaseResult> {
        let state = self.states.get_mut(key)?;
        let release = state.release()?;

        self.pending_events -= release.event_count() as usize;
        self.releases += 1;
        self.metrics.record_release(reason.as_str());
        self.metrics.released_events.inc_by(release.event_count());
        self.metrics
            .release_duration
            .observe(release.duration().as_secs_f64() * 1_000_000.0);
        debug!(
            key,
            events = release.event_count(),
            delta = release.delta(),
            balance = state.committed_balance(),
            last_committed_sequence = state.last_committed_sequence(),
            reason = reason.as_str(),
            "key released"
        );

        self.dispatcher.dispatch(&release);

        if self.eviction == EvictionPolicy::AfterRelease {
            self.states.remove(key);
            self.metrics.evictions.inc();
            trace!(key, "key state evicted");
        }

        Some(release)
    }

    /// Releases every owned key with pending events; returns how many were released.
    pub(crate) fn release_all(&mut self) -> usize {
        let keys: Vec<Arc<str>> = self
            .states
            .iter()
            .filter(|(_, state)| state.pending_count() > 0)
            .map(|(key, _)| Arc::clone(key))
            .collect();

        let mut released = 0;
        for key in keys {
            if self.release_key(&key, ReleaseReason::Flush).is_some() {
                released += 1;
            }
        }
        released
    }

    fn publish_stats(
        &self,
        processed: u64,
    ) {
        self.stats
            .publish(self.states.len(), self.pending_events, self.releases, processed);
    }

    #[cfg(test)]
    pub(crate) fn key_state(
        &self,
        key: &str,
    ) -> Option<&KeyState> {
        self.states.get(key)
    }

    #[cfg(test)]
    pub(crate) fn resident_keys(&self) -> usize {
        self.states.len()
    }
}

fn load_balance(
    loader: Option<&dyn BalanceLoader>,
    default_balance: i64,
    key: &str,
) -> Result<i64, LoaderError> {
    let Some(loader) = loader else {
        return Ok(default_balance);
    };

    match panic::catch_unwind(AssertUnwindSafe(|| loader.load(key))) {
        Ok(Ok(balance)) => Ok(balance),
        Ok(Err(source)) => Err(LoaderError::Failed {
            key: key.to_string(),
            source,
        }),
        Err(payload) => Err(LoaderError::Panicked {
            key: key.to_string(),
            message: panic_message(payload.as_ref()).to_string(),
        }),
    }
}
