//! Engine facade.
//!
//! [`LedgerEngine`] wires the ingestion ring, one [`LedgerWorker`] thread per partition, the
//! slot reclaimer and, for TIME/HYBRID policies, the release scheduler. Every method takes
//! `&self`, so an engine is usually shared between producer threads behind an `Arc`.
//!
//! Threads:
//! - `ledger-worker-{i}`: consumes the ring and owns the keys of partition `i`
//! - `ledger-slot-reclaimer`: recycles slots once every worker has passed them
//! - `ledger-release-scheduler`: periodic flush-all (TIME/HYBRID only)

mod builder;
mod scheduler;
pub use builder::*;
pub(crate) use scheduler::*;


use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;

use parking_lot::Mutex;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::aggregator::release_policy::build_policy;
use crate::aggregator::LedgerWorker;
use crate::aggregator::Partition;
use crate::aggregator::ReleaseDispatcher;
use crate::aggregator::ReleaseHandle;
use crate::aggregator::SlotReclaimer;
use crate::aggregator::WorkerStats;
use crate::channel::Publisher;
use crate::channel::RingBuffer;
use crate::constants::RECLAIMER_THREAD_NAME;
use crate::constants::SHUTDOWN_POLL_INTERVAL;
use crate::constants::WORKER_THREAD_PREFIX;
use crate::BalanceLoader;
use crate::EngineConfig;
use crate::Error;
use crate::EventKind;
use crate::ReleaseListener;
use crate::ReleaseResult;
use crate::Result;
use crate::WorkerSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Created,
    Running,
    Stopped,
}

pub struct LedgerEngine {
    config: EngineConfig,
    ring: Arc<RingBuffer>,
    publisher: Publisher,
    /// Workers waiting to be moved onto their threads by `start()`
    workers: Mutex<Vec<LedgerWorker>>,
    stats: Vec<Arc<WorkerStats>>,
    threads: Mutex<Vec<JoinHandle<()>>>,
    scheduler: Mutex<Option<ReleaseScheduler>>,
    lifecycle: Mutex<Lifecycle>,
    /// Set once shutdown begins; user publishes are rejected from then on
    closed: AtomicBool,
}

impl LedgerEngine {
    pub fn builder() -> LedgerBuilder {
        LedgerBuilder::new()
    }

    pub(crate) fn new(
        config: EngineConfig,
        listener: Option<Arc<dyn ReleaseListener>>,
        loader: Option<Arc<dyn BalanceLoader>>,
    ) -> Self {
        let worker_count = config.worker.worker_count;
        let ring = Arc::new(RingBuffer::new(
            config.channel.buffer_capacity,
            worker_count,
            config.channel.performance_mode,
        ));
        let dispatcher = ReleaseDispatcher::new(listener);

        let workers: Vec<LedgerWorker> = (0..worker_count)
            .map(|index| {
                LedgerWorker::new(
                    Partition::new(index, worker_count),
                    &config.worker,
                    build_policy(&config.release),
                    loader.clone(),
                    dispatcher.clone(),
                )
            })
            .collect();
        let stats = workers.iter().map(LedgerWorker::stats).collect();

        Self {
            publisher: Publisher::new(ring.clone()),
            ring,
            workers: Mutex::new(workers),
            stats,
            threads: Mutex::new(Vec::new()),
            scheduler: Mutex::new(None),
            lifecycle: Mutex::new(Lifecycle::Created),
            closed: AtomicBool::new(false),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Spawns the worker threads and the slot reclaimer, then the release scheduler when
    /// the policy needs one.
    ///
    /// Events published before `start()` are buffered in the ring (publishers block once
    /// it is full) and processed once the workers run.
    pub fn start(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();
        match *lifecycle {
            Lifecycle::Running => return Err(Error::AlreadyStarted),
            Lifecycle::Stopped => return Err(Error::EngineShutdown),
            Lifecycle::Created => {}
        }

        if let Err(e) = self.spawn_threads() {
            error!("engine start failed: {}", e);
            self.closed.store(true, Ordering::Release);
            self.ring.halt();
            self.join_threads();
            *lifecycle = Lifecycle::Stopped;
            return Err(e);
        }

        *lifecycle = Lifecycle::Running;
        info!(
            "ledger engine started: {} workers, capacity {}, {:?} release, {:?} mode",
            self.config.worker.worker_count,
            self.ring.capacity(),
            self.config.release.policy,
            self.config.channel.performance_mode
        );
        Ok(())
    }

    fn spawn_threads(&self) -> Result<()> {
        let workers = std::mem::take(&mut *self.workers.lock());
        let mut threads = self.threads.lock();

        for worker in workers {
            let ring = self.ring.clone();
            let handle = thread::Builder::new()
                .name(format!("{}-{}", WORKER_THREAD_PREFIX, worker.index()))
                .spawn(move || worker.run(ring))?;
            threads.push(handle);
        }

        let reclaimer = SlotReclaimer::new(self.ring.clone());
        threads.push(
            thread::Builder::new()
                .name(RECLAIMER_THREAD_NAME.to_string())
                .spawn(move || reclaimer.run())?,
        );
        drop(threads);

        let policy = build_policy(&self.config.release);
        if let Some(interval) = policy.flush_interval() {
            let scheduler = ReleaseScheduler::start(
                interval,
                self.publisher.clone(),
                self.config.release.scheduler_shutdown_timeout(),
            )?;
            *self.scheduler.lock() = Some(scheduler);
        }
        Ok(())
    }

    /// Stops the engine after releasing everything still pending.
    ///
    /// Order: stop the scheduler (bounded wait), reject new publishes, publish one final
    /// RELEASE_ALL and wait until it is fully processed, halt the ring, join every thread.
    /// Events that slipped in behind the final RELEASE_ALL are discarded once their
    /// producers left the ring; a `release()` among them fails with
    /// [`Error::ReleaseInterrupted`].
    /// Calling it again, or before `start()`, is fine.
    pub fn shutdown(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();
        match *lifecycle {
            Lifecycle::Stopped => return Ok(()),
            Lifecycle::Created => {
                self.closed.store(true, Ordering::Release);
                self.ring.halt();
                self.ring.wait_for_in_flight();
                // SAFETY: no consumer thread was ever started.
                let discarded = unsafe { self.ring.discard_remaining() };
                if discarded > 0 {
                    warn!("engine shut down before start, {} events discarded", discarded);
                }
                *lifecycle = Lifecycle::Stopped;
                return Ok(());
            }
            Lifecycle::Running => {}
        }

        info!("ledger engine shutting down");
        if let Some(scheduler) = self.scheduler.lock().take() {
            scheduler.stop();
        }

        self.closed.store(true, Ordering::Release);
        let drained = match self.publisher.publish_release_all() {
            Ok(final_flush) => self.wait_until_reclaimed(final_flush),
            Err(e) => {
                warn!("final release could not be published: {}", e);
                false
            }
        };

        self.ring.halt();
        self.join_threads();
        self.ring.wait_for_in_flight();

        // SAFETY: every consumer thread has been joined.
        let discarded = unsafe { self.ring.discard_remaining() };
        if !drained || discarded > 0 {
            warn!(
                "engine stopped without a full drain, {} events discarded",
                discarded
            );
        }

        *lifecycle = Lifecycle::Stopped;
        info!("ledger engine stopped");
        Ok(())
    }

    /// Waits until the reclaimer moved past `sequence`. Gives up if an engine thread died.
    fn wait_until_reclaimed(
        &self,
        sequence: u64,
    ) -> bool {
        while self.ring.reclaimed() <= sequence {
            if self.threads.lock().iter().any(JoinHandle::is_finished) {
                error!("an engine thread exited before the final release completed");
                return false;
            }
            thread::sleep(SHUTDOWN_POLL_INTERVAL);
        }
        true
    }

    fn join_threads(&self) {
        let threads = std::mem::take(&mut *self.threads.lock());
        for handle in threads {
            let name = handle.thread().name().unwrap_or("unnamed").to_string();
            if handle.join().is_err() {
                error!("engine thread {} panicked", name);
            } else {
                debug!("engine thread {} joined", name);
            }
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::EngineShutdown);
        }
        Ok(())
    }

    pub fn credit(
        &self,
        key: &str,
        amount: u64,
    ) -> Result<()> {
        self.publish_ledger(key, EventKind::Credit, amount)
    }

    pub fn debit(
        &self,
        key: &str,
        amount: u64,
    ) -> Result<()> {
        self.publish_ledger(key, EventKind::Debit, amount)
    }

    fn publish_ledger(
        &self,
        key: &str,
        kind: EventKind,
        amount: u64,
    ) -> Result<()> {
        validate_key(key)?;
        if amount == 0 || amount > i64::MAX as u64 {
            return Err(Error::InvalidAmount(amount));
        }
        self.ensure_open()?;
        self.publisher.publish_ledger(key, kind, amount)?;
        Ok(())
    }

    /// Releases `key` and blocks until its owning worker answered.
    ///
    /// Returns `Ok(None)` when the key has nothing pending. There is no built-in timeout;
    /// use [`LedgerEngine::release_async`] under `tokio::time::timeout` for one. Must not be
    /// called from inside an async runtime or from a release listener.
    pub fn release(
        &self,
        key: &str,
    ) -> Result<Option<ReleaseResult>> {
        let receiver = self.publish_release(key)?;
        receiver.blocking_recv().map_err(|_| Error::ReleaseInterrupted)
    }

    /// Async variant of [`LedgerEngine::release`].
    pub async fn release_async(
        &self,
        key: &str,
    ) -> Result<Option<ReleaseResult>> {
        let receiver = self.publish_release(key)?;
        receiver.await.map_err(|_| Error::ReleaseInterrupted)
    }

    fn publish_release(
        &self,
        key: &str,
    ) -> Result<tokio::sync::oneshot::Receiver<Option<ReleaseResult>>> {
        validate_key(key)?;
        self.ensure_open()?;
        let (handle, receiver) = ReleaseHandle::new();
        self.publisher.publish_release(key, handle)?;
        Ok(receiver)
    }

    /// Asks every worker to release all pending keys and returns immediately; results
    /// reach the release listener only.
    pub fn release_all(&self) -> Result<()> {
        self.ensure_open()?;
        self.publisher.publish_release_all()?;
        Ok(())
    }

    /// Diagnostics of every worker as of its last consumed batch.
    pub fn worker_stats(&self) -> Vec<WorkerSnapshot> {
        self.stats
            .iter()
            .enumerate()
            .map(|(worker, stats)| stats.snapshot(worker))
            .collect()
    }

    pub fn is_running(&self) -> bool {
        *self.lifecycle.lock() == Lifecycle::Running
    }
}

impl Drop for LedgerEngine {
    fn drop(&mut self) {
        if self.is_running() {
            if let Err(e) = self.shutdown() {
                error!("shutdown on drop failed: {}", e);
            }
        }
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidKey);
    }
    Ok(())
}
