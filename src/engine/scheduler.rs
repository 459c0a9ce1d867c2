//! Periodic flush-all for the TIME and HYBRID release policies.
//!
//! The scheduler owns one thread driving a current-thread tokio runtime. Every tick
//! publishes a RELEASE_ALL through the regular [`Publisher`], so scheduled flushes are
//! ordered with user events like any other event.

use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;
use std::time::Instant;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::trace;
use tracing::warn;

use crate::channel::Publisher;
use crate::constants::SCHEDULER_THREAD_NAME;
use crate::constants::SHUTDOWN_POLL_INTERVAL;
use crate::Error;
use crate::Result;

pub(crate) struct ReleaseScheduler {
    shutdown_tx: watch::Sender<()>,
    handle: Option<JoinHandle<()>>,
    stop_timeout: Duration,
}

impl ReleaseScheduler {
    /// Spawns the scheduler thread. The first flush happens one `interval` after start.
    pub(crate) fn start(
        interval: Duration,
        publisher: Publisher,
        stop_timeout: Duration,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| Error::Fatal(format!("release scheduler runtime: {}", e)))?;
        let (shutdown_tx, shutdown_rx) = watch::channel(());

        let handle = thread::Builder::new()
            .name(SCHEDULER_THREAD_NAME.to_string())
            .spawn(move || runtime.block_on(Self::run(interval, publisher, shutdown_rx)))?;

        Ok(Self {
            shutdown_tx,
            handle: Some(handle),
            stop_timeout,
        })
    }

    async fn run(
        interval: Duration,
        publisher: Publisher,
        mut shutdown_signal: watch::Receiver<()>,
    ) {
        info!("[ReleaseScheduler] started, interval {:?}", interval);
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown_signal.changed() => {
                    debug!("[ReleaseScheduler] shutdown signal received.");
                    break;
                }

                _ = ticker.tick() => {
                    trace!("[ReleaseScheduler] tick");
                    if publisher.publish_release_all().is_err() {
                        warn!("[ReleaseScheduler] channel halted, stopping");
                        break;
                    }
                }
            }
        }
        info!("[ReleaseScheduler] stopped");
    }

    /// Signals the thread and waits for it up to the configured timeout.
    ///
    /// Returns false if the thread did not exit in time; it is then left detached.
    pub(crate) fn stop(mut self) -> bool {
        let _ = self.shutdown_tx.send(());

        let Some(handle) = self.handle.take() else {
            return true;
        };

        let deadline = Instant::now() + self.stop_timeout;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                warn!(
                    "[ReleaseScheduler] did not stop within {:?}, detaching",
                    self.stop_timeout
                );
                return false;
            }
            thread::sleep(SHUTDOWN_POLL_INTERVAL);
        }

        if handle.join().is_err() {
            error!("[ReleaseScheduler] thread panicked");
        }
        true
    }
}
