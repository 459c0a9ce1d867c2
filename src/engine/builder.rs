//! Fluent construction of a [`LedgerEngine`].
//!
//! Every setter writes into an [`EngineConfig`], so a builder seeded with
//! [`LedgerBuilder::config`] (for instance from `EngineConfig::new()`) can still be adjusted
//! in code. Nothing is validated until [`LedgerBuilder::build`].
//!
//! ## Example
//! ```ignore
//! let engine = LedgerEngine::builder()
//!     .config(EngineConfig::new()?)
//!     .worker_count(8)
//!     .balance_loader(|key: &str| balances.fetch(key))
//!     .on_release(move |release| sink.write(release))
//!     .build()?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use super::LedgerEngine;
use crate::BalanceLoader;
use crate::BoxError;
use crate::EngineConfig;
use crate::EvictionPolicy;
use crate::PerformanceMode;
use crate::ReleaseListener;
use crate::ReleaseResult;
use crate::ReleaseTrigger;
use crate::Result;

#[derive(Default)]
pub struct LedgerBuilder {
    config: EngineConfig,
    listener: Option<Arc<dyn ReleaseListener>>,
    loader: Option<Arc<dyn BalanceLoader>>,
}

impl LedgerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every option with `config`; later setters still apply on top.
    pub fn config(
        mut self,
        config: EngineConfig,
    ) -> Self {
        self.config = config;
        self
    }

    /// Ring size; must be a power of two.
    pub fn buffer_capacity(
        mut self,
        capacity: usize,
    ) -> Self {
        self.config.channel.buffer_capacity = capacity;
        self
    }

    pub fn performance_mode(
        mut self,
        mode: PerformanceMode,
    ) -> Self {
        self.config.channel.performance_mode = mode;
        self
    }

    pub fn worker_count(
        mut self,
        count: usize,
    ) -> Self {
        self.config.worker.worker_count = count;
        self
    }

    pub fn default_balance(
        mut self,
        balance: i64,
    ) -> Self {
        self.config.worker.default_balance = balance;
        self
    }

    pub fn eviction_policy(
        mut self,
        policy: EvictionPolicy,
    ) -> Self {
        self.config.worker.eviction_policy = policy;
        self
    }

    pub fn release_trigger(
        mut self,
        trigger: ReleaseTrigger,
    ) -> Self {
        self.config.release.policy = trigger;
        self
    }

    pub fn release_threshold(
        mut self,
        threshold: u64,
    ) -> Self {
        self.config.release.threshold = threshold;
        self
    }

    /// Flush-all period for TIME/HYBRID, at millisecond resolution. Positive intervals are
    /// rounded up to the next millisecond; a zero interval fails `build()`.
    pub fn release_interval(
        mut self,
        interval: Duration,
    ) -> Self {
        let millis = u64::try_from(interval.as_nanos().div_ceil(1_000_000)).unwrap_or(u64::MAX);
        self.config.release.interval_ms = Some(millis);
        self
    }

    pub fn scheduler_shutdown_timeout(
        mut self,
        timeout: Duration,
    ) -> Self {
        self.config.release.scheduler_shutdown_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Closure form of [`LedgerBuilder::release_listener`].
    pub fn on_release<F>(
        self,
        listener: F,
    ) -> Self
    where
        F: Fn(&ReleaseResult) + Send + Sync + 'static,
    {
        self.release_listener(Arc::new(listener))
    }

    pub fn release_listener(
        mut self,
        listener: Arc<dyn ReleaseListener>,
    ) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Closure form of [`LedgerBuilder::balance_source`].
    pub fn balance_loader<F>(
        self,
        loader: F,
    ) -> Self
    where
        F: Fn(&str) -> std::result::Result<i64, BoxError> + Send + Sync + 'static,
    {
        self.balance_source(Arc::new(loader))
    }

    pub fn balance_source(
        mut self,
        loader: Arc<dyn BalanceLoader>,
    ) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Validates the configuration and assembles the engine; no thread runs until
    /// [`LedgerEngine::start`].
    pub fn build(self) -> Result<LedgerEngine> {
        let config = self.config.validate()?;

        if config.worker.eviction_policy == EvictionPolicy::AfterRelease && self.loader.is_none()
        {
            warn!(
                "AFTER_RELEASE eviction without a balance loader: evicted keys restart from \
                 the default balance {}",
                config.worker.default_balance
            );
        }

        Ok(LedgerEngine::new(config, self.listener, self.loader))
    }
}
