//! Engine configuration.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support
//! - Environment variable overrides (`LEDGER__<SECTION>__<KEY>`)
//! - Component-wise validation
mod channel;
mod release;
mod worker;
pub use channel::*;
pub use release::*;
pub use worker::*;

use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::CONFIG_PATH_ENV;
use crate::constants::ENV_PREFIX;
use crate::Result;

/// Main configuration container of a ledger engine
///
/// Combines all subsystem configurations with hierarchical override support:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables (highest priority)
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Ingestion ring sizing and idle wait behaviour
    #[serde(default)]
    pub channel: ChannelConfig,
    /// Worker partitioning and per-key state lifecycle
    #[serde(default)]
    pub worker: WorkerConfig,
    /// When pending events are released
    #[serde(default)]
    pub release: ReleaseConfig,
}

impl EngineConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Configuration sources are merged in the following order (later sources override earlier):
    /// 1. Type defaults (lowest priority)
    /// 2. Configuration file from `CONFIG_PATH` environment variable (if set)
    /// 3. Environment variables with `LEDGER__` prefix (highest priority)
    ///
    /// Callers must call `validate()` before handing the configuration to an engine;
    /// [`LedgerBuilder::build`](crate::LedgerBuilder::build) does so.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("LEDGER__WORKER__WORKER_COUNT", "4");
    /// let cfg = EngineConfig::new()?
    ///     .with_override_config("ledger.toml")?
    ///     .validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(env_source());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional overrides from a file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables (highest priority)
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates every section and returns the validated instance.
    pub fn validate(self) -> Result<Self> {
        self.channel.validate()?;
        self.worker.validate()?;
        self.release.validate()?;
        Ok(self)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}
