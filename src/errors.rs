//! Ledger engine error hierarchy.
//!
//! [`Error`] covers everything a caller of the public API can observe. Failures raised by
//! user callbacks on a worker thread never reach the publishing caller; they are wrapped
//! in [`LoaderError`], logged and counted by the worker instead.

use config::ConfigError;

use crate::EventKind;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

/// Error type returned by user supplied balance loaders.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Engine configuration validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Credit/debit amount outside `1..=i64::MAX`
    #[error("Amount must be positive and fit in a signed 64-bit balance, got {0}")]
    InvalidAmount(u64),

    #[error("Key must not be empty")]
    InvalidKey,

    #[error("Invalid ledger event: {0}")]
    InvalidLedgerEvent(String),

    /// The completion handle of an explicit release was dropped before the owning
    /// worker answered it.
    #[error("Release wait ended before the owning worker answered")]
    ReleaseInterrupted,

    #[error("Engine has been shut down")]
    EngineShutdown,

    #[error("Engine already started")]
    AlreadyStarted,

    #[error("Failed to spawn engine thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),

    /// Unrecoverable failures while bringing engine threads up
    #[error("Fatal error: {0}")]
    Fatal(String),
}

/// Lazy balance initialization failure on a worker thread.
#[derive(Debug, thiserror::Error)]
pub(crate) enum LoaderError {
    #[error("Balance loader failed for key {key}: {source}")]
    Failed {
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("Balance loader panicked for key {key}: {message}")]
    Panicked { key: String, message: String },
}

/// A credit or debit that would take a key's balance outside `i64`.
#[derive(Debug, thiserror::Error)]
#[error("{kind} of {amount} overflows key {key} (pending delta {pending_delta}, balance {balance})")]
pub(crate) struct BalanceOverflow {
    pub(crate) key: String,
    pub(crate) kind: EventKind,
    pub(crate) amount: u64,
    pub(crate) pending_delta: i64,
    pub(crate) balance: i64,
}

#[cfg(test)]
#[path = "errors_test.rs"]
mod errors_test;
