use std::time::Duration;

/// Prefix of environment variables layered over the configuration files,
/// e.g. `LEDGER__RELEASE__THRESHOLD=50`
pub(crate) const ENV_PREFIX: &str = "LEDGER";

pub(crate) const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

pub(crate) const WORKER_THREAD_PREFIX: &str = "ledger-worker";
pub(crate) const RECLAIMER_THREAD_NAME: &str = "ledger-slot-reclaimer";
pub(crate) const SCHEDULER_THREAD_NAME: &str = "ledger-release-scheduler";

/// Upper bound for a parked consumer before it re-checks its cursor on its own
pub(crate) const PARK_TIMEOUT: Duration = Duration::from_millis(1);

/// Number of doubling spin rounds before a waiter starts yielding its time slice
pub(crate) const SPIN_LIMIT: u32 = 6;

/// Poll interval used while shutdown waits on background threads
pub(crate) const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(1);
