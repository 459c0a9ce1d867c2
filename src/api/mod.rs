//! Callback seams between the engine and the embedding application.
//!
//! Both traits are implemented for plain closures, so most callers pass a closure to the
//! builder and only implement the trait for stateful sinks.

#[cfg(test)]
use mockall::automock;

use crate::BoxError;
use crate::ReleaseResult;

/// Supplies the starting balance of a key the first time a worker sees it in a session.
///
/// Called on the owning worker's thread, at most once per key per session (again after
/// the key has been evicted). A slow loader stalls every key of that worker.
#[cfg_attr(test, automock)]
pub trait BalanceLoader: Send + Sync {
    fn load(
        &self,
        key: &str,
    ) -> Result<i64, BoxError>;
}

impl<F> BalanceLoader for F
where
    F: Fn(&str) -> Result<i64, BoxError> + Send + Sync,
{
    fn load(
        &self,
        key: &str,
    ) -> Result<i64, BoxError> {
        self(key)
    }
}

/// Receives every non-empty release, automatic or explicit, on the owning worker's thread.
///
/// The key's state is fully committed before this runs. A panic here is caught, logged and
/// counted; it never stalls the pipeline.
#[cfg_attr(test, automock)]
pub trait ReleaseListener: Send + Sync {
    fn on_release(
        &self,
        release: &ReleaseResult,
    );
}

impl<F> ReleaseListener for F
where
    F: Fn(&ReleaseResult) + Send + Sync,
{
    fn on_release(
        &self,
        release: &ReleaseResult,
    ) {
        self(release)
    }
}
