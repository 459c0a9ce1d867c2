//! Release policies.
//! Decide when a key's pending events are released: inline after each applied event,
//! on a periodic flush-all, or both.

mod count;
mod hybrid;
mod time_based;
pub(crate) use count::*;
pub(crate) use hybrid::*;
pub(crate) use time_based::*;


use std::time::Duration;

#[cfg(test)]
use mockall::automock;

use crate::ReleaseConfig;
use crate::ReleaseTrigger;

#[cfg_attr(test, automock)]
pub(crate) trait ReleasePolicy: Send {
    /// Checked by the owning worker right after an event was applied to a key.
    fn should_release_inline(
        &self,
        pending_events: usize,
    ) -> bool;

    /// Period of the scheduled flush-all, if this policy relies on one.
    fn flush_interval(&self) -> Option<Duration>;
}

/// Builds the policy a validated [`ReleaseConfig`] describes.
pub(crate) fn build_policy(config: &ReleaseConfig) -> Box<dyn ReleasePolicy> {
    let interval = config.interval();
    match (config.policy, interval) {
        (ReleaseTrigger::Count, _) | (_, None) => Box::new(CountPolicy::new(config.threshold)),
        (ReleaseTrigger::Time, Some(interval)) => Box::new(TimePolicy::new(interval)),
        (ReleaseTrigger::Hybrid, Some(interval)) => {
            Box::new(HybridPolicy::new(config.threshold, interval))
        }
    }
}
