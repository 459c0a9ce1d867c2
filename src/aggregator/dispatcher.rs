use std::panic;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::error;

use crate::metrics::LISTENER_FAILURES_METRIC;
use crate::utils::panic::panic_message;
use crate::ReleaseListener;
use crate::ReleaseResult;

/// Hands release results to the configured listener.
#[derive(Clone, Default)]
pub(crate) struct ReleaseDispatcher {
    listener: Option<Arc<dyn ReleaseListener>>,
}

impl ReleaseDispatcher {
    pub(crate) fn new(listener: Option<Arc<dyn ReleaseListener>>) -> Self {
        Self { listener }
    }

    /// Invokes the listener on the calling worker thread.
    ///
    /// Returns false if the listener panicked; the panic is logged and counted.
    pub(crate) fn dispatch(
        &self,
        release: &ReleaseResult,
    ) -> bool {
        let Some(listener) = &self.listener else {
            return true;
        };

        match panic::catch_unwind(AssertUnwindSafe(|| listener.on_release(release))) {
            Ok(()) => true,
            Err(payload) => {
                error!(
                    key = release.key(),
                    events = release.event_count(),
                    "release listener panicked: {}",
                    panic_message(payload.as_ref())
                );
                LISTENER_FAILURES_METRIC.inc();
                false
            }
        }
    }
}

/// One-shot answer to an explicit `release()` call, fulfilled by the owning worker.
#[derive(Debug)]
pub(crate) struct ReleaseHandle {
    sender: Mutex<Option<oneshot::Sender<Option<ReleaseResult>>>>,
}

impl ReleaseHandle {
    pub(crate) fn new() -> (Self, oneshot::Receiver<Option<ReleaseResult>>) {
        let (sender, receiver) = oneshot::channel();
        (
            Self {
                sender: Mutex::new(Some(sender)),
            },
            receiver,
        )
    }

    /// Sends the outcome to the waiting caller.
    ///
    /// Only the first call delivers; returns false if the handle was already used or the
    /// caller stopped waiting.
    pub(crate) fn fulfill(
        &self,
        result: Option<ReleaseResult>,
    ) -> bool {
        match self.sender.lock().take() {
            Some(sender) => sender.send(result).is_ok(),
            None => false,
        }
    }
}
