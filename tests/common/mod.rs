use std::sync::Arc;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use ledger_engine::LedgerBuilder;
use ledger_engine::LedgerEngine;
use ledger_engine::ReleaseResult;
use parking_lot::Mutex;

pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    env_logger::init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for integration test.");
}

/// Listener side of an engine under test.
#[derive(Clone, Default)]
pub struct Releases {
    inner: Arc<Mutex<Vec<ReleaseResult>>>,
}

impl Releases {
    pub fn attach(
        &self,
        builder: LedgerBuilder,
    ) -> LedgerBuilder {
        let inner = self.inner.clone();
        builder.on_release(move |release| inner.lock().push(release.clone()))
    }

    pub fn all(&self) -> Vec<ReleaseResult> {
        self.inner.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn for_key(
        &self,
        key: &str,
    ) -> Vec<ReleaseResult> {
        self.inner
            .lock()
            .iter()
            .filter(|release| release.key() == key)
            .cloned()
            .collect()
    }

    /// Sum of every released delta for `key`.
    pub fn net(
        &self,
        key: &str,
    ) -> i64 {
        self.for_key(key).iter().map(ReleaseResult::delta).sum()
    }

    pub fn wait_for_len(
        &self,
        expected: usize,
    ) -> bool {
        wait_until(|| self.len() >= expected, WAIT_TIMEOUT)
    }
}

pub fn started(builder: LedgerBuilder) -> LedgerEngine {
    let engine = builder.build().expect("valid engine config");
    engine.start().expect("engine starts");
    engine
}

pub fn wait_until(
    mut condition: impl FnMut() -> bool,
    timeout: Duration,
) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}
