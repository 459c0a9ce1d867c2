//! Prometheus collectors of the engine.
//!
//! Collectors are process wide. They are registered into [`REGISTRY`] the first time
//! [`gather_text`] runs; an embedding application may also register them into its own
//! registry with [`register_custom_metrics`].

use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::exponential_buckets;
use prometheus::Encoder;
use prometheus::HistogramOpts;
use prometheus::HistogramVec;
use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::Opts;
use prometheus::Registry;
use prometheus::TextEncoder;
use tracing::warn;

lazy_static! {
    pub static ref EVENTS_APPLIED_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("ledger_events_applied_total", "Credits and debits applied to key state"),
        &["worker"]
    )
    .expect("metric can not be created");

    pub static ref RELEASES_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("ledger_releases_total", "Non-empty releases by what triggered them"),
        &["worker", "reason"]
    )
    .expect("metric can not be created");

    pub static ref RELEASED_EVENTS_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("ledger_released_events_total", "Ledger events handed out by releases"),
        &["worker"]
    )
    .expect("metric can not be created");

    pub static ref RELEASE_DURATION_METRIC: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "ledger_release_duration_us",
            "Histogram of drain-and-commit duration in microseconds"
        )
        .buckets(exponential_buckets(1.0, 2.0, 16).expect("valid buckets")),
        &["worker"]
    )
    .expect("metric can not be created");

    pub static ref EVICTIONS_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("ledger_evictions_total", "Key states dropped after release"),
        &["worker"]
    )
    .expect("metric can not be created");

    pub static ref LISTENER_FAILURES_METRIC: IntCounter = IntCounter::new(
        "ledger_listener_failures_total",
        "Release listener invocations that panicked"
    )
    .expect("metric can not be created");

    pub static ref LOADER_FAILURES_METRIC: IntCounter = IntCounter::new(
        "ledger_loader_failures_total",
        "Balance loader invocations that failed or panicked"
    )
    .expect("metric can not be created");

    pub static ref REJECTED_EVENTS_METRIC: IntCounter = IntCounter::new(
        "ledger_rejected_events_total",
        "Credits and debits rejected because the balance would overflow"
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

static REGISTER_DEFAULT: Once = Once::new();

/// Registers every engine collector into `registry`.
///
/// Fails when a collector with the same name is already registered there.
pub fn register_custom_metrics(registry: &Registry) -> prometheus::Result<()> {
    registry.register(Box::new(EVENTS_APPLIED_METRIC.clone()))?;
    registry.register(Box::new(RELEASES_METRIC.clone()))?;
    registry.register(Box::new(RELEASED_EVENTS_METRIC.clone()))?;
    registry.register(Box::new(RELEASE_DURATION_METRIC.clone()))?;
    registry.register(Box::new(EVICTIONS_METRIC.clone()))?;
    registry.register(Box::new(LISTENER_FAILURES_METRIC.clone()))?;
    registry.register(Box::new(LOADER_FAILURES_METRIC.clone()))?;
    registry.register(Box::new(REJECTED_EVENTS_METRIC.clone()))?;
    Ok(())
}

/// Renders [`REGISTRY`] in the prometheus text exposition format.
pub fn gather_text() -> String {
    REGISTER_DEFAULT.call_once(|| {
        if let Err(e) = register_custom_metrics(&REGISTRY) {
            warn!("engine metrics could not be registered: {}", e);
        }
    });

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        warn!("could not encode engine metrics: {}", e);
    }
    match String::from_utf8(buffer) {
        Ok(text) => text,
        Err(e) => {
            warn!("engine metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    }
}

/// Per-worker handles, resolved once so the hot path skips the label lookup.
#[derive(Debug, Clone)]
pub(crate) struct WorkerMetrics {
    worker: String,
    pub(crate) events_applied: IntCounter,
    pub(crate) released_events: IntCounter,
    pub(crate) evictions: IntCounter,
    pub(crate) release_duration: prometheus::Histogram,
}

impl WorkerMetrics {
    pub(crate) fn new(worker: usize) -> Self {
        let worker = worker.to_string();
        Self {
            events_applied: EVENTS_APPLIED_METRIC.with_label_values(&[&worker]),
            released_events: RELEASED_EVENTS_METRIC.with_label_values(&[&worker]),
            evictions: EVICTIONS_METRIC.with_label_values(&[&worker]),
            release_duration: RELEASE_DURATION_METRIC.with_label_values(&[&worker]),
            worker,
        }
    }

    pub(crate) fn record_release(
        &self,
        reason: &str,
    ) {
        RELEASES_METRIC
            .with_label_values(&[&self.worker, reason])
            .inc();
    }
}
