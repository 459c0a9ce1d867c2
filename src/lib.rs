//! In-process ledger aggregation engine.
//!
//! Producers publish signed credit/debit operations keyed by an account identifier onto a
//! bounded multi-producer ring. Every worker observes every event in one global order and
//! applies only the keys its hash partition owns, so each key has exactly one writer and
//! its state needs no locking. Pending events are released in batches to a caller supplied
//! listener under a COUNT, TIME or HYBRID policy.
//!
//! ```ignore
//! use std::time::Duration;
//! use ledger_engine::{LedgerEngine, ReleaseTrigger};
//!
//! let engine = LedgerEngine::builder()
//!     .worker_count(4)
//!     .release_trigger(ReleaseTrigger::Hybrid)
//!     .release_threshold(500)
//!     .release_interval(Duration::from_millis(200))
//!     .on_release(|release| println!("{} -> {}", release.key(), release.delta()))
//!     .build()?;
//!
//! engine.start()?;
//! engine.credit("acct-1", 100)?;
//! engine.debit("acct-1", 40)?;
//! let release = engine.release("acct-1")?;
//! engine.shutdown()?;
//! ```

mod aggregator;
mod api;
mod channel;
mod config;
mod constants;
mod engine;
mod errors;
pub mod metrics;
mod model;
pub mod utils;

pub use aggregator::WorkerSnapshot;
pub use api::*;
pub use config::*;
pub use engine::*;
pub use errors::*;
pub use model::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
