use std::time::Duration;

use ledger_engine::LedgerEngine;
use ledger_engine::ReleaseTrigger;

use crate::common::started;
use crate::common::wait_until;
use crate::common::Releases;
use crate::common::WAIT_TIMEOUT;

#[test]
fn count_policy_releases_inline_at_threshold() {
    let releases = Releases::default();
    let engine = started(
        releases.attach(
            LedgerEngine::builder()
                .release_trigger(ReleaseTrigger::Count)
                .release_threshold(3),
        ),
    );

    for _ in 0..7 {
        engine.credit("k", 1).unwrap();
    }
    let tail = engine.release("k").unwrap().unwrap();
    engine.shutdown().unwrap();

    let counts: Vec<u64> = releases.for_key("k").iter().map(|r| r.event_count()).collect();
    assert_eq!(counts, vec![3, 3, 1]);
    assert_eq!(tail.running_balance(), 7);
}

#[test]
fn count_threshold_zero_releases_every_event() {
    let releases = Releases::default();
    let engine = started(
        releases.attach(
            LedgerEngine::builder()
                .release_trigger(ReleaseTrigger::Count)
                .release_threshold(0),
        ),
    );

    engine.credit("k", 1).unwrap();
    engine.credit("k", 2).unwrap();
    assert_eq!(engine.release("k").unwrap(), None);
    engine.shutdown().unwrap();

    let deltas: Vec<i64> = releases.for_key("k").iter().map(|r| r.delta()).collect();
    assert_eq!(deltas, vec![1, 2]);
}

#[test]
fn time_policy_ignores_the_threshold_and_flushes_on_tick() {
    let releases = Releases::default();
    let engine = started(
        releases.attach(
            LedgerEngine::builder()
                .release_trigger(ReleaseTrigger::Time)
                .release_threshold(1)
                .release_interval(Duration::from_millis(100)),
        ),
    );

    for _ in 0..10 {
        engine.credit("k", 1).unwrap();
    }

    assert!(wait_until(|| releases.net("k") == 10, WAIT_TIMEOUT));
    assert!(releases.len() < 10);
    engine.shutdown().unwrap();
}

#[test]
fn time_policy_keeps_flushing_new_events() {
    let releases = Releases::default();
    let engine = started(
        releases.attach(
            LedgerEngine::builder()
                .release_trigger(ReleaseTrigger::Time)
                .release_interval(Duration::from_millis(20)),
        ),
    );

    engine.credit("a", 5).unwrap();
    assert!(wait_until(|| releases.net("a") == 5, WAIT_TIMEOUT));
    engine.debit("a", 2).unwrap();
    assert!(wait_until(|| releases.net("a") == 3, WAIT_TIMEOUT));

    let last = releases.for_key("a").pop().unwrap();
    assert_eq!(last.running_balance(), 3);
    engine.shutdown().unwrap();
}

#[test]
fn hybrid_policy_uses_both_triggers() {
    let releases = Releases::default();
    let engine = started(
        releases.attach(
            LedgerEngine::builder()
                .release_trigger(ReleaseTrigger::Hybrid)
                .release_threshold(5)
                .release_interval(Duration::from_millis(500)),
        ),
    );

    for _ in 0..7 {
        engine.credit("k", 1).unwrap();
    }

    assert!(wait_until(|| releases.net("k") == 7, WAIT_TIMEOUT));
    let first = &releases.for_key("k")[0];
    assert_eq!(first.event_count(), 5);
    engine.shutdown().unwrap();
}
