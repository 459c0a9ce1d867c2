use ledger_engine::EventKind;
use ledger_engine::LedgerEngine;
use ledger_engine::PerformanceMode;

use crate::common::enable_logger;
use crate::common::started;
use crate::common::Releases;

#[test]
fn single_credit_release() {
    enable_logger();
    let releases = Releases::default();
    let engine = started(releases.attach(LedgerEngine::builder()));

    engine.credit("k", 100).unwrap();
    let release = engine.release("k").unwrap().expect("pending credit");

    assert_eq!(release.delta(), 100);
    assert_eq!(release.event_count(), 1);
    assert_eq!(release.running_balance(), 100);
    engine.shutdown().unwrap();
}

#[test]
fn mixed_events_net_into_one_release() {
    let engine = started(LedgerEngine::builder());

    engine.credit("k", 100).unwrap();
    engine.debit("k", 20).unwrap();
    engine.credit("k", 5).unwrap();
    let release = engine.release("k").unwrap().unwrap();

    assert_eq!(release.delta(), 85);
    assert_eq!(release.event_count(), 3);

    let kinds: Vec<EventKind> = release.events().iter().map(|e| e.kind()).collect();
    assert_eq!(kinds, vec![EventKind::Credit, EventKind::Debit, EventKind::Credit]);
    let sequences: Vec<u64> = release.events().iter().map(|e| e.sequence()).collect();
    assert_eq!(sequences, vec![1, 2, 3]);
    let balances: Vec<i64> = release.events().iter().map(|e| e.balance_after()).collect();
    assert_eq!(balances, vec![100, 80, 85]);
    engine.shutdown().unwrap();
}

#[test]
fn loaded_balance_seeds_running_balance() {
    let releases = Releases::default();
    let engine = started(
        releases.attach(LedgerEngine::builder().balance_loader(|_key: &str| Ok(1000))),
    );

    engine.credit("k", 500).unwrap();
    engine.release_all().unwrap();

    assert!(releases.wait_for_len(1));
    let release = &releases.all()[0];
    assert_eq!(release.delta(), 500);
    assert_eq!(release.running_balance(), 1500);
    engine.shutdown().unwrap();
}

#[test]
fn release_all_covers_every_key_once() {
    let releases = Releases::default();
    let engine = started(releases.attach(LedgerEngine::builder().worker_count(4)));

    engine.credit("alpha", 1).unwrap();
    engine.credit("beta", 1).unwrap();
    engine.release_all().unwrap();

    assert!(releases.wait_for_len(2));
    engine.shutdown().unwrap();

    let all = releases.all();
    assert_eq!(all.len(), 2);
    assert_eq!(releases.for_key("alpha").len(), 1);
    assert_eq!(releases.for_key("beta").len(), 1);
    assert!(all.iter().all(|release| release.event_count() == 1));
}

#[test]
fn consecutive_releases_carry_the_committed_balance() {
    let engine = started(LedgerEngine::builder().default_balance(10));

    engine.credit("k", 5).unwrap();
    let first = engine.release("k").unwrap().unwrap();
    engine.debit("k", 20).unwrap();
    let second = engine.release("k").unwrap().unwrap();

    assert_eq!(first.running_balance(), 15);
    assert_eq!(second.delta(), -20);
    assert_eq!(second.running_balance(), -5);
    assert_eq!(second.events()[0].sequence(), 2);
    assert_eq!(engine.release("k").unwrap(), None);
    engine.shutdown().unwrap();
}

#[test]
fn scenarios_hold_in_maximum_performance_mode() {
    let releases = Releases::default();
    let engine = started(
        releases.attach(
            LedgerEngine::builder()
                .performance_mode(PerformanceMode::Maximum)
                .worker_count(2)
                .balance_loader(|_key: &str| Ok(1000)),
        ),
    );

    engine.credit("k", 100).unwrap();
    engine.debit("k", 20).unwrap();
    engine.credit("k", 5).unwrap();
    let release = engine.release("k").unwrap().unwrap();
    assert_eq!(release.delta(), 85);
    assert_eq!(release.event_count(), 3);
    assert_eq!(release.running_balance(), 1085);

    engine.credit("other", 1).unwrap();
    engine.shutdown().unwrap();
    assert_eq!(releases.for_key("other").len(), 1);
}
