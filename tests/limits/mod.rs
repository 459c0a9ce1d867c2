use ledger_engine::Error;
use ledger_engine::LedgerEngine;

use crate::common::started;
use crate::common::Releases;

const MAX_AMOUNT: u64 = i64::MAX as u64;

#[test]
fn amounts_past_the_signed_limit_are_rejected() {
    let engine = started(LedgerEngine::builder());

    assert!(matches!(
        engine.credit("k", MAX_AMOUNT + 1),
        Err(Error::InvalidAmount(_))
    ));
    engine.credit("k", MAX_AMOUNT).unwrap();
    assert_eq!(engine.release("k").unwrap().unwrap().delta(), i64::MAX);
    engine.shutdown().unwrap();
}

#[test]
fn repeated_maximum_credits_keep_the_pipeline_alive() {
    let releases = Releases::default();
    let engine = started(releases.attach(LedgerEngine::builder().worker_count(2)));

    engine.credit("k", MAX_AMOUNT).unwrap();
    engine.credit("k", MAX_AMOUNT).unwrap();
    let release = engine.release("k").unwrap().unwrap();
    assert_eq!(release.event_count(), 1);
    assert_eq!(release.running_balance(), i64::MAX);

    engine.debit("k", MAX_AMOUNT).unwrap();
    assert_eq!(engine.release("k").unwrap().unwrap().running_balance(), 0);

    engine.debit("k", MAX_AMOUNT).unwrap();
    engine.debit("k", 1).unwrap();
    let release = engine.release("k").unwrap().unwrap();
    assert_eq!(release.event_count(), 2);
    assert_eq!(release.delta(), i64::MIN);
    assert_eq!(release.running_balance(), i64::MIN);

    engine.debit("k", 1).unwrap();
    assert_eq!(engine.release("k").unwrap(), None);
    engine.shutdown().unwrap();
}

#[test]
fn loaded_balance_near_the_limit_rejects_only_overflowing_events() {
    let releases = Releases::default();
    let engine = started(
        releases.attach(LedgerEngine::builder().balance_loader(|_key: &str| Ok(i64::MIN + 3))),
    );

    engine.debit("k", 4).unwrap();
    engine.debit("k", 3).unwrap();
    engine.shutdown().unwrap();

    let all = releases.for_key("k");
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].delta(), -3);
    assert_eq!(all[0].running_balance(), i64::MIN);
}
