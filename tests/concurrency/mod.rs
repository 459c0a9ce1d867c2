use std::sync::Arc;
use std::thread;

use ledger_engine::LedgerEngine;
use ledger_engine::PerformanceMode;
use ledger_engine::ReleaseTrigger;
use rand::Rng;

use crate::common::enable_logger;
use crate::common::started;
use crate::common::wait_until;
use crate::common::Releases;
use crate::common::WAIT_TIMEOUT;

const PRODUCERS: usize = 4;
const EVENTS_PER_PRODUCER: u64 = 500;

/// Every producer credits its own key with amounts 1, 2, 3, ... and the releases must
/// replay them in exactly that order.
fn assert_per_key_order(
    mode: PerformanceMode,
    buffer_capacity: usize,
    worker_count: usize,
) {
    let releases = Releases::default();
    let engine = Arc::new(started(
        releases.attach(
            LedgerEngine::builder()
                .performance_mode(mode)
                .buffer_capacity(buffer_capacity)
                .worker_count(worker_count)
                .release_trigger(ReleaseTrigger::Count)
                .release_threshold(64),
        ),
    ));

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let engine = engine.clone();
            thread::spawn(move || {
                let key = format!("producer-{}", producer);
                for amount in 1..=EVENTS_PER_PRODUCER {
                    engine.credit(&key, amount).unwrap();
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }
    engine.shutdown().unwrap();

    for producer in 0..PRODUCERS {
        let key = format!("producer-{}", producer);
        let events: Vec<(u64, u64)> = releases
            .for_key(&key)
            .iter()
            .flat_map(|release| release.events().iter().map(|e| (e.sequence(), e.amount())))
            .collect();

        let expected: Vec<(u64, u64)> = (1..=EVENTS_PER_PRODUCER).map(|n| (n, n)).collect();
        assert_eq!(events, expected, "order broken for {}", key);

        let total = (EVENTS_PER_PRODUCER * (EVENTS_PER_PRODUCER + 1) / 2) as i64;
        assert_eq!(releases.net(&key), total);
    }
}

#[test]
fn per_key_order_survives_many_producers() {
    enable_logger();
    assert_per_key_order(PerformanceMode::Standard, 1024, 2);
}

#[test]
fn per_key_order_survives_many_producers_in_maximum_mode() {
    assert_per_key_order(PerformanceMode::Maximum, 1024, 2);
}

#[test]
fn tiny_buffer_applies_backpressure_without_loss() {
    assert_per_key_order(PerformanceMode::Standard, 2, 3);
}

#[test]
fn single_slot_buffer_in_maximum_mode() {
    assert_per_key_order(PerformanceMode::Maximum, 1, 2);
}

#[test]
fn keys_spread_across_workers_and_each_is_released_once() {
    let releases = Releases::default();
    let engine = started(releases.attach(LedgerEngine::builder().worker_count(4)));

    for i in 0..200 {
        engine.credit(&format!("acct-{}", i), 1).unwrap();
    }
    engine.release_all().unwrap();
    assert!(releases.wait_for_len(200));
    // stats are published once the batch holding the RELEASE_ALL is done
    assert!(wait_until(
        || engine.worker_stats().iter().map(|s| s.releases).sum::<u64>() == 200,
        WAIT_TIMEOUT
    ));

    let stats = engine.worker_stats();
    assert_eq!(stats.len(), 4);
    assert!(stats.iter().filter(|s| s.resident_keys > 0).count() > 1);
    engine.shutdown().unwrap();

    assert_eq!(releases.len(), 200);
    for i in 0..200 {
        assert_eq!(releases.for_key(&format!("acct-{}", i)).len(), 1);
    }
}

#[test]
fn concurrent_explicit_releases_see_their_own_writes() {
    let engine = Arc::new(started(LedgerEngine::builder().worker_count(2)));

    let callers: Vec<_> = (0..4)
        .map(|caller| {
            let engine = engine.clone();
            thread::spawn(move || {
                let key = format!("caller-{}", caller);
                let mut balance = 0;
                for round in 1..=50 {
                    engine.credit(&key, round).unwrap();
                    let release = engine.release(&key).unwrap().unwrap();
                    balance += round as i64;
                    assert_eq!(release.delta(), round as i64);
                    assert_eq!(release.running_balance(), balance);
                }
            })
        })
        .collect();
    for caller in callers {
        caller.join().unwrap();
    }
    engine.shutdown().unwrap();
}

#[test]
fn random_credit_debit_mix_nets_to_the_expected_balance() {
    let releases = Releases::default();
    let engine = Arc::new(started(
        releases.attach(
            LedgerEngine::builder()
                .worker_count(3)
                .buffer_capacity(64)
                .release_trigger(ReleaseTrigger::Count)
                .release_threshold(10),
        ),
    ));

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let engine = engine.clone();
            thread::spawn(move || {
                let mut rng = rand::thread_rng();
                let mut expected = Vec::new();
                for account in 0..8 {
                    let key = format!("mix-{}-{}", producer, account);
                    let mut net = 0i64;
                    for _ in 0..50 {
                        let amount: u64 = rng.gen_range(1..=1000);
                        if rng.gen_bool(0.5) {
                            engine.credit(&key, amount).unwrap();
                            net += amount as i64;
                        } else {
                            engine.debit(&key, amount).unwrap();
                            net -= amount as i64;
                        }
                    }
                    expected.push((key, net));
                }
                expected
            })
        })
        .collect();
    let expected: Vec<(String, i64)> = producers
        .into_iter()
        .flat_map(|producer| producer.join().unwrap())
        .collect();
    engine.shutdown().unwrap();

    for (key, net) in expected {
        let key_releases = releases.for_key(&key);
        assert_eq!(releases.net(&key), net, "net mismatch for {}", key);
        assert_eq!(key_releases.last().map(|r| r.running_balance()), Some(net));
        assert_eq!(key_releases.iter().map(|r| r.event_count()).sum::<u64>(), 50);
    }
}
