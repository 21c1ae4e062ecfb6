// Concurrency properties of the token store under contention
use payslip::session::TokenError;
use payslip::testing::constants::{ALICE, BOB};
use payslip::testing::TestFixtures;
use std::sync::{Arc, Barrier};
use std::thread;

const CONTENDERS: usize = 32;

#[test]
fn test_concurrent_rotation_has_exactly_one_winner() {
    let (store, _clock) = TestFixtures::store_with_manual_clock();
    let pair = store.issue_pair(ALICE).unwrap();
    let barrier = Arc::new(Barrier::new(CONTENDERS));

    let handles: Vec<_> = (0..CONTENDERS)
        .map(|_| {
            let store = store.clone();
            let barrier = barrier.clone();
            let refresh = pair.refresh_token.clone();
            thread::spawn(move || {
                barrier.wait();
                store.rotate(&refresh)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();

    assert_eq!(winners.len(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| *e == TokenError::TokenNotFound));

    // the winner's pair is the live one
    assert_eq!(store.authorize(&winners[0].access_token).unwrap(), ALICE);
    assert_eq!(store.stats().sessions, 1);
}

#[test]
fn test_readers_and_writers_for_different_owners() {
    let (store, _clock) = TestFixtures::store_with_manual_clock();
    let alice = store.issue_pair(ALICE).unwrap();

    let reader = {
        let store = store.clone();
        let token = alice.access_token.clone();
        thread::spawn(move || {
            for _ in 0..500 {
                assert_eq!(store.authorize(&token).unwrap(), ALICE);
            }
        })
    };

    let writer = {
        let store = store.clone();
        thread::spawn(move || {
            let mut pair = store.issue_pair(BOB).unwrap();
            for _ in 0..100 {
                pair = store.rotate(&pair.refresh_token).unwrap();
            }
            pair
        })
    };

    reader.join().unwrap();
    let bob = writer.join().unwrap();

    assert_eq!(store.authorize(&bob.access_token).unwrap(), BOB);
    assert_eq!(store.authorize(&alice.access_token).unwrap(), ALICE);
}
