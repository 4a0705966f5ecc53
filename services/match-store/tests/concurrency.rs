//! Concurrency tests for the Match Store
//!
//! Races real OS threads against a shared store and checks that capacity
//! and participant uniqueness hold no matter how the joins interleave.

use match_store::MatchStore;
use std::sync::{Arc, Barrier};
use std::thread;
use types::errors::ReservationError;
use types::ids::{MatchId, WalletAddress};
use types::matches::{NewMatch, SlotCount};

fn wallet(name: &str) -> WalletAddress {
    WalletAddress::parse(name).unwrap()
}

fn open_match(store: &MatchStore, slots: SlotCount) -> MatchId {
    let new = NewMatch::new(wallet("EQorganizer"), "Hala Koło", 2000, slots, None).unwrap();
    store.create_match(new).unwrap().match_id
}

/// Start every joiner at the same instant and collect their results.
fn race(
    store: &Arc<MatchStore>,
    match_id: MatchId,
    wallets: Vec<WalletAddress>,
) -> Vec<Result<u32, ReservationError>> {
    let barrier = Arc::new(Barrier::new(wallets.len()));
    let handles: Vec<_> = wallets
        .into_iter()
        .map(|w| {
            let store = Arc::clone(store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store.join_match(match_id, &w).map(|m| m.current_players)
            })
        })
        .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

#[test]
fn test_last_slot_has_exactly_one_winner() {
    let store = Arc::new(MatchStore::in_memory());
    let match_id = open_match(&store, SlotCount::Eight);
    for i in 0..6 {
        store.join_match(match_id, &wallet(&format!("EQseed{}", i))).unwrap();
    }
    assert_eq!(store.get_match(match_id).unwrap().slots_available(), 1);

    let contenders: Vec<_> = (0..32).map(|i| wallet(&format!("EQrace{}", i))).collect();
    let results = race(&store, match_id, contenders);

    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners, vec![&8]);
    let full = results
        .iter()
        .filter(|r| matches!(r, Err(ReservationError::MatchFull { .. })))
        .count();
    assert_eq!(full, 31);

    let m = store.get_match(match_id).unwrap();
    assert_eq!(m.current_players, 8);
    assert_eq!(store.participants(match_id).unwrap().len(), 8);
}

#[test]
fn test_oversubscribed_match_fills_exactly() {
    let store = Arc::new(MatchStore::in_memory());
    let match_id = open_match(&store, SlotCount::Ten);

    let contenders: Vec<_> = (0..20).map(|i| wallet(&format!("EQp{}", i))).collect();
    let results = race(&store, match_id, contenders);

    let mut seen: Vec<u32> = results.iter().filter_map(|r| r.as_ref().ok().copied()).collect();
    seen.sort_unstable();
    // Each winner observed a distinct post-join count
    assert_eq!(seen, (2..=10).collect::<Vec<_>>());
    assert_eq!(results.iter().filter(|r| r.is_err()).count(), 11);

    let seats: Vec<u32> = store
        .participants(match_id)
        .unwrap()
        .iter()
        .map(|p| p.seat)
        .collect();
    assert_eq!(seats, (1..=10).collect::<Vec<_>>());
}

#[test]
fn test_same_user_racing_is_seated_once() {
    let store = Arc::new(MatchStore::in_memory());
    let match_id = open_match(&store, SlotCount::Ten);

    let results = race(&store, match_id, vec![wallet("EQtwin"); 16]);

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, ReservationError::AlreadyJoined { .. })));
    assert_eq!(store.get_match(match_id).unwrap().current_players, 2);
}

#[test]
fn test_joins_on_different_matches_are_independent() {
    let store = Arc::new(MatchStore::in_memory());
    let ids: Vec<MatchId> = (0..8).map(|_| open_match(&store, SlotCount::Eight)).collect();

    let barrier = Arc::new(Barrier::new(ids.len() * 7));
    let mut handles = Vec::new();
    for (m, match_id) in ids.iter().copied().enumerate() {
        for p in 0..7 {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            handles.push(thread::spawn(move || {
                barrier.wait();
                store.join_match(match_id, &wallet(&format!("EQm{}p{}", m, p)))
            }));
        }
    }
    for h in handles {
        h.join().unwrap().unwrap();
    }

    for match_id in ids {
        let m = store.get_match(match_id).unwrap();
        assert!(m.is_full());
        assert!(m.check_invariant());
    }
}

#[test]
fn test_readers_never_see_overfilled_match() {
    let store = Arc::new(MatchStore::in_memory());
    let match_id = open_match(&store, SlotCount::Eight);

    let reader = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for _ in 0..2_000 {
                let m = store.get_match(match_id).unwrap();
                assert!(m.check_invariant());
                let listed = store.list_matches();
                assert!(listed.iter().all(|m| m.check_invariant()));
            }
        })
    };

    let contenders: Vec<_> = (0..24).map(|i| wallet(&format!("EQr{}", i))).collect();
    let results = race(&store, match_id, contenders);
    reader.join().unwrap();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 7);
}
