//! End-to-end reservation scenarios through the async service

use match_store::{EventLog, MatchStore, StoreEvent};
use reservation::{CreateMatchRequest, ReservationService, RetryPolicy};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use types::errors::ReservationError;

fn request(slots: i64) -> CreateMatchRequest {
    CreateMatchRequest {
        organizer: "EQorganizer".into(),
        venue: "Hala OSiR Mokotów".into(),
        crowdfund_amount: 1500,
        slots_needed: slots,
        scheduled_for: Some("Today, 18:00".into()),
    }
}

fn service() -> ReservationService {
    ReservationService::new(Arc::new(MatchStore::in_memory()))
}

#[tokio::test]
async fn test_scenario_fill_eight_slot_match() {
    let service = service();
    let created = service.create_match(request(8)).await.unwrap();
    let id = created.match_id.to_string();

    for i in 0..6 {
        service.join_match(&id, &format!("EQp{}", i)).await.unwrap();
    }
    let view = service.get_match(&id).await.unwrap();
    assert_eq!((view.current_players, view.slots_available), (7, 1));

    let last = service.join_match(&id, "EQp6").await.unwrap();
    assert_eq!((last.current_players, last.slots_available), (8, 0));

    let err = service.join_match(&id, "EQp7").await.unwrap_err();
    assert_eq!(err.code(), "MATCH_FULL");
    let view = service.get_match(&id).await.unwrap();
    assert_eq!(view.current_players, 8);
}

#[tokio::test]
async fn test_scenario_organizer_rejoin() {
    let service = service();
    let created = service.create_match(request(10)).await.unwrap();

    let err = service
        .join_match(&created.match_id.to_string(), "EQorganizer")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "ALREADY_JOINED");
    let view = service.get_match(&created.match_id.to_string()).await.unwrap();
    assert_eq!(view.current_players, 1);
}

#[tokio::test]
async fn test_scenario_disallowed_slot_count() {
    let service = service();
    let err = service.create_match(request(7)).await.unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");
    assert!(service.list_matches().await.unwrap().is_empty());
    assert_eq!(service.store().user_count(), 0);
}

#[tokio::test]
async fn test_list_reports_slots_available() {
    let service = service();
    let a = service.create_match(request(8)).await.unwrap();
    let b = service.create_match(request(10)).await.unwrap();
    service.join_match(&b.match_id.to_string(), "EQp1").await.unwrap();

    let listed = service.list_matches().await.unwrap();
    let summary: Vec<_> = listed
        .iter()
        .map(|m| (m.match_id, m.current_players, m.slots_available))
        .collect();
    assert_eq!(summary, vec![(a.match_id, 1, 7), (b.match_id, 2, 8)]);

    let seats = service.participants(&b.match_id.to_string()).await.unwrap();
    let wallets: Vec<_> = seats.iter().map(|p| p.wallet_address.as_str()).collect();
    assert_eq!(wallets, vec!["EQorganizer", "EQp1"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_joins_for_last_slot() {
    let service = service();
    let created = service.create_match(request(10)).await.unwrap();
    let id = created.match_id.to_string();
    for i in 0..8 {
        service.join_match(&id, &format!("EQseed{}", i)).await.unwrap();
    }

    let handles: Vec<_> = (0..50)
        .map(|i| {
            let service = service.clone();
            let id = id.clone();
            tokio::spawn(async move { service.join_match(&id, &format!("EQrace{}", i)).await })
        })
        .collect();

    let mut wins = 0;
    let mut full = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(outcome) => {
                wins += 1;
                assert_eq!(outcome.slots_available, 0);
            }
            Err(e) => {
                assert_eq!(e.code(), "MATCH_FULL");
                full += 1;
            }
        }
    }
    assert_eq!((wins, full), (1, 49));
    assert_eq!(service.get_match(&id).await.unwrap().current_players, 10);
}

/// Fails the first `failures` joins with a storage outage
struct OutageLog {
    failures: u32,
    join_attempts: AtomicU32,
}

impl EventLog for OutageLog {
    fn append(&self, event: &StoreEvent) -> Result<(), ReservationError> {
        if let StoreEvent::PlayerJoined { .. } = event {
            let n = self.join_attempts.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                return Err(ReservationError::storage("journal volume offline"));
            }
        }
        Ok(())
    }
}

fn flaky_service(failures: u32, max_attempts: u32) -> (ReservationService, Arc<OutageLog>) {
    let log = Arc::new(OutageLog {
        failures,
        join_attempts: AtomicU32::new(0),
    });
    let store = Arc::new(MatchStore::new(log.clone()));
    let service = ReservationService::new(store).with_retry(RetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
    });
    (service, log)
}

#[tokio::test]
async fn test_storage_outage_is_retried() {
    let (service, log) = flaky_service(2, 3);
    let created = service.create_match(request(8)).await.unwrap();

    let outcome = service
        .join_match(&created.match_id.to_string(), "EQp1")
        .await
        .unwrap();
    assert_eq!(outcome.current_players, 2);
    assert_eq!(log.join_attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_persistent_outage_surfaces_after_limit() {
    let (service, log) = flaky_service(u32::MAX, 3);
    let created = service.create_match(request(8)).await.unwrap();
    let id = created.match_id.to_string();

    let err = service.join_match(&id, "EQp1").await.unwrap_err();
    assert_eq!(err.code(), "STORAGE_UNAVAILABLE");
    assert_eq!(log.join_attempts.load(Ordering::SeqCst), 3);
    assert_eq!(service.get_match(&id).await.unwrap().current_players, 1);
}

#[tokio::test]
async fn test_full_match_never_reaches_the_log() {
    let (service, log) = flaky_service(0, 5);
    let created = service.create_match(request(8)).await.unwrap();
    let id = created.match_id.to_string();
    for i in 0..7 {
        service.join_match(&id, &format!("EQp{}", i)).await.unwrap();
    }
    let before = log.join_attempts.load(Ordering::SeqCst);

    let err = service.join_match(&id, "EQlate").await.unwrap_err();
    assert_eq!(err.code(), "MATCH_FULL");
    // Rejected under the match lock, before anything is logged
    assert_eq!(log.join_attempts.load(Ordering::SeqCst), before);
}
