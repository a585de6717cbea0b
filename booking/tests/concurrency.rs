//! Concurrent booking attempts on one slot.

#![allow(clippy::unwrap_used)]

use booking_core::mocks::InMemoryBookingStore;
use booking_core::providers::{BookingStore, BookingTransaction};
use booking_core::types::ClaimOutcome;
use booking_core::{BookingError, ProviderId, ScheduleSlot, SlotId, SlotVersion};
use booking_testing::{SlotFixture, TestHarness};
use chrono::{NaiveDate, NaiveTime};
use futures::future::join_all;
use std::sync::Arc;

const ATTEMPTS: usize = 24;

fn requester(i: usize) -> String {
    format!("p{i}")
}

async fn harness_with_slot(capacity: u32) -> (Arc<TestHarness>, ScheduleSlot) {
    let h = TestHarness::new();
    for i in 0..ATTEMPTS {
        h.requester(&requester(i));
    }
    let slot = h
        .slot(SlotFixture::new("d1").capacity(capacity))
        .await
        .unwrap();
    (Arc::new(h), slot)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_attempts_never_oversell() {
    let capacity = 5;
    let (h, slot) = harness_with_slot(capacity).await;

    let attempts = (0..ATTEMPTS).map(|i| {
        let h = Arc::clone(&h);
        let request = h.request(&requester(i), &slot);
        tokio::spawn(async move { h.service.create_booking(request).await })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let booked = results.iter().filter(|r| r.is_ok()).count();
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(
            matches!(err, BookingError::CapacityExceeded | BookingError::Busy),
            "unexpected error {err:?}"
        );
    }

    let stored = h.store.slot(slot.id).await.unwrap();
    assert!(booked <= capacity as usize);
    assert_eq!(stored.occupied as usize, booked);
    assert_eq!(h.locks.held_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_retrying_callers_fill_slot_exactly() {
    let capacity = 5;
    let (h, slot) = harness_with_slot(capacity).await;

    // Callers retry on Busy only; any other outcome is final.
    let attempts = (0..ATTEMPTS).map(|i| {
        let h = Arc::clone(&h);
        let request = h.request(&requester(i), &slot);
        tokio::spawn(async move {
            loop {
                match h.service.create_booking(request.clone()).await {
                    Err(BookingError::Busy) => tokio::task::yield_now().await,
                    other => return other,
                }
            }
        })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let booked = results.iter().filter(|r| r.is_ok()).count();
    let refused = results
        .iter()
        .filter(|r| matches!(r, Err(BookingError::CapacityExceeded)))
        .count();

    assert_eq!(booked, capacity as usize);
    assert_eq!(refused, ATTEMPTS - capacity as usize);

    let stored = h.store.slot(slot.id).await.unwrap();
    assert_eq!(stored.occupied, capacity);
    assert_eq!(stored.version, SlotVersion(u64::from(capacity)));
    assert_eq!(h.store.booking_count().await, capacity as usize);
}

/// Slot with capacity 1, occupied 0 and version 5.
async fn seeded_store(capacity: u32) -> (InMemoryBookingStore, SlotId) {
    let store = InMemoryBookingStore::new();
    let slot = ScheduleSlot {
        id: SlotId(1),
        provider_id: ProviderId::new("d1"),
        date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
        start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
        capacity,
        occupied: 0,
        active: true,
        version: SlotVersion(5),
    };
    store.seed_slot(slot).await;
    (store, SlotId(1))
}

async fn claim_and_commit(store: InMemoryBookingStore, slot_id: SlotId, observed: SlotVersion) -> ClaimOutcome {
    let mut tx = store.begin().await.unwrap();
    let outcome = tx.claim_slot(slot_id, observed).await.unwrap();
    tx.commit().await.unwrap();
    outcome
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_two_claims_racing_on_same_version() {
    let (store, slot_id) = seeded_store(1).await;
    let observed = store.slot(slot_id).await.unwrap().version;
    assert_eq!(observed, SlotVersion(5));

    // No lock: both claim with the version they observed.
    let (a, b) = tokio::join!(
        tokio::spawn(claim_and_commit(store.clone(), slot_id, observed)),
        tokio::spawn(claim_and_commit(store.clone(), slot_id, observed)),
    );
    let outcomes = [a.unwrap(), b.unwrap()];

    let winners: Vec<_> = outcomes.iter().filter(|o| o.is_claimed()).collect();
    assert_eq!(winners.len(), 1);
    assert_eq!(
        *winners[0],
        ClaimOutcome::Claimed {
            version: SlotVersion(6),
            occupied: 1
        }
    );
    assert!(
        outcomes
            .iter()
            .any(|o| matches!(o, ClaimOutcome::Exhausted | ClaimOutcome::VersionConflict))
    );

    let stored = store.slot(slot_id).await.unwrap();
    assert_eq!((stored.occupied, stored.version), (1, SlotVersion(6)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stale_version_loses_even_with_capacity_left() {
    let (store, slot_id) = seeded_store(2).await;
    let observed = SlotVersion(5);

    let first = claim_and_commit(store.clone(), slot_id, observed).await;
    let second = claim_and_commit(store.clone(), slot_id, observed).await;

    assert!(first.is_claimed());
    assert_eq!(second, ClaimOutcome::VersionConflict);
    let stored = store.slot(slot_id).await.unwrap();
    assert_eq!((stored.occupied, stored.version), (1, SlotVersion(6)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_unrelated_slots_do_not_contend() {
    let h = TestHarness::new();
    h.requester("p1");
    let morning = h.slot(SlotFixture::new("d1").at(9, 0)).await.unwrap();
    let afternoon = h.slot(SlotFixture::new("d2").at(14, 0)).await.unwrap();

    let (a, b) = tokio::join!(
        h.service.create_booking(h.request("p1", &morning)),
        h.service.create_booking(h.request("p1", &afternoon)),
    );

    assert!(a.is_ok());
    assert!(b.is_ok());
}
