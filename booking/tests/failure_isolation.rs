//! A failed create never leaves a trace: the slot's occupancy and version
//! are unchanged and the slot lock is gone, whichever step failed.

#![allow(clippy::unwrap_used)]

use booking_core::{BookingError, ProviderId, ScheduleSlot};
use booking_testing::{SlotFixture, TestHarness};
use std::time::Duration;

async fn assert_untouched(h: &TestHarness, before: &ScheduleSlot) {
    let after = h.store.slot(before.id).await.unwrap();
    assert_eq!(
        (after.occupied, after.version),
        (before.occupied, before.version),
        "slot changed by a failed attempt"
    );
}

fn assert_unlocked(h: &TestHarness, slot: &ScheduleSlot) {
    let key = h.service.lock_coordinator().key_for(slot.id);
    assert!(!h.locks.is_held(&key), "lock {key} leaked");
}

/// One booked requester on a capacity-2 slot, plus a full capacity-1 slot.
async fn setup() -> (TestHarness, ScheduleSlot, ScheduleSlot) {
    let h = TestHarness::new();
    for id in ["p1", "p2", "p3"] {
        h.requester(id);
    }
    h.directory.add_inactive_requester("retired");

    let open = h.slot(SlotFixture::new("d1").at(9, 0).capacity(2)).await.unwrap();
    let full = h.slot(SlotFixture::new("d2").at(11, 0).capacity(1)).await.unwrap();
    h.service.create_booking(h.request("p1", &open)).await.unwrap();
    h.service.create_booking(h.request("p3", &full)).await.unwrap();

    let open = h.store.slot(open.id).await.unwrap();
    let full = h.store.slot(full.id).await.unwrap();
    (h, open, full)
}

#[tokio::test]
async fn test_every_business_failure_leaves_slot_and_lock_clean() {
    let (h, open, full) = setup().await;
    let other = h.slot(SlotFixture::new("d3").at(9, 0).capacity(2)).await.unwrap();

    let mut mismatch = h.request("p2", &open);
    mismatch.provider_id = ProviderId::new("d9");

    let cases = [
        (h.request("ghost", &open), &open, "not_found"),
        (h.request("retired", &open), &open, "inactive"),
        (mismatch, &open, "mismatch"),
        (h.request("p1", &open), &open, "duplicate"),
        (h.request("p1", &other), &other, "time_conflict"),
        (h.request("p2", &full), &full, "capacity_exceeded"),
    ];

    for (request, slot, expected) in cases {
        let before = h.store.slot(slot.id).await.unwrap();
        let err = h.service.create_booking(request).await.unwrap_err();

        assert_eq!(err.kind(), expected, "unexpected error {err:?}");
        assert_untouched(&h, &before).await;
        assert_unlocked(&h, slot);
    }
}

#[tokio::test]
async fn test_store_failure_after_claim_rolls_the_claim_back() {
    let (h, open, _) = setup().await;
    let bookings_before = h.store.booking_count().await;

    h.store.fail_booking_inserts(true);
    let err = h.service.create_booking(h.request("p2", &open)).await.unwrap_err();
    h.store.fail_booking_inserts(false);

    assert!(matches!(err, BookingError::Database(_)));
    assert!(err.is_system_error());
    assert_untouched(&h, &open).await;
    assert_unlocked(&h, &open);
    assert_eq!(h.store.booking_count().await, bookings_before);

    // the slot is still bookable afterwards
    h.service.create_booking(h.request("p2", &open)).await.unwrap();
}

#[tokio::test]
async fn test_busy_attempt_does_not_touch_slot_or_foreign_lock() {
    let (h, open, _) = setup().await;
    let held = h
        .service
        .lock_coordinator()
        .acquire_slot(open.id, Duration::from_secs(10))
        .await
        .unwrap();

    let err = h.service.create_booking(h.request("p2", &open)).await.unwrap_err();

    assert_eq!(err, BookingError::Busy);
    assert_untouched(&h, &open).await;
    // the other holder's lock is intact
    assert!(
        h.locks.is_held(held.key()),
        "a refused attempt must not release someone else's lock"
    );
    h.service.lock_coordinator().release(&held).await.unwrap();
    assert_unlocked(&h, &open);
}

#[tokio::test]
async fn test_lock_released_after_success() {
    let (h, open, _) = setup().await;

    h.service.create_booking(h.request("p2", &open)).await.unwrap();

    assert_unlocked(&h, &open);
    assert_eq!(h.locks.held_count(), 0);
}

#[tokio::test]
async fn test_expired_lock_is_not_released_by_late_holder() {
    // A zero TTL expires the lock as soon as it is taken; the workflow still
    // completes because the slot version guards the claim, and the release
    // reports NotOwner instead of deleting anything.
    let h = TestHarness::with_config(
        booking_core::BookingConfig::default().with_lock_ttl(Duration::ZERO),
    );
    h.requester("p1");
    let slot = h.slot(SlotFixture::new("d1").capacity(1)).await.unwrap();

    let booking = h.service.create_booking(h.request("p1", &slot)).await.unwrap();

    assert_eq!(booking.slot_id(), slot.id);
    assert_eq!(h.store.slot(slot.id).await.unwrap().occupied, 1);
    assert_eq!(h.locks.held_count(), 0);
}
