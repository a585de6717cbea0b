//! Property tests for slot claim and release.

#![allow(clippy::unwrap_used)]

use booking_core::mocks::InMemoryBookingStore;
use booking_core::providers::{BookingStore, BookingTransaction};
use booking_core::types::ClaimOutcome;
use booking_core::{ProviderId, ScheduleSlot, SlotId, SlotVersion};
use booking_testing::properties::{SlotOp, capacity, slot_ops};
use chrono::{NaiveDate, NaiveTime};
use proptest::prelude::*;

fn empty_slot(capacity: u32) -> ScheduleSlot {
    ScheduleSlot {
        id: SlotId(1),
        provider_id: ProviderId::new("d1"),
        date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
        start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
        capacity,
        occupied: 0,
        active: true,
        version: SlotVersion(0),
    }
}

/// Expected state after one operation: `(occupied, version, outcome)`.
fn model(
    op: SlotOp,
    capacity: u32,
    occupied: u32,
    version: u64,
) -> (u32, u64, Option<ClaimOutcome>) {
    match op {
        SlotOp::Claim if occupied >= capacity => (occupied, version, Some(ClaimOutcome::Exhausted)),
        SlotOp::Claim => (
            occupied + 1,
            version + 1,
            Some(ClaimOutcome::Claimed {
                version: SlotVersion(version + 1),
                occupied: occupied + 1,
            }),
        ),
        SlotOp::StaleClaim if occupied >= capacity => {
            (occupied, version, Some(ClaimOutcome::Exhausted))
        }
        SlotOp::StaleClaim => (occupied, version, Some(ClaimOutcome::VersionConflict)),
        SlotOp::Release => (occupied.saturating_sub(1), version + 1, None),
    }
}

fn run_ops(capacity: u32, ops: &[SlotOp]) -> std::result::Result<(), TestCaseError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();

    runtime.block_on(async {
        let store = InMemoryBookingStore::new();
        store.seed_slot(empty_slot(capacity)).await;
        let slot_id = SlotId(1);

        let (mut occupied, mut version) = (0_u32, 0_u64);

        for &op in ops {
            let (next_occupied, next_version, expected) = model(op, capacity, occupied, version);

            let mut tx = store.begin().await.unwrap();
            match op {
                SlotOp::Claim | SlotOp::StaleClaim => {
                    let observed = if op == SlotOp::Claim {
                        SlotVersion(version)
                    } else if version == 0 {
                        SlotVersion(1)
                    } else {
                        SlotVersion(version - 1)
                    };
                    let outcome = tx.claim_slot(slot_id, observed).await.unwrap();
                    prop_assert_eq!(Some(outcome), expected);
                }
                SlotOp::Release => {
                    let after = tx.release_slot(slot_id).await.unwrap();
                    prop_assert_eq!(after, SlotVersion(next_version));
                }
            }
            tx.commit().await.unwrap();

            let stored = store.slot(slot_id).await.unwrap();
            prop_assert!(stored.occupied <= stored.capacity);
            prop_assert_eq!(stored.occupied, next_occupied);
            prop_assert_eq!(stored.version, SlotVersion(next_version));

            occupied = next_occupied;
            version = next_version;
        }
        Ok(())
    })
}

proptest! {
    #[test]
    fn prop_occupancy_stays_within_capacity(capacity in capacity(), ops in slot_ops()) {
        run_ops(capacity, &ops)?;
    }

    #[test]
    fn prop_rolled_back_claims_change_nothing(capacity in capacity(), claims in 1_usize..16) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();

        runtime.block_on(async {
            let store = InMemoryBookingStore::new();
            store.seed_slot(empty_slot(capacity)).await;

            for _ in 0..claims {
                let mut tx = store.begin().await.unwrap();
                let version = tx.load_slot(SlotId(1)).await.unwrap().unwrap().version;
                tx.claim_slot(SlotId(1), version).await.unwrap();
                tx.rollback().await.unwrap();
            }

            let stored = store.slot(SlotId(1)).await.unwrap();
            prop_assert_eq!(stored.occupied, 0);
            prop_assert_eq!(stored.version, SlotVersion(0));
            Ok(())
        })?;
    }
}
