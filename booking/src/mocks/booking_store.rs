//! In-memory booking store for testing.
//!
//! Transactions are serializable: a transaction holds the store's async
//! mutex from `begin` until it finishes and works on a private copy of the
//! tables. `commit` publishes the copy; `rollback` or drop discards it.

use crate::constants::DEFAULT_SLOT_CAPACITY;
use crate::error::{BookingError, Entity, Result};
use crate::providers::{BookingStore, BookingTransaction};
use crate::types::{
    Booking, BookingId, BookingStatus, ClaimOutcome, NewSlot, ProviderId, RequesterId,
    ScheduleSlot, SlotId, SlotVersion,
};
use chrono::{NaiveDate, NaiveTime};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone, Default)]
struct Tables {
    slots: BTreeMap<SlotId, ScheduleSlot>,
    bookings: BTreeMap<BookingId, Booking>,
}

impl Tables {
    fn slot_mut(&mut self, slot_id: SlotId) -> Result<&mut ScheduleSlot> {
        self.slots
            .get_mut(&slot_id)
            .ok_or_else(|| BookingError::not_found(Entity::Slot, slot_id))
    }

    fn active_bookings_of<'a>(
        &'a self,
        requester_id: &'a RequesterId,
    ) -> impl Iterator<Item = &'a Booking> + 'a {
        self.bookings.values().filter(move |b| {
            b.status() == &BookingStatus::Booked && &b.details().requester_id == requester_id
        })
    }
}

/// In-memory slot and booking store.
#[derive(Debug, Clone)]
pub struct InMemoryBookingStore {
    tables: Arc<Mutex<Tables>>,
    next_slot_id: Arc<AtomicI64>,
    fail_booking_inserts: Arc<AtomicBool>,
}

impl InMemoryBookingStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            next_slot_id: Arc::new(AtomicI64::new(1)),
            fail_booking_inserts: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Put a slot in place as-is, bypassing claim/release (for testing).
    pub async fn seed_slot(&self, slot: ScheduleSlot) {
        self.next_slot_id.fetch_max(slot.id.0 + 1, Ordering::SeqCst);
        self.tables.lock().await.slots.insert(slot.id, slot);
    }

    /// Current committed state of a slot (for testing).
    pub async fn slot(&self, slot_id: SlotId) -> Option<ScheduleSlot> {
        self.tables.lock().await.slots.get(&slot_id).cloned()
    }

    /// Number of committed bookings in any state (for testing).
    pub async fn booking_count(&self) -> usize {
        self.tables.lock().await.bookings.len()
    }

    /// Make every subsequent `insert_booking` fail with a database error
    /// (for testing rollback after a successful claim).
    pub fn fail_booking_inserts(&self, fail: bool) {
        self.fail_booking_inserts.store(fail, Ordering::SeqCst);
    }
}

impl Default for InMemoryBookingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingStore for InMemoryBookingStore {
    type Tx = InMemoryTransaction;

    async fn begin(&self) -> Result<Self::Tx> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let working = guard.clone();
        Ok(InMemoryTransaction {
            guard,
            working,
            fail_booking_inserts: Arc::clone(&self.fail_booking_inserts),
        })
    }

    async fn insert_slot(&self, slot: NewSlot) -> Result<ScheduleSlot> {
        slot.validate()?;

        let id = SlotId(self.next_slot_id.fetch_add(1, Ordering::SeqCst));
        let record = ScheduleSlot {
            id,
            provider_id: slot.provider_id,
            date: slot.date,
            start_time: slot.start_time,
            end_time: slot.end_time,
            capacity: slot.capacity.unwrap_or(DEFAULT_SLOT_CAPACITY),
            occupied: 0,
            active: true,
            version: SlotVersion(0),
        };

        self.tables.lock().await.slots.insert(id, record.clone());
        Ok(record)
    }

    async fn get_slot(&self, slot_id: SlotId) -> Result<Option<ScheduleSlot>> {
        Ok(self.tables.lock().await.slots.get(&slot_id).cloned())
    }

    async fn get_booking(&self, booking_id: BookingId) -> Result<Option<Booking>> {
        Ok(self.tables.lock().await.bookings.get(&booking_id).cloned())
    }

    async fn list_by_requester(&self, requester_id: &RequesterId) -> Result<Vec<Booking>> {
        let tables = self.tables.lock().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|b| &b.details().requester_id == requester_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| {
            b.details()
                .created_at
                .cmp(&a.details().created_at)
                .then(b.id().cmp(&a.id()))
        });
        Ok(bookings)
    }

    async fn list_by_provider(&self, provider_id: &ProviderId) -> Result<Vec<Booking>> {
        let tables = self.tables.lock().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|b| &b.details().provider_id == provider_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| {
            a.details()
                .appointment_time
                .cmp(&b.details().appointment_time)
                .then(a.id().cmp(&b.id()))
        });
        Ok(bookings)
    }
}

/// Transaction over an [`InMemoryBookingStore`].
pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
    fail_booking_inserts: Arc<AtomicBool>,
}

impl BookingTransaction for InMemoryTransaction {
    async fn load_slot(&mut self, slot_id: SlotId) -> Result<Option<ScheduleSlot>> {
        Ok(self.working.slots.get(&slot_id).cloned())
    }

    async fn claim_slot(
        &mut self,
        slot_id: SlotId,
        expected_version: SlotVersion,
    ) -> Result<ClaimOutcome> {
        let slot = self.working.slot_mut(slot_id)?;

        if !slot.active {
            return Err(BookingError::inactive(Entity::Slot, slot_id));
        }
        if slot.is_full() {
            return Ok(ClaimOutcome::Exhausted);
        }
        if slot.version != expected_version {
            return Ok(ClaimOutcome::VersionConflict);
        }

        slot.occupied += 1;
        slot.version = slot.version.next();
        Ok(ClaimOutcome::Claimed {
            version: slot.version,
            occupied: slot.occupied,
        })
    }

    async fn release_slot(&mut self, slot_id: SlotId) -> Result<SlotVersion> {
        let slot = self.working.slot_mut(slot_id)?;
        slot.occupied = slot.occupied.saturating_sub(1);
        slot.version = slot.version.next();
        Ok(slot.version)
    }

    async fn withdraw_slot(&mut self, slot_id: SlotId) -> Result<()> {
        let slot = self.working.slot_mut(slot_id)?;
        if slot.occupied > 0 {
            return Err(BookingError::SlotInUse {
                occupied: slot.occupied,
            });
        }
        slot.active = false;
        Ok(())
    }

    async fn has_active_booking_on_slot(
        &mut self,
        requester_id: &RequesterId,
        slot_id: SlotId,
    ) -> Result<bool> {
        Ok(self
            .working
            .active_bookings_of(requester_id)
            .any(|b| b.slot_id() == slot_id))
    }

    async fn has_active_booking_at_time(
        &mut self,
        requester_id: &RequesterId,
        date: NaiveDate,
        start_time: NaiveTime,
    ) -> Result<bool> {
        let tables = &self.working;
        Ok(tables.active_bookings_of(requester_id).any(|b| {
            tables
                .slots
                .get(&b.slot_id())
                .is_some_and(|s| s.date == date && s.start_time == start_time)
        }))
    }

    async fn load_booking(&mut self, booking_id: BookingId) -> Result<Option<Booking>> {
        Ok(self.working.bookings.get(&booking_id).cloned())
    }

    async fn insert_booking(&mut self, booking: &Booking) -> Result<()> {
        if self.fail_booking_inserts.load(Ordering::SeqCst) {
            return Err(BookingError::Database(
                "insert into bookings failed".to_string(),
            ));
        }

        let requester_id = &booking.details().requester_id;
        if self
            .working
            .active_bookings_of(requester_id)
            .any(|b| b.slot_id() == booking.slot_id())
        {
            return Err(BookingError::DuplicateBooking);
        }
        if self
            .working
            .active_bookings_of(requester_id)
            .any(|b| b.details().appointment_time == booking.details().appointment_time)
        {
            return Err(BookingError::TimeConflict);
        }
        if self.working.bookings.contains_key(&booking.id()) {
            return Err(BookingError::Database(format!(
                "duplicate booking id {}",
                booking.id()
            )));
        }

        self.working.bookings.insert(booking.id(), booking.clone());
        Ok(())
    }

    async fn update_booking_status(&mut self, booking: &Booking) -> Result<()> {
        let stored = self
            .working
            .bookings
            .get_mut(&booking.id())
            .ok_or_else(|| BookingError::not_found(Entity::Booking, booking.id()))?;
        *stored = booking.clone();
        Ok(())
    }

    async fn commit(mut self) -> Result<()> {
        *self.guard = std::mem::take(&mut self.working);
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}
