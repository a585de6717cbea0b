//! Conflict checks run before a slot claim.
//!
//! Both checks only consider bookings in the `Booked` state. The time check
//! compares exact `(date, start_time)` equality, not interval overlap: slots
//! sit on one discrete grid, so equal start times are the only way two
//! bookings can collide.

use crate::error::{BookingError, Result};
use crate::providers::BookingTransaction;
use crate::types::{RequesterId, ScheduleSlot, SlotId};
use chrono::{NaiveDate, NaiveTime};

/// Read-only conflict queries evaluated inside the caller's transaction.
pub struct ConflictChecker<'tx, T> {
    tx: &'tx mut T,
}

impl<'tx, T: BookingTransaction> ConflictChecker<'tx, T> {
    /// Check against the given transaction.
    pub fn new(tx: &'tx mut T) -> Self {
        Self { tx }
    }

    /// Whether the requester already holds a `Booked` booking on this slot.
    ///
    /// # Errors
    ///
    /// Returns error if the store read fails.
    pub async fn has_active_booking_on_slot(
        &mut self,
        requester_id: &RequesterId,
        slot_id: SlotId,
    ) -> Result<bool> {
        self.tx
            .has_active_booking_on_slot(requester_id, slot_id)
            .await
    }

    /// Whether the requester already holds a `Booked` booking at this date and
    /// start time, on any provider's slot.
    ///
    /// # Errors
    ///
    /// Returns error if the store read fails.
    pub async fn has_active_booking_at_time(
        &mut self,
        requester_id: &RequesterId,
        date: NaiveDate,
        start_time: NaiveTime,
    ) -> Result<bool> {
        self.tx
            .has_active_booking_at_time(requester_id, date, start_time)
            .await
    }

    /// Run the slot check, then the time check.
    ///
    /// # Errors
    ///
    /// - [`BookingError::DuplicateBooking`] if the slot check hits
    /// - [`BookingError::TimeConflict`] if the time check hits
    /// - Store errors from either read
    pub async fn ensure_no_conflict(
        &mut self,
        requester_id: &RequesterId,
        slot: &ScheduleSlot,
    ) -> Result<()> {
        if self.has_active_booking_on_slot(requester_id, slot.id).await? {
            tracing::warn!(
                requester_id = %requester_id,
                slot_id = %slot.id,
                "Duplicate booking attempt"
            );
            return Err(BookingError::DuplicateBooking);
        }

        if self
            .has_active_booking_at_time(requester_id, slot.date, slot.start_time)
            .await?
        {
            tracing::warn!(
                requester_id = %requester_id,
                date = %slot.date,
                start_time = %slot.start_time,
                "Booking time conflict"
            );
            return Err(BookingError::TimeConflict);
        }

        Ok(())
    }
}
