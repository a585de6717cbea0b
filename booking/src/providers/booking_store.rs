//! Booking store traits.
//!
//! The transactional relational store holding schedule slots and bookings.
//! Multi-step workflows open a [`BookingTransaction`] and either commit it or
//! roll it back; nothing written through a transaction is visible to others
//! before commit, and nothing survives a rollback.

use crate::error::Result;
use crate::types::{
    Booking, BookingId, ClaimOutcome, NewSlot, ProviderId, RequesterId, ScheduleSlot, SlotId,
    SlotVersion,
};
use chrono::{NaiveDate, NaiveTime};

/// Store of schedule slots and bookings.
///
/// Non-transactional methods are plain reads (and slot registration) that
/// are not concurrency-sensitive.
pub trait BookingStore: Send + Sync {
    /// Transaction handle.
    type Tx: BookingTransaction + Send + 'static;

    /// Open a transaction.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot start a transaction.
    fn begin(&self) -> impl std::future::Future<Output = Result<Self::Tx>> + Send;

    /// Register a new slot with `occupied = 0`, `version = 0`, active.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookingError::Validation`] for an invalid slot, or a
    /// store error.
    fn insert_slot(
        &self,
        slot: NewSlot,
    ) -> impl std::future::Future<Output = Result<ScheduleSlot>> + Send;

    /// Read a slot outside any transaction.
    ///
    /// # Errors
    ///
    /// Returns error if the read fails.
    fn get_slot(
        &self,
        slot_id: SlotId,
    ) -> impl std::future::Future<Output = Result<Option<ScheduleSlot>>> + Send;

    /// Read a booking outside any transaction.
    ///
    /// # Errors
    ///
    /// Returns error if the read fails.
    fn get_booking(
        &self,
        booking_id: BookingId,
    ) -> impl std::future::Future<Output = Result<Option<Booking>>> + Send;

    /// All bookings of a requester, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the read fails.
    fn list_by_requester(
        &self,
        requester_id: &RequesterId,
    ) -> impl std::future::Future<Output = Result<Vec<Booking>>> + Send;

    /// All bookings on a provider's slots, ordered by appointment time.
    ///
    /// # Errors
    ///
    /// Returns error if the read fails.
    fn list_by_provider(
        &self,
        provider_id: &ProviderId,
    ) -> impl std::future::Future<Output = Result<Vec<Booking>>> + Send;
}

/// One unit of work against the booking store.
///
/// Dropping a transaction without calling [`commit`](Self::commit) rolls it
/// back.
pub trait BookingTransaction: Send {
    /// Read a slot.
    ///
    /// # Errors
    ///
    /// Returns error if the read fails.
    fn load_slot(
        &mut self,
        slot_id: SlotId,
    ) -> impl std::future::Future<Output = Result<Option<ScheduleSlot>>> + Send;

    /// Atomically take one unit of capacity.
    ///
    /// In one indivisible step: increment `occupied` and `version`, but only
    /// if `occupied < capacity` and the current version equals
    /// `expected_version`. If either condition fails nothing changes.
    /// A withdrawn slot is never claimed, whatever version the caller saw.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookingError::NotFound`] if the slot is missing,
    /// [`crate::BookingError::Inactive`] if it was withdrawn, or a store error.
    fn claim_slot(
        &mut self,
        slot_id: SlotId,
        expected_version: SlotVersion,
    ) -> impl std::future::Future<Output = Result<ClaimOutcome>> + Send;

    /// Atomically return one unit of capacity.
    ///
    /// Decrements `occupied` (floored at 0) and increments `version`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookingError::NotFound`] if the slot is missing, or a
    /// store error.
    fn release_slot(
        &mut self,
        slot_id: SlotId,
    ) -> impl std::future::Future<Output = Result<SlotVersion>> + Send;

    /// Mark a slot inactive, only if it has no bookings.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookingError::SlotInUse`] while `occupied > 0`,
    /// [`crate::BookingError::NotFound`] if the slot is missing, or a store
    /// error.
    fn withdraw_slot(
        &mut self,
        slot_id: SlotId,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Whether the requester holds a `Booked` booking on this slot.
    ///
    /// # Errors
    ///
    /// Returns error if the read fails.
    fn has_active_booking_on_slot(
        &mut self,
        requester_id: &RequesterId,
        slot_id: SlotId,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Whether the requester holds a `Booked` booking on any slot with exactly
    /// this date and start time.
    ///
    /// # Errors
    ///
    /// Returns error if the read fails.
    fn has_active_booking_at_time(
        &mut self,
        requester_id: &RequesterId,
        date: NaiveDate,
        start_time: NaiveTime,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Read a booking, locking it for the rest of the transaction.
    ///
    /// # Errors
    ///
    /// Returns error if the read fails.
    fn load_booking(
        &mut self,
        booking_id: BookingId,
    ) -> impl std::future::Future<Output = Result<Option<Booking>>> + Send;

    /// Insert a new booking.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookingError::DuplicateBooking`] if the store's own
    /// uniqueness guard rejects it, or a store error.
    fn insert_booking(
        &mut self,
        booking: &Booking,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Persist a booking's new status.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookingError::NotFound`] if the booking is missing, or
    /// a store error.
    fn update_booking_status(
        &mut self,
        booking: &Booking,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Make every change of this transaction durable and visible.
    ///
    /// # Errors
    ///
    /// Returns error if the commit fails; nothing is applied in that case.
    fn commit(self) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Discard every change of this transaction.
    ///
    /// # Errors
    ///
    /// Returns error if the store reports a failure while rolling back.
    fn rollback(self) -> impl std::future::Future<Output = Result<()>> + Send;
}
