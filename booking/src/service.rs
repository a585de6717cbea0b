//! Booking orchestrator.
//!
//! Composes the lock coordinator, the conflict checker, the slot store and
//! the id allocator into the create, cancel and complete workflows.
//!
//! # Create workflow
//!
//! ```text
//! acquire slot lock ──Busy──────────────────────────────────────┐
//!   │                                                           │
//!   ▼  (one store transaction)                                  │
//! requester active? → slot active? → provider owns slot?        │
//!   → no duplicate? → no time conflict? → claim(version)        │
//!   → allocate id → insert booking → commit                     │
//!   │        any failure: rollback (claim included)             │
//!   ▼                                                           ▼
//! release slot lock (every exit path)                    record outcome
//! ```
//!
//! Cancel and complete run in a single transaction each and do not take the
//! slot lock: the release step is an atomic decrement and needs no
//! serialization.

use crate::config::BookingConfig;
use crate::conflict::ConflictChecker;
use crate::environment::{BookingEnvironment, BookingProviders};
use crate::error::{BookingError, Entity, Result};
use crate::lock::{LockCoordinator, LockRelease, LockToken};
use crate::metrics;
use crate::providers::{BookingStore, BookingTransaction, IdAllocator, IdentityDirectory};
use crate::types::{
    Booking, BookingDetails, BookingId, ClaimOutcome, CreateBooking, NewSlot, ProviderId,
    RequesterId, ScheduleSlot, SlotAvailability, SlotId,
};
use std::time::Instant;

type Tx<P> = <<P as BookingProviders>::Store as BookingStore>::Tx;

/// Booking orchestrator.
///
/// Cheap to share behind an `Arc`; holds no per-request state.
pub struct BookingService<P: BookingProviders> {
    env: BookingEnvironment<P>,
    locks: LockCoordinator<P::Locks>,
    config: BookingConfig,
}

impl<P: BookingProviders> BookingService<P> {
    /// Create a service over the given environment.
    #[must_use]
    pub fn new(env: BookingEnvironment<P>, config: BookingConfig) -> Self {
        let locks = LockCoordinator::new(env.locks.clone(), config.lock_key_prefix.clone());
        Self { env, locks, config }
    }

    /// Injected dependencies.
    #[must_use]
    pub const fn environment(&self) -> &BookingEnvironment<P> {
        &self.env
    }

    /// Lock coordinator used for slot locks.
    #[must_use]
    pub const fn lock_coordinator(&self) -> &LockCoordinator<P::Locks> {
        &self.locks
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &BookingConfig {
        &self.config
    }

    // ========================================================================
    // Create
    // ========================================================================

    /// Book one unit of capacity on a slot.
    ///
    /// # Errors
    ///
    /// - [`BookingError::Busy`] if another attempt holds the slot lock
    /// - [`BookingError::NotFound`] / [`BookingError::Inactive`] for a missing
    ///   or inactive requester or slot
    /// - [`BookingError::Mismatch`] if the provider does not own the slot
    /// - [`BookingError::DuplicateBooking`] / [`BookingError::TimeConflict`]
    /// - [`BookingError::CapacityExceeded`] if the slot is full or changed
    ///   concurrently
    /// - Store errors
    ///
    /// On any error the slot is left exactly as it was.
    #[tracing::instrument(
        skip_all,
        fields(
            requester_id = %request.requester_id,
            slot_id = %request.slot_id,
        )
    )]
    pub async fn create_booking(&self, request: CreateBooking) -> Result<Booking> {
        let started = Instant::now();
        let result = self.create_under_lock(&request).await;
        metrics::record_create_outcome(&result, started.elapsed());

        match &result {
            Ok(booking) => tracing::info!(
                booking_id = %booking.id(),
                appointment_time = %booking.details().appointment_time,
                "Booking created"
            ),
            Err(e) if e.is_system_error() => tracing::error!(error = %e, "Booking failed"),
            Err(e) => tracing::warn!(error = %e, kind = e.kind(), "Booking rejected"),
        }

        result
    }

    async fn create_under_lock(&self, request: &CreateBooking) -> Result<Booking> {
        let token = self
            .locks
            .acquire_slot(request.slot_id, self.config.lock_ttl)
            .await?;

        let mut tx = match self.env.store.begin().await {
            Ok(tx) => tx,
            Err(e) => {
                self.release_lock(&token).await;
                return Err(e);
            }
        };
        let result = self.create_in_tx(&mut tx, request).await;
        let result = finish::<P, _>(tx, result).await;

        self.release_lock(&token).await;
        result
    }

    async fn create_in_tx(&self, tx: &mut Tx<P>, request: &CreateBooking) -> Result<Booking> {
        self.ensure_active_requester(&request.requester_id).await?;

        let slot = tx
            .load_slot(request.slot_id)
            .await?
            .ok_or_else(|| BookingError::not_found(Entity::Slot, request.slot_id))?;
        if !slot.active {
            return Err(BookingError::inactive(Entity::Slot, slot.id));
        }
        if slot.provider_id != request.provider_id {
            return Err(BookingError::Mismatch {
                provider_id: request.provider_id.to_string(),
                slot_id: slot.id.to_string(),
            });
        }

        ConflictChecker::new(&mut *tx)
            .ensure_no_conflict(&request.requester_id, &slot)
            .await?;

        match tx.claim_slot(slot.id, slot.version).await? {
            ClaimOutcome::Claimed { version, occupied } => {
                tracing::debug!(%version, occupied, capacity = slot.capacity, "Slot claimed");
            }
            outcome @ (ClaimOutcome::Exhausted | ClaimOutcome::VersionConflict) => {
                tracing::debug!(?outcome, observed = %slot.version, "Slot claim refused");
                return Err(BookingError::CapacityExceeded);
            }
        }

        let id = self.env.ids.next_booking_id().await?;
        let booking = Booking::book(BookingDetails {
            id,
            requester_id: request.requester_id.clone(),
            provider_id: slot.provider_id.clone(),
            slot_id: slot.id,
            appointment_time: slot.appointment_time(),
            created_at: self.env.clock.now(),
        })
        .into_booking();

        tx.insert_booking(&booking).await?;
        Ok(booking)
    }

    async fn ensure_active_requester(&self, requester_id: &RequesterId) -> Result<()> {
        let profile = self
            .env
            .directory
            .requester(requester_id)
            .await?
            .ok_or_else(|| BookingError::not_found(Entity::Requester, requester_id))?;
        if !profile.active {
            return Err(BookingError::inactive(Entity::Requester, requester_id));
        }
        Ok(())
    }

    /// Release a lock; failures are logged and never replace the workflow result.
    async fn release_lock(&self, token: &LockToken) {
        match self.locks.release(token).await {
            Ok(LockRelease::Released) => {}
            Ok(LockRelease::NotOwner) => tracing::warn!(
                lock_key = token.key(),
                "Slot lock expired before the workflow finished"
            ),
            Err(e) => {
                tracing::error!(lock_key = token.key(), error = %e, "Failed to release slot lock");
            }
        }
    }

    // ========================================================================
    // Cancel / Complete
    // ========================================================================

    /// Cancel a booked booking and return its unit of capacity.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] if the booking does not exist
    /// - [`BookingError::InvalidState`] if it is not `Booked`
    /// - [`BookingError::TooLateToCancel`] inside the cutoff window
    /// - Store errors
    #[tracing::instrument(skip_all, fields(booking_id = %booking_id))]
    pub async fn cancel_booking(&self, booking_id: BookingId, reason: Option<String>) -> Result<()> {
        let mut tx = self.env.store.begin().await?;
        let result = self.cancel_in_tx(&mut tx, booking_id, reason).await;
        let cancelled = finish::<P, _>(tx, result).await?;

        metrics::record_transition(cancelled.status());
        tracing::info!(slot_id = %cancelled.slot_id(), "Booking cancelled");
        Ok(())
    }

    async fn cancel_in_tx(
        &self,
        tx: &mut Tx<P>,
        booking_id: BookingId,
        reason: Option<String>,
    ) -> Result<Booking> {
        let active = tx
            .load_booking(booking_id)
            .await?
            .ok_or_else(|| BookingError::not_found(Entity::Booking, booking_id))?
            .into_active()?;

        let now = self.env.clock.now();
        if !active.can_cancel_at(now, self.config.cancellation_cutoff) {
            return Err(BookingError::TooLateToCancel);
        }

        let version = tx.release_slot(active.booking().slot_id()).await?;
        tracing::debug!(%version, "Slot capacity released");

        let cancelled = active.cancel(reason, now);
        tx.update_booking_status(&cancelled).await?;
        Ok(cancelled)
    }

    /// Mark a booked booking as completed. Slot capacity stays consumed.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] if the booking does not exist
    /// - [`BookingError::InvalidState`] if it is not `Booked`
    /// - Store errors
    #[tracing::instrument(skip_all, fields(booking_id = %booking_id))]
    pub async fn complete_booking(&self, booking_id: BookingId) -> Result<()> {
        let mut tx = self.env.store.begin().await?;
        let result = self.complete_in_tx(&mut tx, booking_id).await;
        let completed = finish::<P, _>(tx, result).await?;

        metrics::record_transition(completed.status());
        tracing::info!("Booking completed");
        Ok(())
    }

    async fn complete_in_tx(&self, tx: &mut Tx<P>, booking_id: BookingId) -> Result<Booking> {
        let active = tx
            .load_booking(booking_id)
            .await?
            .ok_or_else(|| BookingError::not_found(Entity::Booking, booking_id))?
            .into_active()?;

        let completed = active.complete(self.env.clock.now());
        tx.update_booking_status(&completed).await?;
        Ok(completed)
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Fetch one booking.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::NotFound`] if it does not exist, or a store error.
    pub async fn get_booking(&self, booking_id: BookingId) -> Result<Booking> {
        self.env
            .store
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| BookingError::not_found(Entity::Booking, booking_id))
    }

    /// All bookings of a requester, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::NotFound`] for an unknown requester, or a store error.
    pub async fn list_for_requester(&self, requester_id: &RequesterId) -> Result<Vec<Booking>> {
        if self.env.directory.requester(requester_id).await?.is_none() {
            return Err(BookingError::not_found(Entity::Requester, requester_id));
        }
        self.env.store.list_by_requester(requester_id).await
    }

    /// All bookings on a provider's slots, by appointment time.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::NotFound`] for an unknown provider, or a store error.
    pub async fn list_for_provider(&self, provider_id: &ProviderId) -> Result<Vec<Booking>> {
        if !self.env.directory.provider_exists(provider_id).await? {
            return Err(BookingError::not_found(Entity::Provider, provider_id));
        }
        self.env.store.list_by_provider(provider_id).await
    }

    // ========================================================================
    // Slots
    // ========================================================================

    /// Register a new slot for a known provider.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] for an unknown provider
    /// - [`BookingError::Validation`] for an invalid window or capacity
    /// - Store errors
    pub async fn register_slot(&self, slot: NewSlot) -> Result<ScheduleSlot> {
        if !self.env.directory.provider_exists(&slot.provider_id).await? {
            return Err(BookingError::not_found(Entity::Provider, &slot.provider_id));
        }
        let slot = self.env.store.insert_slot(slot).await?;
        tracing::info!(
            slot_id = %slot.id,
            provider_id = %slot.provider_id,
            capacity = slot.capacity,
            "Slot registered"
        );
        Ok(slot)
    }

    /// Capacity view of a slot. Also refreshes the availability gauge.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::NotFound`] if the slot does not exist, or a store error.
    pub async fn slot_availability(&self, slot_id: SlotId) -> Result<SlotAvailability> {
        let availability = self
            .env
            .store
            .get_slot(slot_id)
            .await?
            .ok_or_else(|| BookingError::not_found(Entity::Slot, slot_id))?
            .availability();
        metrics::record_slot_availability(&availability);
        Ok(availability)
    }

    /// Withdraw a slot so it takes no more bookings.
    ///
    /// Runs under the slot lock so it cannot interleave with a create.
    ///
    /// # Errors
    ///
    /// - [`BookingError::Busy`] if the slot lock is held
    /// - [`BookingError::SlotInUse`] while the slot has bookings
    /// - [`BookingError::NotFound`] if the slot does not exist
    /// - Store errors
    #[tracing::instrument(skip_all, fields(slot_id = %slot_id))]
    pub async fn withdraw_slot(&self, slot_id: SlotId) -> Result<()> {
        let token = self.locks.acquire_slot(slot_id, self.config.lock_ttl).await?;

        let result = match self.env.store.begin().await {
            Ok(mut tx) => {
                let result = tx.withdraw_slot(slot_id).await;
                finish::<P, _>(tx, result).await
            }
            Err(e) => Err(e),
        };

        self.release_lock(&token).await;

        match &result {
            Ok(()) => tracing::info!("Slot withdrawn"),
            Err(e) => tracing::warn!(error = %e, "Slot withdrawal refused"),
        }
        result
    }
}

/// Commit on success, roll back on failure.
///
/// A rollback failure is logged; the original error is returned.
async fn finish<P: BookingProviders, T>(tx: Tx<P>, result: Result<T>) -> Result<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(error = %rollback_err, cause = %e, "Rollback failed");
            }
            Err(e)
        }
    }
}
