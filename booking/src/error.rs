//! Error types for booking operations.

use std::fmt;
use thiserror::Error;

/// Result type alias for booking operations.
pub type Result<T> = std::result::Result<T, BookingError>;

/// The kind of record an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    /// The patient (or other party) making the booking.
    Requester,
    /// The doctor (or other party) owning a schedule slot.
    Provider,
    /// A schedule slot.
    Slot,
    /// A booking record.
    Booking,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Requester => "requester",
            Self::Provider => "provider",
            Self::Slot => "slot",
            Self::Booking => "booking",
        };
        f.write_str(name)
    }
}

/// Error taxonomy for the booking core.
///
/// Business-rule failures are surfaced to the caller as-is. Only
/// [`BookingError::CapacityExceeded`] and [`BookingError::Busy`] are
/// retryable, and a retry means re-running the whole workflow since slot
/// state may have changed in the meantime.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BookingError {
    // ═══════════════════════════════════════════════════════════
    // Business Rule Violations
    // ═══════════════════════════════════════════════════════════

    /// Requester, provider, slot, or booking does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of record that is missing
        entity: Entity,
        /// Identifier that was looked up
        id: String,
    },

    /// Slot withdrawn by its provider, or requester deactivated.
    #[error("{entity} {id} is inactive")]
    Inactive {
        /// Kind of record that is inactive
        entity: Entity,
        /// Identifier of the inactive record
        id: String,
    },

    /// Provider in the request does not own the referenced slot.
    #[error("provider {provider_id} does not own slot {slot_id}")]
    Mismatch {
        /// Provider named in the request
        provider_id: String,
        /// Slot named in the request
        slot_id: String,
    },

    /// Requester already holds an active booking on this slot.
    #[error("an active booking already exists for this slot")]
    DuplicateBooking,

    /// Requester already holds an active booking at the same date and start time.
    #[error("an active booking already exists at this date and time")]
    TimeConflict,

    /// Slot is full or was concurrently taken. Refresh and try again.
    #[error("slot is full or was concurrently taken, please refresh and retry")]
    CapacityExceeded,

    /// Slot lock is held by another attempt.
    #[error("system busy, please retry")]
    Busy,

    /// Workflow applied to a booking in the wrong state.
    #[error("only booked bookings can be changed (current status: {current})")]
    InvalidState {
        /// Status the booking was in
        current: &'static str,
    },

    /// Cancellation attempted inside the cutoff window before the appointment.
    #[error("appointment starts too soon to cancel")]
    TooLateToCancel,

    /// Slot still has bookings and cannot be withdrawn.
    #[error("slot still has {occupied} booking(s) and cannot be withdrawn")]
    SlotInUse {
        /// Current occupancy of the slot
        occupied: u32,
    },

    /// Request failed input validation.
    #[error("validation failed: {0}")]
    Validation(String),

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Transactional store failure.
    #[error("database error: {0}")]
    Database(String),

    /// Lock store failure (distinct from contention, which is `Busy`).
    #[error("lock store error: {0}")]
    LockStore(String),

    /// Internal error (should not be exposed to users).
    #[error("internal error: {0}")]
    Internal(String),
}

impl BookingError {
    /// Shorthand for [`BookingError::NotFound`].
    pub fn not_found(entity: Entity, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for [`BookingError::Inactive`].
    pub fn inactive(entity: Entity, id: impl fmt::Display) -> Self {
        Self::Inactive {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns `true` if the caller may re-run the whole workflow.
    ///
    /// # Examples
    ///
    /// ```
    /// # use booking_core::BookingError;
    /// assert!(BookingError::Busy.is_retryable());
    /// assert!(BookingError::CapacityExceeded.is_retryable());
    /// assert!(!BookingError::DuplicateBooking.is_retryable());
    /// ```
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::CapacityExceeded | Self::Busy)
    }

    /// Returns `true` if this error reflects infrastructure failure rather
    /// than a business outcome.
    pub const fn is_system_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::LockStore(_) | Self::Internal(_)
        )
    }

    /// Stable, low-cardinality label used for metrics and logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Inactive { .. } => "inactive",
            Self::Mismatch { .. } => "mismatch",
            Self::DuplicateBooking => "duplicate",
            Self::TimeConflict => "time_conflict",
            Self::CapacityExceeded => "capacity_exceeded",
            Self::Busy => "busy",
            Self::InvalidState { .. } => "invalid_state",
            Self::TooLateToCancel => "too_late_to_cancel",
            Self::SlotInUse { .. } => "slot_in_use",
            Self::Validation(_) => "validation",
            Self::Database(_) | Self::LockStore(_) | Self::Internal(_) => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_capacity_and_busy_are_retryable() {
        let errors = [
            BookingError::not_found(Entity::Slot, 7),
            BookingError::inactive(Entity::Requester, "p-1"),
            BookingError::DuplicateBooking,
            BookingError::TimeConflict,
            BookingError::InvalidState { current: "cancelled" },
            BookingError::TooLateToCancel,
            BookingError::Database("boom".to_string()),
        ];
        for err in errors {
            assert!(!err.is_retryable(), "{err} should not be retryable");
        }
        assert!(BookingError::CapacityExceeded.is_retryable());
        assert!(BookingError::Busy.is_retryable());
    }

    #[test]
    fn test_not_found_message_names_entity() {
        let err = BookingError::not_found(Entity::Booking, "000000000042");
        assert_eq!(err.to_string(), "booking 000000000042 not found");
    }

    #[test]
    fn test_system_errors_share_a_kind() {
        assert_eq!(BookingError::Database("x".into()).kind(), "error");
        assert_eq!(BookingError::LockStore("x".into()).kind(), "error");
        assert!(BookingError::LockStore("x".into()).is_system_error());
        assert!(!BookingError::Busy.is_system_error());
    }
}
