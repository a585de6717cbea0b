//! Domain types for the booking core.
//!
//! Identifiers, the schedule slot record, and the booking state machine.
//! A booking's status can only move forward through [`ActiveBooking`]:
//! the transition methods exist on nothing else, so a cancelled or
//! completed booking cannot be changed again.

use crate::constants::{BOOKING_ID_WIDTH, status};
use crate::error::{BookingError, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Identifiers
// ============================================================================

/// Identifier of a schedule slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotId(pub i64);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a booking, allocated from an atomic sequence.
///
/// Rendered (and serialized) as a decimal string zero-padded to at least 12 digits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct BookingId(pub u64);

impl From<BookingId> for String {
    fn from(id: BookingId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for BookingId {
    type Error = BookingError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.0, width = BOOKING_ID_WIDTH)
    }
}

impl FromStr for BookingId {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self> {
        // Display pads to BOOKING_ID_WIDTH but never truncates, so longer ids parse too.
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(BookingError::Validation(format!(
                "booking id must be decimal digits, got {s:?}"
            )));
        }
        s.parse::<u64>()
            .map(Self)
            .map_err(|e| BookingError::Validation(format!("invalid booking id {s:?}: {e}")))
    }
}

/// Identifier of the party making a booking (a patient).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequesterId(pub String);

impl RequesterId {
    /// Create a requester id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequesterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the party owning schedule slots (a doctor).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProviderId(pub String);

impl ProviderId {
    /// Create a provider id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Optimistic concurrency version of a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotVersion(pub u64);

impl SlotVersion {
    /// The version that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SlotVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

// ============================================================================
// Schedule Slots
// ============================================================================

/// One provider's bookable time window on one day.
///
/// `occupied` and `version` are only ever changed through the slot store's
/// claim and release operations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    /// Slot identity
    pub id: SlotId,
    /// Owning provider
    pub provider_id: ProviderId,
    /// Day of the slot
    pub date: NaiveDate,
    /// Start of the window
    pub start_time: NaiveTime,
    /// End of the window
    pub end_time: NaiveTime,
    /// Maximum number of bookings
    pub capacity: u32,
    /// Current number of active bookings (`0 ≤ occupied ≤ capacity`)
    pub occupied: u32,
    /// `false` once withdrawn by the provider
    pub active: bool,
    /// Incremented on every occupancy change
    pub version: SlotVersion,
}

impl ScheduleSlot {
    /// Remaining capacity.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.capacity.saturating_sub(self.occupied)
    }

    /// Whether no capacity is left.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.occupied >= self.capacity
    }

    /// Appointment timestamp for bookings on this slot (date + start time, UTC).
    #[must_use]
    pub fn appointment_time(&self) -> DateTime<Utc> {
        self.date.and_time(self.start_time).and_utc()
    }

    /// Availability snapshot for read APIs.
    #[must_use]
    pub const fn availability(&self) -> SlotAvailability {
        SlotAvailability {
            slot_id: self.id,
            capacity: self.capacity,
            occupied: self.occupied,
            remaining: self.remaining(),
            active: self.active,
        }
    }
}

/// Input for registering a new slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSlot {
    /// Owning provider
    pub provider_id: ProviderId,
    /// Day of the slot
    pub date: NaiveDate,
    /// Start of the window
    pub start_time: NaiveTime,
    /// End of the window
    pub end_time: NaiveTime,
    /// Capacity (defaults to 20 when `None`)
    pub capacity: Option<u32>,
}

impl NewSlot {
    /// Validate the time window and capacity.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] if the window is empty or the
    /// capacity is zero.
    pub fn validate(&self) -> Result<()> {
        if self.end_time <= self.start_time {
            return Err(BookingError::Validation(
                "slot end time must be after its start time".to_string(),
            ));
        }
        if self.capacity == Some(0) {
            return Err(BookingError::Validation(
                "slot capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Capacity view of a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAvailability {
    /// Slot identity
    pub slot_id: SlotId,
    /// Maximum number of bookings
    pub capacity: u32,
    /// Current number of active bookings
    pub occupied: u32,
    /// `capacity - occupied`
    pub remaining: u32,
    /// `false` once withdrawn
    pub active: bool,
}

/// Result of an atomic slot claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Occupancy and version were both incremented.
    Claimed {
        /// Version after the claim
        version: SlotVersion,
        /// Occupancy after the claim
        occupied: u32,
    },
    /// The slot was already full.
    Exhausted,
    /// The slot changed since the caller read it.
    VersionConflict,
}

impl ClaimOutcome {
    /// Whether the claim took effect.
    #[must_use]
    pub const fn is_claimed(&self) -> bool {
        matches!(self, Self::Claimed { .. })
    }
}

// ============================================================================
// Requesters
// ============================================================================

/// What the identity collaborator knows about a requester.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequesterProfile {
    /// Requester identity
    pub id: RequesterId,
    /// `false` if the account has been deactivated
    pub active: bool,
}

// ============================================================================
// Bookings
// ============================================================================

/// Booking status.
///
/// `Booked` is the only non-terminal state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BookingStatus {
    /// Active reservation holding one unit of slot capacity.
    Booked,
    /// Cancelled by the requester; capacity was returned.
    Cancelled {
        /// Free-text reason given at cancellation
        reason: Option<String>,
    },
    /// The visit took place; capacity stays consumed.
    Completed,
}

impl BookingStatus {
    /// Persisted label of this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Booked => status::BOOKED,
            Self::Cancelled { .. } => status::CANCELLED,
            Self::Completed => status::COMPLETED,
        }
    }

    /// Rebuild a status from its persisted label and reason column.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Database`] for an unknown label.
    pub fn from_parts(label: &str, reason: Option<String>) -> Result<Self> {
        match label {
            status::BOOKED => Ok(Self::Booked),
            status::CANCELLED => Ok(Self::Cancelled { reason }),
            status::COMPLETED => Ok(Self::Completed),
            other => Err(BookingError::Database(format!(
                "Invalid booking status: {other}"
            ))),
        }
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Booked)
    }

    /// Cancellation reason, if cancelled with one.
    #[must_use]
    pub fn cancel_reason(&self) -> Option<&str> {
        match self {
            Self::Cancelled { reason } => reason.as_deref(),
            _ => None,
        }
    }
}

/// Immutable facts of a booking, fixed at creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDetails {
    /// Booking identity
    pub id: BookingId,
    /// Who booked
    pub requester_id: RequesterId,
    /// Whose slot
    pub provider_id: ProviderId,
    /// Which slot
    pub slot_id: SlotId,
    /// Slot date + start time
    pub appointment_time: DateTime<Utc>,
    /// When the booking was made
    pub created_at: DateTime<Utc>,
}

/// A booking record.
///
/// The status is private; it changes only through [`ActiveBooking`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    details: BookingDetails,
    #[serde(flatten)]
    status: BookingStatus,
    updated_at: DateTime<Utc>,
}

impl Booking {
    /// Create a fresh booking in the `Booked` state.
    #[must_use]
    pub fn book(details: BookingDetails) -> ActiveBooking {
        let updated_at = details.created_at;
        ActiveBooking(Self {
            details,
            status: BookingStatus::Booked,
            updated_at,
        })
    }

    /// Rebuild a booking loaded from storage.
    #[must_use]
    pub const fn restore(
        details: BookingDetails,
        status: BookingStatus,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            details,
            status,
            updated_at,
        }
    }

    /// Enter the active state, if this booking is still `Booked`.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidState`] for cancelled or completed bookings.
    pub fn into_active(self) -> Result<ActiveBooking> {
        if self.status.is_terminal() {
            return Err(BookingError::InvalidState {
                current: self.status.as_str(),
            });
        }
        Ok(ActiveBooking(self))
    }

    /// Immutable booking facts.
    #[must_use]
    pub const fn details(&self) -> &BookingDetails {
        &self.details
    }

    /// Booking identity.
    #[must_use]
    pub const fn id(&self) -> BookingId {
        self.details.id
    }

    /// Slot this booking holds capacity on.
    #[must_use]
    pub const fn slot_id(&self) -> SlotId {
        self.details.slot_id
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> &BookingStatus {
        &self.status
    }

    /// Last status change.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// A booking known to be in the `Booked` state.
///
/// Consuming `cancel` or `complete` is the only way to move a booking out of
/// `Booked`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveBooking(Booking);

impl ActiveBooking {
    /// Whether cancelling at `now` respects the cutoff before the appointment.
    #[must_use]
    pub fn can_cancel_at(&self, now: DateTime<Utc>, cutoff: chrono::Duration) -> bool {
        self.0.details.appointment_time >= now + cutoff
    }

    /// Booked → Cancelled.
    #[must_use]
    pub fn cancel(self, reason: Option<String>, at: DateTime<Utc>) -> Booking {
        Booking {
            details: self.0.details,
            status: BookingStatus::Cancelled { reason },
            updated_at: at,
        }
    }

    /// Booked → Completed.
    #[must_use]
    pub fn complete(self, at: DateTime<Utc>) -> Booking {
        Booking {
            details: self.0.details,
            status: BookingStatus::Completed,
            updated_at: at,
        }
    }

    /// Borrow the underlying booking.
    #[must_use]
    pub const fn booking(&self) -> &Booking {
        &self.0
    }

    /// Leave the typestate, keeping the `Booked` record.
    #[must_use]
    pub fn into_booking(self) -> Booking {
        self.0
    }
}

/// Input of the create workflow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBooking {
    /// Who is booking
    pub requester_id: RequesterId,
    /// Provider the requester expects to own the slot
    pub provider_id: ProviderId,
    /// Slot to book
    pub slot_id: SlotId,
}
