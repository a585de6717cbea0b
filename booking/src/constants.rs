//! Booking constants.

/// Default lock time-to-live in seconds.
///
/// Must exceed the worst-case duration of the create workflow's critical section.
pub const DEFAULT_LOCK_TTL_SECS: u64 = 10;

/// Default minimum lead time, in minutes, for cancelling a booking.
pub const DEFAULT_CANCELLATION_CUTOFF_MINUTES: i64 = 60;

/// Prefix of the per-slot lock key. The slot id is appended.
pub const LOCK_KEY_PREFIX: &str = "schedule:lock:";

/// Capacity assigned to a new slot when none is given.
pub const DEFAULT_SLOT_CAPACITY: u32 = 20;

/// Minimum number of digits in a rendered booking identifier.
pub const BOOKING_ID_WIDTH: usize = 12;

/// Redis key holding the booking id sequence.
pub const BOOKING_ID_SEQUENCE_KEY: &str = "booking:id:seq";

/// Booking status labels as persisted and exported.
pub mod status {
    /// Active reservation.
    pub const BOOKED: &str = "booked";

    /// Cancelled by the requester.
    pub const CANCELLED: &str = "cancelled";

    /// Visit took place.
    pub const COMPLETED: &str = "completed";
}
