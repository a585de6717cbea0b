//! Booking identifier allocation.

use crate::error::Result;
use crate::types::BookingId;

/// Source of globally unique, monotonically increasing booking ids.
///
/// Implementations MUST be atomic across processes (a database sequence or
/// `Redis` `INCR`). Reading the current maximum and adding one is not
/// acceptable: two concurrent creates would compute the same id.
///
/// Ids handed out to a workflow that later fails are not reused, so the
/// sequence may have gaps.
pub trait IdAllocator: Send + Sync {
    /// Allocate the next id.
    ///
    /// # Errors
    ///
    /// Returns error if the sequence cannot be advanced.
    fn next_booking_id(&self) -> impl std::future::Future<Output = Result<BookingId>> + Send;
}
