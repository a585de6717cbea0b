//! PostgreSQL booking id sequence.

use super::{db_error, non_negative};
use crate::error::Result;
use crate::providers::IdAllocator;
use crate::types::BookingId;
use sqlx::PgPool;

/// Booking id allocator on the `booking_id_seq` sequence.
///
/// `nextval` is non-transactional: an id taken by a workflow that later
/// rolls back is skipped, never handed out twice.
#[derive(Clone)]
pub struct PostgresIdAllocator {
    /// PostgreSQL connection pool.
    pool: PgPool,
}

impl PostgresIdAllocator {
    /// Create a new allocator on a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl IdAllocator for PostgresIdAllocator {
    async fn next_booking_id(&self) -> Result<BookingId> {
        let next: i64 = sqlx::query_scalar("SELECT nextval('booking_id_seq')")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to advance booking id sequence"))?;

        Ok(BookingId(non_negative(next, "nextval")?))
    }
}
