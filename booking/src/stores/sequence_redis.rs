//! Redis-backed booking id sequence.
//!
//! `INCR` on a single counter key; the server serializes increments, so ids
//! are unique across every process sharing the Redis instance.

use crate::constants::BOOKING_ID_SEQUENCE_KEY;
use crate::error::{BookingError, Result};
use crate::providers::IdAllocator;
use crate::types::BookingId;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

/// Booking id allocator on a Redis counter.
#[derive(Clone)]
pub struct RedisIdAllocator {
    conn_manager: ConnectionManager,
    key: String,
}

impl RedisIdAllocator {
    /// Allocator on the default counter key (`booking:id:seq`).
    #[must_use]
    pub fn new(conn_manager: ConnectionManager) -> Self {
        Self::with_key(conn_manager, BOOKING_ID_SEQUENCE_KEY)
    }

    /// Allocator on a custom counter key.
    #[must_use]
    pub fn with_key(conn_manager: ConnectionManager, key: impl Into<String>) -> Self {
        Self {
            conn_manager,
            key: key.into(),
        }
    }
}

impl IdAllocator for RedisIdAllocator {
    async fn next_booking_id(&self) -> Result<BookingId> {
        let mut conn = self.conn_manager.clone();

        let next: u64 = conn
            .incr(&self.key, 1_u64)
            .await
            .map_err(|e| BookingError::LockStore(format!("Failed to advance booking id sequence: {e}")))?;

        Ok(BookingId(next))
    }
}
