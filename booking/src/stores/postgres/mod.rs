//! PostgreSQL storage implementations.
//!
//! This module provides persistent storage using PostgreSQL for:
//! - Schedule slots and bookings (transactional, with the optimistic claim)
//! - The booking id sequence
//! - Read access to requester and provider profiles
//!
//! Queries are checked at runtime (`sqlx::query` + `bind`), so building the
//! crate does not need a live database.

pub mod booking;
pub mod identity;
pub mod sequence;

// Re-exports
pub use booking::{PostgresBookingStore, PostgresTransaction};
pub use identity::PostgresIdentityDirectory;
pub use sequence::PostgresIdAllocator;

use crate::error::{BookingError, Result};
use sqlx::PgPool;

/// Run the booking schema migrations.
///
/// # Errors
///
/// Returns error if migrations fail.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| BookingError::Database(format!("Migration failed: {e}")))?;
    Ok(())
}

/// Map a driver error into a [`BookingError::Database`] with context.
pub(crate) fn db_error(context: &str) -> impl FnOnce(sqlx::Error) -> BookingError + '_ {
    move |e| BookingError::Database(format!("{context}: {e}"))
}

/// Column value to domain integer, rejecting negatives.
pub(crate) fn non_negative<T: TryFrom<i64>>(value: i64, column: &str) -> Result<T> {
    T::try_from(value)
        .map_err(|_| BookingError::Database(format!("Invalid value {value} in column {column}")))
}

/// Domain integer to a `BIGINT` bind value.
pub(crate) fn to_bigint(value: u64, what: &str) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| BookingError::Validation(format!("{what} {value} is out of range")))
}
