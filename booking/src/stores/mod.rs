//! Storage implementations for the booking core.
//!
//! - **Lock Store** (Redis) - Per-slot locks with `SET NX PX` and a
//!   compare-and-delete script
//! - **Id Sequence** (Redis or PostgreSQL) - Atomic booking id allocation
//! - **Booking Store** (PostgreSQL) - Slots and bookings with transactional
//!   optimistic claims
//! - **Identity Directory** (PostgreSQL) - Requester and provider lookups

pub mod lock_redis;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod sequence_redis;

// Re-exports
pub use lock_redis::RedisLockStore;
#[cfg(feature = "postgres")]
pub use postgres::{
    PostgresBookingStore, PostgresIdAllocator, PostgresIdentityDirectory, PostgresTransaction,
};
pub use sequence_redis::RedisIdAllocator;

#[cfg(feature = "postgres")]
use crate::environment::BookingProviders;

/// Production provider bundle: PostgreSQL store, ids and directory with a
/// Redis lock store.
#[cfg(feature = "postgres")]
#[derive(Debug, Clone, Copy)]
pub struct ProductionProviders;

#[cfg(feature = "postgres")]
impl BookingProviders for ProductionProviders {
    type Store = PostgresBookingStore;
    type Locks = RedisLockStore;
    type Ids = PostgresIdAllocator;
    type Directory = PostgresIdentityDirectory;
}
