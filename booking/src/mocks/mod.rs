//! Mock provider implementations for testing.
//!
//! This module provides simple, in-memory implementations of all provider
//! traits for use in unit and integration tests. Clones share state, so a
//! cloned mock stands in for another process talking to the same backend.

pub mod booking_store;
pub mod id_allocator;
pub mod identity;
pub mod lock_store;

pub use booking_store::{InMemoryBookingStore, InMemoryTransaction};
pub use id_allocator::SequentialIdAllocator;
pub use identity::MockIdentityDirectory;
pub use lock_store::MockLockStore;

use crate::environment::BookingProviders;

/// Provider bundle backed entirely by in-memory mocks.
#[derive(Debug, Clone, Copy)]
pub struct InMemoryProviders;

impl BookingProviders for InMemoryProviders {
    type Store = InMemoryBookingStore;
    type Locks = MockLockStore;
    type Ids = SequentialIdAllocator;
    type Directory = MockIdentityDirectory;
}
