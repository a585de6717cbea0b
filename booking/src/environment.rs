//! Booking environment.
//!
//! All external dependencies of the booking workflows are abstracted behind
//! traits and injected here.

use crate::providers::{BookingStore, IdAllocator, IdentityDirectory, LockStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Clock trait - abstracts time operations for testability.
pub trait Clock: Send + Sync {
    /// Get the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Bundle of provider types used by one deployment of the booking core.
///
/// Lets services and HTTP handlers be generic over a single parameter.
pub trait BookingProviders: Send + Sync + 'static {
    /// Transactional slot and booking store.
    type Store: BookingStore + Clone + 'static;
    /// Distributed lock store.
    type Locks: LockStore + Clone + 'static;
    /// Booking id sequence.
    type Ids: IdAllocator + Clone + 'static;
    /// Requester/provider directory.
    type Directory: IdentityDirectory + Clone + 'static;
}

/// Booking environment.
///
/// Contains all external dependencies needed by the booking workflows.
pub struct BookingEnvironment<P: BookingProviders> {
    /// Slot and booking store (`PostgreSQL`).
    pub store: P::Store,

    /// Lock store (`Redis`).
    pub locks: P::Locks,

    /// Booking id sequence (`PostgreSQL` sequence or `Redis` counter).
    pub ids: P::Ids,

    /// Requester/provider directory (`PostgreSQL`).
    pub directory: P::Directory,

    /// Time source.
    pub clock: Arc<dyn Clock>,
}

impl<P: BookingProviders> BookingEnvironment<P> {
    /// Create a new booking environment.
    #[must_use]
    pub fn new(
        store: P::Store,
        locks: P::Locks,
        ids: P::Ids,
        directory: P::Directory,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            locks,
            ids,
            directory,
            clock,
        }
    }
}

impl<P: BookingProviders> Clone for BookingEnvironment<P> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            locks: self.locks.clone(),
            ids: self.ids.clone(),
            directory: self.directory.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}
