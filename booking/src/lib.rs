//! # Booking Core
//!
//! Concurrency-safe booking of bounded-capacity appointment slots.
//!
//! ## Features
//!
//! - **No overselling**: a slot's occupancy never exceeds its capacity, even
//!   when many processes book the same slot at once
//! - **Two independent guards**: a per-slot distributed lock serializes
//!   attempts, and an optimistic version check on the slot rejects any claim
//!   that raced past the lock
//! - **All-or-nothing**: every workflow runs in one store transaction; a
//!   failed create leaves the slot untouched
//! - **Typed state machine**: only `Booked` bookings can be cancelled or
//!   completed, enforced by [`types::ActiveBooking`]
//! - **Testable**: every external dependency is a trait with an in-memory mock
//!
//! ## Architecture
//!
//! ```text
//! BookingService ──► LockCoordinator ──► LockStore (Redis)
//!       │
//!       ├──► ConflictChecker ─┐
//!       ├──► claim / release ─┴──► BookingStore transaction (PostgreSQL)
//!       ├──► IdAllocator (sequence)
//!       └──► IdentityDirectory
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use booking_core::*;
//!
//! let service = BookingService::new(env, BookingConfig::default());
//!
//! let booking = service
//!     .create_booking(CreateBooking {
//!         requester_id: RequesterId::new("1000000001"),
//!         provider_id: ProviderId::new("10000001"),
//!         slot_id: SlotId(42),
//!     })
//!     .await?;
//!
//! service.cancel_booking(booking.id(), Some("feeling better".into())).await?;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod config;
pub mod conflict;
pub mod constants;
pub mod environment;
pub mod error;
pub mod lock;
pub mod metrics;
pub mod providers;
pub mod service;
pub mod stores;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export main types for convenience
pub use config::BookingConfig;
pub use environment::{BookingEnvironment, BookingProviders, Clock, SystemClock};
pub use error::{BookingError, Entity, Result};
pub use lock::{LockCoordinator, LockRelease, LockToken};
pub use service::BookingService;
pub use types::{
    Booking, BookingId, BookingStatus, CreateBooking, NewSlot, ProviderId, RequesterId,
    ScheduleSlot, SlotAvailability, SlotId, SlotVersion,
};
