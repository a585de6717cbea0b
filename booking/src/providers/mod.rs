//! Booking providers.
//!
//! This module defines traits for all external dependencies used by the
//! booking core. These traits enable dependency injection and make the
//! booking workflows testable.
//!
//! # Architecture
//!
//! Providers are **interfaces**, not implementations. The orchestrator
//! depends on these traits, and the application provides concrete
//! implementations:
//!
//! ```text
//! ┌──────────────────────────┐
//! │ BookingService           │
//! │ (create/cancel/complete) │
//! └──┬───────┬───────┬───────┘
//!    │       │       │
//!    ▼       ▼       ▼
//! LockStore  BookingStore  IdAllocator / IdentityDirectory
//! (Redis)    (PostgreSQL)  (PostgreSQL, Redis)
//! ```
//!
//! The lock store and the slot store are deliberately independent layers:
//! the lock serializes attempts on one slot, while the slot claim's version
//! check keeps capacity correct even when the lock is lost.
//!
//! This enables:
//! - **Testing**: Use mocks (in-memory, deterministic)
//! - **Production**: Use real services (`PostgreSQL`, `Redis`)

pub mod booking_store;
pub mod id_allocator;
pub mod identity;
pub mod lock_store;

pub use booking_store::{BookingStore, BookingTransaction};
pub use id_allocator::IdAllocator;
pub use identity::IdentityDirectory;
pub use lock_store::LockStore;
