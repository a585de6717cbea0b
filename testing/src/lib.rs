//! # Booking Testing
//!
//! Testing utilities and fixtures for the booking core.
//!
//! This crate provides:
//! - Deterministic clocks
//! - A ready-wired [`TestHarness`] over the in-memory providers
//! - Slot fixture builders
//! - proptest strategies for slot operations
//!
//! ## Example
//!
//! ```ignore
//! use booking_testing::{SlotFixture, TestHarness};
//!
//! #[tokio::test]
//! async fn test_booking_flow() {
//!     let harness = TestHarness::new();
//!     harness.requester("p1");
//!     let slot = harness.slot(SlotFixture::new("d1").capacity(2)).await.unwrap();
//!
//!     let booking = harness
//!         .service
//!         .create_booking(harness.request("p1", &slot))
//!         .await
//!         .unwrap();
//!     assert_eq!(harness.store.slot(slot.id).await.unwrap().occupied, 1);
//! }
//! ```

use booking_core::environment::Clock;
use chrono::{DateTime, Utc};

/// Deterministic clocks for tests.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::{Arc, Mutex};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use booking_testing::mocks::FixedClock;
    /// use booking_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that tests can move forward.
    ///
    /// Clones share the same time.
    #[derive(Debug, Clone)]
    pub struct AdjustableClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl AdjustableClock {
        /// Start at `time`.
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(time)),
            }
        }

        /// Move the clock forward (or back, for a negative duration).
        pub fn advance(&self, by: chrono::Duration) {
            if let Ok(mut time) = self.time.lock() {
                *time += by;
            }
        }

        /// Jump to an absolute time.
        pub fn set(&self, to: DateTime<Utc>) {
            if let Ok(mut time) = self.time.lock() {
                *time = to;
            }
        }
    }

    impl Clock for AdjustableClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
                .lock()
                .map_or_else(|poisoned| *poisoned.into_inner(), |time| *time)
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Fixtures and a wired-up service for tests.
pub mod helpers {
    use super::Clock;
    use super::mocks::{AdjustableClock, test_clock};
    use booking_core::mocks::{
        InMemoryBookingStore, InMemoryProviders, MockIdentityDirectory, MockLockStore,
        SequentialIdAllocator,
    };
    use booking_core::{
        BookingConfig, BookingEnvironment, BookingService, CreateBooking, NewSlot, ProviderId,
        RequesterId, Result, ScheduleSlot,
    };
    use chrono::{Days, NaiveDate, NaiveTime};
    use std::sync::Arc;

    /// Builder for [`NewSlot`].
    ///
    /// Defaults: the day after [`test_clock`], 09:00-09:30, capacity 1.
    #[derive(Debug, Clone)]
    pub struct SlotFixture {
        provider_id: String,
        date: NaiveDate,
        start: NaiveTime,
        minutes: u32,
        capacity: Option<u32>,
    }

    impl SlotFixture {
        /// Slot owned by `provider_id`.
        #[must_use]
        pub fn new(provider_id: impl Into<String>) -> Self {
            let tomorrow = test_clock().now().date_naive() + Days::new(1);
            Self {
                provider_id: provider_id.into(),
                date: tomorrow,
                start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
                minutes: 30,
                capacity: Some(1),
            }
        }

        /// Set the capacity; `None` leaves it to the store default.
        #[must_use]
        pub const fn capacity_opt(mut self, capacity: Option<u32>) -> Self {
            self.capacity = capacity;
            self
        }

        /// Set the capacity.
        #[must_use]
        pub const fn capacity(self, capacity: u32) -> Self {
            self.capacity_opt(Some(capacity))
        }

        /// Set the day.
        #[must_use]
        pub const fn on(mut self, date: NaiveDate) -> Self {
            self.date = date;
            self
        }

        /// Set the start time (hour and minute); the window stays 30 minutes.
        #[must_use]
        pub fn at(mut self, hour: u32, minute: u32) -> Self {
            self.start = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default();
            self
        }

        /// Build the slot input.
        #[must_use]
        pub fn build(&self) -> NewSlot {
            NewSlot {
                provider_id: ProviderId::new(self.provider_id.clone()),
                date: self.date,
                start_time: self.start,
                end_time: self.start + chrono::Duration::minutes(i64::from(self.minutes)),
                capacity: self.capacity,
            }
        }
    }

    /// A [`BookingService`] over in-memory providers, plus handles to each
    /// provider for assertions.
    pub struct TestHarness {
        /// The service under test.
        pub service: Arc<BookingService<InMemoryProviders>>,
        /// Slot and booking store.
        pub store: InMemoryBookingStore,
        /// Lock store.
        pub locks: MockLockStore,
        /// Requester/provider directory.
        pub directory: MockIdentityDirectory,
        /// Time source, starting at [`test_clock`].
        pub clock: AdjustableClock,
    }

    impl TestHarness {
        /// Harness with the default configuration.
        #[must_use]
        pub fn new() -> Self {
            Self::with_config(BookingConfig::default())
        }

        /// Harness with a custom configuration.
        #[must_use]
        pub fn with_config(config: BookingConfig) -> Self {
            let store = InMemoryBookingStore::new();
            let locks = MockLockStore::new();
            let directory = MockIdentityDirectory::new();
            let clock = AdjustableClock::new(test_clock().now());

            let env = BookingEnvironment::<InMemoryProviders>::new(
                store.clone(),
                locks.clone(),
                SequentialIdAllocator::new(),
                directory.clone(),
                Arc::new(clock.clone()),
            );

            Self {
                service: Arc::new(BookingService::new(env, config)),
                store,
                locks,
                directory,
                clock,
            }
        }

        /// Register an active requester.
        pub fn requester(&self, id: &str) {
            self.directory.add_requester(id);
        }

        /// Register the fixture's provider and the slot itself.
        ///
        /// # Errors
        ///
        /// Returns error if the slot is rejected by the service.
        pub async fn slot(&self, fixture: SlotFixture) -> Result<ScheduleSlot> {
            let slot = fixture.build();
            self.directory.add_provider(slot.provider_id.as_str());
            self.service.register_slot(slot).await
        }

        /// Create-booking input for a requester on a slot's own provider.
        #[must_use]
        pub fn request(&self, requester_id: &str, slot: &ScheduleSlot) -> CreateBooking {
            CreateBooking {
                requester_id: RequesterId::new(requester_id),
                provider_id: slot.provider_id.clone(),
                slot_id: slot.id,
            }
        }
    }

    impl Default for TestHarness {
        fn default() -> Self {
            Self::new()
        }
    }

    /// Install a test-friendly tracing subscriber once (output captured by the
    /// test harness). Filter from `RUST_LOG`, default `booking_core=debug`.
    pub fn init_test_tracing() {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("booking_core=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;

    /// One operation against a single slot.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum SlotOp {
        /// Claim with the version the caller last read.
        Claim,
        /// Claim with a version older than the current one.
        StaleClaim,
        /// Release one unit.
        Release,
    }

    /// Slot capacities worth exercising.
    pub fn capacity() -> impl Strategy<Value = u32> {
        1_u32..=8
    }

    /// Random sequences of slot operations, claim-heavy.
    pub fn slot_ops() -> impl Strategy<Value = Vec<SlotOp>> {
        prop::collection::vec(
            prop_oneof![
                4 => Just(SlotOp::Claim),
                1 => Just(SlotOp::StaleClaim),
                2 => Just(SlotOp::Release),
            ],
            0..64,
        )
    }
}

// Re-export commonly used items
pub use helpers::{SlotFixture, TestHarness, init_test_tracing};
pub use mocks::{AdjustableClock, FixedClock, test_clock};
