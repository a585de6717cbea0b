//! Application state for Axum handlers.

use booking_core::{BookingProviders, BookingService};
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Generic over the provider bundle so the router can be exercised with the
/// in-memory providers.
pub struct AppState<P: BookingProviders> {
    /// The booking service.
    pub service: Arc<BookingService<P>>,
}

impl<P: BookingProviders> AppState<P> {
    /// Create a new application state.
    #[must_use]
    pub const fn new(service: Arc<BookingService<P>>) -> Self {
        Self { service }
    }
}

// Manual impl: `P` itself need not be `Clone`.
impl<P: BookingProviders> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}
