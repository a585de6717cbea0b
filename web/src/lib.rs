//! HTTP surface for the booking core.
//!
//! Thin axum handlers translate requests into [`booking_core::BookingService`]
//! calls and map [`booking_core::BookingError`] onto status codes. The handlers
//! are generic over [`booking_core::BookingProviders`], so the same router
//! runs over `PostgreSQL`/`Redis` in production and the in-memory providers
//! in tests.
//!
//! # Request Flow
//!
//! 1. **Correlation ID** is read from `X-Correlation-ID` (or generated)
//! 2. **Extract** path, query and JSON body
//! 3. **Call** the booking service
//! 4. **Map** the result (or [`AppError`]) to a response
//!
//! # Example
//!
//! ```ignore
//! use booking_web::{routes, AppState};
//!
//! let state = AppState::new(service);
//! let app = routes::router(state);
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

// Re-export key types for convenience
pub use config::Config;
pub use error::AppError;
pub use middleware::{CORRELATION_ID_HEADER, CorrelationId, correlation_id_layer};
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
