//! HTTP request handlers.
//!
//! This module contains all HTTP handlers organized by resource.

pub mod bookings;
pub mod health;
pub mod slots;

// Re-export common handler utilities
pub use health::health_check;
