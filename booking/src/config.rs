//! Booking configuration.
//!
//! Values should be provided by the application; the defaults match the
//! production policy (10 second lock, 1 hour cancellation cutoff).

use crate::constants::{
    DEFAULT_CANCELLATION_CUTOFF_MINUTES, DEFAULT_LOCK_TTL_SECS, LOCK_KEY_PREFIX,
};
use chrono::Duration;

/// Booking workflow configuration.
#[derive(Debug, Clone)]
pub struct BookingConfig {
    /// Time-to-live of the per-slot lock.
    ///
    /// Default: 10 seconds
    pub lock_ttl: std::time::Duration,

    /// Minimum time between "now" and the appointment for a cancellation
    /// to be accepted.
    ///
    /// Default: 1 hour
    pub cancellation_cutoff: Duration,

    /// Prefix of lock keys in the lock store.
    ///
    /// Default: `schedule:lock:`
    pub lock_key_prefix: String,
}

impl BookingConfig {
    /// Create configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lock_ttl: std::time::Duration::from_secs(DEFAULT_LOCK_TTL_SECS),
            cancellation_cutoff: Duration::minutes(DEFAULT_CANCELLATION_CUTOFF_MINUTES),
            lock_key_prefix: LOCK_KEY_PREFIX.to_string(),
        }
    }

    /// Set lock time-to-live.
    #[must_use]
    pub const fn with_lock_ttl(mut self, ttl: std::time::Duration) -> Self {
        self.lock_ttl = ttl;
        self
    }

    /// Set cancellation cutoff.
    #[must_use]
    pub const fn with_cancellation_cutoff(mut self, cutoff: Duration) -> Self {
        self.cancellation_cutoff = cutoff;
        self
    }

    /// Set lock key prefix.
    #[must_use]
    pub fn with_lock_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.lock_key_prefix = prefix.into();
        self
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self::new()
    }
}
