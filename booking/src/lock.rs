//! Distributed lock coordinator.
//!
//! Per-slot mutual exclusion across process boundaries. A lock is a key in
//! the [`LockStore`] holding a random token value with an expiry, so a
//! crashed holder blocks the slot for at most one TTL.
//!
//! # Example
//!
//! ```no_run
//! use booking_core::lock::{LockCoordinator, LockRelease};
//! use booking_core::mocks::MockLockStore;
//! use booking_core::types::SlotId;
//! use std::time::Duration;
//!
//! # async fn example() -> booking_core::Result<()> {
//! let locks = LockCoordinator::new(MockLockStore::new(), "schedule:lock:");
//! let token = locks.acquire_slot(SlotId(7), Duration::from_secs(10)).await?;
//! // ... critical section ...
//! assert_eq!(locks.release(&token).await?, LockRelease::Released);
//! # Ok(())
//! # }
//! ```

use crate::error::{BookingError, Result};
use crate::metrics;
use crate::providers::LockStore;
use crate::types::SlotId;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Proof of ownership of one lock acquisition.
///
/// The value is unique per acquisition; releasing with a token that no
/// longer matches the stored value is refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockToken {
    key: String,
    value: String,
    acquired_at: Instant,
    ttl: Duration,
}

impl LockToken {
    /// Lock key in the store.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Opaque ownership value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Local estimate of when the store will expire the lock.
    #[must_use]
    pub fn expires_at(&self) -> Instant {
        self.acquired_at + self.ttl
    }

    /// Whether the TTL has elapsed according to the local clock.
    ///
    /// A `true` here means another holder may already own the key.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at()
    }
}

/// Outcome of a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockRelease {
    /// The lock was held with this token and has been removed.
    Released,
    /// The lock had expired or belongs to someone else; nothing was removed.
    NotOwner,
}

/// Acquires and releases per-key locks on a [`LockStore`].
///
/// A failed acquire is never retried here. The caller decides.
#[derive(Debug, Clone)]
pub struct LockCoordinator<L> {
    store: L,
    key_prefix: String,
}

impl<L: LockStore> LockCoordinator<L> {
    /// Create a coordinator; slot lock keys are `{key_prefix}{slot_id}`.
    pub fn new(store: L, key_prefix: impl Into<String>) -> Self {
        Self {
            store,
            key_prefix: key_prefix.into(),
        }
    }

    /// Lock key of a slot.
    #[must_use]
    pub fn key_for(&self, slot_id: SlotId) -> String {
        format!("{}{}", self.key_prefix, slot_id)
    }

    /// Try once to take the lock on `key`.
    ///
    /// # Errors
    ///
    /// - [`BookingError::Busy`] if an unexpired lock holds `key`
    /// - [`BookingError::LockStore`] if the store cannot be reached
    pub async fn acquire(&self, key: &str, ttl: Duration) -> Result<LockToken> {
        let value = Uuid::new_v4().to_string();

        if !self.store.set_if_absent(key, &value, ttl).await? {
            tracing::debug!(lock_key = %key, "Lock held by another attempt");
            metrics::record_lock_contention();
            return Err(BookingError::Busy);
        }

        tracing::debug!(lock_key = %key, ttl_ms = ttl.as_millis(), "Lock acquired");

        Ok(LockToken {
            key: key.to_string(),
            value,
            acquired_at: Instant::now(),
            ttl,
        })
    }

    /// Try once to take the lock of a slot.
    ///
    /// # Errors
    ///
    /// See [`acquire`](Self::acquire).
    pub async fn acquire_slot(&self, slot_id: SlotId, ttl: Duration) -> Result<LockToken> {
        self.acquire(&self.key_for(slot_id), ttl).await
    }

    /// Release a lock, only if `token` still owns it.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::LockStore`] if the store cannot be reached.
    pub async fn release(&self, token: &LockToken) -> Result<LockRelease> {
        if self.store.compare_and_delete(&token.key, &token.value).await? {
            tracing::debug!(lock_key = %token.key, "Lock released");
            Ok(LockRelease::Released)
        } else {
            tracing::warn!(
                lock_key = %token.key,
                expired_locally = token.is_expired(),
                "Lock no longer owned at release"
            );
            Ok(LockRelease::NotOwner)
        }
    }

    /// Whether any unexpired lock holds `key`.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::LockStore`] if the store cannot be reached.
    pub async fn is_locked(&self, key: &str) -> Result<bool> {
        Ok(self.store.current_value(key).await?.is_some())
    }
}
