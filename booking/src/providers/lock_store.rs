//! Lock store trait.
//!
//! Key-value primitives behind the distributed lock coordinator. Any store
//! offering atomic set-if-absent-with-expiry and compare-and-delete will do.

use crate::error::Result;
use std::time::Duration;

/// Distributed key-value store used for per-slot mutual exclusion.
///
/// # Implementation Notes
///
/// - **CRITICAL**: `set_if_absent()` MUST be a single atomic operation that
///   also sets the expiry (`Redis`: `SET key value NX PX ttl`). A separate
///   `SETNX` + `EXPIRE` leaves a window where a crash leaks the key forever.
/// - **CRITICAL**: `compare_and_delete()` MUST compare and delete atomically
///   (`Redis`: Lua script). Otherwise a holder whose lock expired can delete
///   the lock of the next holder.
/// - State must be visible to every serving process. Process-local
///   implementations are only suitable for tests.
pub trait LockStore: Send + Sync {
    /// Store `value` under `key` with expiry `ttl`, only if `key` is absent
    /// or expired.
    ///
    /// # Returns
    ///
    /// `true` if the value was stored, `false` if another value holds the key.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be reached.
    fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Delete `key` only if it currently holds `value`.
    ///
    /// # Returns
    ///
    /// `true` if the key was deleted, `false` if it was absent or held
    /// another value.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be reached.
    fn compare_and_delete(
        &self,
        key: &str,
        value: &str,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Current value of `key`, if present and unexpired.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be reached.
    fn current_value(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>>> + Send;
}
