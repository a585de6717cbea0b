//! Redis-based lock store implementation.
//!
//! # Architecture
//!
//! Each lock is one string key:
//! - **Key**: `schedule:lock:{slot_id}` (prefix configurable)
//! - **Value**: random per-acquisition token
//! - **Expiry**: `PX` milliseconds, set in the same command as the value
//!
//! Release runs a Lua script so the ownership check and the delete happen
//! atomically on the server.
//!
//! # Example
//!
//! ```no_run
//! use booking_core::stores::RedisLockStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = RedisLockStore::new("redis://127.0.0.1:6379").await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{BookingError, Result};
use crate::providers::LockStore;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::time::Duration;

/// Delete `KEYS[1]` only if its value is `ARGV[1]`.
const COMPARE_AND_DELETE: &str = r"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
else
    return 0
end
";

/// Redis lock store.
///
/// Provides:
/// - Atomic set-if-absent with expiry (`SET NX PX`)
/// - Atomic compare-and-delete (Lua)
/// - Connection pooling via `ConnectionManager`
#[derive(Clone)]
pub struct RedisLockStore {
    /// Connection manager for connection pooling.
    conn_manager: ConnectionManager,
}

impl RedisLockStore {
    /// Create a new Redis lock store.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "redis://127.0.0.1:6379")
    ///
    /// # Errors
    ///
    /// Returns error if connection to Redis fails.
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url).map_err(|e| {
            BookingError::LockStore(format!("Failed to create Redis client: {e}"))
        })?;

        let conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            BookingError::LockStore(format!("Failed to create Redis connection manager: {e}"))
        })?;

        Ok(Self { conn_manager })
    }

    /// Build from an existing connection manager.
    #[must_use]
    pub const fn from_manager(conn_manager: ConnectionManager) -> Self {
        Self { conn_manager }
    }
}

impl LockStore for RedisLockStore {
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn_manager.clone();

        // PX takes at least 1 ms; a zero TTL would be rejected by the server.
        #[allow(clippy::cast_possible_truncation)]
        let ttl_ms = ttl.as_millis().max(1) as u64;

        // SET returns "OK" when stored and nil when NX refused.
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut conn)
            .await
            .map_err(|e| BookingError::LockStore(format!("Failed to set lock key: {e}")))?;

        Ok(reply.is_some())
    }

    async fn compare_and_delete(&self, key: &str, value: &str) -> Result<bool> {
        let mut conn = self.conn_manager.clone();

        let deleted: i64 = redis::Script::new(COMPARE_AND_DELETE)
            .key(key)
            .arg(value)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| BookingError::LockStore(format!("Failed to release lock key: {e}")))?;

        Ok(deleted == 1)
    }

    async fn current_value(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn_manager.clone();

        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| BookingError::LockStore(format!("Failed to read lock key: {e}")))?;

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(clippy::unwrap_used)] // Test code
    async fn create_test_store() -> RedisLockStore {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        RedisLockStore::new(&redis_url).await.unwrap()
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    #[allow(clippy::unwrap_used)] // Test code
    async fn test_set_if_absent_and_compare_and_delete() {
        let store = create_test_store().await;
        let key = format!("test:lock:{}", uuid::Uuid::new_v4());
        let ttl = Duration::from_secs(10);

        assert!(store.set_if_absent(&key, "a", ttl).await.unwrap());
        assert!(!store.set_if_absent(&key, "b", ttl).await.unwrap());
        assert_eq!(store.current_value(&key).await.unwrap().as_deref(), Some("a"));

        assert!(!store.compare_and_delete(&key, "b").await.unwrap());
        assert!(store.compare_and_delete(&key, "a").await.unwrap());
        assert!(store.current_value(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    #[allow(clippy::unwrap_used)] // Test code
    async fn test_lock_expires() {
        let store = create_test_store().await;
        let key = format!("test:lock:{}", uuid::Uuid::new_v4());

        assert!(
            store
                .set_if_absent(&key, "a", Duration::from_millis(50))
                .await
                .unwrap()
        );
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(store.current_value(&key).await.unwrap().is_none());
        assert!(
            store
                .set_if_absent(&key, "b", Duration::from_secs(1))
                .await
                .unwrap()
        );
        store.compare_and_delete(&key, "b").await.unwrap();
    }
}
