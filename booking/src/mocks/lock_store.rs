//! Mock lock store for testing.

use crate::error::{BookingError, Result};
use crate::providers::LockStore;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

type Entries = HashMap<String, (String, Instant)>;

/// Mock lock store.
///
/// In-memory key-value map with expiry. Shared by clones, so every "process"
/// in a test sees the same locks. Expired entries are dropped on the next
/// `set_if_absent`.
#[derive(Debug, Clone)]
pub struct MockLockStore {
    entries: Arc<Mutex<Entries>>,
}

fn lock_failed() -> BookingError {
    BookingError::LockStore("Mutex lock failed".to_string())
}

impl MockLockStore {
    /// Create a new mock lock store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Force a key to expire, as if its TTL had elapsed (for testing).
    pub fn expire_now(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            if let Some((_, expires_at)) = entries.get_mut(key) {
                *expires_at = Instant::now();
            }
        }
    }

    /// Whether an unexpired value holds `key` (for testing).
    #[must_use]
    pub fn is_held(&self, key: &str) -> bool {
        self.entries
            .lock()
            .map(|entries| live_value(&entries, key).is_some())
            .unwrap_or(false)
    }

    /// Number of unexpired keys (for testing).
    #[must_use]
    pub fn held_count(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .map(|entries| entries.values().filter(|(_, exp)| *exp > now).count())
            .unwrap_or(0)
    }
}

impl Default for MockLockStore {
    fn default() -> Self {
        Self::new()
    }
}

fn live_value(entries: &Entries, key: &str) -> Option<String> {
    entries
        .get(key)
        .filter(|(_, expires_at)| *expires_at > Instant::now())
        .map(|(value, _)| value.clone())
}

impl LockStore for MockLockStore {
    fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl Future<Output = Result<bool>> + Send {
        let entries = Arc::clone(&self.entries);
        let key = key.to_string();
        let value = value.to_string();

        async move {
            let mut guard = entries.lock().map_err(|_| lock_failed())?;
            let now = Instant::now();
            guard.retain(|_, (_, expires_at)| *expires_at > now);

            if guard.contains_key(&key) {
                return Ok(false);
            }

            guard.insert(key, (value, Instant::now() + ttl));
            Ok(true)
        }
    }

    fn compare_and_delete(&self, key: &str, value: &str) -> impl Future<Output = Result<bool>> + Send {
        let entries = Arc::clone(&self.entries);
        let key = key.to_string();
        let value = value.to_string();

        async move {
            let mut guard = entries.lock().map_err(|_| lock_failed())?;

            if live_value(&guard, &key).as_deref() == Some(value.as_str()) {
                guard.remove(&key);
                Ok(true)
            } else {
                Ok(false)
            }
        }
    }

    fn current_value(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send {
        let entries = Arc::clone(&self.entries);
        let key = key.to_string();

        async move {
            let guard = entries.lock().map_err(|_| lock_failed())?;
            Ok(live_value(&guard, &key))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_if_absent_respects_existing_value() {
        let store = MockLockStore::new();
        let ttl = Duration::from_secs(10);

        assert!(store.set_if_absent("k", "a", ttl).await.unwrap());
        assert!(!store.set_if_absent("k", "b", ttl).await.unwrap());
        assert_eq!(store.current_value("k").await.unwrap().as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_expired_key_can_be_taken() {
        let store = MockLockStore::new();
        let ttl = Duration::from_secs(10);

        store.set_if_absent("k", "a", ttl).await.unwrap();
        store.expire_now("k");

        assert!(store.current_value("k").await.unwrap().is_none());
        assert!(store.set_if_absent("k", "b", ttl).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_keys_are_pruned() {
        let store = MockLockStore::new();
        let ttl = Duration::from_secs(10);

        for key in ["a", "b", "c"] {
            store.set_if_absent(key, "v", ttl).await.unwrap();
            store.expire_now(key);
        }
        store.set_if_absent("d", "v", ttl).await.unwrap();

        let stored: Vec<String> = store.entries.lock().unwrap().keys().cloned().collect();
        assert_eq!(stored, vec!["d".to_string()]);
    }

    #[tokio::test]
    async fn test_compare_and_delete_requires_matching_value() {
        let store = MockLockStore::new();
        store
            .set_if_absent("k", "a", Duration::from_secs(10))
            .await
            .unwrap();

        assert!(!store.compare_and_delete("k", "b").await.unwrap());
        assert!(store.is_held("k"));
        assert!(store.compare_and_delete("k", "a").await.unwrap());
        assert_eq!(store.held_count(), 0);
    }
}
