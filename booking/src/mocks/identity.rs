//! Mock identity directory for testing.

use crate::error::{BookingError, Result};
use crate::providers::IdentityDirectory;
use crate::types::{ProviderId, RequesterId, RequesterProfile};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Directory {
    requesters: HashMap<RequesterId, RequesterProfile>,
    providers: HashSet<ProviderId>,
}

/// Mock identity directory.
#[derive(Debug, Clone, Default)]
pub struct MockIdentityDirectory {
    inner: Arc<Mutex<Directory>>,
}

fn lock_failed() -> BookingError {
    BookingError::Internal("Mutex lock failed".to_string())
}

impl MockIdentityDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an active requester.
    pub fn add_requester(&self, id: impl Into<String>) {
        self.put_requester(RequesterId::new(id), true);
    }

    /// Register a deactivated requester.
    pub fn add_inactive_requester(&self, id: impl Into<String>) {
        self.put_requester(RequesterId::new(id), false);
    }

    /// Register a provider.
    pub fn add_provider(&self, id: impl Into<String>) {
        if let Ok(mut dir) = self.inner.lock() {
            dir.providers.insert(ProviderId::new(id));
        }
    }

    fn put_requester(&self, id: RequesterId, active: bool) {
        if let Ok(mut dir) = self.inner.lock() {
            dir.requesters
                .insert(id.clone(), RequesterProfile { id, active });
        }
    }
}

impl IdentityDirectory for MockIdentityDirectory {
    fn requester(
        &self,
        requester_id: &RequesterId,
    ) -> impl Future<Output = Result<Option<RequesterProfile>>> + Send {
        let result = self
            .inner
            .lock()
            .map_err(|_| lock_failed())
            .map(|dir| dir.requesters.get(requester_id).cloned());
        async move { result }
    }

    fn provider_exists(&self, provider_id: &ProviderId) -> impl Future<Output = Result<bool>> + Send {
        let result = self
            .inner
            .lock()
            .map_err(|_| lock_failed())
            .map(|dir| dir.providers.contains(provider_id));
        async move { result }
    }
}
