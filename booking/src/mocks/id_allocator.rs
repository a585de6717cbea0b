//! Mock booking id sequence.

use crate::error::Result;
use crate::providers::IdAllocator;
use crate::types::BookingId;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Sequential id allocator starting at 1.
#[derive(Debug, Clone)]
pub struct SequentialIdAllocator {
    next: Arc<AtomicU64>,
}

impl SequentialIdAllocator {
    /// Create an allocator whose first id is 1.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Create an allocator whose first id is `first`.
    #[must_use]
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: Arc::new(AtomicU64::new(first)),
        }
    }
}

impl Default for SequentialIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator for SequentialIdAllocator {
    fn next_booking_id(&self) -> impl Future<Output = Result<BookingId>> + Send {
        let id = self.next.fetch_add(1, Ordering::SeqCst);
        async move { Ok(BookingId(id)) }
    }
}
