//! Identity/profile directory.
//!
//! Query-only view of requester and provider profiles. Profile management
//! itself lives outside the booking core.

use crate::error::Result;
use crate::types::{ProviderId, RequesterId, RequesterProfile};

/// Answers "does requester X exist and is it active" and "does provider Y
/// exist".
///
/// Slot ownership is not asked here: it is read from the slot record.
pub trait IdentityDirectory: Send + Sync {
    /// Look up a requester.
    ///
    /// # Returns
    ///
    /// `None` if no such requester exists.
    ///
    /// # Errors
    ///
    /// Returns error if the lookup fails.
    fn requester(
        &self,
        requester_id: &RequesterId,
    ) -> impl std::future::Future<Output = Result<Option<RequesterProfile>>> + Send;

    /// Whether a provider exists.
    ///
    /// # Errors
    ///
    /// Returns error if the lookup fails.
    fn provider_exists(
        &self,
        provider_id: &ProviderId,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;
}
